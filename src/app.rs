use std::sync::Arc;

use anyhow::{Context, Result};

use crate::{config::Config, pipeline::ChangelogPipeline};

/// アプリケーション全体で共有するコンポーネント一式。
pub struct ComponentRegistry {
    config: Arc<Config>,
    pipeline: ChangelogPipeline,
}

impl ComponentRegistry {
    /// 構成情報と依存をまとめて初期化し、共有レジストリを構築する。
    ///
    /// # Errors
    /// HTTPクライアントやレンダラの構築が失敗した場合はエラーを返す。
    pub fn build(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let pipeline = ChangelogPipeline::new(Arc::clone(&config))
            .context("failed to build changelog pipeline")?;

        Ok(Self { config, pipeline })
    }

    #[must_use]
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    #[must_use]
    pub fn pipeline(&self) -> &ChangelogPipeline {
        &self.pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ENV_MUTEX;

    #[test]
    fn component_registry_builds_with_defaults() {
        let config = {
            let _lock = ENV_MUTEX.lock().expect("env mutex");
            Config::from_env().expect("config loads")
        };

        let registry = ComponentRegistry::build(config).expect("registry builds");

        assert!(!registry.config().use_github_dates());
        let _ = registry.pipeline();
    }
}
