use std::{env, time::Duration};

use thiserror::Error;

#[cfg(test)]
use once_cell::sync::Lazy;
#[cfg(test)]
pub(crate) static ENV_MUTEX: Lazy<std::sync::Mutex<()>> = Lazy::new(|| std::sync::Mutex::new(()));

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    changelog_url: String,
    changelog_page_url: String,
    github_api_base: String,
    github_releases_limit: usize,
    use_github_dates: bool,
    release_cadence_days: f64,
    estimate_offset_days: f64,
    min_changelog_bytes: usize,
    http_connect_timeout: Duration,
    http_total_timeout: Duration,
    http_max_retries: usize,
    http_backoff_base_ms: u64,
    http_backoff_cap_ms: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Config {
    /// 環境変数から Changelog Worker の設定値を読み込み、検証する。
    ///
    /// すべての項目にデフォルト値があるため、未設定の変数はエラーにならない。
    ///
    /// # Errors
    /// 数値・真偽値のパースに失敗した場合は [`ConfigError`] を返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        let changelog_url = env::var("CHANGELOG_URL").unwrap_or_else(|_| {
            "https://raw.githubusercontent.com/anthropics/claude-code/refs/heads/main/CHANGELOG.md"
                .to_string()
        });
        let changelog_page_url = env::var("CHANGELOG_PAGE_URL").unwrap_or_else(|_| {
            "https://github.com/anthropics/claude-code/blob/main/CHANGELOG.md".to_string()
        });
        let github_api_base = env::var("GITHUB_API_BASE")
            .unwrap_or_else(|_| "https://api.github.com/repos/anthropics/claude-code".to_string());
        let github_releases_limit = parse_usize("GITHUB_RELEASES_LIMIT", 30)?;
        let use_github_dates = parse_bool("USE_GITHUB_DATES", false)?;

        // Date estimation settings
        let release_cadence_days = parse_positive_f64("RELEASE_CADENCE_DAYS", 2.5)?;
        let estimate_offset_days = parse_positive_f64("ESTIMATE_OFFSET_DAYS", 3.0)?;

        // Anything shorter than this is treated as a broken changelog document
        let min_changelog_bytes = parse_usize("MIN_CHANGELOG_BYTES", 100)?;

        // HTTP timeout settings
        let http_connect_timeout = parse_duration_ms("HTTP_CONNECT_TIMEOUT_MS", 3000)?;
        let http_total_timeout = parse_duration_ms("HTTP_TOTAL_TIMEOUT_MS", 30000)?;

        // Retry settings (exponential backoff + jitter)
        let http_max_retries = parse_usize("HTTP_MAX_RETRIES", 3)?;
        let http_backoff_base_ms = parse_u64("HTTP_BACKOFF_BASE_MS", 250)?;
        let http_backoff_cap_ms = parse_u64("HTTP_BACKOFF_CAP_MS", 10000)?;

        Ok(Self {
            changelog_url,
            changelog_page_url,
            github_api_base,
            github_releases_limit,
            use_github_dates,
            release_cadence_days,
            estimate_offset_days,
            min_changelog_bytes,
            http_connect_timeout,
            http_total_timeout,
            http_max_retries,
            http_backoff_base_ms,
            http_backoff_cap_ms,
        })
    }

    #[must_use]
    pub fn changelog_url(&self) -> &str {
        &self.changelog_url
    }

    #[must_use]
    pub fn changelog_page_url(&self) -> &str {
        &self.changelog_page_url
    }

    #[must_use]
    pub fn github_api_base(&self) -> &str {
        &self.github_api_base
    }

    #[must_use]
    pub fn github_releases_limit(&self) -> usize {
        self.github_releases_limit
    }

    #[must_use]
    pub fn use_github_dates(&self) -> bool {
        self.use_github_dates
    }

    #[must_use]
    pub fn release_cadence_days(&self) -> f64 {
        self.release_cadence_days
    }

    #[must_use]
    pub fn estimate_offset_days(&self) -> f64 {
        self.estimate_offset_days
    }

    #[must_use]
    pub fn min_changelog_bytes(&self) -> usize {
        self.min_changelog_bytes
    }

    #[must_use]
    pub fn http_connect_timeout(&self) -> Duration {
        self.http_connect_timeout
    }

    #[must_use]
    pub fn http_total_timeout(&self) -> Duration {
        self.http_total_timeout
    }

    #[must_use]
    pub fn http_max_retries(&self) -> usize {
        self.http_max_retries
    }

    #[must_use]
    pub fn http_backoff_base_ms(&self) -> u64 {
        self.http_backoff_base_ms
    }

    #[must_use]
    pub fn http_backoff_cap_ms(&self) -> u64 {
        self.http_backoff_cap_ms
    }
}

fn parse_duration_ms(name: &'static str, default_ms: u64) -> Result<Duration, ConfigError> {
    let ms = parse_u64(name, default_ms)?;
    Ok(Duration::from_millis(ms))
}

fn parse_usize(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<usize>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<u64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_positive_f64(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let parsed = raw.parse::<f64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    if parsed <= 0.0 || !parsed.is_finite() {
        return Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("value must be a positive number"),
        });
    }
    Ok(parsed)
}

fn parse_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("invalid boolean value: {raw}"),
        }),
    }
}
