use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    clients::{
        ChangelogClient, ReleasesClient,
        changelog::ChangelogClientConfig,
        releases::ReleasesClientConfig,
    },
    config::Config,
    parser::section::extract_sections,
    timeline::{DateEstimator, KnownDates, TimelineItem, render::ItemRenderer},
    util::retry::{RetryConfig, is_retryable_error},
};

pub mod sink;

use sink::ResultsSink;

/// 日付割り当ての出どころ。第2段の取得が失敗しても実行は止めず、
/// 推定のみのパスへ切り替える。
enum DateSource {
    Authoritative(KnownDates),
    EstimatedOnly,
}

/// fetch → パース → 日付割り当て → レンダリング → 受け渡しを
/// 直列に実行するオーケストレータ。
pub struct ChangelogPipeline {
    config: Arc<Config>,
    changelog_client: ChangelogClient,
    releases_client: ReleasesClient,
    renderer: ItemRenderer,
    estimator: DateEstimator,
    retry_config: RetryConfig,
}

impl ChangelogPipeline {
    /// 構成情報からパイプライン一式を組み立てる。
    ///
    /// # Errors
    /// HTTPクライアントやレンダラの構築に失敗した場合はエラーを返す。
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let changelog_client = ChangelogClient::new(ChangelogClientConfig {
            url: config.changelog_url().to_string(),
            connect_timeout: config.http_connect_timeout(),
            total_timeout: config.http_total_timeout(),
        })
        .context("failed to create changelog client")?;

        let releases_client = ReleasesClient::new(ReleasesClientConfig {
            api_base: config.github_api_base().to_string(),
            per_page: config.github_releases_limit(),
            connect_timeout: config.http_connect_timeout(),
            total_timeout: config.http_total_timeout(),
        })
        .context("failed to create releases client")?;

        let renderer = ItemRenderer::new(config.changelog_page_url())
            .context("failed to create item renderer")?;

        let estimator =
            DateEstimator::new(config.release_cadence_days(), config.estimate_offset_days());

        let retry_config = RetryConfig::new(
            config.http_max_retries(),
            config.http_backoff_base_ms(),
            config.http_backoff_cap_ms(),
        );

        Ok(Self {
            config,
            changelog_client,
            releases_client,
            renderer,
            estimator,
            retry_config,
        })
    }

    /// 1回分の実行。結果かエラーメッセージを、シンクへ1度だけ渡す。
    pub async fn run<R: Rng>(&self, rng: &mut R, sink: &dyn ResultsSink) {
        let run_id = Uuid::new_v4();
        info!(%run_id, use_github_dates = self.config.use_github_dates(), "starting changelog run");

        match self.load(rng, run_id).await {
            Ok(items) => {
                info!(%run_id, count = items.len(), "delivering timeline items");
                sink.deliver(items);
            }
            Err(error) => {
                warn!(%run_id, error = %error, "changelog run failed");
                sink.fail(&format!("Failed to load changelog: {error:#}"));
            }
        }
    }

    /// コネクタ設定の検証。リリースAPIへの疎通とJSON応答を確認する。
    pub async fn verify(&self) -> bool {
        self.releases_client.verify().await
    }

    async fn load<R: Rng>(&self, rng: &mut R, run_id: Uuid) -> Result<Vec<TimelineItem>> {
        let markdown = self.fetch_with_retry().await?;

        if markdown.is_empty() {
            bail!("invalid changelog response: empty document");
        }
        if markdown.len() < self.config.min_changelog_bytes() {
            bail!("changelog appears to be too short or invalid");
        }

        let sections = extract_sections(&markdown);
        if sections.is_empty() {
            bail!("no version sections found in changelog");
        }
        info!(%run_id, sections = sections.len(), "extracted changelog sections");

        let date_source = self.resolve_date_source(run_id).await;
        let now = Utc::now();
        let dates = match &date_source {
            DateSource::Authoritative(known) => {
                self.estimator.assign_with_known(now, &sections, known)
            }
            DateSource::EstimatedOnly => self.estimator.estimate_all(rng, now, sections.len()),
        };

        let items: Vec<TimelineItem> = sections
            .iter()
            .zip(dates)
            .map(|(section, date)| self.renderer.render(section, date))
            .collect();

        if items.is_empty() {
            bail!("no changelog items could be created");
        }

        Ok(items)
    }

    /// 公式リリース日の取得を試み、失敗時は推定のみのパスへ黙って切り替える。
    async fn resolve_date_source(&self, run_id: Uuid) -> DateSource {
        if !self.config.use_github_dates() {
            return DateSource::EstimatedOnly;
        }

        match self.releases_client.fetch_release_dates().await {
            Ok(known) => {
                info!(%run_id, known = known.len(), "using authoritative release dates");
                DateSource::Authoritative(known)
            }
            Err(error) => {
                warn!(%run_id, error = %error, "release dates unavailable, falling back to estimation");
                DateSource::EstimatedOnly
            }
        }
    }

    /// 再試行付きでチェンジログを取得する。
    async fn fetch_with_retry(&self) -> Result<String> {
        let mut attempt = 0;

        loop {
            match self.changelog_client.fetch_markdown().await {
                Ok(markdown) => {
                    if attempt > 0 {
                        info!(attempt, "changelog fetch succeeded after retry");
                    }
                    return Ok(markdown);
                }
                Err(err) => {
                    attempt += 1;

                    if !self.retry_config.can_retry(attempt) {
                        warn!(
                            attempt,
                            max_attempts = self.retry_config.max_attempts,
                            "changelog fetch failed after all retries"
                        );
                        return Err(err);
                    }

                    let is_retryable = err
                        .downcast_ref::<reqwest::Error>()
                        .is_some_and(is_retryable_error);

                    if !is_retryable {
                        warn!(?err, "changelog fetch error is not retryable");
                        return Err(err);
                    }

                    let delay = self.retry_config.delay_for_attempt(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis(),
                        "changelog fetch failed, retrying after delay"
                    );

                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
