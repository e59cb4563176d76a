/// CHANGELOG.md の原文を取得するクライアント。
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Url};
use tracing::debug;

/// チェンジログ取得クライアントの設定。
#[derive(Debug, Clone)]
pub struct ChangelogClientConfig {
    pub url: String,
    pub connect_timeout: Duration,
    pub total_timeout: Duration,
}

/// チェンジログ文書との通信を管理するクライアント。
#[derive(Debug, Clone)]
pub struct ChangelogClient {
    client: Client,
    url: Url,
}

impl ChangelogClient {
    /// 新しいチェンジログクライアントを作成する。
    ///
    /// # Errors
    /// URLのパースまたはHTTPクライアントの構築に失敗した場合はエラーを返す。
    pub fn new(config: ChangelogClientConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.total_timeout)
            .build()
            .context("failed to build changelog HTTP client")?;

        let url = Url::parse(&config.url).context("invalid changelog URL")?;

        Ok(Self { client, url })
    }

    /// チェンジログ全文をテキストとして取得する。
    ///
    /// # Errors
    /// リクエストが失敗した場合、またはサーバーがエラー状態を返した場合はエラーを返す。
    pub async fn fetch_markdown(&self) -> Result<String> {
        debug!(url = %self.url, "fetching changelog document");

        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .context("changelog request failed")?
            .error_for_status()
            .context("changelog endpoint returned error status")?;

        response
            .text()
            .await
            .context("failed to read changelog response body")
    }
}
