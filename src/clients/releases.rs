/// GitHub Releases API から公式リリース日を取得するクライアント。
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{Client, Url, header};
use serde::Deserialize;
use tracing::debug;

use crate::timeline::estimate::KnownDates;

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// リリースAPIクライアントの設定。
#[derive(Debug, Clone)]
pub struct ReleasesClientConfig {
    pub api_base: String,
    pub per_page: usize,
    pub connect_timeout: Duration,
    pub total_timeout: Duration,
}

/// リリース一覧レスポンスの1レコード。欠けていても全体を失敗させない。
#[derive(Debug, Deserialize)]
struct ReleaseRecord {
    tag_name: Option<String>,
    published_at: Option<String>,
    created_at: Option<String>,
}

/// GitHub Releases API との通信を管理するクライアント。
#[derive(Debug, Clone)]
pub struct ReleasesClient {
    client: Client,
    api_base: Url,
    per_page: usize,
}

impl ReleasesClient {
    /// 新しいリリースAPIクライアントを作成する。
    ///
    /// # Errors
    /// URLのパースまたはHTTPクライアントの構築に失敗した場合はエラーを返す。
    pub fn new(config: ReleasesClientConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.total_timeout)
            .build()
            .context("failed to build releases HTTP client")?;

        let api_base = Url::parse(&config.api_base).context("invalid GitHub API base URL")?;

        Ok(Self {
            client,
            api_base,
            per_page: config.per_page,
        })
    }

    /// リリース一覧を取得し、バージョン→公開日時のマップを構築する。
    ///
    /// タグ名の先頭の `v` は取り除く。公開日時は `published_at` を優先し、
    /// なければ `created_at` を使う。タグや日時が欠けている・解釈できない
    /// レコードはそのレコードだけをスキップする。
    ///
    /// # Errors
    /// リクエストの失敗、エラーステータス、またはレスポンスがリリースの
    /// リストとして解釈できない場合はエラーを返す。
    pub async fn fetch_release_dates(&self) -> Result<KnownDates> {
        let base = self.api_base.as_str().trim_end_matches('/');
        let url = format!("{base}/releases?per_page={}", self.per_page);

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, GITHUB_ACCEPT)
            .send()
            .await
            .context("GitHub releases request failed")?
            .error_for_status()
            .context("GitHub releases endpoint returned error status")?;

        let records: Vec<ReleaseRecord> = response
            .json()
            .await
            .context("GitHub API response is not a release list")?;

        let mut dates = KnownDates::new();
        for record in records {
            let Some(tag) = record.tag_name else {
                continue;
            };
            let version = tag.strip_prefix('v').unwrap_or(&tag).to_string();

            let Some(raw_date) = record.published_at.or(record.created_at) else {
                debug!(tag = %tag, "release record has no usable date, skipping");
                continue;
            };
            match DateTime::parse_from_rfc3339(&raw_date) {
                Ok(date) => {
                    dates.insert(version, date.with_timezone(&Utc));
                }
                Err(error) => {
                    debug!(tag = %tag, %error, "release record date is unparseable, skipping");
                }
            }
        }

        Ok(dates)
    }

    /// コネクタ設定の検証。APIベースへアクセスし、レスポンスがJSONとして
    /// 解釈できる場合のみ `true` を返す。失敗はエラーとして伝播させない。
    pub async fn verify(&self) -> bool {
        match self.fetch_api_root().await {
            Ok(()) => true,
            Err(error) => {
                debug!(error = %error, "connector verification failed");
                false
            }
        }
    }

    async fn fetch_api_root(&self) -> Result<()> {
        let response = self
            .client
            .get(self.api_base.clone())
            .header(header::ACCEPT, GITHUB_ACCEPT)
            .send()
            .await
            .context("GitHub API request failed")?;

        let body = response
            .text()
            .await
            .context("failed to read GitHub API response body")?;
        serde_json::from_str::<serde_json::Value>(&body)
            .context("GitHub API response is not JSON")?;

        Ok(())
    }
}
