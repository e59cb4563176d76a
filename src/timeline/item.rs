/// タイムライン表示用の値オブジェクト。
use chrono::{DateTime, Utc};
use serde::Serialize;

/// 1バージョン分のタイムラインアイテム。
///
/// `uri` はバージョン文字列から決定的に導出され、`body` はHTML文字列。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineItem {
    pub uri: String,
    pub date: DateTime<Utc>,
    pub title: String,
    pub body: String,
    pub author: Identity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Vec<Annotation>>,
}

/// アイテムの作者情報。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub name: String,
    pub uri: String,
    pub avatar: String,
    pub username: String,
}

/// 特別なリリースに付ける短い注記ラベル。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub text: String,
}

impl Annotation {
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
