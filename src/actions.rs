/// アイテムに対するアクションのディスパッチ。
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::timeline::TimelineItem;

/// アイテムのタイトルからバージョン番号を取り出すパターン。
static VERSION_IN_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Claude Code ([0-9.]+)").expect("title version pattern compiles"));

const RELEASE_TAG_BASE: &str = "https://github.com/anthropics/claude-code/releases/tag/v";
const COMMITS_URL: &str = "https://github.com/anthropics/claude-code/commits/main";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("Could not determine version")]
    VersionNotFound,
    #[error("Unknown action: {0}")]
    UnknownAction(String),
}

/// アクション識別子を解決し、結果のURLを返す。
///
/// 失敗は戻り値で伝え、他のアイテムの処理には影響しない。
///
/// # Errors
/// 未知のアクション識別子、またはタイトルからバージョンを特定できない
/// 場合は [`ActionError`] を返す。
pub fn perform_action(action_id: &str, item: &TimelineItem) -> Result<String, ActionError> {
    match action_id {
        "download" => {
            let captures = VERSION_IN_TITLE
                .captures(&item.title)
                .ok_or(ActionError::VersionNotFound)?;
            Ok(format!("{RELEASE_TAG_BASE}{}", &captures[1]))
        }
        "view_commits" => Ok(COMMITS_URL.to_string()),
        other => Err(ActionError::UnknownAction(other.to_string())),
    }
}
