/// 変更行を4つのバケットへ分類し、セクションのハイライトを抽出する。
use once_cell::sync::Lazy;
use regex::Regex;

/// 変更の分類先バケット。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Breaking,
    Features,
    Fixes,
    Improvements,
}

impl ChangeKind {
    #[must_use]
    pub fn emoji(self) -> &'static str {
        match self {
            Self::Breaking => "⚠️",
            Self::Features => "✨",
            Self::Fixes => "🐛",
            Self::Improvements => "📈",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Breaking => "Breaking Changes",
            Self::Features => "New Features",
            Self::Fixes => "Bug Fixes",
            Self::Improvements => "Improvements",
        }
    }
}

/// バケットの固定表示順。本文のリスト順とプレビューの優先順に共通で使う。
pub const BUCKET_ORDER: [ChangeKind; 4] = [
    ChangeKind::Breaking,
    ChangeKind::Features,
    ChangeKind::Fixes,
    ChangeKind::Improvements,
];

/// 分類ルール。先頭から順に評価し、最初に一致したバケットで確定する。
/// どれにも一致しない行は `Improvements` に落ちる。
const CLASSIFY_RULES: [(ChangeKind, fn(&str) -> bool); 3] = [
    (ChangeKind::Breaking, is_breaking),
    (ChangeKind::Fixes, is_fix),
    (ChangeKind::Features, is_feature),
];

fn is_breaking(lower: &str) -> bool {
    lower.contains("breaking change") || lower.starts_with("breaking:")
}

fn is_fix(lower: &str) -> bool {
    lower.contains("fixed") || lower.contains("fix ")
}

fn is_feature(lower: &str) -> bool {
    lower.contains("added")
        || lower.contains("new ")
        || lower.contains("introducing")
        || lower.contains("can now")
}

/// 1行の変更テキストをバケットへ分類する。決定的な全域関数。
#[must_use]
pub fn classify_change(change: &str) -> ChangeKind {
    let lower = change.to_lowercase();
    for (kind, applies) in CLASSIFY_RULES {
        if applies(&lower) {
            return kind;
        }
    }
    ChangeKind::Improvements
}

/// セクションの変更行をバケットごとに仕分けた結果。
#[derive(Debug, Default)]
pub struct GroupedChanges<'a> {
    pub breaking: Vec<&'a str>,
    pub features: Vec<&'a str>,
    pub fixes: Vec<&'a str>,
    pub improvements: Vec<&'a str>,
}

impl<'a> GroupedChanges<'a> {
    #[must_use]
    pub fn bucket(&self, kind: ChangeKind) -> &[&'a str] {
        match kind {
            ChangeKind::Breaking => &self.breaking,
            ChangeKind::Features => &self.features,
            ChangeKind::Fixes => &self.fixes,
            ChangeKind::Improvements => &self.improvements,
        }
    }

    /// 表示順で最初に中身のあるバケット。プレビュー行の種別表示に使う。
    #[must_use]
    pub fn dominant_kind(&self) -> Option<ChangeKind> {
        BUCKET_ORDER
            .into_iter()
            .find(|kind| !self.bucket(*kind).is_empty())
    }
}

/// 変更行をバケットへ仕分ける。
#[must_use]
pub fn group_changes(changes: &[String]) -> GroupedChanges<'_> {
    let mut grouped = GroupedChanges::default();
    for change in changes {
        match classify_change(change) {
            ChangeKind::Breaking => grouped.breaking.push(change),
            ChangeKind::Features => grouped.features.push(change),
            ChangeKind::Fixes => grouped.fixes.push(change),
            ChangeKind::Improvements => grouped.improvements.push(change),
        }
    }
    grouped
}

/// セクションに破壊的変更が含まれるかどうか。
#[must_use]
pub fn has_breaking_changes(changes: &[String]) -> bool {
    changes
        .iter()
        .any(|change| is_breaking(&change.to_lowercase()))
}

/// 機能名を切り出すパターン。ダッシュ類または行末で打ち切る。
static FEATURE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)introducing\s+(.+?)(?:\s*[-–—]|$)",
        r"(?i)added\s+support\s+for\s+(.+?)(?:\s*[-–—]|$)",
        r"(?i)can\s+now\s+(.+?)(?:\s*[-–—]|$)",
        r"(?i)new\s+(.+?)(?:\s*[-–—]|$)",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("feature pattern compiles"))
    .collect()
});

const HIGHLIGHT_MAX_CHARS: usize = 30;
const HIGHLIGHT_TRUNCATED_CHARS: usize = 27;

/// タイトルに添えるハイライトをセクション全体から選ぶ。
///
/// 優先順: 新機能紹介（introducing / new model）、破壊的変更、
/// その他の機能追加（can now / added support）。どれもなければ `None`。
#[must_use]
pub fn find_highlight(changes: &[String]) -> Option<String> {
    for change in changes {
        let lower = change.to_lowercase();
        if lower.contains("introducing") || lower.contains("new model") {
            return Some(extract_feature_name(change));
        }
    }

    for change in changes {
        if change.to_lowercase().contains("breaking change") {
            return Some("Breaking Changes".to_string());
        }
    }

    for change in changes {
        let lower = change.to_lowercase();
        if lower.contains("can now") || lower.contains("added support") {
            return Some(extract_feature_name(change));
        }
    }

    None
}

/// 変更テキストから簡潔な機能名を切り出す。
///
/// どのパターンにも一致しない場合は先頭5語へフォールバックする。
#[must_use]
pub fn extract_feature_name(change: &str) -> String {
    for pattern in FEATURE_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(change) {
            return truncate_highlight(captures[1].trim());
        }
    }

    let words: Vec<&str> = change.split_whitespace().take(5).collect();
    truncate_highlight(&words.join(" "))
}

fn truncate_highlight(text: &str) -> String {
    if text.chars().count() > HIGHLIGHT_MAX_CHARS {
        let mut truncated: String = text.chars().take(HIGHLIGHT_TRUNCATED_CHARS).collect();
        truncated.push_str("...");
        truncated
    } else {
        text.to_string()
    }
}
