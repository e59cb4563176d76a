/// セクションと日付からタイムラインアイテムを組み立てるレンダラ。
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use regex::Regex;

use crate::parser::Section;
use crate::parser::classify::{BUCKET_ORDER, find_highlight, group_changes, has_breaking_changes};
use crate::timeline::item::{Annotation, Identity, TimelineItem};

const AUTHOR_NAME: &str = "Claude Code Team";
const AUTHOR_URI: &str = "https://github.com/anthropics/claude-code";
const AUTHOR_AVATAR: &str = "https://avatars.githubusercontent.com/u/76263028";
const AUTHOR_USERNAME: &str = "@anthropics";

pub struct ItemRenderer {
    page_url: String,
    code_span: Regex,
    breaking_keyword: Regex,
}

impl ItemRenderer {
    /// チェンジログページのURL（アンカーの土台）を指定してレンダラを作る。
    ///
    /// # Errors
    /// 整形用パターンのコンパイルに失敗した場合はエラーを返す。
    pub fn new(changelog_page_url: &str) -> Result<Self> {
        let code_span = Regex::new(r"`([^`]+)`").context("failed to compile code span pattern")?;
        let breaking_keyword = Regex::new(r"(?i)\b(Breaking change:|BREAKING:)")
            .context("failed to compile breaking keyword pattern")?;

        Ok(Self {
            page_url: changelog_page_url.to_string(),
            code_span,
            breaking_keyword,
        })
    }

    /// セクション1件と割り当て済みの日付からアイテムを組み立てる。
    #[must_use]
    pub fn render(&self, section: &Section, date: DateTime<Utc>) -> TimelineItem {
        // GitHubの見出しアンカーはドットを除去した形になる
        let anchor = section.version.replace('.', "");
        let uri = format!("{}#{anchor}", self.page_url);

        let title = match find_highlight(&section.changes) {
            Some(highlight) => format!("Claude Code {} - {highlight}", section.version),
            None => format!("Claude Code {}", section.version),
        };

        let grouped = group_changes(&section.changes);

        let mut preview = section.version.clone();
        if let Some(kind) = grouped.dominant_kind() {
            preview.push(' ');
            preview.push_str(kind.emoji());
            preview.push(' ');
            preview.push_str(kind.label());
        }

        let mut body = format!("<p><strong>{preview}</strong></p>");
        for kind in BUCKET_ORDER {
            let changes = grouped.bucket(kind);
            if changes.is_empty() {
                continue;
            }
            body.push_str("<ul>");
            for change in changes {
                body.push_str("<li>");
                body.push_str(&self.format_change(change));
                body.push_str("</li>");
            }
            body.push_str("</ul>");
        }

        let author = Identity {
            name: AUTHOR_NAME.to_string(),
            uri: AUTHOR_URI.to_string(),
            avatar: AUTHOR_AVATAR.to_string(),
            username: AUTHOR_USERNAME.to_string(),
        };

        TimelineItem {
            uri,
            date,
            title,
            body,
            author,
            annotations: annotation_for(section).map(|annotation| vec![annotation]),
        }
    }

    /// 変更行1件をHTML断片へ整形する。
    ///
    /// 必ず先にエスケープし、その後でバッククォート区切りを `<code>` に、
    /// 破壊的変更のキーワードを `<strong>` に置き換える。
    #[must_use]
    pub fn format_change(&self, change: &str) -> String {
        let escaped = escape_html(change);
        let with_code = self.code_span.replace_all(&escaped, "<code>${1}</code>");
        self.breaking_keyword
            .replace_all(&with_code, "<strong>${1}</strong>")
            .into_owned()
    }
}

/// 特別なリリースへの注記。最初に一致した条件だけが使われる。
fn annotation_for(section: &Section) -> Option<Annotation> {
    if section.version == "1.0.0" {
        Some(Annotation::with_text("🎉 GA Release"))
    } else if has_breaking_changes(&section.changes) {
        Some(Annotation::with_text("⚠️ Breaking Changes"))
    } else if section.version.ends_with(".0") {
        Some(Annotation::with_text("✨ Feature Release"))
    } else {
        None
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
