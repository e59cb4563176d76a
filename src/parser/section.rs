/// CHANGELOG.mdをバージョンセクション列に分割するパーサ。
use once_cell::sync::Lazy;
use regex::Regex;

/// `## 1.2.3` 形式の見出し。バージョンは数字とドット、任意の `-suffix` を許す。
static VERSION_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^##\s+([0-9.]+(?:-[A-Za-z0-9]+)?)\s*$").expect("version heading pattern compiles")
});

/// 1バージョン分のチェンジログセクション。
///
/// 変更行が1件もないセクションは [`extract_sections`] から出力されない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub version: String,
    pub changes: Vec<String>,
    pub line_number: usize,
}

/// Markdownをドキュメント順（新しいリリースが先頭）のセクション列に分割する。
///
/// バージョン見出しで新しいセクションを開き、開いているセクション内の
/// `-` で始まる行だけを変更行として取り込む。それ以外の行（他レベルの見出し、
/// 空行、本文）は無視する。見出しより前に現れた箇条書きも無視する。
#[must_use]
pub fn extract_sections(markdown: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<Section> = None;

    for (line_number, line) in markdown.lines().enumerate() {
        if let Some(captures) = VERSION_HEADING.captures(line) {
            if let Some(section) = current.take() {
                if !section.changes.is_empty() {
                    sections.push(section);
                }
            }
            current = Some(Section {
                version: captures[1].to_string(),
                changes: Vec::new(),
                line_number,
            });
        } else if let Some(section) = current.as_mut() {
            if let Some(rest) = line.trim().strip_prefix('-') {
                let change = rest.trim();
                if !change.is_empty() {
                    section.changes.push(change.to_string());
                }
            }
        }
    }

    if let Some(section) = current {
        if !section.changes.is_empty() {
            sections.push(section);
        }
    }

    sections
}
