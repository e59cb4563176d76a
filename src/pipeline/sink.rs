/// パイプライン実行結果の受け渡し先。
use tracing::error;

use crate::timeline::TimelineItem;

/// 実行結果を受け取るシンク。ホスト側の結果コールバックに相当する。
///
/// 1回の実行で `deliver` か `fail` のどちらか一方だけが、最大1度呼ばれる。
pub trait ResultsSink {
    /// 生成されたアイテム列を受け取る。
    fn deliver(&self, items: Vec<TimelineItem>);

    /// 回復不能なエラーの説明文を受け取る。
    fn fail(&self, message: &str);
}

/// アイテム列をJSONとして標準出力へ書き出すシンク。
#[derive(Debug, Default)]
pub struct JsonStdoutSink;

impl ResultsSink for JsonStdoutSink {
    fn deliver(&self, items: Vec<TimelineItem>) {
        match serde_json::to_string_pretty(&items) {
            Ok(json) => println!("{json}"),
            Err(err) => error!(error = %err, "failed to serialize timeline items"),
        }
    }

    fn fail(&self, message: &str) {
        eprintln!("{message}");
    }
}
