/// リリース日の推定ロジック。
///
/// チェンジログ自体には日付がないため、既知の公開日（バージョン→日時の
/// マップ）があればそれを優先し、欠けている部分はインデックス位置で
/// 補間・外挿する。既知の日付がまったくない場合は平均リリース間隔に
/// ジッターを加えて順に遡る。
use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::parser::Section;

/// バージョン文字列（先頭の `v` なし）→ 公式公開日時のマップ。
pub type KnownDates = HashMap<String, DateTime<Utc>>;

const MILLIS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// 日数（小数可）を `chrono::Duration` に変換する。
#[allow(clippy::cast_possible_truncation)]
fn days(value: f64) -> Duration {
    Duration::milliseconds((value * MILLIS_PER_DAY) as i64)
}

/// セクション列へ日付を割り当てる推定器。
#[derive(Debug, Clone, Copy)]
pub struct DateEstimator {
    cadence_days: f64,
    offset_days: f64,
}

impl DateEstimator {
    /// 平均リリース間隔（日）と、最新リリースを現在から何日前に置くかを指定して作る。
    #[must_use]
    pub fn new(cadence_days: f64, offset_days: f64) -> Self {
        Self {
            cadence_days,
            offset_days,
        }
    }

    /// 既知の日付なしで全セクションの日付を推定する。
    ///
    /// 先頭（最新）を `now - offset_days` に置き、以降は1区間ごとに
    /// `cadence_days ± 0.5日未満` のジッター付き間隔で独立に遡る。
    /// 結果はインデックスに対して厳密に単調減少する。
    pub fn estimate_all<R: Rng>(
        &self,
        rng: &mut R,
        now: DateTime<Utc>,
        count: usize,
    ) -> Vec<DateTime<Utc>> {
        let mut dates = Vec::with_capacity(count);
        let mut current = now - days(self.offset_days);

        for index in 0..count {
            if index > 0 {
                let jitter = rng.random_range(-0.5..0.5);
                current -= days(self.cadence_days + jitter);
            }
            dates.push(current);
        }

        dates
    }

    /// 既知の日付を優先しつつ全セクションの日付を割り当てる。
    ///
    /// バージョンがマップにあればその日時をそのまま使い、なければ
    /// [`Self::estimate_between_known`] で位置補間する。
    #[must_use]
    pub fn assign_with_known(
        &self,
        now: DateTime<Utc>,
        sections: &[Section],
        known: &KnownDates,
    ) -> Vec<DateTime<Utc>> {
        sections
            .iter()
            .enumerate()
            .map(|(index, section)| {
                known.get(&section.version).copied().unwrap_or_else(|| {
                    self.estimate_between_known(now, index, sections, known)
                })
            })
            .collect()
    }

    /// 前後の既知日付からインデックス位置で補間・外挿する。
    ///
    /// 両隣あり: 位置比率による線形補間。前側のみ: 前側からインデックス差
    /// ×間隔だけ過去へ。後側のみ: 後側へインデックス差×間隔を加算する
    /// （ドキュメント順の「後」は古いリリースを指すため、この向きを保つ）。
    /// どちらもなし: `now - (index * cadence + offset)` 日、ジッターなし。
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn estimate_between_known(
        &self,
        now: DateTime<Utc>,
        index: usize,
        sections: &[Section],
        known: &KnownDates,
    ) -> DateTime<Utc> {
        let mut before: Option<(usize, DateTime<Utc>)> = None;
        let mut after: Option<(usize, DateTime<Utc>)> = None;

        for i in (0..index).rev() {
            if let Some(date) = known.get(&sections[i].version) {
                before = Some((i, *date));
                break;
            }
        }

        for (offset, section) in sections.iter().enumerate().skip(index + 1) {
            if let Some(date) = known.get(&section.version) {
                after = Some((offset, *date));
                break;
            }
        }

        match (before, after) {
            (Some((before_index, before_date)), Some((after_index, after_date))) => {
                let total_gap = (after_date - before_date).num_milliseconds();
                let position =
                    (index - before_index) as f64 / (after_index - before_index) as f64;
                before_date + Duration::milliseconds((total_gap as f64 * position) as i64)
            }
            (Some((before_index, before_date)), None) => {
                before_date - days((index - before_index) as f64 * self.cadence_days)
            }
            (None, Some((after_index, after_date))) => {
                after_date + days((after_index - index) as f64 * self.cadence_days)
            }
            (None, None) => now - days(index as f64 * self.cadence_days + self.offset_days),
        }
    }
}
