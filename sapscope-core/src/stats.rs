//! Aggregation engine
//!
//! Every reported statistic is a pure function of the current result set,
//! recomputed on demand rather than incrementally maintained, so the
//! numbers are always consistent with whatever subset of files has been
//! processed so far.
//!
//! Only valid results contribute. Entries cached under the legacy protocol
//! carry no turn count; they still count toward win totals, the bandage
//! partition, and the day-of-week histogram, but are left out of the
//! turn-count histogram and the per-date turn average.

use crate::datekey;
use crate::types::ScreenshotResult;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// One row of the turn-count histogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnBucket {
    pub turn_count: u8,
    pub wins: usize,
}

/// One row of the date series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateBucket {
    pub date: NaiveDate,
    pub win_count: usize,
    /// Mean turn count over this date's turn-bearing results, 0.0 when the
    /// bucket holds only legacy entries
    pub avg_turn_count: f64,
}

/// All derived statistics over a result set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WinStats {
    pub total_wins: usize,
    pub wins_with_bandage: usize,
    pub wins_without_bandage: usize,
    /// Wins per weekday, Monday-first ordinals 0..=6
    pub day_of_week: [usize; 7],
    /// Ascending by turn count
    pub turn_histogram: Vec<TurnBucket>,
    /// Ascending by date
    pub date_series: Vec<DateBucket>,
}

impl WinStats {
    /// Recompute everything from a snapshot of the result set.
    pub fn from_results(results: &[ScreenshotResult]) -> Self {
        let mut stats = WinStats::default();
        let mut turns: BTreeMap<u8, usize> = BTreeMap::new();
        let mut dates: BTreeMap<NaiveDate, DateAccumulator> = BTreeMap::new();

        for result in results.iter().filter(|r| r.valid) {
            stats.total_wins += 1;
            if result.has_bandage {
                stats.wins_with_bandage += 1;
            } else {
                stats.wins_without_bandage += 1;
            }

            let date = datekey::calendar_date(&result.file_key);
            // Native weekday is Sunday-first; shift so Monday is 0.
            let native = date.weekday().num_days_from_sunday();
            stats.day_of_week[((native + 6) % 7) as usize] += 1;

            let acc = dates.entry(date).or_default();
            acc.win_count += 1;
            if let Some(turn) = result.turn_count {
                *turns.entry(turn).or_default() += 1;
                acc.turn_sum += turn as u64;
                acc.turn_samples += 1;
            }
        }

        stats.turn_histogram = turns
            .into_iter()
            .map(|(turn_count, wins)| TurnBucket { turn_count, wins })
            .collect();
        stats.date_series = dates
            .into_iter()
            .map(|(date, acc)| DateBucket {
                date,
                win_count: acc.win_count,
                avg_turn_count: acc.average(),
            })
            .collect();

        stats
    }
}

#[derive(Default)]
struct DateAccumulator {
    win_count: usize,
    turn_sum: u64,
    turn_samples: usize,
}

impl DateAccumulator {
    fn average(&self) -> f64 {
        if self.turn_samples == 0 {
            0.0
        } else {
            self.turn_sum as f64 / self.turn_samples as f64
        }
    }
}

/// Display name for a Monday-first weekday ordinal.
pub fn weekday_name(ordinal: usize) -> &'static str {
    match ordinal {
        0 => "Monday",
        1 => "Tuesday",
        2 => "Wednesday",
        3 => "Thursday",
        4 => "Friday",
        5 => "Saturday",
        6 => "Sunday",
        _ => "Unknown",
    }
}
