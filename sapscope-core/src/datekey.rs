//! DateToken extraction from file keys
//!
//! Screenshot file names embed a capture date as a digit run between an
//! underscore and a hyphen, e.g. `Screenshot_20230815-104233.png`. The same
//! token serves two purposes:
//!
//! - a numeric sort key for the minimum-date gate ([`sort_key`]), where a
//!   missing or unusable token falls back to a *maximal* value so the file
//!   is never excluded by the gate;
//! - a calendar date for day-of-week and date-series bucketing
//!   ([`calendar_date`]), where the fallback is a fixed epoch that sorts
//!   consistently instead of erroring.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Sort key used when no token can be extracted. Larger than any
/// `YYYYMMDD` value, so unmatched files always pass the date gate.
pub const FALLBACK_SORT_KEY: i64 = 99_999_999;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_(\d+)-").expect("valid regex"));

/// Fallback calendar date for file keys without a parseable token.
pub fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1990, 1, 1).expect("valid epoch date")
}

fn token(file_key: &str) -> Option<&str> {
    TOKEN_RE
        .captures(file_key)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Numeric filter key for the minimum-date gate.
///
/// Non-positive and unparseable tokens get [`FALLBACK_SORT_KEY`].
pub fn sort_key(file_key: &str) -> i64 {
    token(file_key)
        .and_then(|t| t.parse::<i64>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(FALLBACK_SORT_KEY)
}

/// Calendar date parsed from the first eight token digits (`YYYYMMDD`).
///
/// Falls back to [`epoch`] when the token is absent, too short, or not a
/// real calendar date.
pub fn calendar_date(file_key: &str) -> NaiveDate {
    let parsed = token(file_key).and_then(|t| {
        if t.len() < 8 {
            return None;
        }
        let year: i32 = t[0..4].parse().ok()?;
        let month: u32 = t[4..6].parse().ok()?;
        let day: u32 = t[6..8].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    });
    parsed.unwrap_or_else(epoch)
}
