//! Season labels. A season starts October 1; July through September still
//! belong to the season that began the previous October.

use chrono::{Datelike, Local, NaiveDate};

use crate::config::MAX_SEASON_LIST;

fn label(start_year: i32) -> String {
    format!("{start_year}-{:02}", (start_year + 1).rem_euclid(100))
}

/// `YYYY-YY` season containing `date`.
pub fn season_for_date(date: NaiveDate) -> String {
    let start_year = if date.month() >= 10 { date.year() } else { date.year() - 1 };
    label(start_year)
}

pub fn current_season() -> String {
    season_for_date(Local::now().date_naive())
}

/// `count` seasons ending at the one containing `today`, newest first.
/// `count` is clamped to 1..=MAX_SEASON_LIST.
pub fn seasons_from(today: NaiveDate, count: usize) -> Vec<String> {
    let count = count.clamp(1, MAX_SEASON_LIST);
    let newest = if today.month() >= 10 { today.year() } else { today.year() - 1 };
    (0..count as i32).map(|i| label(newest - i)).collect()
}

pub fn seasons(count: usize) -> Vec<String> {
    seasons_from(Local::now().date_naive(), count)
}

/// Stats feed season ids look like `22025` (type digit + start year).
/// Anything else is returned unchanged.
pub fn normalize_season_id(raw: &str) -> String {
    let raw = raw.trim();
    if raw.len() >= 5 && raw.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(start_year) = raw[1..5].parse::<i32>() {
            return label(start_year);
        }
    }
    raw.to_string()
}
