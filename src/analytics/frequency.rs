//! How often a stat landed at or above a threshold.

use crate::analytics::extractor;
use crate::types::{GameStatRecord, OverUnder, StatKey};

/// Counts games at or above `threshold` over the most recent `last_n` games
/// (the whole window when `last_n` is absent or not positive). `last_n` only
/// caps; a short window is used as-is.
pub fn frequency(
    games: &[GameStatRecord],
    key: StatKey,
    threshold: f64,
    last_n: Option<i64>,
) -> OverUnder {
    let window = match last_n {
        Some(n) if n > 0 => &games[..games.len().min(n as usize)],
        _ => games,
    };

    let total = window.len();
    let over = extractor::values(window, key)
        .into_iter()
        .filter(|&v| v >= threshold)
        .count();
    let under = total - over;
    let (probability_over, probability_under) = if total == 0 {
        (0.0, 0.0)
    } else {
        (over as f64 / total as f64, under as f64 / total as f64)
    };

    OverUnder {
        stat: key,
        threshold,
        total_games: total,
        games_over: over,
        games_under: under,
        probability_over,
        probability_under,
        last_n,
    }
}
