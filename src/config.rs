use crate::error::{AppError, Result};
use crate::season::current_season;

pub const DB_PATH: &str = "props.db";

/// Minimum games a player needs before a suggestion is produced, and the
/// size of the medium-term window the engine reads.
pub const SUGGESTION_WINDOW: usize = 10;

/// Most recent games used for short-term form.
pub const RECENT_WINDOW: usize = 5;

/// Picks shown before the diversity slots are appended.
pub const TOP_PICKS_LIMIT: usize = 3;

/// Maximum number of seasons returned by a season listing.
pub const MAX_SEASON_LIST: usize = 20;

/// Decision ladder thresholds for the prop suggestion engine.
pub mod suggestion_thresholds {
    /// Weight of the 5-game average in the projection. The 10-game average gets the rest.
    pub const RECENT_WEIGHT: f64 = 0.6;
    /// Projection must clear the line by this much for a strong call.
    pub const STRONG_EDGE: f64 = 1.5;
    /// Window std dev above this fraction of the 10-game average is high variance.
    pub const HIGH_VARIANCE_RATIO: f64 = 0.3;
    /// A recent game more than this many std devs above the 5-game average is an outlier.
    pub const OUTLIER_SIGMA: f64 = 2.0;
    /// Minimum recent games needed before the outlier check applies.
    pub const OUTLIER_MIN_GAMES: usize = 3;
    /// Recent overs needed for a strong Over (and the max for a strong Under is one less).
    pub const STRONG_RECENT_OVERS: usize = 3;
    /// Hit-rate midpoint over the 10-game window.
    pub const HIT_RATE_MIDPOINT: usize = 5;
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    /// Season used when a command does not name one (DEFAULT_SEASON).
    pub default_season: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let default_season = match std::env::var("DEFAULT_SEASON") {
            Ok(s) if is_season_label(&s) => s,
            Ok(s) => {
                return Err(AppError::Config(format!(
                    "DEFAULT_SEASON must look like 2024-25, got {s:?}"
                )))
            }
            Err(_) => current_season(),
        };

        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| DB_PATH.to_string()),
            default_season,
        })
    }
}

fn is_season_label(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 7
        && bytes[4] == b'-'
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[5..].iter().all(u8::is_ascii_digit)
}
