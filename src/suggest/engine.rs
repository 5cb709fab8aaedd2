//! Recent-form projection and the Over/Under decision ladder.

use crate::analytics::{mean, stddev, values};
use crate::config::suggestion_thresholds::*;
use crate::config::{RECENT_WINDOW, SUGGESTION_WINDOW};
use crate::types::{Confidence, GameStatRecord, StatKey, Suggestion, SuggestionLine, VarianceNote};

/// Inputs to the decision ladder, derived from a 10-game window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signals {
    pub line: f64,
    pub projected: f64,
    /// Games in the full window at or above the line.
    pub hit10: usize,
    /// Most recent games at or above the line.
    pub over5: usize,
    pub high_variance: bool,
    pub one_big_game: bool,
}

impl Signals {
    /// `values` are most-recent-first and hold at least `RECENT_WINDOW` entries.
    pub fn from_values(values: &[f64], line: f64) -> (Self, f64, f64) {
        let recent = &values[..values.len().min(RECENT_WINDOW)];

        let avg10 = mean(values);
        let avg5 = mean(recent);
        let hit10 = values.iter().filter(|&&v| v >= line).count();
        let over5 = recent.iter().filter(|&&v| v >= line).count();

        let high_variance = values.len() > 1 && stddev(values) > HIGH_VARIANCE_RATIO * avg10;
        let max5 = recent.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let one_big_game =
            recent.len() >= OUTLIER_MIN_GAMES && max5 > avg5 + OUTLIER_SIGMA * stddev(recent);

        let projected = RECENT_WEIGHT * avg5 + (1.0 - RECENT_WEIGHT) * avg10;

        let signals = Self { line, projected, hit10, over5, high_variance, one_big_game };
        (signals, avg10, avg5)
    }

    fn variance_note(&self) -> VarianceNote {
        if self.one_big_game {
            VarianceNote::OneBigGame
        } else if self.high_variance {
            VarianceNote::HighVariance
        } else {
            VarianceNote::Consistent
        }
    }
}

/// Medium when the window is volatile, else High.
fn variance_grade(s: &Signals) -> Confidence {
    if s.high_variance {
        Confidence::Medium
    } else {
        Confidence::High
    }
}

/// Like `variance_grade`, but Low when one game is carrying the recent average.
fn outlier_grade(s: &Signals) -> Confidence {
    if s.one_big_game {
        Confidence::Low
    } else {
        variance_grade(s)
    }
}

struct Rule {
    applies: fn(&Signals) -> bool,
    call: fn(&Signals) -> (Suggestion, Confidence),
}

/// Evaluated top to bottom; the first rule that applies decides.
const LADDER: [Rule; 5] = [
    // strong over: clear edge, recent overs, no outlier inflating it
    Rule {
        applies: |s| {
            s.projected >= s.line + STRONG_EDGE && s.over5 >= STRONG_RECENT_OVERS && !s.one_big_game
        },
        call: |s| (Suggestion::Over, variance_grade(s)),
    },
    Rule {
        applies: |s| s.projected >= s.line && s.hit10 >= HIT_RATE_MIDPOINT,
        call: |s| (Suggestion::Over, outlier_grade(s)),
    },
    // strong under
    Rule {
        applies: |s| s.projected <= s.line - STRONG_EDGE && s.over5 < STRONG_RECENT_OVERS,
        call: |s| (Suggestion::Under, variance_grade(s)),
    },
    Rule {
        applies: |s| s.projected <= s.line && s.hit10 <= HIT_RATE_MIDPOINT,
        call: |s| (Suggestion::Under, outlier_grade(s)),
    },
    // signals disagree: lean with the projection
    Rule {
        applies: |_| true,
        call: |s| {
            let side = if s.projected >= s.line { Suggestion::Over } else { Suggestion::Under };
            (side, Confidence::Low)
        },
    },
];

pub fn decide(signals: &Signals) -> (Suggestion, Confidence) {
    LADDER
        .iter()
        .find(|rule| (rule.applies)(signals))
        .map(|rule| (rule.call)(signals))
        .unwrap_or((Suggestion::Under, Confidence::Low))
}

/// Half-up rounding to one decimal place.
fn round1(x: f64) -> f64 {
    (x * 10.0 + 0.5).floor() / 10.0
}

/// Graded suggestion from a most-recent-first game log for a validated key.
///
/// Only the first 10 games are read. Returns `None` when fewer than 10 are
/// supplied: small samples get no suggestion at all.
pub fn suggest(
    games: &[GameStatRecord],
    key: StatKey,
    prop_label: &str,
    line: f64,
) -> Option<SuggestionLine> {
    if games.len() < SUGGESTION_WINDOW {
        return None;
    }
    let window = values(&games[..SUGGESTION_WINDOW], key);
    let (signals, avg10, avg5) = Signals::from_values(&window, line);
    let (suggestion, confidence) = decide(&signals);

    Some(SuggestionLine {
        prop_label: prop_label.to_string(),
        stat_key: key,
        line,
        suggestion,
        confidence,
        last10_avg: round1(avg10),
        last5_avg: round1(avg5),
        trend: String::new(),
        hit_rate_last10: signals.hit10 as u32,
        over_last5: signals.over5 as u32,
        variance_note: signals.variance_note(),
    })
}
