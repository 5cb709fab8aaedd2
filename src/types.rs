use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Stat keys
// ---------------------------------------------------------------------------

/// Closed set of statistics the analytics understand. Composite keys are
/// sums of simple keys.
///
/// Analytic functions only take validated keys. Free text from callers goes
/// through [`StatKey::normalize`], which substitutes `pts` for anything unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKey {
    #[default]
    Pts,
    Reb,
    Ast,
    Fg3m,
    Stl,
    Blk,
    Tov,
    MinPlayed,
    PtsReb,
    PtsAst,
    RebAst,
    PtsRebAst,
}

impl StatKey {
    pub const ALL: [StatKey; 12] = [
        StatKey::Pts,
        StatKey::Reb,
        StatKey::Ast,
        StatKey::Fg3m,
        StatKey::Stl,
        StatKey::Blk,
        StatKey::Tov,
        StatKey::MinPlayed,
        StatKey::PtsReb,
        StatKey::PtsAst,
        StatKey::RebAst,
        StatKey::PtsRebAst,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatKey::Pts => "pts",
            StatKey::Reb => "reb",
            StatKey::Ast => "ast",
            StatKey::Fg3m => "fg3m",
            StatKey::Stl => "stl",
            StatKey::Blk => "blk",
            StatKey::Tov => "tov",
            StatKey::MinPlayed => "min_played",
            StatKey::PtsReb => "pts_reb",
            StatKey::PtsAst => "pts_ast",
            StatKey::RebAst => "reb_ast",
            StatKey::PtsRebAst => "pts_reb_ast",
        }
    }

    /// Display name used on pick cards.
    pub fn label(self) -> &'static str {
        match self {
            StatKey::Pts => "points",
            StatKey::Reb => "rebounds",
            StatKey::Ast => "assists",
            StatKey::Fg3m => "3's",
            StatKey::Stl => "steals",
            StatKey::Blk => "blocks",
            StatKey::Tov => "turnovers",
            StatKey::MinPlayed => "minutes",
            StatKey::PtsReb => "Pts+Reb",
            StatKey::PtsAst => "Pts+Ast",
            StatKey::RebAst => "Reb+Ast",
            StatKey::PtsRebAst => "Pts+Reb+Ast",
        }
    }

    /// Simple keys summed by a composite key; a simple key returns itself.
    pub fn components(self) -> &'static [StatKey] {
        match self {
            StatKey::PtsReb => &[StatKey::Pts, StatKey::Reb],
            StatKey::PtsAst => &[StatKey::Pts, StatKey::Ast],
            StatKey::RebAst => &[StatKey::Reb, StatKey::Ast],
            StatKey::PtsRebAst => &[StatKey::Pts, StatKey::Reb, StatKey::Ast],
            StatKey::Pts => &[StatKey::Pts],
            StatKey::Reb => &[StatKey::Reb],
            StatKey::Ast => &[StatKey::Ast],
            StatKey::Fg3m => &[StatKey::Fg3m],
            StatKey::Stl => &[StatKey::Stl],
            StatKey::Blk => &[StatKey::Blk],
            StatKey::Tov => &[StatKey::Tov],
            StatKey::MinPlayed => &[StatKey::MinPlayed],
        }
    }

    /// Exact match against the closed set.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Trim and lowercase caller input; anything outside the set becomes `pts`.
    pub fn normalize(s: &str) -> Self {
        Self::parse(&s.trim().to_lowercase()).unwrap_or_default()
    }
}

impl std::fmt::Display for StatKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Suggestion grades
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Suggestion {
    Over,
    Under,
}

impl Suggestion {
    /// Stored text is matched case-insensitively; anything other than
    /// "under" reads as Over.
    pub fn parse_lenient(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("under") {
            Suggestion::Under
        } else {
            Suggestion::Over
        }
    }
}

impl std::fmt::Display for Suggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Suggestion::Over => write!(f, "Over"),
            Suggestion::Under => write!(f, "Under"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "High" => Some(Confidence::High),
            "Medium" => Some(Confidence::Medium),
            "Low" => Some(Confidence::Low),
            _ => None,
        }
    }

    /// Sort rank: High=3, Medium=2, Low=1. Unrecognized stored values rank 0.
    pub fn rank(c: Option<Self>) -> u8 {
        match c {
            Some(Confidence::High) => 3,
            Some(Confidence::Medium) => 2,
            Some(Confidence::Low) => 1,
            None => 0,
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarianceNote {
    Consistent,
    HighVariance,
    /// One outlier game is carrying the 5-game average.
    OneBigGame,
}

impl std::fmt::Display for VarianceNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VarianceNote::Consistent => "Consistent",
            VarianceNote::HighVariance => "High variance",
            VarianceNote::OneBigGame => "One big game in last 5 - tread carefully",
        };
        write!(f, "{s}")
    }
}

impl Serialize for VarianceNote {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Players and game logs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub full_name: String,
}

/// One player-game observation. Counting stats missing from the source are 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStatRecord {
    pub game_id: String,
    pub game_date: NaiveDate,
    pub season: String,
    pub matchup: Option<String>,
    pub home_away: Option<String>,
    pub team_abbr: Option<String>,
    pub opponent_abbr: Option<String>,
    pub wl: Option<String>,
    pub min_played: Option<i32>,
    pub pts: i32,
    pub reb: i32,
    pub ast: i32,
    pub stl: i32,
    pub blk: i32,
    pub tov: i32,
    pub fg3m: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonStats {
    pub season: String,
    pub games_played: usize,
    pub pts_avg: f64,
    pub reb_avg: f64,
    pub ast_avg: f64,
    pub stl_avg: f64,
    pub blk_avg: f64,
    pub tov_avg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverUnder {
    pub stat: StatKey,
    pub threshold: f64,
    pub total_games: usize,
    pub games_over: usize,
    pub games_under: usize,
    pub probability_over: f64,
    pub probability_under: f64,
    pub last_n: Option<i64>,
}

// ---------------------------------------------------------------------------
// Suggestions and daily picks
// ---------------------------------------------------------------------------

/// Graded Over/Under call for one (player, stat, line). Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionLine {
    pub prop_label: String,
    pub stat_key: StatKey,
    pub line: f64,
    pub suggestion: Suggestion,
    pub confidence: Confidence,
    pub last10_avg: f64,
    pub last5_avg: f64,
    pub trend: String,
    /// Games in the 10-game window at or above the line (0-10).
    pub hit_rate_last10: u32,
    /// Games in the 5 most recent at or above the line (0-5).
    pub over_last5: u32,
    pub variance_note: VarianceNote,
}

impl SuggestionLine {
    pub fn reason(&self) -> String {
        format!(
            "{}/5 last 5, {}/10 last 10. {}",
            self.over_last5, self.hit_rate_last10, self.variance_note
        )
    }
}

/// Marker for hit-rate / over-count fields on rows saved before those
/// columns existed. Always sorts last.
pub const LEGACY_MISSING: i32 = -1;

/// Data-access boundary normalization for nullable legacy count columns.
pub fn legacy_count(v: Option<i64>) -> i32 {
    v.and_then(|n| i32::try_from(n).ok()).unwrap_or(LEGACY_MISSING)
}

/// A stored suggestion bound to a date and player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPick {
    pub id: i64,
    pub player_id: i64,
    pub player_name: String,
    pub stat_key: StatKey,
    pub line: f64,
    pub line_date: NaiveDate,
    pub suggestion: Suggestion,
    /// None when the stored text is not a known grade.
    pub confidence: Option<Confidence>,
    pub reason: Option<String>,
    /// 0-10, or [`LEGACY_MISSING`].
    pub hit_rate_last10: i32,
    /// 0-5, or [`LEGACY_MISSING`].
    pub over_last5: i32,
}

/// A suggestion about to be stored for a date.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDailyLine {
    pub player_id: i64,
    pub stat_key: StatKey,
    pub line: f64,
    pub line_date: NaiveDate,
    pub suggestion: Suggestion,
    pub confidence: Confidence,
    pub reason: String,
    pub hit_rate_last10: u32,
    pub over_last5: u32,
}

impl NewDailyLine {
    pub fn from_suggestion(player_id: i64, line_date: NaiveDate, s: &SuggestionLine) -> Self {
        Self {
            player_id,
            stat_key: s.stat_key,
            line: s.line,
            line_date,
            suggestion: s.suggestion,
            confidence: s.confidence,
            reason: s.reason(),
            hit_rate_last10: s.hit_rate_last10,
            over_last5: s.over_last5,
        }
    }
}

/// A ranked pick with display metadata attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodayPick {
    pub id: i64,
    pub player_name: String,
    pub player_id: i64,
    pub stat_label: &'static str,
    pub stat_key: StatKey,
    pub line: f64,
    pub suggestion: Suggestion,
    pub confidence: Option<Confidence>,
    pub reason: Option<String>,
    pub team_abbr: Option<String>,
    pub hit_rate_last10: i32,
    pub over_last5: i32,
}

/// One entry of a daily-lines batch. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LineInput {
    pub player: Option<String>,
    pub stat: Option<String>,
    pub line: Option<f64>,
}

/// Lines for the combo props suggested together on a player page.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PropLines {
    pub pts_reb_ast: Option<f64>,
    pub pts_ast: Option<f64>,
    pub reb_ast: Option<f64>,
}

/// How many ranked picks to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickMode {
    /// Top three, then one 3PM pick and one Reb+Ast pick if available.
    #[default]
    TopWithDiversity,
    /// First `n`; `n <= 0` returns everything.
    Capped(i64),
    All,
}
