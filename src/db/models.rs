//! Row types matching `migrations/0001_init.sql`, and their conversion into
//! domain types. Legacy nullable counts are normalized here and nowhere else.

use chrono::NaiveDate;

use crate::types::{legacy_count, Confidence, DailyPick, GameStatRecord, Player, StatKey, Suggestion};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlayerRow {
    pub id: i64,
    pub full_name: String,
}

impl From<PlayerRow> for Player {
    fn from(r: PlayerRow) -> Self {
        Player { id: r.id, full_name: r.full_name }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GameLogRow {
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

impl From<GameLogRow> for GameStatRecord {
    fn from(r: GameLogRow) -> Self {
        GameStatRecord {
            game_id: r.game_id,
            game_date: r.game_date,
            season: r.season,
            matchup: r.matchup,
            home_away: r.home_away,
            team_abbr: r.team_abbr,
            opponent_abbr: r.opponent_abbr,
            wl: r.wl,
            min_played: r.min_played,
            pts: r.pts,
            reb: r.reb,
            ast: r.ast,
            stl: r.stl,
            blk: r.blk,
            tov: r.tov,
            fg3m: r.fg3m,
        }
    }
}

/// `daily_prop_lines` joined with the player's name.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DailyLineRow {
    pub id: i64,
    pub player_id: i64,
    pub player_name: String,
    pub stat_key: String,
    pub line_value: f64,
    pub line_date: NaiveDate,
    pub suggestion: String,
    pub confidence: String,
    pub reason: Option<String>,
    /// NULL on rows saved before the column existed.
    pub hit_rate_last_10: Option<i64>,
    /// NULL on rows saved before the column existed.
    pub over_last_5: Option<i64>,
}

impl DailyLineRow {
    pub fn into_pick(self) -> DailyPick {
        DailyPick {
            id: self.id,
            player_id: self.player_id,
            player_name: self.player_name,
            stat_key: StatKey::normalize(&self.stat_key),
            line: self.line_value,
            line_date: self.line_date,
            suggestion: Suggestion::parse_lenient(&self.suggestion),
            confidence: Confidence::parse(&self.confidence),
            reason: self.reason,
            hit_rate_last10: legacy_count(self.hit_rate_last_10),
            over_last5: legacy_count(self.over_last_5),
        }
    }
}
