//! Data collaborators the analytics read from and the ingest path writes to.
//! Implemented by `db::SqliteStore` and `state::MemoryStore`.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::types::{DailyPick, GameStatRecord, NewDailyLine, Player};

#[async_trait]
pub trait GameLogStore: Send + Sync {
    /// A player's games for a season, most recent first.
    async fn games_descending(&self, player_id: i64, season: &str) -> Result<Vec<GameStatRecord>>;

    /// Subset of `player_ids` with at least `SUGGESTION_WINDOW` games in
    /// `season` dated on or before `on_or_before`.
    async fn eligible_player_ids(
        &self,
        player_ids: &[i64],
        season: &str,
        on_or_before: NaiveDate,
    ) -> Result<HashSet<i64>>;

    /// Team of each player's most recent game in `season`. Players with no
    /// games are absent; a game without a team maps to None.
    async fn latest_team_abbreviation(
        &self,
        player_ids: &[i64],
        season: &str,
    ) -> Result<HashMap<i64, Option<String>>>;

    /// Insert or replace games keyed by (player, game id). Returns rows written.
    async fn upsert_games(&self, player_id: i64, games: &[GameStatRecord]) -> Result<usize>;
}

#[async_trait]
pub trait PlayerDirectory: Send + Sync {
    /// Case-insensitive substring match on full name, ordered by name.
    async fn search_by_name(&self, query: &str) -> Result<Vec<Player>>;

    async fn player(&self, id: i64) -> Result<Option<Player>>;

    async fn upsert_player(&self, player: &Player) -> Result<()>;
}

#[async_trait]
pub trait DailyLineStore: Send + Sync {
    /// Write a batch of lines as one unit: on error nothing from the batch is
    /// stored. Returns rows written.
    async fn save_lines(&self, lines: &[NewDailyLine]) -> Result<usize>;

    /// Stored picks for a date with legacy counts normalized to the sentinel.
    async fn picks_for_date(&self, date: NaiveDate) -> Result<Vec<DailyPick>>;

    /// Most recent date with any stored line.
    async fn latest_line_date(&self) -> Result<Option<NaiveDate>>;
}
