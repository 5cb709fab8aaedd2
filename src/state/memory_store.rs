use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;

use crate::config::SUGGESTION_WINDOW;
use crate::db::models::DailyLineRow;
use crate::error::Result;
use crate::store::{DailyLineStore, GameLogStore, PlayerDirectory};
use crate::types::{DailyPick, GameStatRecord, NewDailyLine, Player};

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process implementation of every store trait. Nothing is persisted.
pub struct MemoryStore {
    /// player_id → Player
    players: DashMap<i64, Player>,
    /// player_id → games in any order; sorted on read
    games: DashMap<i64, Vec<GameStatRecord>>,
    /// line id → stored row, same shape the database returns
    lines: DashMap<i64, DailyLineRow>,
    next_line_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Store a row as-is, including rows without hit-rate columns.
    #[cfg(test)]
    pub fn insert_line_row(&self, row: DailyLineRow) {
        self.next_line_id.fetch_max(row.id + 1, Ordering::Relaxed);
        self.lines.insert(row.id, row);
    }

    fn season_games(&self, player_id: i64, season: &str) -> Vec<GameStatRecord> {
        self.games
            .get(&player_id)
            .map(|g| g.iter().filter(|r| r.season == season).cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            players: DashMap::new(),
            games: DashMap::new(),
            lines: DashMap::new(),
            next_line_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl GameLogStore for MemoryStore {
    async fn games_descending(&self, player_id: i64, season: &str) -> Result<Vec<GameStatRecord>> {
        // later inserts win same-date ties, as with the SQLite row id
        let mut games: Vec<(usize, GameStatRecord)> =
            self.season_games(player_id, season).into_iter().enumerate().collect();
        games.sort_by_key(|(i, g)| Reverse((g.game_date, *i)));
        Ok(games.into_iter().map(|(_, g)| g).collect())
    }

    async fn eligible_player_ids(
        &self,
        player_ids: &[i64],
        season: &str,
        on_or_before: NaiveDate,
    ) -> Result<HashSet<i64>> {
        Ok(player_ids
            .iter()
            .copied()
            .filter(|&id| {
                self.season_games(id, season)
                    .iter()
                    .filter(|g| g.game_date <= on_or_before)
                    .count()
                    >= SUGGESTION_WINDOW
            })
            .collect())
    }

    async fn latest_team_abbreviation(
        &self,
        player_ids: &[i64],
        season: &str,
    ) -> Result<HashMap<i64, Option<String>>> {
        let mut teams = HashMap::new();
        for &id in player_ids {
            let latest = self
                .season_games(id, season)
                .into_iter()
                .max_by_key(|g| g.game_date);
            if let Some(g) = latest {
                teams.insert(id, g.team_abbr);
            }
        }
        Ok(teams)
    }

    async fn upsert_games(&self, player_id: i64, games: &[GameStatRecord]) -> Result<usize> {
        let mut stored = self.games.entry(player_id).or_default();
        for g in games {
            match stored.iter_mut().find(|s| s.game_id == g.game_id) {
                Some(existing) => *existing = g.clone(),
                None => stored.push(g.clone()),
            }
        }
        Ok(games.len())
    }
}

#[async_trait]
impl PlayerDirectory for MemoryStore {
    async fn search_by_name(&self, query: &str) -> Result<Vec<Player>> {
        let needle = query.to_lowercase();
        let mut hits: Vec<Player> = self
            .players
            .iter()
            .filter(|e| e.value().full_name.to_lowercase().contains(&needle))
            .map(|e| e.value().clone())
            .collect();
        hits.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(hits)
    }

    async fn player(&self, id: i64) -> Result<Option<Player>> {
        Ok(self.players.get(&id).map(|p| p.clone()))
    }

    async fn upsert_player(&self, player: &Player) -> Result<()> {
        self.players.insert(player.id, player.clone());
        Ok(())
    }
}

#[async_trait]
impl DailyLineStore for MemoryStore {
    async fn save_lines(&self, lines: &[NewDailyLine]) -> Result<usize> {
        for line in lines {
            let id = self.next_line_id.fetch_add(1, Ordering::Relaxed);
            let player_name = self
                .players
                .get(&line.player_id)
                .map(|p| p.full_name.clone())
                .unwrap_or_default();
            self.lines.insert(
                id,
                DailyLineRow {
                    id,
                    player_id: line.player_id,
                    player_name,
                    stat_key: line.stat_key.to_string(),
                    line_value: line.line,
                    line_date: line.line_date,
                    suggestion: line.suggestion.to_string(),
                    confidence: line.confidence.to_string(),
                    reason: Some(line.reason.clone()),
                    hit_rate_last_10: Some(i64::from(line.hit_rate_last10)),
                    over_last_5: Some(i64::from(line.over_last5)),
                },
            );
        }
        Ok(lines.len())
    }

    async fn picks_for_date(&self, date: NaiveDate) -> Result<Vec<DailyPick>> {
        let mut rows: Vec<DailyLineRow> = self
            .lines
            .iter()
            .filter(|e| e.value().line_date == date)
            .map(|e| e.value().clone())
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows.into_iter().map(DailyLineRow::into_pick).collect())
    }

    async fn latest_line_date(&self) -> Result<Option<NaiveDate>> {
        Ok(self.lines.iter().map(|e| e.value().line_date).max())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::extractor::fixtures::points_log;

    #[tokio::test]
    async fn games_sorted_most_recent_first() {
        let store = MemoryStore::new();
        let mut games = points_log(&[3, 2, 1]);
        games.reverse();
        store.upsert_games(9, &games).await.unwrap();
        let out = store.games_descending(9, "2024-25").await.unwrap();
        let pts: Vec<i32> = out.iter().map(|g| g.pts).collect();
        assert_eq!(pts, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn same_date_games_latest_insert_first() {
        let store = MemoryStore::new();
        let mut games = points_log(&[10, 20]);
        games[1].game_date = games[0].game_date;
        store.upsert_games(9, &games).await.unwrap();
        let out = store.games_descending(9, "2024-25").await.unwrap();
        let ids: Vec<&str> = out.iter().map(|g| g.game_id.as_str()).collect();
        assert_eq!(ids, vec!["g1", "g0"]);
    }

    #[tokio::test]
    async fn upsert_replaces_same_game() {
        let store = MemoryStore::new();
        let mut games = points_log(&[10, 11]);
        store.upsert_games(9, &games).await.unwrap();
        games[1].pts = 40;
        store.upsert_games(9, &games[1..]).await.unwrap();
        let out = store.games_descending(9, "2024-25").await.unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].pts, 40);
    }

    #[tokio::test]
    async fn line_ids_continue_after_raw_rows() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        store.insert_line_row(DailyLineRow {
            id: 41,
            player_id: 1,
            player_name: "A".to_string(),
            stat_key: "pts".to_string(),
            line_value: 10.5,
            line_date: date,
            suggestion: "Over".to_string(),
            confidence: "Low".to_string(),
            reason: None,
            hit_rate_last_10: None,
            over_last_5: None,
        });
        assert_eq!(store.next_line_id.load(Ordering::Relaxed), 42);
        assert_eq!(store.latest_line_date().await.unwrap(), Some(date));
    }
}
