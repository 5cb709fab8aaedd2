use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::Result;
use crate::ranker;
use crate::season::season_for_date;
use crate::service::PlayerService;
use crate::store::{DailyLineStore, GameLogStore, PlayerDirectory};
use crate::types::{LineInput, NewDailyLine, PickMode, TodayPick};

/// Why a batch entry was not stored. Logged only; the batch reports a count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    MissingField,
    UnknownPlayer,
    NotEnoughGames,
}

/// Stores a day's curated lines and serves the ranked feed.
pub struct DailyLineService<S> {
    store: Arc<S>,
    players: PlayerService<S>,
}

impl<S: GameLogStore + PlayerDirectory + DailyLineStore> DailyLineService<S> {
    pub fn new(store: Arc<S>) -> Self {
        let players = PlayerService::new(Arc::clone(&store));
        Self { store, players }
    }

    /// Evaluates each line for `date` and stores the accepted ones in a single
    /// write, returning how many were saved. Entries with a missing field, an
    /// unmatched player or fewer than 10 games are skipped; the rest of the
    /// batch carries on. Store failures abort and propagate with nothing from
    /// the batch stored. `season` defaults to the season of `date`.
    pub async fn add_daily_lines(
        &self,
        date: NaiveDate,
        season: Option<&str>,
        lines: &[LineInput],
    ) -> Result<usize> {
        let season = season.map_or_else(|| season_for_date(date), str::to_string);
        let mut rows = Vec::with_capacity(lines.len());
        let mut skipped = 0;

        for (i, input) in lines.iter().enumerate() {
            match self.evaluate(date, &season, input).await? {
                Ok(row) => {
                    debug!(entry = i, stat = %row.stat_key, line = row.line, "daily line accepted");
                    rows.push(row);
                }
                Err(reason) => {
                    debug!(entry = i, ?reason, player = ?input.player, "daily line skipped");
                    skipped += 1;
                }
            }
        }

        let saved = if rows.is_empty() { 0 } else { self.store.save_lines(&rows).await? };
        info!(%date, %season, saved, skipped, "daily lines ingested");
        Ok(saved)
    }

    async fn evaluate(
        &self,
        date: NaiveDate,
        season: &str,
        input: &LineInput,
    ) -> Result<std::result::Result<NewDailyLine, Skip>> {
        let (Some(name), Some(stat), Some(line)) = (&input.player, &input.stat, input.line) else {
            return Ok(Err(Skip::MissingField));
        };
        let Some(player) = self.players.resolve(name).await? else {
            return Ok(Err(Skip::UnknownPlayer));
        };
        let Some(suggestion) = self.players.single_suggestion(player.id, season, stat, line).await?
        else {
            return Ok(Err(Skip::NotEnoughGames));
        };

        Ok(Ok(NewDailyLine::from_suggestion(player.id, date, &suggestion)))
    }

    pub async fn latest_line_date(&self) -> Result<Option<NaiveDate>> {
        self.store.latest_line_date().await
    }

    /// Ranked picks for `date`, restricted to players with at least 10 games
    /// this season on or before that date.
    pub async fn picks_for_date(&self, date: NaiveDate, mode: PickMode) -> Result<Vec<TodayPick>> {
        let picks = self.store.picks_for_date(date).await?;
        if picks.is_empty() {
            return Ok(Vec::new());
        }

        let player_ids: Vec<i64> = picks
            .iter()
            .map(|p| p.player_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let season = season_for_date(date);
        let eligible = self.store.eligible_player_ids(&player_ids, &season, date).await?;
        let teams = self.store.latest_team_abbreviation(&player_ids, &season).await?;

        let stored = picks.len();
        let ranked = ranker::rank(picks, &eligible, &teams, mode);
        info!(%date, stored, eligible = eligible.len(), returned = ranked.len(), "picks ranked");
        Ok(ranked)
    }

    /// Picks for `date`, or for the most recent date with lines when none is
    /// given. No stored lines at all is an empty feed.
    pub async fn today_picks(&self, date: Option<NaiveDate>, mode: PickMode) -> Result<Vec<TodayPick>> {
        let date = match date {
            Some(d) => d,
            None => match self.latest_line_date().await? {
                Some(d) => d,
                None => return Ok(Vec::new()),
            },
        };
        self.picks_for_date(date, mode).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::extractor::fixtures::points_log;
    use crate::db::models::DailyLineRow;
    use crate::state::MemoryStore;
    use crate::error::AppError;
    use crate::types::{Confidence, DailyPick, GameStatRecord, Player, StatKey, Suggestion, LEGACY_MISSING};
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn input(player: &str, stat: &str, line: f64) -> LineInput {
        LineInput {
            player: Some(player.to_string()),
            stat: Some(stat.to_string()),
            line: Some(line),
        }
    }

    /// Player 1 has 12 games, player 2 has 6. Games end 2025-03-01.
    async fn seeded() -> (Arc<MemoryStore>, DailyLineService<MemoryStore>) {
        let store = MemoryStore::new();
        store
            .upsert_player(&Player { id: 1, full_name: "Nikola Jokic".to_string() })
            .await
            .unwrap();
        store
            .upsert_player(&Player { id: 2, full_name: "Cooper Flagg".to_string() })
            .await
            .unwrap();
        let mut games = points_log(&[30, 28, 32, 25, 40, 22, 26, 29, 31, 27, 20, 20]);
        for g in &mut games {
            g.team_abbr = Some("DEN".to_string());
            g.reb = 12;
            g.ast = 9;
        }
        store.upsert_games(1, &games).await.unwrap();
        store.upsert_games(2, &points_log(&[18; 6])).await.unwrap();
        let svc = DailyLineService::new(Arc::clone(&store));
        (store, svc)
    }

    #[tokio::test]
    async fn batch_skips_bad_entries_and_counts_saved() {
        let (store, svc) = seeded().await;
        let date = d(2025, 3, 2);
        let lines = vec![
            input("jokic", "pts", 27.5),
            LineInput { player: Some("jokic".to_string()), stat: None, line: Some(10.5) },
            input("nobody at all", "pts", 10.5),
            input("flagg", "pts", 15.5),
            input("Jokic", " REB_AST ", 20.5),
            input("jokic", "bogus", 27.5),
        ];

        let saved = svc.add_daily_lines(date, Some("2024-25"), &lines).await.unwrap();
        assert_eq!(saved, 3);

        let picks = store.picks_for_date(date).await.unwrap();
        assert_eq!(picks.len(), 3);
        assert_eq!(picks[0].stat_key, StatKey::Pts);
        assert_eq!(picks[0].suggestion, Suggestion::Over);
        assert_eq!(picks[0].confidence, Some(Confidence::High));
        assert_eq!(picks[0].reason.as_deref(), Some("4/5 last 5, 6/10 last 10. Consistent"));
        assert_eq!(picks[1].stat_key, StatKey::RebAst);
        assert_eq!(picks[2].stat_key, StatKey::Pts);
    }

    #[tokio::test]
    async fn batch_season_defaults_to_line_date() {
        let (_store, svc) = seeded().await;
        // 2025-11-01 is in 2025-26, where nobody has games
        let saved = svc
            .add_daily_lines(d(2025, 11, 1), None, &[input("jokic", "pts", 27.5)])
            .await
            .unwrap();
        assert_eq!(saved, 0);

        let saved = svc
            .add_daily_lines(d(2025, 3, 2), None, &[input("jokic", "pts", 27.5)])
            .await
            .unwrap();
        assert_eq!(saved, 1);
    }

    #[tokio::test]
    async fn feed_excludes_low_sample_players() {
        let (store, svc) = seeded().await;
        let date = d(2025, 3, 2);
        svc.add_daily_lines(date, None, &[input("jokic", "pts", 27.5)]).await.unwrap();
        // a pick for the 6-game player stored directly, as if by an older ingest
        store.insert_line_row(DailyLineRow {
            id: 100,
            player_id: 2,
            player_name: "Cooper Flagg".to_string(),
            stat_key: "pts".to_string(),
            line_value: 15.5,
            line_date: date,
            suggestion: "Over".to_string(),
            confidence: "High".to_string(),
            reason: None,
            hit_rate_last_10: Some(10),
            over_last_5: Some(5),
        });

        let picks = svc.picks_for_date(date, PickMode::All).await.unwrap();
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].player_id, 1);
        assert_eq!(picks[0].team_abbr.as_deref(), Some("DEN"));
        assert_eq!(picks[0].stat_label, "points");
    }

    #[tokio::test]
    async fn eligibility_only_counts_games_up_to_the_pick_date() {
        let (_store, svc) = seeded().await;
        let date = d(2025, 3, 2);
        svc.add_daily_lines(date, None, &[input("jokic", "pts", 27.5)]).await.unwrap();

        // 12 games end 2025-03-01; only 8 are on or before 2025-02-25
        let earlier = d(2025, 2, 25);
        svc.add_daily_lines(earlier, Some("2024-25"), &[input("jokic", "pts", 27.5)])
            .await
            .unwrap();
        assert!(svc.picks_for_date(earlier, PickMode::All).await.unwrap().is_empty());
        assert_eq!(svc.picks_for_date(date, PickMode::All).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn legacy_rows_rank_last_with_sentinels() {
        let (store, svc) = seeded().await;
        let date = d(2025, 3, 2);
        store.insert_line_row(DailyLineRow {
            id: 1,
            player_id: 1,
            player_name: "Nikola Jokic".to_string(),
            stat_key: "ast".to_string(),
            line_value: 8.5,
            line_date: date,
            suggestion: "Over".to_string(),
            confidence: "High".to_string(),
            reason: None,
            hit_rate_last_10: None,
            over_last_5: None,
        });
        svc.add_daily_lines(date, None, &[input("jokic", "pts", 27.5)]).await.unwrap();

        let picks = svc.picks_for_date(date, PickMode::All).await.unwrap();
        assert_eq!(picks.len(), 2);
        assert_eq!(picks[0].stat_key, StatKey::Pts);
        assert_eq!(picks[1].hit_rate_last10, LEGACY_MISSING);
        assert_eq!(picks[1].over_last5, LEGACY_MISSING);
    }

    #[tokio::test]
    async fn feed_defaults_to_latest_date() {
        let (_store, svc) = seeded().await;
        assert!(svc.today_picks(None, PickMode::TopWithDiversity).await.unwrap().is_empty());

        svc.add_daily_lines(d(2025, 3, 2), None, &[input("jokic", "pts", 27.5)]).await.unwrap();
        svc.add_daily_lines(d(2025, 3, 3), None, &[input("jokic", "reb", 11.5)]).await.unwrap();

        let picks = svc.today_picks(None, PickMode::TopWithDiversity).await.unwrap();
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].stat_key, StatKey::Reb);
        assert_eq!(svc.latest_line_date().await.unwrap(), Some(d(2025, 3, 3)));
    }

    /// Reads through to a MemoryStore; the first batch write fails.
    struct FailFirstWrite {
        inner: Arc<MemoryStore>,
        failed: AtomicBool,
    }

    #[async_trait]
    impl GameLogStore for FailFirstWrite {
        async fn games_descending(&self, player_id: i64, season: &str) -> Result<Vec<GameStatRecord>> {
            self.inner.games_descending(player_id, season).await
        }

        async fn eligible_player_ids(
            &self,
            player_ids: &[i64],
            season: &str,
            on_or_before: NaiveDate,
        ) -> Result<HashSet<i64>> {
            self.inner.eligible_player_ids(player_ids, season, on_or_before).await
        }

        async fn latest_team_abbreviation(
            &self,
            player_ids: &[i64],
            season: &str,
        ) -> Result<HashMap<i64, Option<String>>> {
            self.inner.latest_team_abbreviation(player_ids, season).await
        }

        async fn upsert_games(&self, player_id: i64, games: &[GameStatRecord]) -> Result<usize> {
            self.inner.upsert_games(player_id, games).await
        }
    }

    #[async_trait]
    impl PlayerDirectory for FailFirstWrite {
        async fn search_by_name(&self, query: &str) -> Result<Vec<Player>> {
            self.inner.search_by_name(query).await
        }

        async fn player(&self, id: i64) -> Result<Option<Player>> {
            self.inner.player(id).await
        }

        async fn upsert_player(&self, player: &Player) -> Result<()> {
            self.inner.upsert_player(player).await
        }
    }

    #[async_trait]
    impl DailyLineStore for FailFirstWrite {
        async fn save_lines(&self, lines: &[NewDailyLine]) -> Result<usize> {
            if !self.failed.swap(true, Ordering::SeqCst) {
                return Err(AppError::Io(std::io::Error::other("disk full")));
            }
            self.inner.save_lines(lines).await
        }

        async fn picks_for_date(&self, date: NaiveDate) -> Result<Vec<DailyPick>> {
            self.inner.picks_for_date(date).await
        }

        async fn latest_line_date(&self) -> Result<Option<NaiveDate>> {
            self.inner.latest_line_date().await
        }
    }

    #[tokio::test]
    async fn failed_write_leaves_no_partial_batch() {
        let (inner, _) = seeded().await;
        let store = Arc::new(FailFirstWrite { inner: Arc::clone(&inner), failed: AtomicBool::new(false) });
        let svc = DailyLineService::new(store);
        let date = d(2025, 3, 2);
        let batch = [input("jokic", "pts", 27.5), input("jokic", "reb", 11.5), input("jokic", "ast", 8.5)];

        assert!(svc.add_daily_lines(date, None, &batch).await.is_err());
        assert!(inner.picks_for_date(date).await.unwrap().is_empty());

        assert_eq!(svc.add_daily_lines(date, None, &batch).await.unwrap(), 3);
        let picks = inner.picks_for_date(date).await.unwrap();
        assert_eq!(picks.len(), 3);
        assert_eq!(picks.iter().filter(|p| p.stat_key == StatKey::Pts).count(), 1);
    }
}
