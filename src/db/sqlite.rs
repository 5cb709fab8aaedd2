use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::info;

use crate::config::SUGGESTION_WINDOW;
use crate::db::models::{DailyLineRow, GameLogRow, PlayerRow};
use crate::error::{AppError, Result};
use crate::store::{DailyLineStore, GameLogStore, PlayerDirectory};
use crate::types::{DailyPick, GameStatRecord, NewDailyLine, Player};

/// SQLite-backed game logs, player directory and daily lines.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database file and apply migrations.
    pub async fn open(db_path: &str) -> Result<Self> {
        let pool = SqlitePool::connect(&format!("sqlite:{db_path}?mode=rwc")).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database ready at {db_path}");
        Ok(Self { pool })
    }

    /// Private in-memory database. One connection, since each `:memory:`
    /// connection would otherwise see its own empty database.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn now_secs() -> i64 {
    Utc::now().timestamp()
}

/// Appends `(?, ?, ...)` with one bind per id.
fn push_id_list(qb: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    qb.push("(");
    let mut sep = qb.separated(", ");
    for &id in ids {
        sep.push_bind(id);
    }
    qb.push(")");
}

#[async_trait]
impl GameLogStore for SqliteStore {
    async fn games_descending(&self, player_id: i64, season: &str) -> Result<Vec<GameStatRecord>> {
        let rows: Vec<GameLogRow> = sqlx::query_as(
            r#"
            SELECT game_id, game_date, season, matchup, home_away, team_abbr, opponent_abbr,
                   wl, min_played, pts, reb, ast, stl, blk, tov, fg3m
            FROM player_game_logs
            WHERE player_id = ? AND season = ?
            ORDER BY game_date DESC, id DESC
            "#,
        )
        .bind(player_id)
        .bind(season)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(GameStatRecord::from).collect())
    }

    async fn eligible_player_ids(
        &self,
        player_ids: &[i64],
        season: &str,
        on_or_before: NaiveDate,
    ) -> Result<HashSet<i64>> {
        if player_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT player_id FROM player_game_logs WHERE season = ",
        );
        qb.push_bind(season);
        qb.push(" AND game_date <= ");
        qb.push_bind(on_or_before);
        qb.push(" AND player_id IN ");
        push_id_list(&mut qb, player_ids);
        qb.push(" GROUP BY player_id HAVING COUNT(*) >= ");
        qb.push_bind(SUGGESTION_WINDOW as i64);

        let ids: Vec<i64> = qb.build_query_scalar().fetch_all(&self.pool).await?;
        Ok(ids.into_iter().collect())
    }

    async fn latest_team_abbreviation(
        &self,
        player_ids: &[i64],
        season: &str,
    ) -> Result<HashMap<i64, Option<String>>> {
        if player_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT player_id, team_abbr FROM player_game_logs WHERE season = ",
        );
        qb.push_bind(season);
        qb.push(" AND player_id IN ");
        push_id_list(&mut qb, player_ids);
        qb.push(" ORDER BY player_id, game_date DESC, id DESC");

        let rows: Vec<(i64, Option<String>)> = qb.build_query_as().fetch_all(&self.pool).await?;

        let mut teams = HashMap::new();
        for (player_id, team) in rows {
            teams.entry(player_id).or_insert(team);
        }
        Ok(teams)
    }

    async fn upsert_games(&self, player_id: i64, games: &[GameStatRecord]) -> Result<usize> {
        let updated_at = now_secs();
        let mut tx = self.pool.begin().await?;

        for g in games {
            sqlx::query(
                r#"
                INSERT INTO player_game_logs (
                    player_id, game_id, game_date, season, matchup, home_away,
                    team_abbr, opponent_abbr, wl, min_played,
                    pts, reb, ast, stl, blk, tov, fg3m, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(player_id, game_id) DO UPDATE SET
                    game_date = excluded.game_date,
                    season = excluded.season,
                    matchup = excluded.matchup,
                    home_away = excluded.home_away,
                    team_abbr = excluded.team_abbr,
                    opponent_abbr = excluded.opponent_abbr,
                    wl = excluded.wl,
                    min_played = excluded.min_played,
                    pts = excluded.pts,
                    reb = excluded.reb,
                    ast = excluded.ast,
                    stl = excluded.stl,
                    blk = excluded.blk,
                    tov = excluded.tov,
                    fg3m = excluded.fg3m,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(player_id)
            .bind(&g.game_id)
            .bind(g.game_date)
            .bind(&g.season)
            .bind(&g.matchup)
            .bind(&g.home_away)
            .bind(&g.team_abbr)
            .bind(&g.opponent_abbr)
            .bind(&g.wl)
            .bind(g.min_played)
            .bind(g.pts)
            .bind(g.reb)
            .bind(g.ast)
            .bind(g.stl)
            .bind(g.blk)
            .bind(g.tov)
            .bind(g.fg3m)
            .bind(updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(games.len())
    }
}

#[async_trait]
impl PlayerDirectory for SqliteStore {
    async fn search_by_name(&self, query: &str) -> Result<Vec<Player>> {
        let rows: Vec<PlayerRow> = sqlx::query_as(
            r#"
            SELECT id, full_name
            FROM players
            WHERE LOWER(full_name) LIKE '%' || LOWER(?) || '%'
            ORDER BY full_name
            "#,
        )
        .bind(query)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Player::from).collect())
    }

    async fn player(&self, id: i64) -> Result<Option<Player>> {
        let row: Option<PlayerRow> = sqlx::query_as("SELECT id, full_name FROM players WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Player::from))
    }

    async fn upsert_player(&self, player: &Player) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO players (id, full_name, created_at) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET full_name = excluded.full_name
            "#,
        )
        .bind(player.id)
        .bind(&player.full_name)
        .bind(now_secs())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl DailyLineStore for SqliteStore {
    async fn save_lines(&self, lines: &[NewDailyLine]) -> Result<usize> {
        let created_at = now_secs();
        let mut tx = self.pool.begin().await?;

        for line in lines {
            sqlx::query(
                r#"
                INSERT INTO daily_prop_lines (
                    player_id, stat_key, line_value, line_date, suggestion, confidence,
                    reason, hit_rate_last_10, over_last_5, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(line.player_id)
            .bind(line.stat_key.as_str())
            .bind(line.line)
            .bind(line.line_date)
            .bind(line.suggestion.to_string())
            .bind(line.confidence.to_string())
            .bind(&line.reason)
            .bind(i64::from(line.hit_rate_last10))
            .bind(i64::from(line.over_last5))
            .bind(created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(lines.len())
    }

    async fn picks_for_date(&self, date: NaiveDate) -> Result<Vec<DailyPick>> {
        let rows: Vec<DailyLineRow> = sqlx::query_as(
            r#"
            SELECT d.id, d.player_id, p.full_name AS player_name, d.stat_key, d.line_value,
                   d.line_date, d.suggestion, d.confidence, d.reason,
                   d.hit_rate_last_10, d.over_last_5
            FROM daily_prop_lines d
            JOIN players p ON p.id = d.player_id
            WHERE d.line_date = ?
            ORDER BY d.id
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DailyLineRow::into_pick).collect())
    }

    async fn latest_line_date(&self) -> Result<Option<NaiveDate>> {
        let max: Option<String> = sqlx::query_scalar("SELECT MAX(line_date) FROM daily_prop_lines")
            .fetch_one(&self.pool)
            .await?;

        max.map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map_err(|e| AppError::InvalidDate(format!("stored line_date {s:?}: {e}")))
        })
        .transpose()
    }
}
