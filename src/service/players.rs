use std::sync::Arc;

use tracing::debug;

use crate::analytics;
use crate::config::SUGGESTION_WINDOW;
use crate::error::Result;
use crate::store::{GameLogStore, PlayerDirectory};
use crate::suggest;
use crate::types::{GameStatRecord, OverUnder, Player, PropLines, SeasonStats, StatKey, SuggestionLine};

/// Player lookups and per-player analytics over the stores.
pub struct PlayerService<S> {
    store: Arc<S>,
}

impl<S: GameLogStore + PlayerDirectory> PlayerService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Blank queries match nobody.
    pub async fn search(&self, query: &str) -> Result<Vec<Player>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.store.search_by_name(query).await
    }

    /// First directory match for a free-text name.
    pub async fn resolve(&self, name: &str) -> Result<Option<Player>> {
        Ok(self.search(name).await?.into_iter().next())
    }

    pub async fn player(&self, id: i64) -> Result<Option<Player>> {
        self.store.player(id).await
    }

    pub async fn game_log(&self, player_id: i64, season: &str) -> Result<Vec<GameStatRecord>> {
        self.store.games_descending(player_id, season).await
    }

    pub async fn season_stats(&self, player_id: i64, season: &str) -> Result<SeasonStats> {
        let games = self.store.games_descending(player_id, season).await?;
        Ok(analytics::season_stats(season, &games))
    }

    pub async fn over_under(
        &self,
        player_id: i64,
        season: &str,
        stat: &str,
        threshold: f64,
        last_n: Option<i64>,
    ) -> Result<OverUnder> {
        let key = StatKey::normalize(stat);
        let games = self.store.games_descending(player_id, season).await?;
        Ok(analytics::frequency(&games, key, threshold, last_n))
    }

    /// Suggestion for one stat line. None when the player has fewer than 10
    /// games this season.
    pub async fn single_suggestion(
        &self,
        player_id: i64,
        season: &str,
        stat: &str,
        line: f64,
    ) -> Result<Option<SuggestionLine>> {
        let key = StatKey::normalize(stat);
        let games = self.store.games_descending(player_id, season).await?;
        if games.len() < SUGGESTION_WINDOW {
            debug!(player_id, season, games = games.len(), "not enough games for a suggestion");
            return Ok(None);
        }
        Ok(suggest::suggest(&games, key, key.label(), line))
    }

    /// Suggestions for the combo props that were given a line, in the order
    /// Pts+Reb+Ast, Pts+Ast, Reb+Ast.
    pub async fn prop_suggestions(
        &self,
        player_id: i64,
        season: &str,
        lines: PropLines,
    ) -> Result<Vec<SuggestionLine>> {
        let games = self.store.games_descending(player_id, season).await?;
        if games.len() < SUGGESTION_WINDOW {
            return Ok(Vec::new());
        }

        let wanted = [
            (StatKey::PtsRebAst, lines.pts_reb_ast),
            (StatKey::PtsAst, lines.pts_ast),
            (StatKey::RebAst, lines.reb_ast),
        ];
        Ok(wanted
            .into_iter()
            .filter_map(|(key, line)| suggest::suggest(&games, key, key.label(), line?))
            .collect())
    }
}
