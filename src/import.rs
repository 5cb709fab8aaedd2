use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::season::normalize_season_id;
use crate::store::{GameLogStore, PlayerDirectory};
use crate::types::{GameStatRecord, Player};

#[derive(Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ImportStats {
    pub rows_total: usize,
    pub players: usize,
    pub games_upserted: usize,
    pub duplicates: usize,
    pub rejected_no_player: usize,
    pub rejected_no_game_id: usize,
    pub rejected_bad_date: usize,
}

impl ImportStats {
    pub fn rejected(&self) -> usize {
        self.rejected_no_player + self.rejected_no_game_id + self.rejected_bad_date
    }
}

#[derive(Debug)]
enum Rejection {
    NoPlayer,
    NoGameId,
    BadDate(String),
}

/// One player's games from an export, keyed by game id. A later row for the
/// same game replaces an earlier one.
#[derive(Debug, Default)]
struct PlayerGames {
    full_name: String,
    games: BTreeMap<String, GameStatRecord>,
}

/// Import a game-log export file (JSON array of stats-feed rows).
pub async fn import_file<S>(store: &S, path: &Path) -> Result<ImportStats>
where
    S: GameLogStore + PlayerDirectory,
{
    let raw = tokio::fs::read_to_string(path).await?;
    let stats = import_game_logs(store, &raw).await?;
    info!(path = %path.display(), "import file done");
    Ok(stats)
}

/// Parse `json` and upsert every valid row. Players are created or renamed,
/// games are upserted by (player, game id) so re-importing is idempotent.
pub async fn import_game_logs<S>(store: &S, json: &str) -> Result<ImportStats>
where
    S: GameLogStore + PlayerDirectory,
{
    let rows: Vec<Value> = serde_json::from_str(json)?;
    let (by_player, mut stats) = group_rows(&rows);

    for (player_id, pg) in &by_player {
        store
            .upsert_player(&Player { id: *player_id, full_name: pg.full_name.clone() })
            .await?;
        let games: Vec<GameStatRecord> = pg.games.values().cloned().collect();
        stats.games_upserted += store.upsert_games(*player_id, &games).await?;
    }

    info!(
        rows = stats.rows_total,
        players = stats.players,
        games = stats.games_upserted,
        duplicates = stats.duplicates,
        "game logs imported"
    );
    if stats.rejected() > 0 {
        warn!(
            no_player = stats.rejected_no_player,
            no_game_id = stats.rejected_no_game_id,
            bad_date = stats.rejected_bad_date,
            "import rows rejected"
        );
    }
    Ok(stats)
}

fn group_rows(rows: &[Value]) -> (BTreeMap<i64, PlayerGames>, ImportStats) {
    let mut stats = ImportStats { rows_total: rows.len(), ..Default::default() };
    let mut by_player: BTreeMap<i64, PlayerGames> = BTreeMap::new();

    for (i, row) in rows.iter().enumerate() {
        match parse_row(row) {
            Ok((player, game)) => {
                let entry = by_player.entry(player.id).or_default();
                entry.full_name = player.full_name;
                if entry.games.insert(game.game_id.clone(), game).is_some() {
                    stats.duplicates += 1;
                }
            }
            Err(Rejection::NoPlayer) => {
                debug!(row = i, "import row has no player");
                stats.rejected_no_player += 1;
            }
            Err(Rejection::NoGameId) => {
                debug!(row = i, "import row has no game id");
                stats.rejected_no_game_id += 1;
            }
            Err(Rejection::BadDate(raw)) => {
                debug!(row = i, date = %raw, "import row has no usable game date");
                stats.rejected_bad_date += 1;
            }
        }
    }

    stats.players = by_player.len();
    (by_player, stats)
}

fn parse_row(row: &Value) -> std::result::Result<(Player, GameStatRecord), Rejection> {
    let player_id = int_field(row, &["PLAYER_ID", "Player_ID"]).ok_or(Rejection::NoPlayer)?;
    let full_name = str_field(row, &["PLAYER_NAME"]).ok_or(Rejection::NoPlayer)?;
    let game_id = str_field(row, &["GAME_ID", "Game_ID"]).ok_or(Rejection::NoGameId)?;
    let raw_date = str_field(row, &["GAME_DATE", "Game_Date"])
        .ok_or_else(|| Rejection::BadDate(String::new()))?;
    let game_date = parse_game_date(&raw_date).ok_or(Rejection::BadDate(raw_date))?;

    let season = match str_field(row, &["SEASON"]) {
        Some(s) => s,
        None => str_field(row, &["SEASON_ID"]).map(|s| normalize_season_id(&s)).unwrap_or_default(),
    };
    let matchup = str_field(row, &["MATCHUP"]);
    let (team_abbr, opponent_abbr, home_away) = match matchup.as_deref().map(parse_matchup) {
        Some(Some(m)) => (Some(m.team), Some(m.opponent), Some(m.home_away.to_string())),
        _ => (None, None, None),
    };
    let stat = |key: &str| int_field(row, &[key]).map_or(0, |v| v as i32);

    let game = GameStatRecord {
        game_id,
        game_date,
        season,
        matchup,
        home_away,
        team_abbr,
        opponent_abbr,
        wl: str_field(row, &["WL"]).and_then(|w| w.chars().next()).map(String::from),
        min_played: int_field(row, &["MIN"]).map(|v| v as i32),
        pts: stat("PTS"),
        reb: stat("REB"),
        ast: stat("AST"),
        stl: stat("STL"),
        blk: stat("BLK"),
        tov: stat("TOV"),
        fg3m: stat("FG3M"),
    };
    Ok((Player { id: player_id, full_name }, game))
}

#[derive(Debug, PartialEq, Eq)]
pub struct Matchup {
    pub team: String,
    pub opponent: String,
    /// 'H' for "vs." matchups, 'A' for "@".
    pub home_away: char,
}

/// `"LAL vs. BOS"` is a home game for LAL, `"LAL @ BOS"` an away game.
/// Fewer than three tokens is unparseable.
pub fn parse_matchup(matchup: &str) -> Option<Matchup> {
    let parts: Vec<&str> = matchup.split_whitespace().collect();
    if parts.len() < 3 {
        return None;
    }
    Some(Matchup {
        team: parts[0].to_string(),
        opponent: parts[parts.len() - 1].to_string(),
        home_away: if matchup.contains("vs.") { 'H' } else { 'A' },
    })
}

/// Accepts `2025-03-01`, `2025-03-01T00:00:00` and the feed's `MAR 01, 2025`.
fn parse_game_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    raw.get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .or_else(|| NaiveDate::parse_from_str(raw, "%b %d, %Y").ok())
}

/// First non-empty value among `keys`, as a string. Numbers are stringified.
fn str_field(row: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match row.get(*k)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Integer value among `keys`; floats and numeric strings are truncated.
fn int_field(row: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|k| match row.get(*k)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    })
}
