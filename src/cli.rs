use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::import;
use crate::season;
use crate::service::{DailyLineService, PlayerService};
use crate::store::{DailyLineStore, GameLogStore, PlayerDirectory};
use crate::types::{LineInput, PickMode, PropLines};

/// Player prop suggestions and daily pick rankings.
#[derive(Parser, Debug)]
#[command(name = "prop-picks")]
#[command(version)]
#[command(about = "Basketball player prop suggestions and daily pick ranking", long_about = None)]
pub struct Cli {
    /// Run against a fresh in-memory store instead of the database
    #[arg(long)]
    pub memory: bool,

    /// Game-log export to import into the in-memory store first (with --memory)
    #[arg(long, requires = "memory")]
    pub seed: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search players by name
    Search { query: String },

    /// Look up one player
    Player { id: i64 },

    /// Season game log, most recent first
    Games {
        player_id: i64,
        #[arg(short, long)]
        season: Option<String>,
    },

    /// Season averages
    Stats {
        player_id: i64,
        #[arg(short, long)]
        season: Option<String>,
    },

    /// How often a stat cleared a threshold
    OverUnder {
        player_id: i64,
        #[arg(long, default_value = "pts")]
        stat: String,
        #[arg(short, long)]
        threshold: f64,
        /// Only the most recent N games
        #[arg(long)]
        last_n: Option<i64>,
        #[arg(short, long)]
        season: Option<String>,
    },

    /// Over/Under suggestion for one stat line
    Suggest {
        player_id: i64,
        #[arg(long, default_value = "pts")]
        stat: String,
        #[arg(short, long)]
        line: f64,
        #[arg(short, long)]
        season: Option<String>,
    },

    /// Suggestions for the combo props (Pts+Reb+Ast, Pts+Ast, Reb+Ast)
    Props {
        player_id: i64,
        #[arg(long)]
        pra: Option<f64>,
        #[arg(long)]
        pa: Option<f64>,
        #[arg(long)]
        ra: Option<f64>,
        #[arg(short, long)]
        season: Option<String>,
    },

    /// Import a game-log export (JSON array of stats-feed rows)
    Import { file: PathBuf },

    /// Evaluate and store a batch of daily lines (JSON array of {player, stat, line})
    AddLines {
        file: PathBuf,
        /// Line date, YYYY-MM-DD (default: today)
        #[arg(short, long)]
        date: Option<String>,
        /// Season to evaluate against (default: season of the line date)
        #[arg(short, long)]
        season: Option<String>,
    },

    /// Ranked picks for a date (default: latest date with lines)
    Picks {
        #[arg(short, long)]
        date: Option<String>,
        /// Return the first N picks instead of the top picks plus diversity slots
        #[arg(short, long, conflicts_with = "all")]
        limit: Option<i64>,
        /// Return every eligible pick
        #[arg(long)]
        all: bool,
    },

    /// Recent seasons, newest first
    Seasons {
        #[arg(short, long, default_value = "5")]
        count: usize,
    },

    /// The season containing today
    CurrentSeason,
}

/// Run one command against `store`, printing its result as JSON.
pub async fn dispatch<S>(cmd: Commands, store: Arc<S>, cfg: &Config) -> Result<()>
where
    S: GameLogStore + PlayerDirectory + DailyLineStore + 'static,
{
    let players = PlayerService::new(Arc::clone(&store));
    let season_or_default = |s: Option<String>| s.unwrap_or_else(|| cfg.default_season.clone());

    match cmd {
        Commands::Search { query } => print_json(&players.search(&query).await?),
        Commands::Player { id } => match players.player(id).await? {
            Some(p) => print_json(&p),
            None => Err(AppError::NotFound(format!("player {id}"))),
        },
        Commands::Games { player_id, season } => {
            print_json(&players.game_log(player_id, &season_or_default(season)).await?)
        }
        Commands::Stats { player_id, season } => {
            print_json(&players.season_stats(player_id, &season_or_default(season)).await?)
        }
        Commands::OverUnder { player_id, stat, threshold, last_n, season } => {
            let season = season_or_default(season);
            print_json(&players.over_under(player_id, &season, &stat, threshold, last_n).await?)
        }
        Commands::Suggest { player_id, stat, line, season } => {
            let season = season_or_default(season);
            print_json(&players.single_suggestion(player_id, &season, &stat, line).await?)
        }
        Commands::Props { player_id, pra, pa, ra, season } => {
            let lines = PropLines { pts_reb_ast: pra, pts_ast: pa, reb_ast: ra };
            let season = season_or_default(season);
            print_json(&players.prop_suggestions(player_id, &season, lines).await?)
        }
        Commands::Import { file } => print_json(&import::import_file(store.as_ref(), &file).await?),
        Commands::AddLines { file, date, season } => {
            let date = match date {
                Some(d) => parse_date(&d)?,
                None => chrono::Local::now().date_naive(),
            };
            let raw = tokio::fs::read_to_string(&file).await?;
            let lines: Vec<LineInput> = serde_json::from_str(&raw)?;
            let saved = DailyLineService::new(store)
                .add_daily_lines(date, season.as_deref(), &lines)
                .await?;
            print_json(&serde_json::json!({ "date": date, "submitted": lines.len(), "saved": saved }))
        }
        Commands::Picks { date, limit, all } => {
            let date = date.as_deref().map(parse_date).transpose()?;
            let mode = match (limit, all) {
                (_, true) => PickMode::All,
                (Some(n), false) => PickMode::Capped(n),
                (None, false) => PickMode::TopWithDiversity,
            };
            print_json(&DailyLineService::new(store).today_picks(date, mode).await?)
        }
        Commands::Seasons { count } => print_json(&season::seasons(count)),
        Commands::CurrentSeason => print_json(&season::current_season()),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| AppError::InvalidDate(format!("{s}: {e}")))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
