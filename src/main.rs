mod analytics;
mod cli;
mod config;
mod db;
mod error;
mod import;
mod ranker;
mod season;
mod service;
mod state;
mod store;
mod suggest;
mod types;

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::Config;
use crate::db::SqliteStore;
use crate::error::Result;
use crate::state::MemoryStore;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    // stdout carries command output only
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli, cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, cfg: Config) -> Result<()> {
    if cli.memory {
        let store = MemoryStore::new();
        if let Some(seed) = &cli.seed {
            let stats = import::import_file(store.as_ref(), seed).await?;
            info!(players = store.player_count(), games = stats.games_upserted, "in-memory store seeded");
        }
        return cli::dispatch(cli.command, store, &cfg).await;
    }

    let store = Arc::new(SqliteStore::open(&cfg.db_path).await?);
    cli::dispatch(cli.command, store, &cfg).await
}
