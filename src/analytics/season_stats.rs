use crate::types::{GameStatRecord, SeasonStats};

/// Per-game averages over a season's games. An empty season is all zeros.
pub fn season_stats(season: &str, games: &[GameStatRecord]) -> SeasonStats {
    let n = games.len();
    let avg = |f: fn(&GameStatRecord) -> i32| -> f64 {
        if n == 0 {
            0.0
        } else {
            games.iter().map(|g| i64::from(f(g))).sum::<i64>() as f64 / n as f64
        }
    };

    SeasonStats {
        season: season.to_string(),
        games_played: n,
        pts_avg: avg(|g| g.pts),
        reb_avg: avg(|g| g.reb),
        ast_avg: avg(|g| g.ast),
        stl_avg: avg(|g| g.stl),
        blk_avg: avg(|g| g.blk),
        tov_avg: avg(|g| g.tov),
    }
}
