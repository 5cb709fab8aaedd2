//! Maps a game record to the scalar value of a stat key.

use crate::types::{GameStatRecord, StatKey};

/// Value of `key` for one game. Composite keys sum their components;
/// missing minutes count as 0.
pub fn value(record: &GameStatRecord, key: StatKey) -> i32 {
    match key {
        StatKey::Pts => record.pts,
        StatKey::Reb => record.reb,
        StatKey::Ast => record.ast,
        StatKey::Fg3m => record.fg3m,
        StatKey::Stl => record.stl,
        StatKey::Blk => record.blk,
        StatKey::Tov => record.tov,
        StatKey::MinPlayed => record.min_played.unwrap_or(0),
        composite => composite.components().iter().map(|&k| value(record, k)).sum(),
    }
}

/// Values for each record, in input order.
pub fn values(records: &[GameStatRecord], key: StatKey) -> Vec<f64> {
    records.iter().map(|r| f64::from(value(r, key))).collect()
}


#[cfg(test)]
mod tests {
    use super::fixtures::game;
    use super::*;

    #[test]
    fn simple_keys_read_fields() {
        let mut g = game(31, 9, 7);
        g.fg3m = 4;
        g.stl = 2;
        g.blk = 1;
        g.tov = 3;
        g.min_played = Some(36);
        assert_eq!(value(&g, StatKey::Pts), 31);
        assert_eq!(value(&g, StatKey::Reb), 9);
        assert_eq!(value(&g, StatKey::Ast), 7);
        assert_eq!(value(&g, StatKey::Fg3m), 4);
        assert_eq!(value(&g, StatKey::Stl), 2);
        assert_eq!(value(&g, StatKey::Blk), 1);
        assert_eq!(value(&g, StatKey::Tov), 3);
        assert_eq!(value(&g, StatKey::MinPlayed), 36);
    }

    #[test]
    fn missing_minutes_is_zero() {
        assert_eq!(value(&game(10, 0, 0), StatKey::MinPlayed), 0);
    }

    #[test]
    fn composites_sum_components() {
        let g = game(25, 10, 8);
        for key in StatKey::ALL.into_iter().filter(|k| k.components().len() > 1) {
            let expected: i32 = key.components().iter().map(|&k| value(&g, k)).sum();
            assert_eq!(value(&g, key), expected, "{key}");
        }
        assert_eq!(value(&g, StatKey::PtsRebAst), 43);
        assert_eq!(value(&g, StatKey::RebAst), 18);
    }
}
