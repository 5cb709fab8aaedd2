use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use crate::config::TOP_PICKS_LIMIT;
use crate::types::{Confidence, DailyPick, PickMode, StatKey, Suggestion, TodayPick, LEGACY_MISSING};

/// Stat keys that get a guaranteed slot in the homepage feed, in order.
const DIVERSITY_KEYS: [StatKey; 2] = [StatKey::Fg3m, StatKey::RebAst];

/// Conviction of a count in the direction of the call: overs for an Over,
/// unders for an Under. Missing counts stay at the sentinel.
fn strength(suggestion: Suggestion, count: i32, window: i32) -> i32 {
    if count < 0 {
        return LEGACY_MISSING;
    }
    match suggestion {
        Suggestion::Over => count,
        Suggestion::Under => window - count,
    }
}

pub fn hit_strength(p: &TodayPick) -> i32 {
    strength(p.suggestion, p.hit_rate_last10, 10)
}

pub fn over_strength(p: &TodayPick) -> i32 {
    strength(p.suggestion, p.over_last5, 5)
}

/// Ranks a date's stored picks.
///
/// Picks for players outside `eligible` are dropped. The rest sort by
/// confidence, then hit-rate strength, then recent-over strength (all
/// descending), then id ascending, so equal picks always come out in the
/// same order.
pub fn rank(
    picks: Vec<DailyPick>,
    eligible: &HashSet<i64>,
    team_by_player: &HashMap<i64, Option<String>>,
    mode: PickMode,
) -> Vec<TodayPick> {
    let mut ranked: Vec<TodayPick> = picks
        .into_iter()
        .filter(|p| eligible.contains(&p.player_id))
        .map(|p| TodayPick {
            team_abbr: team_by_player.get(&p.player_id).cloned().flatten(),
            stat_label: p.stat_key.label(),
            id: p.id,
            player_name: p.player_name,
            player_id: p.player_id,
            stat_key: p.stat_key,
            line: p.line,
            suggestion: p.suggestion,
            confidence: p.confidence,
            reason: p.reason,
            hit_rate_last10: p.hit_rate_last10,
            over_last5: p.over_last5,
        })
        .collect();

    ranked.sort_by_key(|p| {
        (
            Reverse(Confidence::rank(p.confidence)),
            Reverse(hit_strength(p)),
            Reverse(over_strength(p)),
            p.id,
        )
    });

    select(ranked, mode)
}

fn select(ranked: Vec<TodayPick>, mode: PickMode) -> Vec<TodayPick> {
    match mode {
        PickMode::All => ranked,
        PickMode::Capped(n) if n <= 0 => ranked,
        PickMode::Capped(n) => ranked.into_iter().take(n as usize).collect(),
        PickMode::TopWithDiversity => {
            let mut out: Vec<TodayPick> = ranked.iter().take(TOP_PICKS_LIMIT).cloned().collect();
            let mut taken: HashSet<i64> = out.iter().map(|p| p.id).collect();
            for key in DIVERSITY_KEYS {
                if let Some(p) = ranked.iter().find(|p| p.stat_key == key && !taken.contains(&p.id)) {
                    taken.insert(p.id);
                    out.push(p.clone());
                }
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn pick(id: i64, confidence: Confidence, suggestion: Suggestion, hit10: i32, over5: i32) -> DailyPick {
        DailyPick {
            id,
            player_id: id * 100,
            player_name: format!("Player {id}"),
            stat_key: StatKey::Pts,
            line: 20.5,
            line_date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            suggestion,
            confidence: Some(confidence),
            reason: None,
            hit_rate_last10: hit10,
            over_last5: over5,
        }
    }

    fn everyone(picks: &[DailyPick]) -> HashSet<i64> {
        picks.iter().map(|p| p.player_id).collect()
    }

    fn ids(out: &[TodayPick]) -> Vec<i64> {
        out.iter().map(|p| p.id).collect()
    }

    fn rank_all(picks: Vec<DailyPick>) -> Vec<TodayPick> {
        let eligible = everyone(&picks);
        rank(picks, &eligible, &HashMap::new(), PickMode::All)
    }

    #[test]
    fn confidence_dominates_strength() {
        let out = rank_all(vec![
            pick(1, Confidence::Low, Suggestion::Over, 10, 5),
            pick(2, Confidence::High, Suggestion::Over, 5, 3),
            pick(3, Confidence::Medium, Suggestion::Over, 9, 5),
        ]);
        assert_eq!(ids(&out), vec![2, 3, 1]);
    }

    #[test]
    fn under_strength_counts_misses() {
        let out = rank_all(vec![
            pick(1, Confidence::High, Suggestion::Over, 7, 3),
            // 10 - 1 = 9 unders beats 7 overs
            pick(2, Confidence::High, Suggestion::Under, 1, 2),
        ]);
        assert_eq!(ids(&out), vec![2, 1]);
    }

    #[test]
    fn over_count_breaks_hit_rate_ties_then_id() {
        let out = rank_all(vec![
            pick(4, Confidence::High, Suggestion::Over, 8, 3),
            pick(3, Confidence::High, Suggestion::Over, 8, 4),
            pick(1, Confidence::High, Suggestion::Over, 8, 3),
        ]);
        assert_eq!(ids(&out), vec![3, 1, 4]);
    }

    #[test]
    fn legacy_rows_sort_last_within_tier() {
        let out = rank_all(vec![
            pick(1, Confidence::High, Suggestion::Over, LEGACY_MISSING, LEGACY_MISSING),
            pick(2, Confidence::High, Suggestion::Under, 10, 5),
            pick(3, Confidence::High, Suggestion::Over, 0, 0),
            pick(4, Confidence::Medium, Suggestion::Over, 10, 5),
        ]);
        // a 0-strength Under (10/10 overs) still outranks the legacy row
        assert_eq!(ids(&out), vec![2, 3, 1, 4]);
        assert_eq!(out[2].hit_rate_last10, LEGACY_MISSING);
        assert_eq!(out[2].over_last5, LEGACY_MISSING);
    }

    #[test]
    fn unknown_confidence_ranks_below_low() {
        let mut odd = pick(1, Confidence::High, Suggestion::Over, 10, 5);
        odd.confidence = None;
        let out = rank_all(vec![odd, pick(2, Confidence::Low, Suggestion::Over, 0, 0)]);
        assert_eq!(ids(&out), vec![2, 1]);
    }

    #[test]
    fn ineligible_players_are_dropped() {
        let picks = vec![
            pick(1, Confidence::High, Suggestion::Over, 9, 4),
            pick(2, Confidence::High, Suggestion::Over, 8, 4),
        ];
        let eligible: HashSet<i64> = [200].into_iter().collect();
        let out = rank(picks, &eligible, &HashMap::new(), PickMode::All);
        assert_eq!(ids(&out), vec![2]);
    }

    #[test]
    fn ranking_is_idempotent() {
        let picks: Vec<DailyPick> = (1..=8)
            .map(|i| {
                let s = if i % 2 == 0 { Suggestion::Under } else { Suggestion::Over };
                pick(i, Confidence::High, s, (i * 3 % 11) as i32, (i % 6) as i32)
            })
            .collect();
        let first = rank_all(picks.clone());
        let again = rank_all(picks);
        assert_eq!(ids(&first), ids(&again));

        let by_id: HashMap<i64, usize> = ids(&first).into_iter().enumerate().map(|(i, id)| (id, i)).collect();
        let mut reordered: Vec<DailyPick> = (1..=8)
            .map(|i| {
                let s = if i % 2 == 0 { Suggestion::Under } else { Suggestion::Over };
                pick(i, Confidence::High, s, (i * 3 % 11) as i32, (i % 6) as i32)
            })
            .collect();
        reordered.sort_by_key(|p| by_id[&p.id]);
        assert_eq!(ids(&rank_all(reordered)), ids(&first));
    }

    #[test]
    fn capped_modes() {
        let picks: Vec<DailyPick> =
            (1..=5).map(|i| pick(i, Confidence::High, Suggestion::Over, 10 - i as i32, 3)).collect();
        let eligible = everyone(&picks);
        let none = HashMap::new();
        assert_eq!(ids(&rank(picks.clone(), &eligible, &none, PickMode::Capped(2))), vec![1, 2]);
        assert_eq!(rank(picks.clone(), &eligible, &none, PickMode::Capped(0)).len(), 5);
        assert_eq!(rank(picks.clone(), &eligible, &none, PickMode::Capped(-1)).len(), 5);
        assert_eq!(rank(picks, &eligible, &none, PickMode::Capped(50)).len(), 5);
    }

    #[test]
    fn homepage_adds_three_pointer_and_reb_ast_slots() {
        let picks: Vec<DailyPick> = (1..=10)
            .map(|i| {
                let mut p = pick(i, Confidence::High, Suggestion::Over, 11 - i as i32, 3);
                p.stat_key = match i {
                    7 => StatKey::Fg3m,
                    9 => StatKey::RebAst,
                    _ => StatKey::Pts,
                };
                p
            })
            .collect();
        let eligible = everyone(&picks);
        let out = rank(picks, &eligible, &HashMap::new(), PickMode::TopWithDiversity);
        assert_eq!(ids(&out), vec![1, 2, 3, 7, 9]);
        assert_eq!(out[3].stat_label, "3's");
        assert_eq!(out[4].stat_label, "Reb+Ast");
    }

    #[test]
    fn homepage_does_not_duplicate_top_picks() {
        let picks: Vec<DailyPick> = (1..=4)
            .map(|i| {
                let mut p = pick(i, Confidence::High, Suggestion::Over, 11 - i as i32, 3);
                if i == 1 {
                    p.stat_key = StatKey::Fg3m;
                }
                p
            })
            .collect();
        let eligible = everyone(&picks);
        let out = rank(picks, &eligible, &HashMap::new(), PickMode::TopWithDiversity);
        assert_eq!(ids(&out), vec![1, 2, 3]);
    }

    #[test]
    fn homepage_with_few_picks_returns_them_all() {
        let picks = vec![pick(1, Confidence::High, Suggestion::Over, 9, 4)];
        let eligible = everyone(&picks);
        let out = rank(picks, &eligible, &HashMap::new(), PickMode::TopWithDiversity);
        assert_eq!(ids(&out), vec![1]);
    }

    #[test]
    fn team_abbreviation_attached_when_known() {
        let picks = vec![
            pick(1, Confidence::High, Suggestion::Over, 9, 4),
            pick(2, Confidence::High, Suggestion::Over, 8, 4),
        ];
        let eligible = everyone(&picks);
        let teams: HashMap<i64, Option<String>> = [(100, Some("DEN".to_string()))].into_iter().collect();
        let out = rank(picks, &eligible, &teams, PickMode::All);
        assert_eq!(out[0].team_abbr.as_deref(), Some("DEN"));
        assert_eq!(out[1].team_abbr, None);
    }
}
