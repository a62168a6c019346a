//! Ranking: score first, then the configured tiebreakers in order.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::{Player, PlayerId, Score};
use crate::tiebreak::{TiebreakContext, Tiebreaker, direct_encounter_score};

/// One ordering criterion. `Less` means the first argument ranks ahead.
pub type Comparator<'a, T> = Box<dyn Fn(&T, &T) -> Ordering + 'a>;

/// Item tagged with its insertion position, the final tie-breaker.
#[derive(Debug, Clone)]
pub struct Indexed<T> {
    pub index: usize,
    pub item: T,
}

/// Chains comparators by priority; the first non-equal result wins.
///
/// Items that every comparator considers equal keep their insertion order,
/// whatever the stability of the sort used.
pub fn create_comparator<'a, T: 'a>(
    comparators: Vec<Comparator<'a, T>>,
) -> impl Fn(&Indexed<T>, &Indexed<T>) -> Ordering + 'a {
    move |a: &Indexed<T>, b: &Indexed<T>| {
        comparators
            .iter()
            .map(|cmp| cmp(&a.item, &b.item))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or_else(|| a.index.cmp(&b.index))
    }
}

/// Score record in effect after `for_round`: the last one if the round is
/// beyond the player's history, none before round 1.
pub fn score_at(player: &Player, for_round: u32) -> Option<&Score> {
    let len = player.scores.len().min(for_round as usize);
    len.checked_sub(1).map(|idx| &player.scores[idx])
}

fn stored_tiebreak(player: &Player, tiebreaker: Tiebreaker, for_round: u32) -> f64 {
    score_at(player, for_round)
        .and_then(|s| s.tiebreakers.get(&tiebreaker))
        .copied()
        .unwrap_or(0.0)
}

/// A player with one sort key per criterion: points, then each configured
/// tiebreaker in order. Higher keys rank ahead.
struct Keyed<'a> {
    player: &'a Player,
    keys: Vec<f64>,
}

fn compare_keys(a: &[f64], b: &[f64]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| y.total_cmp(x))
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Players in rank order after `for_round`.
///
/// Reads the scores and tiebreakers stored by the recalculation pipeline.
/// Direct encounter has no value of its own: it is scored inside each group
/// of players still tied on every earlier criterion, as the points each one
/// took off the rest of the group. Every criterion thus becomes a plain key
/// and the final comparison is a total order.
pub fn sort_by_rank<'a>(ctx: &'a TiebreakContext<'a>, for_round: u32) -> Vec<&'a Player> {
    let by_keys: Comparator<'a, Keyed<'a>> =
        Box::new(|a: &Keyed<'a>, b: &Keyed<'a>| compare_keys(&a.keys, &b.keys));
    let compare = create_comparator(vec![by_keys]);

    let mut entries: Vec<Indexed<Keyed<'a>>> = ctx
        .players()
        .iter()
        .enumerate()
        .map(|(index, player)| Indexed {
            index,
            item: Keyed {
                player,
                keys: vec![player.points_at(for_round)],
            },
        })
        .collect();

    for &tiebreaker in &ctx.config.tiebreakers {
        if tiebreaker.is_scalar() {
            for entry in &mut entries {
                let value = stored_tiebreak(entry.item.player, tiebreaker, for_round);
                entry.item.keys.push(value);
            }
            continue;
        }

        entries.sort_by(|a, b| compare(a, b));
        let tied = |a: &Indexed<Keyed<'a>>, b: &Indexed<Keyed<'a>>| {
            compare_keys(&a.item.keys, &b.item.keys) == Ordering::Equal
        };
        for group in entries.chunk_by_mut(tied) {
            let members: Vec<PlayerId> = group.iter().map(|e| e.item.player.id).collect();
            for entry in group.iter_mut() {
                let value = direct_encounter_score(ctx, entry.item.player, &members, for_round);
                entry.item.keys.push(value);
            }
        }
    }

    entries.sort_by(|a, b| compare(a, b));
    entries.into_iter().map(|e| e.item.player).collect()
}

/// Final order and 1-based ranks after a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub round: u32,
    pub order: Vec<PlayerId>,
    pub ranks: HashMap<PlayerId, usize>,
}

impl Ranking {
    pub fn rank_of(&self, id: PlayerId) -> Option<usize> {
        self.ranks.get(&id).copied()
    }
}

pub fn compute_ranks(ctx: &TiebreakContext<'_>, for_round: u32) -> Ranking {
    let order: Vec<PlayerId> = sort_by_rank(ctx, for_round)
        .into_iter()
        .map(|p| p.id)
        .collect();
    let ranks = order
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, i + 1))
        .collect();
    Ranking {
        round: for_round,
        order,
        ranks,
    }
}

#[cfg(test)]
#[path = "ranking_tests.rs"]
mod ranking_tests;
