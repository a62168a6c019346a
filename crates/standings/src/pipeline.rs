//! Two-pass recalculation: every affected score first, then tiebreakers.
//!
//! Opponent-based tiebreaks read other players' cumulative scores, so a
//! tiebreak computed while some scores are still old is wrong. The passes are
//! typestates: tiebreakers can only be reached through [`FreshScores`], which
//! only [`ScorePass::run`] produces, and nothing can be read from the players
//! between the two passes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use tracing::debug;

use crate::config::Configuration;
use crate::model::{Player, PlayerId};
use crate::scoring::recalculate_scores;
use crate::tiebreak::{self, TiebreakContext, Tiebreaker};

/// Freshness of the stored standings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    #[default]
    ScoresStale,
    ScoresFresh,
    TiebreakersFresh,
}

/// Rounds `[from_round, to_round)` to recompute; `to_round = None` runs to
/// the last round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundWindow {
    pub from_round: u32,
    pub to_round: Option<u32>,
}

impl RoundWindow {
    pub fn all() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(from_round: u32) -> Self {
        Self {
            from_round: from_round.max(1),
            to_round: None,
        }
    }

    fn rounds(&self, played: u32) -> std::ops::Range<u32> {
        let end = self.to_round.unwrap_or(u32::MAX).min(played + 1);
        self.from_round..end.max(self.from_round)
    }
}

/// First pass: recompute cumulative scores of the affected players.
pub struct ScorePass<'t> {
    players: &'t mut [Player],
    config: &'t Configuration,
    affected: Vec<usize>,
    window: RoundWindow,
}

/// Scores are final for every affected player; only the tiebreaker pass may
/// follow.
#[must_use = "tiebreakers are stale until run_tiebreakers is called"]
pub struct FreshScores<'t> {
    players: &'t mut [Player],
    config: &'t Configuration,
    affected: Vec<usize>,
    window: RoundWindow,
}

impl<'t> ScorePass<'t> {
    /// `affected = None` recomputes everyone.
    pub fn new(
        players: &'t mut [Player],
        config: &'t Configuration,
        affected: Option<&BTreeSet<PlayerId>>,
        window: RoundWindow,
    ) -> Self {
        let affected = players
            .iter()
            .enumerate()
            .filter(|(_, p)| affected.map_or(true, |set| set.contains(&p.id)))
            .map(|(i, _)| i)
            .collect();
        Self {
            players,
            config,
            affected,
            window,
        }
    }

    pub fn run(self) -> FreshScores<'t> {
        for &idx in &self.affected {
            recalculate_scores(
                &mut self.players[idx],
                self.config,
                self.window.from_round,
                self.window.to_round,
            );
        }
        debug!(
            players = self.affected.len(),
            from_round = self.window.from_round,
            "score pass finished"
        );
        FreshScores {
            players: self.players,
            config: self.config,
            affected: self.affected,
            window: self.window,
        }
    }
}

impl<'t> FreshScores<'t> {
    /// Second pass. Replaces each touched tiebreaker map with exactly the
    /// configured scalar tiebreakers. Returns the number of values written.
    pub fn run_tiebreakers(self) -> usize {
        let configured: Vec<Tiebreaker> = self.config.scalar_tiebreakers().collect();

        // Compute everything against a read-only view, then write.
        let updates: Vec<(usize, u32, BTreeMap<Tiebreaker, f64>)> = {
            let ctx = TiebreakContext::new(self.config, &*self.players);
            let ctx = &ctx;
            let configured = &configured;
            let window = self.window;
            self.affected
                .iter()
                .flat_map(move |&idx| {
                    let player = &ctx.players()[idx];
                    let played = player.scores.len() as u32;
                    window.rounds(played).map(move |round| {
                        let values = configured
                            .iter()
                            .filter_map(|&tb| {
                                tiebreak::calculate(tb, ctx, player, round).map(|v| (tb, v))
                            })
                            .collect();
                        (idx, round, values)
                    })
                })
                .collect()
        };

        let mut written = 0;
        for (idx, round, values) in updates {
            written += values.len();
            if let Some(score) = self.players[idx].scores.get_mut(round as usize - 1) {
                score.tiebreakers = values;
            }
        }
        debug!(
            players = self.affected.len(),
            values = written,
            "tiebreaker pass finished"
        );
        written
    }
}

/// Runs both passes in order.
pub fn recalculate(
    players: &mut [Player],
    config: &Configuration,
    affected: Option<&BTreeSet<PlayerId>>,
    window: RoundWindow,
) {
    ScorePass::new(players, config, affected, window)
        .run()
        .run_tiebreakers();
}

/// Every player connected to `seeds` through any chain of pairings,
/// seeds included.
///
/// Changing one game moves two scores, which moves the opponent-based
/// tiebreaks of everyone those two ever met, and so on.
pub fn reachable_from(players: &[Player], seeds: &[PlayerId]) -> BTreeSet<PlayerId> {
    let mut adjacency: HashMap<PlayerId, Vec<PlayerId>> = HashMap::new();
    for player in players {
        for opponent in player.games.iter().filter_map(|g| g.opponent) {
            adjacency.entry(player.id).or_default().push(opponent);
            adjacency.entry(opponent).or_default().push(player.id);
        }
    }

    let mut seen: BTreeSet<PlayerId> = seeds.iter().copied().collect();
    let mut queue: VecDeque<PlayerId> = seeds.iter().copied().collect();
    while let Some(id) = queue.pop_front() {
        for &next in adjacency.get(&id).into_iter().flatten() {
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod pipeline_tests;
