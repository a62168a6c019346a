//! The tournament aggregate: players, configuration and freshness of the
//! stored standings.
//!
//! Every mutation goes through a method here so the reciprocal records stay
//! checked and the scores get recomputed for exactly the players an edit can
//! reach.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info, warn};

use crate::config::Configuration;
use crate::consistency::{find_pair_contradictions, validate_pair_consistency};
use crate::error::{ContradictionReason, ImportErrors, PairingContradiction, StandingsError};
use crate::model::{Game, GameResult, Player, PlayerId};
use crate::pairing::{
    Pair, pairs_from_games, read_pairing_output, sort_pairs, validate_and_assign_pairs,
};
use crate::pipeline::{RoundWindow, ScorePass, Stage, reachable_from, recalculate};
use crate::ranking::{Ranking, compute_ranks};
use crate::scoring::points_for;
use crate::tiebreak::{TiebreakContext, approx_eq};

/// Serialized form of a tournament, as loaded from and saved to disk.
///
/// Stored scores are carried along but always recomputed on import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TournamentSnapshot {
    pub name: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub config: Configuration,
    #[serde(default)]
    pub players: Vec<Player>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tournament {
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    config: Configuration,
    /// Registration order; starting numbers are positions in this list
    players: Vec<Player>,
    stage: Stage,
}

impl Tournament {
    pub fn new(name: &str, config: Configuration) -> Result<Self, StandingsError> {
        config.validate()?;
        Ok(Self {
            name: name.to_string(),
            start_date: None,
            end_date: None,
            config,
            players: Vec::new(),
            stage: Stage::TiebreakersFresh,
        })
    }

    /// Loads a snapshot, reporting every problem found rather than the first.
    ///
    /// Short game lists are padded with absences, acceleration counts and
    /// declared totals are checked, the reciprocal records are cross-checked,
    /// and all scores and tiebreakers are recomputed.
    pub fn import(snapshot: TournamentSnapshot) -> Result<Self, ImportErrors> {
        let TournamentSnapshot {
            name,
            start_date,
            end_date,
            config,
            mut players,
        } = snapshot;

        if let Err(e) = config.validate() {
            return Err(ImportErrors { errors: vec![e] });
        }

        let mut errors = Vec::new();
        let mut seen = HashSet::new();
        for player in &players {
            if !seen.insert(player.id) {
                errors.push(StandingsError::DuplicatePlayer(player.id));
            }
        }

        let rounds = players.iter().map(|p| p.games.len()).max().unwrap_or(0) as u32;
        let acceleration_limit = rounds.max(config.expected_rounds);
        for player in &mut players {
            player.pad_games(rounds);
            for (idx, game) in player.games.iter_mut().enumerate() {
                game.round = idx as u32 + 1;
            }
            if player.accelerations.len() > acceleration_limit as usize {
                errors.push(StandingsError::TooManyAccelerations {
                    player: player.id,
                    count: player.accelerations.len(),
                    rounds: acceleration_limit,
                });
            }
            errors.extend(invalid_results(player));
        }

        errors.extend(
            find_pair_contradictions(&players)
                .into_iter()
                .map(StandingsError::from),
        );

        let mut tournament = Self {
            name,
            start_date,
            end_date,
            config,
            players,
            stage: Stage::ScoresStale,
        };
        tournament.recalculate();
        errors.extend(tournament.points_mismatches());

        if errors.is_empty() {
            info!(
                players = tournament.players.len(),
                rounds, "tournament imported"
            );
            Ok(tournament)
        } else {
            warn!(errors = errors.len(), "tournament import rejected");
            Err(ImportErrors { errors })
        }
    }

    pub fn snapshot(&self) -> TournamentSnapshot {
        TournamentSnapshot {
            name: self.name.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            config: self.config.clone(),
            players: self.players.clone(),
        }
    }

    /// Declared totals are accepted when they match the game points alone,
    /// the points with accelerations, or the total before the last round.
    fn points_mismatches(&self) -> Vec<StandingsError> {
        let rounds = self.played_rounds();
        self.players
            .iter()
            .filter_map(|player| {
                let declared = player.declared_points?;
                let games: f64 = player
                    .games
                    .iter()
                    .map(|g| points_for(g, &self.config, false))
                    .sum();
                let computed = player.points_at(rounds);
                let before_last = player.points_at(rounds.saturating_sub(1));
                let accepted = [games, computed, before_last]
                    .iter()
                    .any(|total| approx_eq(*total, declared));
                (!accepted).then_some(StandingsError::PointsMismatch {
                    player: player.id,
                    declared,
                    computed,
                })
            })
            .collect()
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn played_rounds(&self) -> u32 {
        self.players.iter().map(|p| p.games.len()).max().unwrap_or(0) as u32
    }

    fn index_of(&self, id: PlayerId) -> Result<usize, StandingsError> {
        self.players
            .iter()
            .position(|p| p.id == id)
            .ok_or(StandingsError::UnknownPlayer(id))
    }

    /// 1-based starting number, derived from registration order.
    pub fn starting_number(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id).map(|i| i + 1)
    }

    pub fn context(&self) -> TiebreakContext<'_> {
        TiebreakContext::new(&self.config, &self.players)
    }

    /// Players by pairing number for `round`: current rank after the
    /// previous round when configured, starting order otherwise.
    pub fn pairing_order(&self, round: u32) -> Result<Vec<PlayerId>, StandingsError> {
        if self.config.pairing_uses_rank && round > 1 {
            return Ok(self.standings(round - 1)?.order);
        }
        Ok(self.players.iter().map(|p| p.id).collect())
    }

    /// Recomputes every score, then every tiebreaker.
    pub fn recalculate(&mut self) {
        let fresh = ScorePass::new(&mut self.players, &self.config, None, RoundWindow::all()).run();
        self.stage = Stage::ScoresFresh;
        fresh.run_tiebreakers();
        self.stage = Stage::TiebreakersFresh;
        debug!(players = self.players.len(), "full recalculation");
    }

    /// Windowed recalculation for everyone connected to `seeds` (everyone
    /// when `None`), or a full one when the standings were already stale.
    fn refresh(&mut self, seeds: Option<&[PlayerId]>, from_round: u32) {
        if self.stage != Stage::TiebreakersFresh {
            self.recalculate();
            return;
        }
        let affected = seeds.map(|seeds| reachable_from(&self.players, seeds));
        recalculate(
            &mut self.players,
            &self.config,
            affected.as_ref(),
            RoundWindow::starting_at(from_round),
        );
        debug!(
            players = affected.as_ref().map_or(self.players.len(), |a| a.len()),
            from_round, "windowed recalculation"
        );
    }

    /// Ranking after `for_round`. Fails while the standings are stale.
    pub fn standings(&self, for_round: u32) -> Result<Ranking, StandingsError> {
        if self.stage != Stage::TiebreakersFresh {
            return Err(StandingsError::StaleStandings);
        }
        Ok(compute_ranks(&self.context(), for_round))
    }

    /// Pairs of a stored round, in board order.
    pub fn pairs(&self, round: u32) -> Vec<Pair> {
        sort_pairs(&pairs_from_games(&self.players, round), &self.players, round)
    }

    /// Writes a round's pairs; nothing changes if any check fails.
    pub fn apply_pairs(&mut self, round: u32, pairs: &[Pair]) -> Result<(), StandingsError> {
        let mut players = self.players.clone();
        validate_and_assign_pairs(&mut players, round, pairs)?;
        validate_pair_consistency(&players)?;
        self.players = players;

        // Every player gained a record for the round.
        self.refresh(None, round);
        info!(round, boards = pairs.len(), "round applied");
        Ok(())
    }

    /// Reads pairing-generator output for `round` and applies it. Returns the
    /// pairs in board order.
    pub fn apply_pairing_output(&mut self, round: u32, text: &str) -> Result<Vec<Pair>, StandingsError> {
        let order = self.pairing_order(round)?;
        let pairs = sort_pairs(&read_pairing_output(text, &order)?, &self.players, round);
        self.apply_pairs(round, &pairs)?;
        Ok(pairs)
    }

    /// Enters a result from `player`'s point of view; the opponent gets the
    /// mirrored result.
    pub fn set_result(&mut self, round: u32, player: PlayerId, result: GameResult) -> Result<(), StandingsError> {
        let idx = self.index_of(player)?;
        let played = self.played_rounds();
        let game = self.players[idx]
            .game(round)
            .cloned()
            .ok_or(StandingsError::InvalidRound { round, played })?;
        let invalid = || StandingsError::InvalidResult {
            round,
            player,
            result: format!("{result:?}"),
        };

        let mut seeds = vec![player];
        match game.opponent {
            Some(opponent) => {
                let mirrored = result.mirrored().ok_or_else(invalid)?;
                let opp_idx = self.index_of(opponent)?;
                let reciprocal = self.players[opp_idx]
                    .game(round)
                    .is_some_and(|g| g.opponent == Some(player));
                if !reciprocal {
                    return Err(PairingContradiction {
                        round,
                        player,
                        opponent,
                        reason: ContradictionReason::DifferentOpponent,
                    }
                    .into());
                }
                self.players[idx].games[round as usize - 1].result = result;
                self.players[opp_idx].games[round as usize - 1].result = mirrored;
                seeds.push(opponent);
            }
            None => {
                if !(result.is_bye() || result.is_forfeit()) {
                    return Err(invalid());
                }
                self.players[idx].games[round as usize - 1].result = result;
            }
        }

        info!(round, player = %player, ?result, "result entered");
        self.refresh(Some(seeds.as_slice()), round);
        Ok(())
    }

    /// Marks a player absent (or present again) for a round still to be
    /// paired.
    pub fn set_absent(&mut self, player: PlayerId, round: u32, absent: bool) -> Result<(), StandingsError> {
        let idx = self.index_of(player)?;
        if absent {
            self.players[idx].absent_rounds.insert(round);
        } else {
            self.players[idx].absent_rounds.remove(&round);
        }
        Ok(())
    }

    /// Sets the acceleration credited at `round`.
    pub fn set_acceleration(&mut self, player: PlayerId, round: u32, points: f64) -> Result<(), StandingsError> {
        let idx = self.index_of(player)?;
        let limit = self.played_rounds().max(self.config.expected_rounds);
        if round == 0 || round > limit {
            return Err(StandingsError::TooManyAccelerations {
                player,
                count: round as usize,
                rounds: limit,
            });
        }
        let accelerations = &mut self.players[idx].accelerations;
        if accelerations.len() < round as usize {
            accelerations.resize(round as usize, 0.0);
        }
        accelerations[round as usize - 1] = points;
        self.refresh(Some(&[player][..]), round);
        Ok(())
    }

    /// Replaces the configuration. Tiebreaker keys no longer configured are
    /// dropped right away; the standings stay stale until
    /// [`recalculate`](Self::recalculate).
    pub fn set_configuration(&mut self, config: Configuration) -> Result<(), StandingsError> {
        config.validate()?;
        let configured: BTreeSet<_> = config.scalar_tiebreakers().collect();
        for score in self.players.iter_mut().flat_map(|p| p.scores.iter_mut()) {
            score.tiebreakers.retain(|tb, _| configured.contains(tb));
        }
        self.config = config;
        self.stage = Stage::ScoresStale;
        info!("configuration replaced");
        Ok(())
    }

    /// Registers a player. Late entrants are absent for the rounds already
    /// played.
    pub fn add_player(&mut self, mut player: Player) -> Result<PlayerId, StandingsError> {
        if self.players.iter().any(|p| p.id == player.id) {
            return Err(StandingsError::DuplicatePlayer(player.id));
        }
        let rounds = self.played_rounds();
        let known = player.games.len() as u32;
        if known > rounds {
            return Err(StandingsError::InvalidRound {
                round: known,
                played: rounds,
            });
        }
        player.absent_rounds.extend(known + 1..=rounds);
        player.pad_games(rounds);
        let id = player.id;

        self.players.push(player);
        if let Err(contradiction) = validate_pair_consistency(&self.players) {
            self.players.pop();
            return Err(contradiction.into());
        }
        info!(player = %id, "player added");
        self.refresh(Some(&[id][..]), 1);
        Ok(id)
    }

    /// Removes a player nobody has a game against. Starting numbers of later
    /// players shift down by one.
    pub fn remove_player(&mut self, id: PlayerId) -> Result<Player, StandingsError> {
        let idx = self.index_of(id)?;
        for other in &self.players {
            if let Some(game) = other.games.iter().find(|g| g.opponent == Some(id)) {
                return Err(StandingsError::PlayerReferenced {
                    player: id,
                    by: other.id,
                    round: game.round,
                });
            }
        }
        let removed = self.players.remove(idx);
        info!(player = %id, "player removed");
        Ok(removed)
    }
}

fn invalid_results(player: &Player) -> Vec<StandingsError> {
    player
        .games
        .iter()
        .filter(|game| {
            let needs_opponent = game.result.is_over_the_board();
            let needs_none = game.result.is_bye();
            (needs_opponent && game.opponent.is_none()) || (needs_none && game.opponent.is_some())
        })
        .map(|game: &Game| StandingsError::InvalidResult {
            round: game.round,
            player: player.id,
            result: format!("{:?}", game.result),
        })
        .collect()
}

#[cfg(test)]
#[path = "tournament_tests.rs"]
mod tournament_tests;
