//! Cross-check of reciprocal game records.
//!
//! Both players of a game store their own copy of it. After any import or
//! bulk mutation the copies have to be checked against each other: for every
//! played game, the opponent's record for the same round must exist, must
//! also be played, must carry the other color and must name this player.

use std::collections::HashMap;
use tracing::warn;

use crate::error::{ContradictionReason, PairingContradiction};
use crate::model::{Player, PlayerId};
use crate::scoring::game_was_played;

/// Returns the first contradiction found, in player then round order.
pub fn validate_pair_consistency(players: &[Player]) -> Result<(), PairingContradiction> {
    match check(players, true).into_iter().next() {
        Some(contradiction) => Err(contradiction),
        None => Ok(()),
    }
}

/// Collects every contradiction, for reports that list all problems at once.
pub fn find_pair_contradictions(players: &[Player]) -> Vec<PairingContradiction> {
    check(players, false)
}

fn check(players: &[Player], stop_at_first: bool) -> Vec<PairingContradiction> {
    let by_id: HashMap<PlayerId, &Player> = players.iter().map(|p| (p.id, p)).collect();
    let mut found = Vec::new();

    for player in players {
        for game in player.games.iter().filter(|g| game_was_played(g)) {
            // game_was_played guarantees both fields
            let (Some(opponent_id), Some(color)) = (game.opponent, game.color) else {
                continue;
            };

            let reason = match by_id.get(&opponent_id) {
                None => Some(ContradictionReason::UnknownOpponent),
                Some(opponent) => match opponent.game(game.round) {
                    None => Some(ContradictionReason::MissingRecord),
                    Some(theirs) if theirs.opponent != Some(player.id) => {
                        Some(ContradictionReason::DifferentOpponent)
                    }
                    Some(theirs) if !game_was_played(theirs) => Some(ContradictionReason::NotPlayed),
                    Some(theirs) if theirs.color != Some(color.other()) => {
                        Some(ContradictionReason::SameColor)
                    }
                    Some(_) => None,
                },
            };

            if let Some(reason) = reason {
                let contradiction = PairingContradiction {
                    round: game.round,
                    player: player.id,
                    opponent: opponent_id,
                    reason,
                };
                warn!(%contradiction, "reciprocal record mismatch");
                found.push(contradiction);
                if stop_at_first {
                    return found;
                }
            }
        }
    }

    found
}

#[cfg(test)]
#[path = "consistency_tests.rs"]
mod consistency_tests;
