//! Turning a round's pairings into game records.
//!
//! Pairings come from three places: the text printed by the external pairing
//! generator, the game records of a round already stored, or a list edited by
//! hand through [`PairingSession`]. All of them end in
//! [`validate_and_assign_pairs`], which writes both halves of every game or
//! nothing at all.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::error::StandingsError;
use crate::model::{Color, Game, GameResult, Player, PlayerId};

/// One board. `black = None` is a pairing-allocated bye for `white`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair {
    pub white: PlayerId,
    pub black: Option<PlayerId>,
}

impl Pair {
    pub fn game(white: PlayerId, black: PlayerId) -> Self {
        Self {
            white,
            black: Some(black),
        }
    }

    pub fn bye(player: PlayerId) -> Self {
        Self {
            white: player,
            black: None,
        }
    }

    pub fn is_bye(&self) -> bool {
        self.black.is_none()
    }

    pub fn players(&self) -> impl Iterator<Item = PlayerId> {
        std::iter::once(self.white).chain(self.black)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.white == id || self.black == Some(id)
    }
}

fn parse_index(token: &str, line: usize, order: &[PlayerId]) -> Result<Option<PlayerId>, StandingsError> {
    let number: usize = token.parse().map_err(|_| StandingsError::InvalidNumber {
        line,
        value: token.to_string(),
    })?;
    match number {
        0 => Ok(None),
        n if n <= order.len() => Ok(Some(order[n - 1])),
        _ => Err(StandingsError::InvalidValue {
            line,
            value: token.to_string(),
        }),
    }
}

/// Parses pairing-generator output.
///
/// Each line holds two whitespace-separated 1-based pairing numbers, white
/// first; `0` on either side means the other player gets the bye. A leading
/// line with a single number is the pair count and must match. `order` maps
/// pairing numbers to players.
pub fn read_pairing_output(text: &str, order: &[PlayerId]) -> Result<Vec<Pair>, StandingsError> {
    let mut pairs = Vec::new();
    let mut declared_count: Option<(usize, usize)> = None;

    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        match tokens.as_slice() {
            [] => continue,
            [count] if pairs.is_empty() && declared_count.is_none() => {
                let count = count.parse().map_err(|_| StandingsError::InvalidNumber {
                    line,
                    value: count.to_string(),
                })?;
                declared_count = Some((count, line));
            }
            [white, black] => {
                let pair = match (parse_index(white, line, order)?, parse_index(black, line, order)?) {
                    (Some(w), Some(b)) => Pair::game(w, b),
                    (Some(p), None) | (None, Some(p)) => Pair::bye(p),
                    (None, None) => {
                        return Err(StandingsError::InvalidLine {
                            line,
                            content: raw.to_string(),
                        });
                    }
                };
                pairs.push(pair);
            }
            _ => {
                return Err(StandingsError::InvalidLine {
                    line,
                    content: raw.to_string(),
                });
            }
        }
    }

    if let Some((count, line)) = declared_count {
        if count != pairs.len() {
            return Err(StandingsError::InvalidValue {
                line,
                value: format!("{count} pairs declared, {} listed", pairs.len()),
            });
        }
    }

    debug!(pairs = pairs.len(), "pairing output read");
    Ok(pairs)
}

/// Re-derives the pairs of a stored round from the game records.
///
/// Games come out white first; colorless games (e.g. forfeits entered without
/// colors) list the earlier-registered player first. Only pairing-allocated
/// byes are pairs; other byes and absences are not.
pub fn pairs_from_games(players: &[Player], round: u32) -> Vec<Pair> {
    let position: HashMap<PlayerId, usize> =
        players.iter().enumerate().map(|(i, p)| (p.id, i)).collect();

    players
        .iter()
        .enumerate()
        .filter_map(|(i, player)| {
            let game = player.game(round)?;
            match (game.opponent, game.color) {
                (Some(opponent), Some(Color::White)) => Some(Pair::game(player.id, opponent)),
                (Some(_), Some(Color::Black)) => None,
                (Some(opponent), None) => {
                    let theirs = position.get(&opponent).copied().unwrap_or(usize::MAX);
                    (i < theirs).then(|| Pair::game(player.id, opponent))
                }
                (None, _) if game.result == GameResult::PairingAllocatedBye => {
                    Some(Pair::bye(player.id))
                }
                (None, _) => None,
            }
        })
        .collect()
}

/// Board order: by each pair's higher-ranked member, byes last.
///
/// Members are compared by score after `round - 1`, then by starting rank.
pub fn sort_pairs(pairs: &[Pair], players: &[Player], round: u32) -> Vec<Pair> {
    let previous = round.saturating_sub(1);
    let standing: HashMap<PlayerId, (f64, usize)> = players
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id, (p.points_at(previous), i)))
        .collect();
    let key = |id: PlayerId| standing.get(&id).copied().unwrap_or((f64::MIN, usize::MAX));
    let better = |a: (f64, usize), b: (f64, usize)| {
        b.0.total_cmp(&a.0).then(a.1.cmp(&b.1))
    };
    let head = |pair: &Pair| {
        pair.players()
            .map(key)
            .min_by(|a, b| better(*a, *b))
            .unwrap_or((f64::MIN, usize::MAX))
    };

    let mut sorted = pairs.to_vec();
    sorted.sort_by(|a, b| {
        a.is_bye()
            .cmp(&b.is_bye())
            .then_with(|| better(head(a), head(b)))
    });
    sorted
}

/// Manual pairing edits for one round.
///
/// Every player is either on exactly one board or in the unpaired pool.
#[derive(Debug, Clone, PartialEq)]
pub struct PairingSession {
    round: u32,
    pairs: Vec<Pair>,
    unpaired: Vec<PlayerId>,
}

impl PairingSession {
    /// Empty boards, every player in the pool (in starting order).
    pub fn new(round: u32, players: &[Player]) -> Self {
        Self {
            round,
            pairs: Vec::new(),
            unpaired: players.iter().map(|p| p.id).collect(),
        }
    }

    /// Starts from existing pairs, rejecting double assignments.
    pub fn with_pairs(round: u32, players: &[Player], pairs: &[Pair]) -> Result<Self, StandingsError> {
        let mut session = Self::new(round, players);
        for pair in pairs {
            session.add_pair(*pair)?;
        }
        Ok(session)
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    pub fn unpaired(&self) -> &[PlayerId] {
        &self.unpaired
    }

    /// Adds a board. Both players must currently be in the pool.
    pub fn add_pair(&mut self, pair: Pair) -> Result<(), StandingsError> {
        if pair.black == Some(pair.white) {
            return Err(StandingsError::InvalidPair {
                round: self.round,
                player: pair.white,
            });
        }
        if let Some(taken) = pair.players().find(|id| !self.unpaired.contains(id)) {
            return Err(StandingsError::InvalidPair {
                round: self.round,
                player: taken,
            });
        }
        self.unpaired.retain(|id| !pair.contains(*id));
        self.pairs.push(pair);
        Ok(())
    }

    /// Removes the board at `index`, returning its players to the pool.
    pub fn remove_pair(&mut self, index: usize) -> Option<Pair> {
        if index >= self.pairs.len() {
            return None;
        }
        let pair = self.pairs.remove(index);
        self.unpaired.extend(pair.players());
        Some(pair)
    }

    pub fn into_pairs(self) -> Vec<Pair> {
        self.pairs
    }
}

/// Checks a round's pairs and writes them into both players' records.
///
/// Fails with `InvalidPair` when a player is on two boards (or paired with
/// themself) and with `PairingError` when a player is on no board without
/// being marked absent. Nothing is written unless every check passes.
/// Paired games start as `Unassigned`; bye pairs become pairing-allocated
/// byes and absent players get a zero-point bye. `round` may replace an
/// existing round or append the next one.
pub fn validate_and_assign_pairs(
    players: &mut [Player],
    round: u32,
    pairs: &[Pair],
) -> Result<(), StandingsError> {
    let played = players.iter().map(|p| p.games.len()).max().unwrap_or(0) as u32;
    if round == 0 || round > played + 1 {
        return Err(StandingsError::InvalidRound { round, played });
    }

    let position: HashMap<PlayerId, usize> =
        players.iter().enumerate().map(|(i, p)| (p.id, i)).collect();
    let mut assigned: HashSet<PlayerId> = HashSet::new();
    let mut writes: Vec<(usize, Game)> = Vec::with_capacity(players.len());

    for pair in pairs {
        for id in pair.players() {
            if !position.contains_key(&id) {
                return Err(StandingsError::UnknownPlayer(id));
            }
            if !assigned.insert(id) {
                return Err(StandingsError::InvalidPair { round, player: id });
            }
        }
        let white = position[&pair.white];
        match pair.black {
            Some(black_id) => {
                let black = position[&black_id];
                writes.push((
                    white,
                    Game::paired(round, black_id, Color::White, GameResult::Unassigned),
                ));
                writes.push((
                    black,
                    Game::paired(round, pair.white, Color::Black, GameResult::Unassigned),
                ));
            }
            None => writes.push((white, Game::bye(round, GameResult::PairingAllocatedBye))),
        }
    }

    for (idx, player) in players.iter().enumerate() {
        if assigned.contains(&player.id) {
            continue;
        }
        if !player.is_absent(round) {
            return Err(StandingsError::PairingError {
                round,
                player: player.id,
            });
        }
        writes.push((idx, Game::absent(round)));
    }

    for (idx, game) in writes {
        let player = &mut players[idx];
        player.pad_games(round - 1);
        let slot = round as usize - 1;
        if slot < player.games.len() {
            player.games[slot] = game;
        } else {
            player.games.push(game);
        }
    }
    let rounds = played.max(round);
    for player in players.iter_mut() {
        player.pad_games(rounds);
    }

    info!(round, boards = pairs.len(), "pairings assigned");
    Ok(())
}

#[cfg(test)]
#[path = "pairing_tests.rs"]
mod pairing_tests;
