//! Tournament data model: players, their per-round games and scores.
//!
//! Each player carries its own copy of every pairing it took part in. The two
//! halves of a pairing are kept in sync by the pairing applier and checked by
//! [`crate::consistency`], never by shared storage.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use uuid::Uuid;

use crate::tiebreak::Tiebreaker;

/// Opaque, stable player identity.
///
/// Display numbers (starting rank, pairing number) are projections of the
/// tournament's player order and never stored in game records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(Uuid);

impl PlayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn other(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

/// Outcome of a round from one player's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    Win,
    Draw,
    Loss,
    ForfeitWin,
    ForfeitLoss,
    /// Played over the board but excluded from rating (e.g. less than one move).
    UnratedWin,
    UnratedDraw,
    UnratedLoss,
    HalfPointBye,
    FullPointBye,
    ZeroPointBye,
    PairingAllocatedBye,
    /// Paired, result not entered yet.
    Unassigned,
}

impl GameResult {
    pub fn is_forfeit(self) -> bool {
        matches!(self, GameResult::ForfeitWin | GameResult::ForfeitLoss)
    }

    pub fn is_bye(self) -> bool {
        matches!(
            self,
            GameResult::HalfPointBye
                | GameResult::FullPointBye
                | GameResult::ZeroPointBye
                | GameResult::PairingAllocatedBye
        )
    }

    /// Over-the-board outcomes, the only ones that count as a played game.
    pub fn is_over_the_board(self) -> bool {
        matches!(
            self,
            GameResult::Win
                | GameResult::Draw
                | GameResult::Loss
                | GameResult::UnratedWin
                | GameResult::UnratedDraw
                | GameResult::UnratedLoss
        )
    }

    pub fn is_win(self) -> bool {
        matches!(self, GameResult::Win | GameResult::UnratedWin)
    }

    pub fn is_draw(self) -> bool {
        matches!(self, GameResult::Draw | GameResult::UnratedDraw)
    }

    pub fn is_loss(self) -> bool {
        matches!(self, GameResult::Loss | GameResult::UnratedLoss)
    }

    /// The result the opponent must record for the same game.
    ///
    /// Byes have no opponent and therefore no mirror.
    pub fn mirrored(self) -> Option<GameResult> {
        let mirror = match self {
            GameResult::Win => GameResult::Loss,
            GameResult::Loss => GameResult::Win,
            GameResult::Draw => GameResult::Draw,
            GameResult::ForfeitWin => GameResult::ForfeitLoss,
            GameResult::ForfeitLoss => GameResult::ForfeitWin,
            GameResult::UnratedWin => GameResult::UnratedLoss,
            GameResult::UnratedLoss => GameResult::UnratedWin,
            GameResult::UnratedDraw => GameResult::UnratedDraw,
            GameResult::Unassigned => GameResult::Unassigned,
            GameResult::HalfPointBye
            | GameResult::FullPointBye
            | GameResult::ZeroPointBye
            | GameResult::PairingAllocatedBye => return None,
        };
        Some(mirror)
    }
}

/// One player's record of a single round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// 1-based round number
    pub round: u32,
    /// None for byes and absences
    pub opponent: Option<PlayerId>,
    pub color: Option<Color>,
    pub result: GameResult,
}

impl Game {
    pub fn paired(round: u32, opponent: PlayerId, color: Color, result: GameResult) -> Self {
        Self {
            round,
            opponent: Some(opponent),
            color: Some(color),
            result,
        }
    }

    pub fn bye(round: u32, result: GameResult) -> Self {
        Self {
            round,
            opponent: None,
            color: None,
            result,
        }
    }

    /// Record used to fill rounds a player has no entry for.
    pub fn absent(round: u32) -> Self {
        Self::bye(round, GameResult::ZeroPointBye)
    }
}

/// Cumulative standing of a player after a round.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub round: u32,
    /// Points through this round, acceleration included
    pub points: f64,
    /// Configured scalar tiebreakers at this round
    #[serde(default)]
    pub tiebreakers: BTreeMap<Tiebreaker, f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// 0 means unrated
    #[serde(default)]
    pub rating: u16,
    #[serde(default)]
    pub federation: Option<String>,
    #[serde(default)]
    pub fide_id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    /// Index = round - 1
    #[serde(default)]
    pub games: Vec<Game>,
    /// Parallel to `games`
    #[serde(default)]
    pub scores: Vec<Score>,
    /// Bonus points per round, index = round - 1
    #[serde(default)]
    pub accelerations: Vec<f64>,
    /// Rounds the player is absent, withdrawn or not yet arrived
    #[serde(default)]
    pub absent_rounds: BTreeSet<u32>,
    /// Total points stated by the imported file, checked on import
    #[serde(default)]
    pub declared_points: Option<f64>,
}

impl Player {
    pub fn new(name: &str, rating: u16) -> Self {
        Self {
            id: PlayerId::new(),
            name: name.to_string(),
            rating,
            federation: None,
            fide_id: None,
            title: None,
            games: Vec::new(),
            scores: Vec::new(),
            accelerations: Vec::new(),
            absent_rounds: BTreeSet::new(),
            declared_points: None,
        }
    }

    /// Game record for a 1-based round.
    pub fn game(&self, round: u32) -> Option<&Game> {
        round
            .checked_sub(1)
            .and_then(|idx| self.games.get(idx as usize))
    }

    /// Score record for a 1-based round.
    pub fn score(&self, round: u32) -> Option<&Score> {
        round
            .checked_sub(1)
            .and_then(|idx| self.scores.get(idx as usize))
    }

    /// Cumulative points after `round`; 0 before round 1, last known total
    /// past the end.
    pub fn points_at(&self, round: u32) -> f64 {
        if round == 0 || self.scores.is_empty() {
            return 0.0;
        }
        let idx = (round as usize).min(self.scores.len()) - 1;
        self.scores[idx].points
    }

    /// Acceleration credited at a 1-based round.
    pub fn acceleration(&self, round: u32) -> f64 {
        round
            .checked_sub(1)
            .and_then(|idx| self.accelerations.get(idx as usize))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn is_absent(&self, round: u32) -> bool {
        self.absent_rounds.contains(&round)
    }

    /// Pads `games` with absence records up to `rounds` entries.
    pub fn pad_games(&mut self, rounds: u32) {
        while (self.games.len() as u32) < rounds {
            let round = self.games.len() as u32 + 1;
            self.games.push(Game::absent(round));
        }
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod model_tests;
