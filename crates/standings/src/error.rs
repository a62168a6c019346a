//! Error taxonomy shared by validators, the pairing applier and import.
//!
//! Errors are plain values carrying the round and player identifiers an
//! arbiter needs to fix the source data.

use std::fmt;
use thiserror::Error;

use crate::model::PlayerId;

/// A played game whose two halves disagree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("pairing contradiction in round {round}: {player} vs {opponent}: {reason}")]
pub struct PairingContradiction {
    pub round: u32,
    pub player: PlayerId,
    pub opponent: PlayerId,
    pub reason: ContradictionReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContradictionReason {
    /// Opponent is not part of the tournament
    UnknownOpponent,
    /// Opponent has no record for the round
    MissingRecord,
    /// Opponent's record is a forfeit, bye or unpaired
    NotPlayed,
    /// Opponent's record names someone else
    DifferentOpponent,
    /// Both sides recorded the same color
    SameColor,
}

impl fmt::Display for ContradictionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ContradictionReason::UnknownOpponent => "opponent is not registered",
            ContradictionReason::MissingRecord => "opponent has no record for this round",
            ContradictionReason::NotPlayed => "opponent's record is not a played game",
            ContradictionReason::DifferentOpponent => "opponent's record names another player",
            ContradictionReason::SameColor => "both players have the same color",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StandingsError {
    #[error("invalid line {line}: {content:?}")]
    InvalidLine { line: usize, content: String },

    #[error("invalid value on line {line}: {value:?}")]
    InvalidValue { line: usize, value: String },

    #[error("invalid number on line {line}: {value:?}")]
    InvalidNumber { line: usize, value: String },

    #[error(transparent)]
    PairingContradiction(#[from] PairingContradiction),

    #[error("round {round}: player {player} is unpaired without an absence or bye")]
    PairingError { round: u32, player: PlayerId },

    #[error("round {round}: player {player} is assigned more than once")]
    InvalidPair { round: u32, player: PlayerId },

    #[error("player {player}: declared {declared} points but results give {computed}")]
    PointsMismatch {
        player: PlayerId,
        declared: f64,
        computed: f64,
    },

    #[error("player {player}: {count} acceleration entries for {rounds} rounds")]
    TooManyAccelerations {
        player: PlayerId,
        count: usize,
        rounds: u32,
    },

    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("player {0} is registered twice")]
    DuplicatePlayer(PlayerId),

    #[error("round {round}: result {result} is not valid for player {player}")]
    InvalidResult {
        round: u32,
        player: PlayerId,
        result: String,
    },

    #[error("player {player} is still referenced by {by} in round {round}")]
    PlayerReferenced {
        player: PlayerId,
        by: PlayerId,
        round: u32,
    },

    #[error("round {round} does not exist (tournament has {played} rounds)")]
    InvalidRound { round: u32, played: u32 },

    #[error("standings are stale, recalculate before reading them")]
    StaleStandings,

    #[error("configuration error: {0}")]
    Config(String),
}

/// All problems found while importing a tournament snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportErrors {
    pub errors: Vec<StandingsError>,
}

impl fmt::Display for ImportErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} import error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ImportErrors {}

impl ImportErrors {
    pub fn contradictions(&self) -> impl Iterator<Item = &PairingContradiction> {
        self.errors.iter().filter_map(|e| match e {
            StandingsError::PairingContradiction(c) => Some(c),
            _ => None,
        })
    }
}
