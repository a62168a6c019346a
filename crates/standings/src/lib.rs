//! Standings engine for Swiss and round-robin chess tournaments
//!
//! This crate provides:
//! - Point resolution for every kind of game result and bye
//! - Cross-checking of the two players' records of each game
//! - Twenty-one federation tiebreak systems and a tie-broken ranking
//! - Reading pairing-generator output into round records
//!
//! # Usage
//!
//! ```bash
//! # Print standings after the last round
//! cargo run -p standings -- standings event.json --config rules.toml
//!
//! # Apply the pairing generator's output as the next round
//! cargo run -p standings -- apply-round event.json pairings.txt --round 5
//! ```

pub mod config;
pub mod consistency;
pub mod error;
pub mod export;
pub mod model;
pub mod opposition;
pub mod pairing;
pub mod pipeline;
pub mod ranking;
pub mod scoring;
pub mod tiebreak;
pub mod tournament;

#[cfg(test)]
mod test_support;

pub use config::Configuration;
pub use consistency::{find_pair_contradictions, validate_pair_consistency};
pub use error::{ContradictionReason, ImportErrors, PairingContradiction, StandingsError};
pub use export::{StandingsRow, render_table, standings_rows};
pub use model::{Color, Game, GameResult, Player, PlayerId, Score};
pub use pairing::{Pair, PairingSession};
pub use pipeline::{RoundWindow, Stage};
pub use ranking::{Ranking, compute_ranks, sort_by_rank};
pub use tiebreak::{TiebreakContext, Tiebreaker};
pub use tournament::{Tournament, TournamentSnapshot};
