//! Tournament configuration: point schedule and tiebreak order.

use serde::{Deserialize, Serialize};

use crate::error::StandingsError;
use crate::tiebreak::Tiebreaker;

/// Point values and tiebreak order for a tournament.
///
/// Loaded from TOML by the CLI; every field has a default so a partial file is
/// enough:
///
/// ```toml
/// points_for_win = 3.0
/// points_for_draw = 1.0
/// tiebreakers = ["DIRECT_ENCOUNTER", "SONNEBORN_BERGER"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub points_for_win: f64,
    pub points_for_draw: f64,
    pub points_for_loss: f64,
    pub points_for_zero_point_bye: f64,
    pub points_for_forfeit_loss: f64,
    pub points_for_pairing_allocated_bye: f64,
    /// Applied in priority order after the score
    pub tiebreakers: Vec<Tiebreaker>,
    /// Planned number of rounds (0 = unknown)
    pub expected_rounds: u32,
    /// Number players by current rank instead of starting rank when talking
    /// to the pairing generator
    pub pairing_uses_rank: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            points_for_win: 1.0,
            points_for_draw: 0.5,
            points_for_loss: 0.0,
            points_for_zero_point_bye: 0.0,
            points_for_forfeit_loss: 0.0,
            points_for_pairing_allocated_bye: 1.0,
            tiebreakers: vec![
                Tiebreaker::BuchholzCut1,
                Tiebreaker::Buchholz,
                Tiebreaker::SonnebornBerger,
            ],
            expected_rounds: 0,
            pairing_uses_rank: false,
        }
    }
}

impl Configuration {
    pub fn from_toml_str(contents: &str) -> Result<Self, StandingsError> {
        let config: Configuration =
            toml::from_str(contents).map_err(|e| StandingsError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, StandingsError> {
        toml::to_string_pretty(self).map_err(|e| StandingsError::Config(e.to_string()))
    }

    /// Rejects schedules the tiebreak formulas cannot work with.
    pub fn validate(&self) -> Result<(), StandingsError> {
        let values = [
            ("points_for_win", self.points_for_win),
            ("points_for_draw", self.points_for_draw),
            ("points_for_loss", self.points_for_loss),
            ("points_for_zero_point_bye", self.points_for_zero_point_bye),
            ("points_for_forfeit_loss", self.points_for_forfeit_loss),
            (
                "points_for_pairing_allocated_bye",
                self.points_for_pairing_allocated_bye,
            ),
        ];
        for (name, value) in values {
            if !value.is_finite() || value < 0.0 {
                return Err(StandingsError::Config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.points_for_win <= 0.0 {
            return Err(StandingsError::Config(
                "points_for_win must be positive".to_string(),
            ));
        }
        for (i, tb) in self.tiebreakers.iter().enumerate() {
            if self.tiebreakers[..i].contains(tb) {
                return Err(StandingsError::Config(format!(
                    "tiebreaker {tb} listed twice"
                )));
            }
        }
        Ok(())
    }

    /// Configured tiebreakers that have a per-player value.
    pub fn scalar_tiebreakers(&self) -> impl Iterator<Item = Tiebreaker> + '_ {
        self.tiebreakers.iter().copied().filter(|tb| tb.is_scalar())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
