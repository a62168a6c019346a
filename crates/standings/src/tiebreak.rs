//! Tiebreak systems and their dispatcher.
//!
//! Every tiebreak except direct encounter is a pure function
//! `(context, player, for_round) -> f64` over scores and games already
//! finalised through `for_round`. Direct encounter only means something
//! among tied players and lives in [`direct_encounter`] and
//! [`direct_encounter_score`].
//!
//! Opponent-score based systems (Buchholz family, Sonneborn-Berger, Solkoff,
//! Koya, cumulative) are in [`crate::opposition`]; counting and rating
//! metrics are here.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::config::Configuration;
use crate::model::{Color, Game, GameResult, Player, PlayerId};
use crate::opposition;
use crate::scoring::{game_was_played, points_for};

/// Rating difference credited per win or loss in opposition performance.
pub const PERFORMANCE_OFFSET: f64 = 400.0;

/// Kashdan weights for win, draw and loss.
const KASHDAN_WIN: f64 = 4.0;
const KASHDAN_DRAW: f64 = 2.0;
const KASHDAN_LOSS: f64 = 1.0;

const EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tiebreaker {
    Cumulative,
    #[serde(rename = "CUMULATIVE_CUT1")]
    CumulativeCut1,
    OppositionCumulative,
    Buchholz,
    #[serde(rename = "BUCHHOLZ_CUT1")]
    BuchholzCut1,
    #[serde(rename = "BUCHHOLZ_CUT2")]
    BuchholzCut2,
    BuchholzMedian,
    BuchholzModifiedMedian,
    SonnebornBerger,
    Solkoff,
    Koya,
    DirectEncounter,
    AverageRatingOfOpponents,
    #[serde(rename = "AVERAGE_RATING_OF_OPPONENTS_CUT1")]
    AverageRatingOfOpponentsCut1,
    OppositionPerformance,
    RoundsWon,
    RoundsWonWithBlack,
    GamesPlayed,
    GamesPlayedWithBlack,
    Kashdan,
    TimeOfLoss,
}

impl Tiebreaker {
    pub const ALL: [Tiebreaker; 21] = [
        Tiebreaker::Cumulative,
        Tiebreaker::CumulativeCut1,
        Tiebreaker::OppositionCumulative,
        Tiebreaker::Buchholz,
        Tiebreaker::BuchholzCut1,
        Tiebreaker::BuchholzCut2,
        Tiebreaker::BuchholzMedian,
        Tiebreaker::BuchholzModifiedMedian,
        Tiebreaker::SonnebornBerger,
        Tiebreaker::Solkoff,
        Tiebreaker::Koya,
        Tiebreaker::DirectEncounter,
        Tiebreaker::AverageRatingOfOpponents,
        Tiebreaker::AverageRatingOfOpponentsCut1,
        Tiebreaker::OppositionPerformance,
        Tiebreaker::RoundsWon,
        Tiebreaker::RoundsWonWithBlack,
        Tiebreaker::GamesPlayed,
        Tiebreaker::GamesPlayedWithBlack,
        Tiebreaker::Kashdan,
        Tiebreaker::TimeOfLoss,
    ];

    /// Whether the tiebreak yields a per-player value. Direct encounter only
    /// orders pairs of players.
    pub fn is_scalar(self) -> bool {
        self != Tiebreaker::DirectEncounter
    }

    /// Configuration / serialization name.
    pub fn name(self) -> &'static str {
        match self {
            Tiebreaker::Cumulative => "CUMULATIVE",
            Tiebreaker::CumulativeCut1 => "CUMULATIVE_CUT1",
            Tiebreaker::OppositionCumulative => "OPPOSITION_CUMULATIVE",
            Tiebreaker::Buchholz => "BUCHHOLZ",
            Tiebreaker::BuchholzCut1 => "BUCHHOLZ_CUT1",
            Tiebreaker::BuchholzCut2 => "BUCHHOLZ_CUT2",
            Tiebreaker::BuchholzMedian => "BUCHHOLZ_MEDIAN",
            Tiebreaker::BuchholzModifiedMedian => "BUCHHOLZ_MODIFIED_MEDIAN",
            Tiebreaker::SonnebornBerger => "SONNEBORN_BERGER",
            Tiebreaker::Solkoff => "SOLKOFF",
            Tiebreaker::Koya => "KOYA",
            Tiebreaker::DirectEncounter => "DIRECT_ENCOUNTER",
            Tiebreaker::AverageRatingOfOpponents => "AVERAGE_RATING_OF_OPPONENTS",
            Tiebreaker::AverageRatingOfOpponentsCut1 => "AVERAGE_RATING_OF_OPPONENTS_CUT1",
            Tiebreaker::OppositionPerformance => "OPPOSITION_PERFORMANCE",
            Tiebreaker::RoundsWon => "ROUNDS_WON",
            Tiebreaker::RoundsWonWithBlack => "ROUNDS_WON_WITH_BLACK",
            Tiebreaker::GamesPlayed => "GAMES_PLAYED",
            Tiebreaker::GamesPlayedWithBlack => "GAMES_PLAYED_WITH_BLACK",
            Tiebreaker::Kashdan => "KASHDAN",
            Tiebreaker::TimeOfLoss => "TIME_OF_LOSS",
        }
    }

    /// Short column header for standings tables.
    pub fn abbreviation(self) -> &'static str {
        match self {
            Tiebreaker::Cumulative => "Cum",
            Tiebreaker::CumulativeCut1 => "Cum-C1",
            Tiebreaker::OppositionCumulative => "OpCum",
            Tiebreaker::Buchholz => "BH",
            Tiebreaker::BuchholzCut1 => "BH-C1",
            Tiebreaker::BuchholzCut2 => "BH-C2",
            Tiebreaker::BuchholzMedian => "BH-M",
            Tiebreaker::BuchholzModifiedMedian => "BH-MM",
            Tiebreaker::SonnebornBerger => "SB",
            Tiebreaker::Solkoff => "Solk",
            Tiebreaker::Koya => "Koya",
            Tiebreaker::DirectEncounter => "DE",
            Tiebreaker::AverageRatingOfOpponents => "ARO",
            Tiebreaker::AverageRatingOfOpponentsCut1 => "AROC1",
            Tiebreaker::OppositionPerformance => "OPerf",
            Tiebreaker::RoundsWon => "Won",
            Tiebreaker::RoundsWonWithBlack => "WonB",
            Tiebreaker::GamesPlayed => "GP",
            Tiebreaker::GamesPlayedWithBlack => "GPB",
            Tiebreaker::Kashdan => "Kash",
            Tiebreaker::TimeOfLoss => "ToL",
        }
    }
}

impl fmt::Display for Tiebreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tiebreaker {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Tiebreaker::ALL
            .into_iter()
            .find(|tb| tb.name() == wanted)
            .ok_or_else(|| format!("unknown tiebreaker: {s}"))
    }
}

/// Read-only view of the tournament handed to every calculator.
pub struct TiebreakContext<'a> {
    pub config: &'a Configuration,
    players: &'a [Player],
    index: HashMap<PlayerId, usize>,
}

impl<'a> TiebreakContext<'a> {
    pub fn new(config: &'a Configuration, players: &'a [Player]) -> Self {
        let index = players.iter().enumerate().map(|(i, p)| (p.id, i)).collect();
        Self {
            config,
            players,
            index,
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&'a Player> {
        self.index.get(&id).map(|&i| &self.players[i])
    }

    pub fn players(&self) -> &'a [Player] {
        self.players
    }

    /// Opponent record of a played game, if the opponent is registered.
    pub fn opponent(&self, game: &Game) -> Option<&'a Player> {
        if !game_was_played(game) {
            return None;
        }
        game.opponent.and_then(|id| self.player(id))
    }
}

/// Computes one tiebreak for `player` after `for_round`.
///
/// Returns `None` only for [`Tiebreaker::DirectEncounter`], which has no
/// per-player value.
pub fn calculate(
    tiebreaker: Tiebreaker,
    ctx: &TiebreakContext<'_>,
    player: &Player,
    for_round: u32,
) -> Option<f64> {
    let value = match tiebreaker {
        Tiebreaker::Cumulative => opposition::cumulative(ctx, player, for_round, false),
        Tiebreaker::CumulativeCut1 => opposition::cumulative(ctx, player, for_round, true),
        Tiebreaker::OppositionCumulative => opposition::opposition_cumulative(ctx, player, for_round),
        Tiebreaker::Buchholz => opposition::buchholz(ctx, player, for_round),
        Tiebreaker::BuchholzCut1 => opposition::buchholz_cut(ctx, player, for_round, 1),
        Tiebreaker::BuchholzCut2 => opposition::buchholz_cut(ctx, player, for_round, 2),
        Tiebreaker::BuchholzMedian => opposition::buchholz_median(ctx, player, for_round),
        Tiebreaker::BuchholzModifiedMedian => {
            opposition::buchholz_modified_median(ctx, player, for_round)
        }
        Tiebreaker::SonnebornBerger => opposition::sonneborn_berger(ctx, player, for_round),
        Tiebreaker::Solkoff => opposition::solkoff(ctx, player, for_round),
        Tiebreaker::Koya => opposition::koya(ctx, player, for_round),
        Tiebreaker::DirectEncounter => return None,
        Tiebreaker::AverageRatingOfOpponents => average_rating_of_opponents(ctx, player, for_round),
        Tiebreaker::AverageRatingOfOpponentsCut1 => {
            average_rating_of_opponents_cut1(ctx, player, for_round)
        }
        Tiebreaker::OppositionPerformance => opposition_performance(ctx, player, for_round),
        Tiebreaker::RoundsWon => rounds_won(ctx, player, for_round),
        Tiebreaker::RoundsWonWithBlack => rounds_won_with_black(player, for_round),
        Tiebreaker::GamesPlayed => games_played(player, for_round),
        Tiebreaker::GamesPlayedWithBlack => games_played_with_black(player, for_round),
        Tiebreaker::Kashdan => kashdan(player, for_round),
        Tiebreaker::TimeOfLoss => time_of_loss(player, for_round),
    };
    Some(value)
}

/// Games of rounds `1..=for_round`.
pub(crate) fn games_through(player: &Player, for_round: u32) -> &[Game] {
    let end = player.games.len().min(for_round as usize);
    &player.games[..end]
}

pub(crate) fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// Ratings of real, rated opponents met over the board.
fn opponent_ratings(ctx: &TiebreakContext<'_>, player: &Player, for_round: u32) -> Vec<f64> {
    games_through(player, for_round)
        .iter()
        .filter_map(|g| ctx.opponent(g))
        .filter(|opp| opp.rating > 0)
        .map(|opp| f64::from(opp.rating))
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

pub fn average_rating_of_opponents(ctx: &TiebreakContext<'_>, player: &Player, for_round: u32) -> f64 {
    mean(&opponent_ratings(ctx, player, for_round))
}

/// ARO without the lowest-rated opponent. Players with any bye, forfeit or
/// absence keep all opponents.
pub fn average_rating_of_opponents_cut1(
    ctx: &TiebreakContext<'_>,
    player: &Player,
    for_round: u32,
) -> f64 {
    let mut ratings = opponent_ratings(ctx, player, for_round);
    // a paired game still waiting for its result does not void the cut
    let all_played = games_through(player, for_round)
        .iter()
        .all(|g| game_was_played(g) || g.result == GameResult::Unassigned);
    if all_played && ratings.len() > 1 {
        ratings.sort_by(f64::total_cmp);
        ratings.remove(0);
    }
    mean(&ratings)
}

/// Mean of opponent rating ±400 per win/loss over rated games played.
pub fn opposition_performance(ctx: &TiebreakContext<'_>, player: &Player, for_round: u32) -> f64 {
    let adjusted: Vec<f64> = games_through(player, for_round)
        .iter()
        .filter_map(|g| ctx.opponent(g).map(|opp| (g, opp)))
        .filter(|(_, opp)| opp.rating > 0)
        .map(|(g, opp)| {
            let rating = f64::from(opp.rating);
            if g.result.is_win() {
                rating + PERFORMANCE_OFFSET
            } else if g.result.is_loss() {
                rating - PERFORMANCE_OFFSET
            } else {
                rating
            }
        })
        .collect();
    mean(&adjusted)
}

/// Rounds scoring as much as a win, whether played or not.
pub fn rounds_won(ctx: &TiebreakContext<'_>, player: &Player, for_round: u32) -> f64 {
    games_through(player, for_round)
        .iter()
        .filter(|g| g.result != GameResult::Unassigned)
        .filter(|g| approx_eq(points_for(g, ctx.config, false), ctx.config.points_for_win))
        .count() as f64
}

pub fn rounds_won_with_black(player: &Player, for_round: u32) -> f64 {
    games_through(player, for_round)
        .iter()
        .filter(|g| game_was_played(g) && g.color == Some(Color::Black) && g.result.is_win())
        .count() as f64
}

pub fn games_played(player: &Player, for_round: u32) -> f64 {
    games_through(player, for_round)
        .iter()
        .filter(|g| game_was_played(g))
        .count() as f64
}

pub fn games_played_with_black(player: &Player, for_round: u32) -> f64 {
    games_through(player, for_round)
        .iter()
        .filter(|g| game_was_played(g) && g.color == Some(Color::Black))
        .count() as f64
}

/// 4 per win, 2 per draw, 1 per loss; unplayed games earn nothing.
pub fn kashdan(player: &Player, for_round: u32) -> f64 {
    games_through(player, for_round)
        .iter()
        .filter(|g| game_was_played(g))
        .map(|g| {
            if g.result.is_win() {
                KASHDAN_WIN
            } else if g.result.is_draw() {
                KASHDAN_DRAW
            } else {
                KASHDAN_LOSS
            }
        })
        .sum()
}

/// Round of the first loss, played or forfeited. Losing later ranks higher;
/// players without a loss get `for_round + 1`.
pub fn time_of_loss(player: &Player, for_round: u32) -> f64 {
    games_through(player, for_round)
        .iter()
        .find(|g| g.result.is_loss() || g.result == GameResult::ForfeitLoss)
        .map(|g| g.round)
        .unwrap_or(for_round + 1) as f64
}

/// Points `player` scored in decided games against `opponents` through
/// `for_round`, or `None` if they never met.
fn points_against(
    ctx: &TiebreakContext<'_>,
    player: &Player,
    opponents: &[PlayerId],
    for_round: u32,
) -> Option<f64> {
    let games: Vec<&Game> = games_through(player, for_round)
        .iter()
        .filter(|g| g.result != GameResult::Unassigned)
        .filter(|g| g.opponent.is_some_and(|id| id != player.id && opponents.contains(&id)))
        .collect();
    if games.is_empty() {
        return None;
    }
    Some(games.iter().map(|g| points_for(g, ctx.config, false)).sum())
}

/// Orders two players by the games they played against each other.
///
/// `Less` means `a` ranks ahead. Players who never met, or split their
/// games evenly, compare `Equal` so the next criterion decides.
pub fn direct_encounter(ctx: &TiebreakContext<'_>, a: &Player, b: &Player, for_round: u32) -> Ordering {
    match (
        points_against(ctx, a, &[b.id], for_round),
        points_against(ctx, b, &[a.id], for_round),
    ) {
        (Some(a_points), Some(b_points)) => b_points.total_cmp(&a_points),
        _ => Ordering::Equal,
    }
}

/// Direct encounter over a whole group of tied players: the points
/// `player` scored against the other members, 0 if it met none of them.
///
/// For two players this orders them exactly as [`direct_encounter`] does.
pub fn direct_encounter_score(
    ctx: &TiebreakContext<'_>,
    player: &Player,
    group: &[PlayerId],
    for_round: u32,
) -> f64 {
    points_against(ctx, player, group, for_round).unwrap_or(0.0)
}

#[cfg(test)]
#[path = "tiebreak_tests.rs"]
mod tiebreak_tests;
