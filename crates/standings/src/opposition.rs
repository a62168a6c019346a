//! Tiebreaks built from opponents' scores.
//!
//! These read the cumulative [`crate::model::Score`] of other players, so they
//! must only run once every player's score pass has finished.

use crate::config::Configuration;
use crate::model::{Game, GameResult, Player};
use crate::scoring::{calculate_points, points_for};
use crate::tiebreak::{TiebreakContext, approx_eq, games_through};

/// How a player's own unplayed rounds enter an opponent-score sum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OwnUnplayed {
    /// Substitute the virtual opponent
    Virtual,
    /// Contribute nothing
    Zero,
}

/// Stand-in opponent score for a round the player did not play.
///
/// The virtual opponent starts the round with the player's score, wins the
/// game (so gets whatever the player did not), and draws every later round up
/// to `for_round`.
pub fn virtual_opponent_score(
    ctx: &TiebreakContext<'_>,
    player: &Player,
    game: &Game,
    for_round: u32,
) -> f64 {
    let config = ctx.config;
    let before = player.points_at(game.round.saturating_sub(1));
    let remaining = for_round.saturating_sub(game.round);
    before
        + (config.points_for_win - points_for(game, config, false))
        + config.points_for_draw * f64::from(remaining)
}

/// An opponent's cumulative score at `for_round`, with the opponent's own
/// unplayed games valued as draws.
pub fn opponent_score(ctx: &TiebreakContext<'_>, opponent: &Player, for_round: u32) -> f64 {
    let config = ctx.config;
    let recorded = calculate_points(for_round, &opponent.games, config, false);
    let adjusted = calculate_points(for_round, &opponent.games, config, true);
    opponent.points_at(for_round) - recorded + adjusted
}

/// One value per round in `1..=for_round`: the opponent score for played
/// games and the substitute for the player's own unplayed rounds.
///
/// A repeated opponent contributes once per pairing.
fn contributions(
    ctx: &TiebreakContext<'_>,
    player: &Player,
    for_round: u32,
    own_unplayed: OwnUnplayed,
) -> Vec<f64> {
    games_through(player, for_round)
        .iter()
        .map(|game| match ctx.opponent(game) {
            Some(opponent) => opponent_score(ctx, opponent, for_round),
            None => match own_unplayed {
                OwnUnplayed::Virtual => virtual_opponent_score(ctx, player, game, for_round),
                OwnUnplayed::Zero => 0.0,
            },
        })
        .collect()
}

/// Sum after dropping the `low` smallest and `high` largest values.
fn trimmed_sum(mut values: Vec<f64>, low: usize, high: usize) -> f64 {
    if low + high >= values.len() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    values[low..values.len() - high].iter().sum()
}

pub fn buchholz(ctx: &TiebreakContext<'_>, player: &Player, for_round: u32) -> f64 {
    contributions(ctx, player, for_round, OwnUnplayed::Virtual)
        .iter()
        .sum()
}

/// Buchholz without the `cut` lowest contributions.
pub fn buchholz_cut(ctx: &TiebreakContext<'_>, player: &Player, for_round: u32, cut: usize) -> f64 {
    trimmed_sum(
        contributions(ctx, player, for_round, OwnUnplayed::Virtual),
        cut,
        0,
    )
}

/// Buchholz without the highest and the lowest contribution.
pub fn buchholz_median(ctx: &TiebreakContext<'_>, player: &Player, for_round: u32) -> f64 {
    trimmed_sum(
        contributions(ctx, player, for_round, OwnUnplayed::Virtual),
        1,
        1,
    )
}

/// Rounds from which the modified median drops two values per side.
const MODIFIED_MEDIAN_LONG_EVENT: u32 = 9;

/// USCF modified median.
///
/// Above half of the maximum possible score the lowest contribution is
/// dropped, below half the highest, at exactly half both. From nine rounds on
/// two values are dropped on each affected side.
pub fn buchholz_modified_median(ctx: &TiebreakContext<'_>, player: &Player, for_round: u32) -> f64 {
    let per_side = if for_round >= MODIFIED_MEDIAN_LONG_EVENT { 2 } else { 1 };
    let half = f64::from(for_round) * ctx.config.points_for_win / 2.0;
    let score = player.points_at(for_round);

    let (low, high) = if approx_eq(score, half) {
        (per_side, per_side)
    } else if score > half {
        (per_side, 0)
    } else {
        (0, per_side)
    };

    trimmed_sum(
        contributions(ctx, player, for_round, OwnUnplayed::Virtual),
        low,
        high,
    )
}

/// Like Buchholz, but the player's own unplayed rounds count zero.
pub fn solkoff(ctx: &TiebreakContext<'_>, player: &Player, for_round: u32) -> f64 {
    contributions(ctx, player, for_round, OwnUnplayed::Zero)
        .iter()
        .sum()
}

/// Full opponent score for wins, half for draws. Unplayed rounds use the
/// virtual opponent, weighted by the outcome the points correspond to.
pub fn sonneborn_berger(ctx: &TiebreakContext<'_>, player: &Player, for_round: u32) -> f64 {
    let config = ctx.config;
    games_through(player, for_round)
        .iter()
        .map(|game| match ctx.opponent(game) {
            Some(opponent) => {
                let weight = if game.result.is_win() {
                    1.0
                } else if game.result.is_draw() {
                    0.5
                } else {
                    0.0
                };
                weight * opponent_score(ctx, opponent, for_round)
            }
            None => {
                let earned = points_for(game, config, false);
                let weight = if approx_eq(earned, config.points_for_win) {
                    1.0
                } else if approx_eq(earned, config.points_for_draw) {
                    0.5
                } else {
                    0.0
                };
                weight * virtual_opponent_score(ctx, player, game, for_round)
            }
        })
        .sum()
}

/// Points scored against opponents who reached at least half the maximum.
///
/// The threshold is checked against the opponent's actual score, byes and
/// absences included as scored.
pub fn koya(ctx: &TiebreakContext<'_>, player: &Player, for_round: u32) -> f64 {
    let config = ctx.config;
    let threshold = f64::from(for_round) * config.points_for_win / 2.0;
    games_through(player, for_round)
        .iter()
        .filter_map(|game| ctx.opponent(game).map(|opponent| (game, opponent)))
        .filter(|(_, opponent)| {
            let score = opponent.points_at(for_round);
            score > threshold || approx_eq(score, threshold)
        })
        .map(|(game, _)| points_for(game, config, false))
        .sum()
}

/// Points an unplayed win or draw added to the running score. Forfeit
/// losses, zero-point byes and unentered results add none.
fn unplayed_bonus(game: &Game, config: &Configuration) -> f64 {
    match game.result {
        GameResult::ForfeitWin
        | GameResult::FullPointBye
        | GameResult::HalfPointBye
        | GameResult::PairingAllocatedBye => points_for(game, config, false),
        _ => 0.0,
    }
}

/// Sum of the running score after each round, minus once the bonus of every
/// unplayed win or draw in that range. `cut1` leaves out round 1.
pub fn cumulative(ctx: &TiebreakContext<'_>, player: &Player, for_round: u32, cut1: bool) -> f64 {
    let first = if cut1 { 2 } else { 1 };
    let last = for_round.min(player.games.len() as u32);
    (first..=last)
        .map(|round| {
            let bonus = player
                .game(round)
                .map_or(0.0, |game| unplayed_bonus(game, ctx.config));
            player.points_at(round) - bonus
        })
        .sum()
}

/// Sum of the cumulative tiebreak of every opponent met over the board.
pub fn opposition_cumulative(ctx: &TiebreakContext<'_>, player: &Player, for_round: u32) -> f64 {
    games_through(player, for_round)
        .iter()
        .filter_map(|game| ctx.opponent(game))
        .map(|opponent| cumulative(ctx, opponent, for_round, false))
        .sum()
}

#[cfg(test)]
#[path = "opposition_tests.rs"]
mod opposition_tests;
