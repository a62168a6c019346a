//! Result → points resolution and cumulative score recalculation.

use tracing::trace;

use crate::config::Configuration;
use crate::model::{Game, GameResult, Player, Score};

/// Whether a game was actually contested over the board.
///
/// Needs an opponent, a color, and an over-the-board result; forfeits, byes
/// and unentered results do not count.
pub fn game_was_played(game: &Game) -> bool {
    game.opponent.is_some() && game.color.is_some() && game.result.is_over_the_board()
}

/// Points a single game is worth under `config`.
///
/// With `not_played_is_draw`, every game that was not played is valued as a
/// draw. Opponent-based tiebreaks use this to neutralise an opponent's byes
/// and forfeits.
pub fn points_for(game: &Game, config: &Configuration, not_played_is_draw: bool) -> f64 {
    if not_played_is_draw && !game_was_played(game) {
        return config.points_for_draw;
    }
    match game.result {
        GameResult::Win
        | GameResult::ForfeitWin
        | GameResult::UnratedWin
        | GameResult::FullPointBye => config.points_for_win,
        GameResult::Draw | GameResult::UnratedDraw | GameResult::HalfPointBye => {
            config.points_for_draw
        }
        GameResult::Loss | GameResult::UnratedLoss => config.points_for_loss,
        GameResult::ForfeitLoss => config.points_for_forfeit_loss,
        GameResult::ZeroPointBye | GameResult::Unassigned => config.points_for_zero_point_bye,
        GameResult::PairingAllocatedBye => config.points_for_pairing_allocated_bye,
    }
}

/// Sum of game points over the first `for_round` rounds.
pub fn calculate_points(
    for_round: u32,
    games: &[Game],
    config: &Configuration,
    not_played_is_draw: bool,
) -> f64 {
    let end = games.len().min(for_round as usize);
    games[..end]
        .iter()
        .map(|g| points_for(g, config, not_played_is_draw))
        .sum()
}

/// Recomputes cumulative scores for rounds `[from_round, to_round)`.
///
/// Seeds from the score stored for the round before `from_round`, so only the
/// window is rescanned. Existing tiebreaker maps are left in place for the
/// tiebreaker pass to overwrite. Scores past the last game are dropped.
pub fn recalculate_scores(
    player: &mut Player,
    config: &Configuration,
    from_round: u32,
    to_round: Option<u32>,
) {
    let rounds = player.games.len() as u32;
    player.scores.truncate(rounds as usize);

    // A missing seed means earlier rounds were never computed.
    let from_round = from_round.max(1).min(player.scores.len() as u32 + 1);
    let to_round = to_round.unwrap_or(u32::MAX).min(rounds + 1);

    let mut total = if from_round >= 2 {
        player.scores[from_round as usize - 2].points
    } else {
        0.0
    };

    for round in from_round..to_round {
        let idx = round as usize - 1;
        total += points_for(&player.games[idx], config, false) + player.acceleration(round);

        match player.scores.get_mut(idx) {
            Some(score) => {
                score.round = round;
                score.points = total;
            }
            None => player.scores.push(Score {
                round,
                points: total,
                ..Default::default()
            }),
        }
    }

    trace!(
        player = %player.id,
        from_round,
        to_round,
        points = total,
        "scores recalculated"
    );
}

#[cfg(test)]
#[path = "scoring_tests.rs"]
mod scoring_tests;
