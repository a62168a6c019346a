//! Small builder for hand-written tournament histories used by unit tests.

use crate::config::Configuration;
use crate::model::{Color, Game, GameResult, Player};
use crate::scoring::recalculate_scores;
use crate::tiebreak::TiebreakContext;

pub(crate) struct Fixture {
    pub players: Vec<Player>,
    pub config: Configuration,
}

impl Fixture {
    pub fn new(entrants: &[(&str, u16)]) -> Self {
        Self {
            players: entrants
                .iter()
                .map(|(name, rating)| Player::new(name, *rating))
                .collect(),
            config: Configuration::default(),
        }
    }

    fn set_game(&mut self, idx: usize, game: Game) {
        let player = &mut self.players[idx];
        player.pad_games(game.round - 1);
        let slot = game.round as usize - 1;
        if slot < player.games.len() {
            player.games[slot] = game;
        } else {
            player.games.push(game);
        }
    }

    /// Records a game from white's point of view on both sides.
    pub fn play(&mut self, round: u32, white: usize, black: usize, white_result: GameResult) -> &mut Self {
        let white_id = self.players[white].id;
        let black_id = self.players[black].id;
        let black_result = white_result.mirrored().expect("paired result");
        self.set_game(white, Game::paired(round, black_id, Color::White, white_result));
        self.set_game(black, Game::paired(round, white_id, Color::Black, black_result));
        self
    }

    pub fn bye(&mut self, round: u32, idx: usize, result: GameResult) -> &mut Self {
        self.set_game(idx, Game::bye(round, result));
        self
    }

    /// Pads everyone to the same length and recomputes all scores.
    pub fn score(&mut self) -> &mut Self {
        let rounds = self.players.iter().map(|p| p.games.len()).max().unwrap_or(0) as u32;
        for player in &mut self.players {
            player.pad_games(rounds);
            recalculate_scores(player, &self.config, 1, None);
        }
        self
    }

    pub fn ctx(&self) -> TiebreakContext<'_> {
        TiebreakContext::new(&self.config, &self.players)
    }
}
