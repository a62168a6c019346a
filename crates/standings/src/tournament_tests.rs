use super::*;
use crate::model::Color;
use crate::test_support::Fixture;
use crate::tiebreak::Tiebreaker;

fn club(names: &[&str], tiebreakers: Vec<Tiebreaker>) -> (Tournament, Vec<PlayerId>) {
    let config = Configuration {
        tiebreakers,
        ..Default::default()
    };
    let mut t = Tournament::new("Club", config).unwrap();
    let ids = names
        .iter()
        .enumerate()
        .map(|(i, name)| t.add_player(Player::new(name, 2000 - i as u16 * 100)).unwrap())
        .collect();
    (t, ids)
}

fn snapshot(fx: Fixture) -> TournamentSnapshot {
    TournamentSnapshot {
        name: "Open".to_string(),
        config: fx.config,
        players: fx.players,
        ..Default::default()
    }
}

#[test]
fn test_round_flow_from_pairing_output() {
    let (mut t, ids) = club(&["A", "B", "C", "D"], vec![Tiebreaker::Buchholz]);
    let (a, b, c, d) = (ids[0], ids[1], ids[2], ids[3]);

    let pairs = t.apply_pairing_output(1, "2\n1 3\n4 2\n").unwrap();
    assert_eq!(pairs, vec![Pair::game(a, c), Pair::game(d, b)]);
    assert_eq!(t.played_rounds(), 1);

    t.set_result(1, a, GameResult::Win).unwrap();
    t.set_result(1, b, GameResult::Draw).unwrap();

    assert_eq!(t.player(c).unwrap().games[0].result, GameResult::Loss);
    assert_eq!(t.player(d).unwrap().games[0].result, GameResult::Draw);

    let ranking = t.standings(1).unwrap();
    // B and D tie on points and Buchholz; B registered first
    assert_eq!(ranking.order, vec![a, b, d, c]);
    assert_eq!(ranking.rank_of(c), Some(4));
}

#[test]
fn test_pairing_numbers_follow_rank_when_configured() {
    let (mut t, ids) = club(&["A", "B", "C", "D"], vec![Tiebreaker::Buchholz]);
    let (a, b, c, d) = (ids[0], ids[1], ids[2], ids[3]);
    t.apply_pairing_output(1, "1 3\n4 2\n").unwrap();
    t.set_result(1, a, GameResult::Win).unwrap();
    t.set_result(1, b, GameResult::Draw).unwrap();

    let mut config = t.config().clone();
    config.pairing_uses_rank = true;
    t.set_configuration(config).unwrap();
    assert_eq!(t.pairing_order(2), Err(StandingsError::StaleStandings));

    t.recalculate();
    assert_eq!(t.pairing_order(2).unwrap(), vec![a, b, d, c]);

    t.apply_pairing_output(2, "1 2\n3 4\n").unwrap();
    assert_eq!(t.pairs(2), vec![Pair::game(a, b), Pair::game(d, c)]);
    assert_eq!(t.starting_number(d), Some(4));
}

#[test]
fn test_configuration_change_purges_keys_and_marks_stale() {
    let (mut t, ids) = club(
        &["A", "B"],
        vec![Tiebreaker::Buchholz, Tiebreaker::SonnebornBerger],
    );
    t.apply_pairs(1, &[Pair::game(ids[0], ids[1])]).unwrap();
    t.set_result(1, ids[0], GameResult::Win).unwrap();

    let config = Configuration {
        tiebreakers: vec![Tiebreaker::SonnebornBerger],
        ..Default::default()
    };
    t.set_configuration(config).unwrap();

    assert_eq!(t.stage(), Stage::ScoresStale);
    assert_eq!(t.standings(1), Err(StandingsError::StaleStandings));
    for player in t.players() {
        let keys: Vec<_> = player.scores[0].tiebreakers.keys().copied().collect();
        assert_eq!(keys, vec![Tiebreaker::SonnebornBerger]);
    }

    t.recalculate();
    assert_eq!(t.stage(), Stage::TiebreakersFresh);
    assert_eq!(t.standings(1).unwrap().order, vec![ids[0], ids[1]]);
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let (mut t, _) = club(&["A"], vec![]);
    let config = Configuration {
        points_for_win: -1.0,
        ..Default::default()
    };
    assert!(matches!(
        t.set_configuration(config),
        Err(StandingsError::Config(_))
    ));
    assert_eq!(t.stage(), Stage::TiebreakersFresh);
}

#[test]
fn test_failed_round_application_changes_nothing() {
    let (mut t, ids) = club(&["A", "B", "C", "D"], vec![]);
    let before = t.clone();

    let err = t.apply_pairs(1, &[Pair::game(ids[0], ids[1])]).unwrap_err();

    assert_eq!(
        err,
        StandingsError::PairingError {
            round: 1,
            player: ids[2]
        }
    );
    assert_eq!(t, before);
}

#[test]
fn test_absent_player_gets_zero_point_bye() {
    let (mut t, ids) = club(&["A", "B", "C"], vec![]);
    t.set_absent(ids[2], 1, true).unwrap();

    t.apply_pairs(1, &[Pair::game(ids[1], ids[0])]).unwrap();

    let c = t.player(ids[2]).unwrap();
    assert_eq!(c.games[0], Game::absent(1));
    assert_eq!(c.scores[0].points, 0.0);
    assert_eq!(t.player(ids[1]).unwrap().games[0].color, Some(Color::White));
}

#[test]
fn test_result_edit_updates_connected_tiebreaks() {
    let (mut t, ids) = club(&["A", "B", "C", "D"], vec![Tiebreaker::Buchholz]);
    let (a, b, c, d) = (ids[0], ids[1], ids[2], ids[3]);
    t.apply_pairs(1, &[Pair::game(a, b), Pair::game(c, d)]).unwrap();
    t.set_result(1, a, GameResult::Win).unwrap();
    t.set_result(1, c, GameResult::Win).unwrap();
    t.apply_pairs(2, &[Pair::game(a, c), Pair::game(b, d)]).unwrap();
    t.set_result(2, a, GameResult::Draw).unwrap();
    t.set_result(2, b, GameResult::Draw).unwrap();

    // B 0.5, C 1.5
    assert_eq!(t.player(a).unwrap().scores[1].tiebreakers[&Tiebreaker::Buchholz], 2.0);

    t.set_result(1, d, GameResult::Win).unwrap();

    // C drops to 0.5
    assert_eq!(t.player(c).unwrap().scores[1].points, 0.5);
    assert_eq!(t.player(a).unwrap().scores[1].tiebreakers[&Tiebreaker::Buchholz], 1.0);
}

#[test]
fn test_result_must_fit_the_record() {
    let (mut t, ids) = club(&["A", "B", "C"], vec![]);
    t.apply_pairs(1, &[Pair::game(ids[0], ids[1]), Pair::bye(ids[2])])
        .unwrap();
    assert_eq!(t.player(ids[2]).unwrap().scores[0].points, 1.0);

    assert!(matches!(
        t.set_result(1, ids[2], GameResult::Win),
        Err(StandingsError::InvalidResult { round: 1, .. })
    ));
    assert!(matches!(
        t.set_result(1, ids[0], GameResult::HalfPointBye),
        Err(StandingsError::InvalidResult { round: 1, .. })
    ));
    assert_eq!(
        t.set_result(3, ids[0], GameResult::Win),
        Err(StandingsError::InvalidRound { round: 3, played: 1 })
    );

    t.set_result(1, ids[2], GameResult::HalfPointBye).unwrap();
    assert_eq!(t.player(ids[2]).unwrap().scores[0].points, 0.5);
}

#[test]
fn test_referenced_player_cannot_be_removed() {
    let (mut t, ids) = club(&["A", "B", "C", "D"], vec![]);
    t.set_absent(ids[2], 1, true).unwrap();
    t.set_absent(ids[3], 1, true).unwrap();
    t.apply_pairs(1, &[Pair::game(ids[0], ids[1])]).unwrap();

    assert_eq!(
        t.remove_player(ids[1]),
        Err(StandingsError::PlayerReferenced {
            player: ids[1],
            by: ids[0],
            round: 1
        })
    );

    let removed = t.remove_player(ids[2]).unwrap();
    assert_eq!(removed.name, "C");
    assert_eq!(t.starting_number(ids[3]), Some(3));
    assert_eq!(t.remove_player(ids[2]), Err(StandingsError::UnknownPlayer(ids[2])));
}

#[test]
fn test_late_entrant_is_absent_for_played_rounds() {
    let (mut t, ids) = club(&["A", "B"], vec![]);
    t.apply_pairs(1, &[Pair::game(ids[0], ids[1])]).unwrap();

    let late = t.add_player(Player::new("Late", 1500)).unwrap();

    let player = t.player(late).unwrap();
    assert_eq!(player.games, vec![Game::absent(1)]);
    assert!(player.is_absent(1));
    assert_eq!(player.scores.len(), 1);
    assert_eq!(t.starting_number(late), Some(3));

    let duplicate = t.player(late).unwrap().clone();
    assert_eq!(
        t.add_player(duplicate),
        Err(StandingsError::DuplicatePlayer(late))
    );
}

#[test]
fn test_acceleration_is_credited_at_its_round() {
    let (mut t, ids) = club(&["A", "B"], vec![]);
    t.apply_pairs(1, &[Pair::game(ids[0], ids[1])]).unwrap();
    t.set_result(1, ids[0], GameResult::Draw).unwrap();

    t.set_acceleration(ids[1], 1, 1.0).unwrap();

    assert_eq!(t.player(ids[1]).unwrap().points_at(1), 1.5);
    assert!(matches!(
        t.set_acceleration(ids[1], 2, 1.0),
        Err(StandingsError::TooManyAccelerations { rounds: 1, .. })
    ));
}

#[test]
fn test_import_accepts_declared_totals() {
    let mut fx = Fixture::new(&[("A", 2000), ("B", 1900)]);
    fx.play(1, 0, 1, GameResult::Win).play(2, 1, 0, GameResult::Draw);
    // With acceleration
    fx.players[0].accelerations = vec![1.0];
    fx.players[0].declared_points = Some(2.5);
    // Before the last round
    fx.players[1].declared_points = Some(0.0);

    let t = Tournament::import(snapshot(fx)).unwrap();

    assert_eq!(t.stage(), Stage::TiebreakersFresh);
    assert_eq!(t.players()[0].points_at(2), 2.5);
    assert_eq!(t.players()[1].points_at(2), 0.5);
}

#[test]
fn test_import_pads_short_histories() {
    let mut fx = Fixture::new(&[("A", 2000), ("B", 1900), ("C", 1800)]);
    fx.play(1, 0, 1, GameResult::Win);

    let t = Tournament::import(snapshot(fx)).unwrap();

    assert!(t.players().iter().all(|p| p.games.len() == 1));
    assert_eq!(t.players()[2].games[0], Game::absent(1));
}

#[test]
fn test_import_reports_every_problem() {
    let mut fx = Fixture::new(&[("A", 2000), ("B", 1900), ("C", 1800), ("D", 1700)]);
    fx.play(1, 0, 1, GameResult::Win)
        .play(1, 2, 3, GameResult::Draw)
        .play(2, 1, 2, GameResult::Win)
        .bye(2, 3, GameResult::PairingAllocatedBye);
    // A claims to have played B in round 2, B played C.
    let b = fx.players[1].id;
    fx.players[0]
        .games
        .push(Game::paired(2, b, Color::White, GameResult::Draw));
    fx.players[2].declared_points = Some(5.0);
    fx.players[3].accelerations = vec![0.0, 0.0, 0.0];

    let errors = Tournament::import(snapshot(fx)).unwrap_err().errors;

    assert_eq!(errors.len(), 3, "{errors:?}");
    assert!(errors.iter().any(|e| matches!(
        e,
        StandingsError::TooManyAccelerations { count: 3, rounds: 2, .. }
    )));
    assert!(errors.iter().any(|e| matches!(
        e,
        StandingsError::PointsMismatch { declared, computed, .. } if *declared == 5.0 && *computed == 0.5
    )));
    assert!(errors.iter().any(|e| matches!(
        e,
        StandingsError::PairingContradiction(c)
            if c.round == 2 && c.reason == ContradictionReason::DifferentOpponent
    )));
}

#[test]
fn test_import_rejects_results_that_need_an_opponent() {
    let mut fx = Fixture::new(&[("A", 2000)]);
    fx.bye(1, 0, GameResult::Win);

    let errors = Tournament::import(snapshot(fx)).unwrap_err().errors;

    assert!(matches!(
        errors.as_slice(),
        [StandingsError::InvalidResult { round: 1, .. }]
    ));
}

#[test]
fn test_snapshot_survives_json() {
    let mut fx = Fixture::new(&[("A", 2000), ("B", 1900)]);
    fx.play(1, 0, 1, GameResult::Loss);
    let t = Tournament::import(snapshot(fx)).unwrap();

    let json = serde_json::to_string(&t.snapshot()).unwrap();
    let back: TournamentSnapshot = serde_json::from_str(&json).unwrap();

    assert_eq!(Tournament::import(back).unwrap(), t);
}
