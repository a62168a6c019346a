use super::*;
use crate::test_support::Fixture;

const A: usize = 0;
const B: usize = 1;
const C: usize = 2;
const D: usize = 3;

/// R1: A-B 1-0, C-D ½-½. R2: A-C ½-½, D-B 0-1.
fn four_players() -> Fixture {
    let mut fx = Fixture::new(&[("A", 2000), ("B", 1900), ("C", 1800), ("D", 1700)]);
    fx.play(1, A, B, GameResult::Win)
        .play(1, C, D, GameResult::Draw)
        .play(2, A, C, GameResult::Draw)
        .play(2, D, B, GameResult::Loss)
        .score();
    fx
}

#[test]
fn test_names_round_trip() {
    for tb in Tiebreaker::ALL {
        assert_eq!(tb.name().parse::<Tiebreaker>().unwrap(), tb);
        let json = serde_json::to_string(&tb).unwrap();
        assert_eq!(json, format!("\"{}\"", tb.name()));
    }
    assert_eq!("buchholz-cut1".parse::<Tiebreaker>().unwrap(), Tiebreaker::BuchholzCut1);
    assert!("coin toss".parse::<Tiebreaker>().is_err());
}

#[test]
fn test_dispatch_covers_every_scalar() {
    let fx = four_players();
    let ctx = fx.ctx();
    for tb in Tiebreaker::ALL {
        let value = calculate(tb, &ctx, &fx.players[A], 2);
        assert_eq!(value.is_some(), tb.is_scalar(), "{tb}");
    }
}

#[test]
fn test_rating_based_tiebreaks() {
    let fx = four_players();
    let ctx = fx.ctx();
    let a = &fx.players[A];

    assert_eq!(average_rating_of_opponents(&ctx, a, 2), 1850.0);
    assert_eq!(average_rating_of_opponents_cut1(&ctx, a, 2), 1900.0);
    assert_eq!(opposition_performance(&ctx, a, 2), 2050.0);
}

#[test]
fn test_aroc1_keeps_all_opponents_after_a_bye() {
    let mut fx = Fixture::new(&[("A", 2000), ("B", 1900), ("C", 1800)]);
    fx.play(1, A, B, GameResult::Win)
        .bye(1, C, GameResult::PairingAllocatedBye)
        .play(2, A, C, GameResult::Draw)
        .bye(2, B, GameResult::PairingAllocatedBye)
        .play(3, B, A, GameResult::Loss)
        .bye(3, C, GameResult::PairingAllocatedBye)
        .score();
    let ctx = fx.ctx();

    // A played every round: lowest (1800) dropped
    assert_eq!(average_rating_of_opponents_cut1(&ctx, &fx.players[A], 3), 1900.0);
    // B had a bye: nothing dropped
    assert_eq!(average_rating_of_opponents_cut1(&ctx, &fx.players[B], 3), 2000.0);
    assert_eq!(average_rating_of_opponents(&ctx, &fx.players[C], 3), 2000.0);
}

#[test]
fn test_aroc1_cuts_while_a_result_is_pending() {
    let mut fx = Fixture::new(&[("A", 2000), ("B", 1900), ("C", 1800), ("D", 1700)]);
    fx.play(1, A, B, GameResult::Win)
        .play(1, C, D, GameResult::Draw)
        .play(2, A, C, GameResult::Draw)
        .play(2, D, B, GameResult::Loss)
        .play(3, A, D, GameResult::Unassigned)
        .play(3, B, C, GameResult::Unassigned)
        .score();
    let ctx = fx.ctx();

    // round 3 paired but not decided: 1800 is still dropped
    assert_eq!(average_rating_of_opponents_cut1(&ctx, &fx.players[A], 3), 1900.0);
    assert_eq!(average_rating_of_opponents(&ctx, &fx.players[A], 3), 1850.0);
}

#[test]
fn test_unrated_opponents_are_ignored_for_ratings() {
    let mut fx = Fixture::new(&[("A", 2000), ("B", 0)]);
    fx.play(1, A, B, GameResult::Win).score();
    let ctx = fx.ctx();

    assert_eq!(average_rating_of_opponents(&ctx, &fx.players[A], 1), 0.0);
    assert_eq!(average_rating_of_opponents(&ctx, &fx.players[B], 1), 2000.0);
}

#[test]
fn test_counting_tiebreaks() {
    let fx = four_players();
    let ctx = fx.ctx();
    let a = &fx.players[A];
    let b = &fx.players[B];

    assert_eq!(rounds_won(&ctx, a, 2), 1.0);
    assert_eq!(rounds_won_with_black(b, 2), 1.0);
    assert_eq!(games_played(b, 2), 2.0);
    assert_eq!(games_played_with_black(b, 2), 2.0);
    assert_eq!(kashdan(a, 2), 6.0);
    assert_eq!(kashdan(b, 2), 5.0);
    assert_eq!(time_of_loss(a, 2), 3.0);
    assert_eq!(time_of_loss(b, 2), 1.0);
}

#[test]
fn test_rounds_won_counts_unplayed_wins() {
    let mut fx = Fixture::new(&[("A", 2000), ("B", 1900), ("C", 1800)]);
    fx.play(1, A, B, GameResult::ForfeitWin)
        .bye(1, C, GameResult::PairingAllocatedBye)
        .score();
    let ctx = fx.ctx();

    assert_eq!(rounds_won(&ctx, &fx.players[A], 1), 1.0);
    assert_eq!(rounds_won(&ctx, &fx.players[C], 1), 1.0);
    assert_eq!(kashdan(&fx.players[A], 1), 0.0);
    assert_eq!(time_of_loss(&fx.players[B], 1), 1.0);
}

#[test]
fn test_direct_encounter() {
    let fx = four_players();
    let ctx = fx.ctx();
    let (a, b, c, d) = (&fx.players[A], &fx.players[B], &fx.players[C], &fx.players[D]);

    assert_eq!(direct_encounter(&ctx, a, b, 2), Ordering::Less);
    assert_eq!(direct_encounter(&ctx, b, a, 2), Ordering::Greater);
    assert_eq!(direct_encounter(&ctx, a, c, 2), Ordering::Equal);
    // never met
    assert_eq!(direct_encounter(&ctx, a, d, 2), Ordering::Equal);
    // met only in a later round
    assert_eq!(direct_encounter(&ctx, b, d, 1), Ordering::Equal);
}

#[test]
fn test_direct_encounter_score_counts_only_group_members() {
    let fx = four_players();
    let ctx = fx.ctx();
    let group = [fx.players[A].id, fx.players[B].id, fx.players[C].id];

    assert_eq!(direct_encounter_score(&ctx, &fx.players[A], &group, 2), 1.5);
    assert_eq!(direct_encounter_score(&ctx, &fx.players[B], &group, 2), 0.0);
    // the draw with D is outside the group
    assert_eq!(direct_encounter_score(&ctx, &fx.players[C], &group, 2), 0.5);
    assert_eq!(direct_encounter_score(&ctx, &fx.players[D], &[fx.players[D].id], 2), 0.0);
}
