//! Side pot calculation tests using property-based testing
//!
//! These tests verify that side pot layering works correctly in all scenarios:
//! - Multiple all-ins at different amounts
//! - Folded players contribute but can't win
//! - Correct distribution of remainder chips
//! - Side pot eligibility based on investment levels

use holdem::game::{
    betting::{SidePot, compute_side_pots, distribute, total_payouts},
    entities::{Card, Chips, Player, Suit},
    functional::eval,
};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

fn invested(seat: usize, amount: Chips, folded: bool) -> Player {
    let mut player = Player::new(format!("p{seat}").into(), amount, seat);
    player.commit(amount);
    player.folded = folded;
    player
}

#[test]
fn test_three_way_all_in_scenario() {
    // Player A all-in 500, player B all-in 300, player C calls 500.
    let players = vec![
        invested(0, 500, false),
        invested(1, 300, false),
        invested(2, 500, false),
    ];
    let pots = compute_side_pots(&players);
    assert_eq!(pots.len(), 2);
    assert_eq!(pots[0].amount, 900);
    assert_eq!(pots[0].eligible, BTreeSet::from([0, 1, 2]));
    assert_eq!(pots[1].amount, 400);
    assert_eq!(pots[1].eligible, BTreeSet::from([0, 2]));
}

#[test]
fn test_multiple_side_pots_four_players() {
    // Player 0: All-in 25
    // Player 1: All-in 75
    // Player 2: All-in 150
    // Player 3: Calls 150
    let players = vec![
        invested(0, 25, false),
        invested(1, 75, false),
        invested(2, 150, false),
        invested(3, 150, false),
    ];
    let pots = compute_side_pots(&players);
    let amounts: Vec<Chips> = pots.iter().map(|p| p.amount).collect();
    assert_eq!(amounts, vec![100, 150, 150]);
    assert_eq!(pots[2].eligible, BTreeSet::from([2, 3]));
}

#[test]
fn test_side_pot_with_folder() {
    // Player 0 bets 50, then folds; players 1 and 2 put in 100.
    let players = vec![
        invested(0, 50, true),
        invested(1, 100, false),
        invested(2, 100, false),
    ];
    let pots = compute_side_pots(&players);
    assert_eq!(pots.iter().map(|p| p.amount).sum::<Chips>(), 250);
    for pot in &pots {
        assert!(!pot.eligible.contains(&0));
    }
}

#[test]
fn test_re_raise_over_all_in_keeps_eligibility() {
    // Seat 0 all-in for 200; seats 1 and 2 keep raising to 800.
    let players = vec![
        invested(0, 200, false),
        invested(1, 800, false),
        invested(2, 800, false),
    ];
    let pots = compute_side_pots(&players);
    assert_eq!(
        pots,
        vec![
            SidePot {
                amount: 600,
                eligible: BTreeSet::from([0, 1, 2]),
            },
            SidePot {
                amount: 1_200,
                eligible: BTreeSet::from([1, 2]),
            },
        ]
    );

    // Seat 0 holds the best hand and still only wins the layer it covered.
    let flush = eval(&[
        Card(2, Suit::Heart),
        Card(6, Suit::Heart),
        Card(9, Suit::Heart),
        Card(11, Suit::Heart),
        Card(13, Suit::Heart),
    ]);
    let trips = eval(&[
        Card(9, Suit::Club),
        Card(9, Suit::Spade),
        Card(9, Suit::Diamond),
        Card(13, Suit::Club),
        Card(4, Suit::Club),
    ]);
    let pair = eval(&[
        Card(4, Suit::Heart),
        Card(4, Suit::Spade),
        Card(9, Suit::Club),
        Card(13, Suit::Spade),
        Card(2, Suit::Club),
    ]);
    let hands = BTreeMap::from([(0, flush), (1, trips), (2, pair)]);
    let totals = total_payouts(&distribute(&pots, &hands, &[1, 2, 0]));
    assert_eq!(totals, BTreeMap::from([(0, 600), (1, 1_200)]));
}

#[test]
fn test_remainder_goes_clockwise_from_button() {
    let board = [
        Card(10, Suit::Heart),
        Card(11, Suit::Club),
        Card(12, Suit::Diamond),
        Card(13, Suit::Spade),
        Card(14, Suit::Heart),
    ];
    let broadway = eval(&board);
    let hands = BTreeMap::from([(0, broadway.clone()), (1, broadway.clone()), (2, broadway)]);
    let pots = vec![SidePot {
        amount: 100,
        eligible: BTreeSet::from([0, 1, 2]),
    }];
    // Button on seat 1: seat 2 gets the odd chip first.
    let awards = distribute(&pots, &hands, &[2, 0, 1]);
    assert_eq!(awards[0].winners, vec![(2, 34), (0, 33), (1, 33)]);
}

fn investments_strategy() -> impl Strategy<Value = Vec<(Chips, bool)>> {
    prop::collection::vec((0u64..2_000, prop::bool::weighted(0.3)), 2..=10)
}

proptest! {
    #[test]
    fn test_side_pots_sum_to_total_invested(investments in investments_strategy()) {
        let players: Vec<Player> = investments
            .iter()
            .enumerate()
            .map(|(seat, (amount, folded))| invested(seat, *amount, *folded))
            .collect();
        let total: Chips = players.iter().map(|p| p.invested).sum();
        let pots = compute_side_pots(&players);
        prop_assert_eq!(pots.iter().map(|p| p.amount).sum::<Chips>(), total);
    }

    #[test]
    fn test_folded_players_never_eligible(investments in investments_strategy()) {
        let players: Vec<Player> = investments
            .iter()
            .enumerate()
            .map(|(seat, (amount, folded))| invested(seat, *amount, *folded))
            .collect();
        for pot in compute_side_pots(&players) {
            for seat in &pot.eligible {
                let player = &players[*seat];
                prop_assert!(!player.folded);
                prop_assert!(player.invested > 0);
            }
        }
    }

    #[test]
    fn test_eligibility_shrinks_with_each_layer(investments in investments_strategy()) {
        let players: Vec<Player> = investments
            .iter()
            .enumerate()
            .map(|(seat, (amount, _))| invested(seat, *amount, false))
            .collect();
        let pots = compute_side_pots(&players);
        for pair in pots.windows(2) {
            prop_assert!(pair[1].eligible.is_subset(&pair[0].eligible));
        }
    }

    #[test]
    fn test_distribution_conserves_chips(
        investments in investments_strategy(),
        ranks in prop::collection::vec(2u8..=14, 10),
    ) {
        let players: Vec<Player> = investments
            .iter()
            .enumerate()
            .map(|(seat, (amount, folded))| invested(seat, *amount, *folded))
            .collect();
        let pots = compute_side_pots(&players);
        // One-card hands keep ties common.
        let hands: BTreeMap<usize, _> = players
            .iter()
            .filter(|p| !p.folded)
            .map(|p| (p.seat_idx, eval(&[Card(ranks[p.seat_idx], Suit::ALL[p.seat_idx % 4])])))
            .collect();
        let order: Vec<usize> = (0..players.len()).collect();
        let awards = distribute(&pots, &hands, &order);

        for (pot, award) in pots.iter().zip(&awards) {
            if pot.eligible.is_empty() {
                continue;
            }
            let paid: Chips = award.winners.iter().map(|(_, amount)| amount).sum();
            prop_assert_eq!(paid, pot.amount);
            for (seat, _) in &award.winners {
                prop_assert!(pot.eligible.contains(seat));
            }
        }
    }
}
