//! Hand Evaluation Example
//!
//! Demonstrates how to evaluate and compare hands, then settles a three-way
//! all-in with side pots.

use holdem::{
    entities::{Card, Player, Suit, Username},
    functional::{argmax, eval},
    game::betting::{compute_side_pots, distribute, total_payouts},
};
use std::collections::BTreeMap;

fn main() {
    println!("=== Poker Hand Evaluation Example ===\n");

    // Example 1: Evaluate a single hand
    println!("Example 1: Evaluating a 7-card hand");
    let hand = vec![
        Card(14, Suit::Heart),
        Card(13, Suit::Heart),
        Card(12, Suit::Heart),
        Card(11, Suit::Heart),
        Card(10, Suit::Heart),
        Card(9, Suit::Spade),
        Card(2, Suit::Club),
    ];
    let value = eval(&hand);
    println!("Hand: {}", cards(&hand));
    println!("Best five: {value}\n");

    // Example 2: Compare two hands
    println!("Example 2: Comparing two hands");
    let board = [
        Card(10, Suit::Club),
        Card(9, Suit::Diamond),
        Card(2, Suit::Spade),
    ];
    let aces = [&[Card(14, Suit::Spade), Card(14, Suit::Heart)], &board[..]].concat();
    let kings = [&[Card(13, Suit::Spade), Card(13, Suit::Heart)], &board[..]].concat();
    let values = [eval(&aces), eval(&kings)];
    println!("Hand A: {} => {}", cards(&aces), values[0]);
    println!("Hand B: {} => {}", cards(&kings), values[1]);
    match argmax(&values).as_slice() {
        [0] => println!("Winner: Hand A\n"),
        [1] => println!("Winner: Hand B\n"),
        _ => println!("Tie!\n"),
    }

    // Example 3: Side pots
    println!("Example 3: Three-way all-in for 500, 300 and 500");
    let mut players: Vec<Player> = [("alice", 500), ("bob", 300), ("carol", 1_000)]
        .into_iter()
        .enumerate()
        .map(|(seat, (name, stack))| Player::new(Username::new(name), stack, seat))
        .collect();
    for player in &mut players {
        player.commit(500);
    }
    let pots = compute_side_pots(&players);
    for (i, pot) in pots.iter().enumerate() {
        println!("Pot {i}: {} chips, eligible seats {:?}", pot.amount, pot.eligible);
    }

    // bob has the best hand, alice the second best.
    let hands = BTreeMap::from([(0, values[1].clone()), (1, values[0].clone()), (2, eval(&board))]);
    for (seat, amount) in total_payouts(&distribute(&pots, &hands, &[1, 2, 0])) {
        println!("{} wins {amount}", players[seat].name);
    }
}

fn cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
