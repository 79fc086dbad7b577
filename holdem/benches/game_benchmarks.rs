use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use holdem::{
    entities::{Action, Card, Player, Suit, Username},
    functional::{argmax, eval},
    game::betting::compute_side_pots,
    table::{Table, TableConfig, hand::StreetOutcome},
};

/// Helper to create a table with N players seated and ready to deal
fn setup_table_with_players(n_players: usize) -> Table {
    let mut table = Table::new(TableConfig {
        name: "bench".to_string(),
        ..TableConfig::default()
    });
    for i in 0..n_players {
        table
            .join(Username::new(&format!("player{i}")), 1_000)
            .unwrap();
    }
    table
}

/// Play one hand to showdown with everybody checking or calling.
fn play_hand(table: &mut Table) {
    table.start_hand().unwrap();
    loop {
        while let Some(player) = table.next_to_act() {
            let username = player.name.clone();
            let action = if table.action_choices(&username).contains(&Action::Check) {
                Action::Check
            } else {
                Action::Call
            };
            table.act(&username, action).unwrap();
        }
        match table.advance_street().unwrap() {
            StreetOutcome::Dealt { .. } => {}
            StreetOutcome::Showdown | StreetOutcome::Uncontested => break,
        }
    }
    table.finish_hand().unwrap();
}

/// Benchmark hand evaluation with 2 cards (pocket cards)
fn bench_hand_eval_2_cards(c: &mut Criterion) {
    let cards = vec![
        Card(14, Suit::Spade), // Ace
        Card(13, Suit::Spade), // King
    ];

    c.bench_function("hand_eval_2_cards", |b| {
        b.iter(|| eval(&cards));
    });
}

/// Benchmark hand evaluation with 7 cards (full hand + board)
fn bench_hand_eval_7_cards(c: &mut Criterion) {
    let cards = vec![
        Card(14, Suit::Spade),
        Card(13, Suit::Spade),
        Card(12, Suit::Spade),
        Card(11, Suit::Spade),
        Card(10, Suit::Spade),
        Card(2, Suit::Heart),
        Card(3, Suit::Diamond),
    ];

    c.bench_function("hand_eval_7_cards", |b| {
        b.iter(|| eval(&cards));
    });
}

/// Benchmark hand evaluation 100 times with varied hands
fn bench_hand_eval_100_iterations(c: &mut Criterion) {
    let all_hands: Vec<Vec<Card>> = (0..100u8)
        .map(|i| {
            let base = i % 9 + 2;
            vec![
                Card(base, Suit::Spade),
                Card(base + 1, Suit::Heart),
                Card(base + 2, Suit::Diamond),
                Card(base + 3, Suit::Club),
                Card((base + 5).min(14), Suit::Spade),
                Card((base + 6).min(14), Suit::Heart),
                Card(14 - i % 5, Suit::Diamond),
            ]
        })
        .collect();

    c.bench_function("hand_eval_100_iterations", |b| {
        b.iter(|| {
            all_hands
                .iter()
                .map(|cards| eval(cards))
                .collect::<Vec<_>>()
        });
    });
}

/// Benchmark hand comparison (argmax) with multiple hands
fn bench_hand_comparison(c: &mut Criterion) {
    let hands = vec![
        eval(&[Card(2, Suit::Club), Card(5, Suit::Heart), Card(9, Suit::Diamond)]),
        eval(&[Card(2, Suit::Club), Card(2, Suit::Heart), Card(9, Suit::Diamond)]),
        eval(&[
            Card(2, Suit::Club),
            Card(2, Suit::Heart),
            Card(9, Suit::Diamond),
            Card(9, Suit::Club),
        ]),
        eval(&[Card(2, Suit::Club), Card(2, Suit::Heart), Card(2, Suit::Diamond)]),
    ];

    c.bench_function("hand_comparison_4_hands", |b| {
        b.iter(|| argmax(&hands));
    });
}

/// Benchmark side pot layering with everybody all-in for a different amount
fn bench_side_pots(c: &mut Criterion) {
    let mut group = c.benchmark_group("side_pots");

    for n_players in [2, 6, 10].iter() {
        let players: Vec<Player> = (0..*n_players)
            .map(|seat| {
                let stack = 100 * (seat as u64 + 1);
                let mut player = Player::new(Username::new(&format!("player{seat}")), stack, seat);
                player.commit(stack);
                player.folded = seat % 3 == 2;
                player
            })
            .collect();
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{n_players}_players")),
            &players,
            |b, players| {
                b.iter(|| compute_side_pots(players));
            },
        );
    }

    group.finish();
}

/// Benchmark a full checked-down hand with different player counts
fn bench_full_hand(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_hand");

    for n_players in [2, 6, 10].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{n_players}_players")),
            n_players,
            |b, &n| {
                b.iter_batched(
                    || setup_table_with_players(n),
                    |mut table| {
                        play_hand(&mut table);
                        table
                    },
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

/// Benchmark snapshot generation (served on every state query)
fn bench_snapshot(c: &mut Criterion) {
    let mut table = setup_table_with_players(6);
    table.start_hand().unwrap();
    c.bench_function("snapshot_6_players", |b| {
        b.iter(|| table.snapshot());
    });
}

criterion_group!(
    hand_evaluation,
    bench_hand_eval_2_cards,
    bench_hand_eval_7_cards,
    bench_hand_eval_100_iterations,
    bench_hand_comparison,
);

criterion_group!(
    table_operations,
    bench_side_pots,
    bench_full_hand,
    bench_snapshot,
);

criterion_main!(hand_evaluation, table_operations);
