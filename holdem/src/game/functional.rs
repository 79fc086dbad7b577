//! Hand evaluation.
//!
//! Pure functions only: the same cards always produce the same
//! [`HandValue`], which makes showdown results reproducible and the
//! evaluator trivially testable.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

use super::entities::{ACE, Card, Value};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Category {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
    RoyalFlush,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "high card",
            Self::OnePair => "pair",
            Self::TwoPair => "two pair",
            Self::ThreeOfAKind => "three of a kind",
            Self::Straight => "straight",
            Self::Flush => "flush",
            Self::FullHouse => "full house",
            Self::FourOfAKind => "four of a kind",
            Self::StraightFlush => "straight flush",
            Self::RoyalFlush => "royal flush",
        };
        write!(f, "{repr}")
    }
}

/// Strength of a best five card hand.
///
/// Ordering is by category first, then by `values`: the ranks that break
/// ties within the category, most significant first (e.g. pair rank, then
/// kickers high to low; the top card for straights). Two equal values are an
/// exact tie and split the pot.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct HandValue {
    pub category: Category,
    pub values: Vec<Value>,
}

impl fmt::Display for HandValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = |v: Value| match v {
            14 => "A".to_string(),
            13 => "K".to_string(),
            12 => "Q".to_string(),
            11 => "J".to_string(),
            v => v.to_string(),
        };
        match (self.category, self.values.first()) {
            (Category::RoyalFlush, _) | (_, None) => write!(f, "{}", self.category),
            (Category::Straight | Category::StraightFlush, Some(&high)) => {
                write!(f, "{}, {} high", self.category, name(high))
            }
            (Category::HighCard | Category::Flush, Some(&high)) => {
                write!(f, "{}, {} high", self.category, name(high))
            }
            (Category::FullHouse, Some(&trips)) => {
                let pair = self.values.get(1).copied().unwrap_or_default();
                write!(f, "{}, {}s full of {}s", self.category, name(trips), name(pair))
            }
            (Category::TwoPair, Some(&high)) => {
                let low = self.values.get(1).copied().unwrap_or_default();
                write!(f, "{}, {}s and {}s", self.category, name(high), name(low))
            }
            (_, Some(&top)) => write!(f, "{}, {}s", self.category, name(top)),
        }
    }
}

/// Group card values by multiplicity, biggest groups first and higher
/// values first within equally sized groups.
fn groups(values: &[Value]) -> Vec<(usize, Value)> {
    let mut counts: BTreeMap<Value, usize> = BTreeMap::new();
    for &value in values {
        *counts.entry(value).or_default() += 1;
    }
    let mut groups: Vec<(usize, Value)> = counts.into_iter().map(|(v, n)| (n, v)).collect();
    groups.sort_unstable_by(|a, b| b.cmp(a));
    groups
}

/// High card of a five card straight, with the wheel counted five high.
fn straight_high(sorted_desc: &[Value]) -> Option<Value> {
    let distinct = sorted_desc.windows(2).all(|w| w[0] != w[1]);
    if sorted_desc.len() != 5 || !distinct {
        return None;
    }
    if sorted_desc[0] - sorted_desc[4] == 4 {
        Some(sorted_desc[0])
    } else if sorted_desc == [ACE, 5, 4, 3, 2] {
        Some(5)
    } else {
        None
    }
}

fn score_multiples(values: &[Value]) -> HandValue {
    let groups = groups(values);
    let shape: Vec<usize> = groups.iter().map(|(n, _)| *n).collect();
    let category = match shape.as_slice() {
        [4, ..] => Category::FourOfAKind,
        [3, 2, ..] => Category::FullHouse,
        [3, ..] => Category::ThreeOfAKind,
        [2, 2, ..] => Category::TwoPair,
        [2, ..] => Category::OnePair,
        _ => Category::HighCard,
    };
    HandValue {
        category,
        values: groups.into_iter().map(|(_, v)| v).collect(),
    }
}

fn score_five(cards: &[Card; 5]) -> HandValue {
    let mut values: Vec<Value> = cards.iter().map(Card::value).collect();
    values.sort_unstable_by(|a, b| b.cmp(a));
    let flush = cards.iter().all(|c| c.suit() == cards[0].suit());
    let straight = straight_high(&values);

    match (flush, straight) {
        (true, Some(ACE)) => HandValue {
            category: Category::RoyalFlush,
            values: vec![ACE],
        },
        (true, Some(high)) => HandValue {
            category: Category::StraightFlush,
            values: vec![high],
        },
        _ => {
            let multiples = score_multiples(&values);
            if multiples.category >= Category::FullHouse {
                multiples
            } else if flush {
                HandValue {
                    category: Category::Flush,
                    values,
                }
            } else if let Some(high) = straight {
                HandValue {
                    category: Category::Straight,
                    values: vec![high],
                }
            } else {
                multiples
            }
        }
    }
}

/// Evaluate the best five card hand out of `cards`.
///
/// Every 5 card subset is scored and the maximum kept (21 subsets for the
/// usual 2 hole + 5 board). With fewer than five cards, e.g. hole cards
/// before the flop, only pairs, trips, quads and high cards count.
#[must_use]
pub fn eval(cards: &[Card]) -> HandValue {
    let n = cards.len();
    if n < 5 {
        let mut values: Vec<Value> = cards.iter().map(Card::value).collect();
        values.sort_unstable_by(|a, b| b.cmp(a));
        return score_multiples(&values);
    }

    let mut best: Option<HandValue> = None;
    for a in 0..n {
        for b in a + 1..n {
            for c in b + 1..n {
                for d in c + 1..n {
                    for e in d + 1..n {
                        let hand = [cards[a], cards[b], cards[c], cards[d], cards[e]];
                        let value = score_five(&hand);
                        if best.as_ref().is_none_or(|best| value > *best) {
                            best = Some(value);
                        }
                    }
                }
            }
        }
    }
    best.unwrap_or(HandValue {
        category: Category::HighCard,
        values: Vec::new(),
    })
}

/// Indices of every hand tied for the best value, in ascending order.
#[must_use]
pub fn argmax(hands: &[HandValue]) -> Vec<usize> {
    let Some(best) = hands.iter().max() else {
        return Vec::new();
    };
    hands
        .iter()
        .enumerate()
        .filter(|(_, hand)| *hand == best)
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{JACK, KING, QUEEN, Suit};

    fn c(value: Value, suit: Suit) -> Card {
        Card(value, suit)
    }

    use Suit::{Club as C, Diamond as D, Heart as H, Spade as S};

    #[test]
    fn test_category_of_each_five_card_hand() {
        let cases = [
            (
                vec![c(2, C), c(7, D), c(9, H), c(JACK, S), c(KING, C)],
                Category::HighCard,
            ),
            (
                vec![c(2, C), c(2, D), c(9, H), c(JACK, S), c(KING, C)],
                Category::OnePair,
            ),
            (
                vec![c(2, C), c(2, D), c(9, H), c(9, S), c(KING, C)],
                Category::TwoPair,
            ),
            (
                vec![c(2, C), c(2, D), c(2, H), c(9, S), c(KING, C)],
                Category::ThreeOfAKind,
            ),
            (
                vec![c(5, C), c(6, D), c(7, H), c(8, S), c(9, C)],
                Category::Straight,
            ),
            (
                vec![c(2, H), c(7, H), c(9, H), c(JACK, H), c(KING, H)],
                Category::Flush,
            ),
            (
                vec![c(2, C), c(2, D), c(2, H), c(9, S), c(9, C)],
                Category::FullHouse,
            ),
            (
                vec![c(2, C), c(2, D), c(2, H), c(2, S), c(9, C)],
                Category::FourOfAKind,
            ),
            (
                vec![c(5, S), c(6, S), c(7, S), c(8, S), c(9, S)],
                Category::StraightFlush,
            ),
            (
                vec![c(10, D), c(JACK, D), c(QUEEN, D), c(KING, D), c(ACE, D)],
                Category::RoyalFlush,
            ),
        ];

        let mut previous: Option<HandValue> = None;
        for (cards, category) in cases {
            let value = eval(&cards);
            assert_eq!(value.category, category, "{cards:?}");
            if let Some(previous) = previous {
                assert!(value > previous, "{category} should beat {}", previous.category);
            }
            previous = Some(value);
        }
    }

    #[test]
    fn test_worst_flush_beats_best_straight() {
        let flush = eval(&[c(2, H), c(3, H), c(4, H), c(5, H), c(7, H)]);
        let straight = eval(&[c(10, C), c(JACK, D), c(QUEEN, H), c(KING, S), c(ACE, C)]);
        assert!(flush > straight);
    }

    #[test]
    fn test_wheel_is_lowest_straight() {
        let wheel = eval(&[c(ACE, C), c(2, D), c(3, H), c(4, S), c(5, C)]);
        let six_high = eval(&[c(2, D), c(3, H), c(4, S), c(5, C), c(6, C)]);
        let ace_high = eval(&[c(ACE, C), c(KING, D), c(QUEEN, H), c(JACK, S), c(9, C)]);
        assert_eq!(wheel.category, Category::Straight);
        assert_eq!(wheel.values, vec![5]);
        assert!(six_high > wheel);
        assert!(wheel > ace_high);
    }

    #[test]
    fn test_steel_wheel_is_straight_flush() {
        let value = eval(&[c(ACE, S), c(2, S), c(3, S), c(4, S), c(5, S)]);
        assert_eq!(value.category, Category::StraightFlush);
        assert_eq!(value.values, vec![5]);
    }

    #[test]
    fn test_no_wraparound_straight() {
        let value = eval(&[c(QUEEN, C), c(KING, D), c(ACE, H), c(2, S), c(3, C)]);
        assert_eq!(value.category, Category::HighCard);
    }

    #[test]
    fn test_seven_cards_pick_best_five() {
        // Board pairs, but the hole cards make a flush.
        let cards = [
            c(ACE, H),
            c(3, H),
            c(KING, H),
            c(KING, C),
            c(9, H),
            c(5, H),
            c(2, S),
        ];
        let value = eval(&cards);
        assert_eq!(value.category, Category::Flush);
        assert_eq!(value.values, vec![ACE, KING, 9, 5, 3]);
    }

    #[test]
    fn test_seven_card_full_house_from_two_trips() {
        let cards = [
            c(9, H),
            c(9, C),
            c(9, D),
            c(4, S),
            c(4, C),
            c(4, D),
            c(2, S),
        ];
        let value = eval(&cards);
        assert_eq!(value.category, Category::FullHouse);
        assert_eq!(value.values, vec![9, 4]);
    }

    #[test]
    fn test_kickers_break_ties() {
        let board = [c(ACE, S), c(ACE, H), c(8, C), c(6, D), c(2, C)];
        let mut alice = board.to_vec();
        alice.extend([c(KING, C), c(3, D)]);
        let mut bob = board.to_vec();
        bob.extend([c(QUEEN, C), c(3, S)]);
        assert!(eval(&alice) > eval(&bob));
    }

    #[test]
    fn test_two_pair_kicker() {
        let a = eval(&[c(9, C), c(9, D), c(5, H), c(5, S), c(KING, C)]);
        let b = eval(&[c(9, H), c(9, S), c(5, C), c(5, D), c(QUEEN, C)]);
        assert_eq!(a.values, vec![9, 5, KING]);
        assert!(a > b);
    }

    #[test]
    fn test_board_plays_is_exact_tie() {
        let board = [c(5, S), c(6, H), c(7, C), c(8, D), c(9, S)];
        let mut alice = board.to_vec();
        alice.extend([c(2, C), c(3, D)]);
        let mut bob = board.to_vec();
        bob.extend([c(2, H), c(4, D)]);
        assert_eq!(eval(&alice), eval(&bob));
        assert_eq!(argmax(&[eval(&alice), eval(&bob)]), vec![0, 1]);
    }

    #[test]
    fn test_partial_hands() {
        let pocket_aces = eval(&[c(ACE, S), c(ACE, H)]);
        assert_eq!(pocket_aces.category, Category::OnePair);
        let unsuited = eval(&[c(KING, S), c(7, H)]);
        assert_eq!(unsuited.category, Category::HighCard);
        assert_eq!(unsuited.values, vec![KING, 7]);
        assert!(pocket_aces > unsuited);
        assert_eq!(eval(&[]).category, Category::HighCard);
    }

    #[test]
    fn test_eval_is_order_independent() {
        let cards = [
            c(ACE, H),
            c(3, H),
            c(KING, H),
            c(KING, C),
            c(9, H),
            c(5, H),
            c(2, S),
        ];
        let mut reversed = cards;
        reversed.reverse();
        assert_eq!(eval(&cards), eval(&reversed));
    }

    #[test]
    fn test_argmax_empty_and_single() {
        assert!(argmax(&[]).is_empty());
        let value = eval(&[c(2, C), c(3, D)]);
        assert_eq!(argmax(&[value]), vec![0]);
    }

    #[test]
    fn test_hand_value_display() {
        let straight = eval(&[c(5, C), c(6, D), c(7, H), c(8, S), c(9, C)]);
        assert_eq!(straight.to_string(), "straight, 9 high");
        let boat = eval(&[c(KING, C), c(KING, D), c(KING, H), c(2, S), c(2, C)]);
        assert_eq!(boat.to_string(), "full house, Ks full of 2s");
        let royal = eval(&[c(10, D), c(JACK, D), c(QUEEN, D), c(KING, D), c(ACE, D)]);
        assert_eq!(royal.to_string(), "royal flush");
    }
}
