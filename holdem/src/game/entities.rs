use rand::seq::SliceRandom;
use serde::{Deserialize, Deserializer, Serialize};
use std::{
    collections::HashSet,
    fmt::{self},
    hash::{Hash, Hasher},
    mem::discriminant,
};
use thiserror::Error;

use super::constants;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Spade,
    Diamond,
    Heart,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Club, Suit::Spade, Suit::Diamond, Suit::Heart];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Spade => "♠",
            Self::Diamond => "♦",
            Self::Heart => "♥",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for card values.
pub type Value = u8;

pub const TWO: Value = 2;
pub const JACK: Value = 11;
pub const QUEEN: Value = 12;
pub const KING: Value = 13;
pub const ACE: Value = 14;

/// A card is a tuple of a value (two=2u8 ... ace=14u8) and a suit.
/// Aces are always stored high; the evaluator handles the wheel.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl Card {
    #[must_use]
    pub const fn value(&self) -> Value {
        self.0
    }

    #[must_use]
    pub const fn suit(&self) -> Suit {
        self.1
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.0 {
            ACE => "A",
            KING => "K",
            QUEEN => "Q",
            JACK => "J",
            v => &v.to_string(),
        };
        let repr = format!("{value}/{}", self.1);
        write!(f, "{repr:>4}")
    }
}

/// Raised when a hand asks for more cards than the deck holds.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
#[error("deck exhausted after {dealt} cards")]
pub struct DeckExhausted {
    pub dealt: usize,
}

/// A 52 card deck dealt from the front. A fresh deck is built and shuffled
/// for every hand, cards are never put back while a hand is running.
#[derive(Clone, Debug)]
pub struct Deck {
    cards: Vec<Card>,
    deck_idx: usize,
}

impl Deck {
    fn ordered() -> Vec<Card> {
        let mut cards = Vec::with_capacity(constants::DECK_SIZE);
        for value in TWO..=ACE {
            for suit in Suit::ALL {
                cards.push(Card(value, suit));
            }
        }
        cards
    }

    /// Full deck in a fair (not cryptographic) random order.
    #[must_use]
    pub fn new_shuffled() -> Self {
        let mut cards = Self::ordered();
        cards.shuffle(&mut rand::rng());
        Self { cards, deck_idx: 0 }
    }

    /// Deck whose first cards are `top` in the given order, followed by the
    /// rest of the 52 cards shuffled. Duplicates in `top` are dropped.
    #[must_use]
    pub fn stacked(top: &[Card]) -> Self {
        let mut seen = HashSet::with_capacity(top.len());
        let mut cards: Vec<Card> = top.iter().copied().filter(|c| seen.insert(*c)).collect();
        let mut rest: Vec<Card> = Self::ordered()
            .into_iter()
            .filter(|c| !seen.contains(c))
            .collect();
        rest.shuffle(&mut rand::rng());
        cards.extend(rest);
        Self { cards, deck_idx: 0 }
    }

    /// Deck holding exactly `cards`, dealt in order. A short deck runs out
    /// mid-hand.
    #[must_use]
    pub fn exact(cards: Vec<Card>) -> Self {
        Self { cards, deck_idx: 0 }
    }

    pub fn draw_one(&mut self) -> Result<Card, DeckExhausted> {
        let card = self
            .cards
            .get(self.deck_idx)
            .copied()
            .ok_or(DeckExhausted {
                dealt: self.deck_idx,
            })?;
        self.deck_idx += 1;
        Ok(card)
    }

    pub fn draw_many(&mut self, n: usize) -> Result<Vec<Card>, DeckExhausted> {
        if self.remaining() < n {
            return Err(DeckExhausted {
                dealt: self.deck_idx,
            });
        }
        (0..n).map(|_| self.draw_one()).collect()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cards.len() - self.deck_idx
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new_shuffled()
    }
}

/// Type alias for whole chips. Stacks, bets and pots are all counted in
/// chips; conversion to anything else is the ledger's business.
pub type Chips = u64;

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Username(String);

impl Username {
    pub fn new(s: &str) -> Self {
        let mut username: String = s
            .trim()
            .chars()
            .map(|c| if c.is_ascii_whitespace() { '_' } else { c })
            .collect();
        if let Some((idx, _)) = username
            .char_indices()
            .nth(constants::MAX_USER_INPUT_LENGTH / 2)
        {
            username.truncate(idx);
        }
        Self(username)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for Username {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for Username {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Type alias for seat positions at the table.
pub type SeatIndex = usize;

/// Positions for the running hand, as indices into the table's player list.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct PlayPositions {
    pub button_idx: usize,
    pub small_blind_idx: usize,
    pub big_blind_idx: usize,
    pub starting_action_idx: usize,
    pub next_action_idx: Option<usize>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Blinds {
    pub small: Chips,
    pub big: Chips,
}

impl fmt::Display for Blinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = format!("{}/{}", self.small, self.big);
        write!(f, "{repr}")
    }
}

/// What a player asks to do on their turn. `Raise` carries the amount to
/// raise by on top of the current bet to match.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Action {
    Fold,
    Check,
    Call,
    Raise(Chips),
    AllIn,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::AllIn => "all-ins",
            Self::Call => "calls",
            Self::Check => "checks",
            Self::Fold => "folds",
            Self::Raise(amount) => &format!("raises {amount}"),
        };
        write!(f, "{repr}")
    }
}

impl From<Bet> for Action {
    fn from(value: Bet) -> Self {
        match value.action {
            BetAction::AllIn => Self::AllIn,
            BetAction::Call => Self::Call,
            BetAction::Raise => Self::Raise(value.raise_by),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub enum ActionChoice {
    AllIn(Chips),
    Call(Chips),
    Check,
    Fold,
    Raise(Chips),
}

impl fmt::Display for ActionChoice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::AllIn(amount) => format!("all-in (== {amount})"),
            Self::Call(amount) => format!("call (== {amount})"),
            Self::Check => "check".to_string(),
            Self::Fold => "fold".to_string(),
            Self::Raise(amount) => format!("raise (>= {amount})"),
        };
        write!(f, "{repr}")
    }
}

// Choices are compared by variant only. The amounts are hints shown to the
// player; the validator decides whether a concrete amount is legal.
impl Eq for ActionChoice {}

impl Hash for ActionChoice {
    fn hash<H: Hasher>(&self, state: &mut H) {
        discriminant(self).hash(state);
    }
}

impl PartialEq for ActionChoice {
    fn eq(&self, other: &Self) -> bool {
        discriminant(self) == discriminant(other)
    }
}

/// The set of actions available to the player whose turn it is.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ActionChoices(pub HashSet<ActionChoice>);

impl ActionChoices {
    pub fn contains(&self, action: &Action) -> bool {
        let action_choice = match action {
            Action::AllIn => ActionChoice::AllIn(0),
            Action::Call => ActionChoice::Call(0),
            Action::Check => ActionChoice::Check,
            Action::Fold => ActionChoice::Fold,
            Action::Raise(_) => ActionChoice::Raise(0),
        };
        self.0.contains(&action_choice)
    }

    /// Choices in a stable order for display.
    #[must_use]
    pub fn sorted(&self) -> Vec<ActionChoice> {
        let rank = |c: &ActionChoice| match c {
            ActionChoice::Fold => 0,
            ActionChoice::Check => 1,
            ActionChoice::Call(_) => 2,
            ActionChoice::Raise(_) => 3,
            ActionChoice::AllIn(_) => 4,
        };
        let mut choices: Vec<_> = self.0.iter().copied().collect();
        choices.sort_by_key(rank);
        choices
    }
}

impl fmt::Display for ActionChoices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let choices = self.sorted();
        let num_options = choices.len();
        let repr = choices
            .iter()
            .enumerate()
            .map(|(i, action_choice)| {
                let repr = action_choice.to_string();
                match i {
                    0 if num_options == 1 => repr,
                    0 if num_options == 2 => format!("{repr} "),
                    0 if num_options >= 3 => format!("{repr}, "),
                    i if i == num_options - 1 && num_options != 1 => format!("or {repr}"),
                    _ => format!("{repr}, "),
                }
            })
            .collect::<String>();
        write!(f, "{repr}")
    }
}

impl<I> From<I> for ActionChoices
where
    I: IntoIterator<Item = ActionChoice>,
{
    fn from(iter: I) -> Self {
        Self(iter.into_iter().collect::<HashSet<_>>())
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum BetAction {
    AllIn,
    Call,
    Raise,
}

/// A validated chip movement. `amount` is what leaves the player's stack,
/// `raise_by` is how far the bet to match goes up because of it.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Bet {
    pub action: BetAction,
    pub amount: Chips,
    pub raise_by: Chips,
}

impl fmt::Display for Bet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let amount = self.amount;
        let repr = match self.action {
            BetAction::AllIn => format!("all-in of {amount}"),
            BetAction::Call => format!("call of {amount}"),
            BetAction::Raise => format!("raise of {}", self.raise_by),
        };
        write!(f, "{repr}")
    }
}

/// A seated participant. Survives across hands; per-hand fields are
/// cleared by [`Player::reset`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Player {
    pub name: Username,
    pub stack: Chips,
    pub cards: Vec<Card>,
    /// Chips put in during the current betting round.
    pub bet: Chips,
    /// Chips put in during the whole hand, blinds included.
    pub invested: Chips,
    pub folded: bool,
    pub all_in: bool,
    pub is_dealer: bool,
    pub is_small_blind: bool,
    pub is_big_blind: bool,
    pub has_acted: bool,
    pub seat_idx: SeatIndex,
    pub last_action: Option<Action>,
}

impl Player {
    #[must_use]
    pub fn new(name: Username, stack: Chips, seat_idx: SeatIndex) -> Self {
        Self {
            name,
            stack,
            cards: Vec::with_capacity(constants::HOLE_CARDS),
            bet: 0,
            invested: 0,
            folded: false,
            all_in: false,
            is_dealer: false,
            is_small_blind: false,
            is_big_blind: false,
            has_acted: false,
            seat_idx,
            last_action: None,
        }
    }

    pub fn reset(&mut self) {
        self.cards.clear();
        self.bet = 0;
        self.invested = 0;
        self.folded = false;
        self.all_in = false;
        self.is_dealer = false;
        self.is_small_blind = false;
        self.is_big_blind = false;
        self.has_acted = false;
        self.last_action = None;
    }

    /// Move chips from the stack into the current bet. Never takes more
    /// than the stack; going to zero marks the player all-in.
    pub fn commit(&mut self, amount: Chips) -> Chips {
        let amount = amount.min(self.stack);
        self.stack -= amount;
        self.bet += amount;
        self.invested += amount;
        if self.stack == 0 {
            self.all_in = true;
        }
        amount
    }

    /// Still holding cards in this hand.
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.folded
    }

    /// Still able to make betting decisions in this hand.
    #[must_use]
    pub fn can_act(&self) -> bool {
        !self.folded && !self.all_in
    }
}
