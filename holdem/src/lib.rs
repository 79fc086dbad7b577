//! # Holdem
//!
//! A continuous single-table Texas Hold'em engine.
//!
//! Players join with chips taken from a ledger, hands are dealt back to back
//! through blinds, four betting streets and showdown, and all-ins with
//! unequal stacks are settled with side pots.
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, hand evaluation, betting rules and table phases
//! - [`table`]: The table and the async actor that runs it
//! - [`wallet`]: Ledger interface and an in-memory ledger
//! - [`notify`]: Player-facing facts and their sinks
//!
//! ## Example
//!
//! ```
//! use holdem::game::{
//!     entities::{Card, Suit},
//!     functional::{Category, eval},
//! };
//!
//! let hand = eval(&[
//!     Card(14, Suit::Heart),
//!     Card(13, Suit::Heart),
//!     Card(12, Suit::Heart),
//!     Card(11, Suit::Heart),
//!     Card(10, Suit::Heart),
//!     Card(2, Suit::Club),
//!     Card(3, Suit::Spade),
//! ]);
//! assert_eq!(hand.category, Category::RoyalFlush);
//! ```

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    constants::{self, MAX_PLAYERS},
    entities::{self, Action, Card, Chips, Username},
    functional,
};

pub mod notify;
pub mod table;
pub mod wallet;
