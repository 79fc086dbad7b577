//! Hold'em rules with no notion of time or I/O.
//!
//! - [`entities`]: cards, deck, players, actions
//! - [`functional`]: hand evaluation
//! - [`betting`]: blinds, round completion, side pots, payouts
//! - [`validation`]: action legality
//! - [`state_machine`]: table phases

pub mod betting;
pub mod constants;
pub mod entities;
pub mod functional;
pub mod state_machine;
pub mod validation;
