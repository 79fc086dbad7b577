//! Phase tracking for the table.
//!
//! [`StateMachine`] is generic over its phase type and only knows how to ask
//! an injected predicate whether a move is allowed. [`TablePhase`] and
//! [`TablePhase::can_transition`] describe the hand lifecycle the table runs.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum StateMachineError<P: fmt::Debug + fmt::Display> {
    #[error("illegal transition from {from} to {to}")]
    Illegal { from: P, to: P },
}

/// Decides whether `from -> to` is a legal move.
pub type TransitionFn<P> = fn(&P, &P) -> bool;

/// Holds the current phase and refuses moves the predicate rejects. Staying
/// in the current phase is always allowed.
#[derive(Clone, Debug)]
pub struct StateMachine<P> {
    current: P,
    can_transition: TransitionFn<P>,
}

impl<P> StateMachine<P>
where
    P: Clone + fmt::Debug + fmt::Display + PartialEq,
{
    #[must_use]
    pub fn new(initial: P, can_transition: TransitionFn<P>) -> Self {
        Self {
            current: initial,
            can_transition,
        }
    }

    #[must_use]
    pub fn current(&self) -> &P {
        &self.current
    }

    #[must_use]
    pub fn can_transition(&self, to: &P) -> bool {
        *to == self.current || (self.can_transition)(&self.current, to)
    }

    /// Move to `to`, returning the phase that was left.
    pub fn transition(&mut self, to: P) -> Result<P, StateMachineError<P>> {
        if !self.can_transition(&to) {
            return Err(StateMachineError::Illegal {
                from: self.current.clone(),
                to,
            });
        }
        Ok(std::mem::replace(&mut self.current, to))
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum TablePhase {
    #[default]
    WaitingForPlayers,
    BetweenHands,
    PreFlop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl TablePhase {
    /// Phases in which players make betting decisions.
    #[must_use]
    pub const fn is_betting(&self) -> bool {
        matches!(self, Self::PreFlop | Self::Flop | Self::Turn | Self::River)
    }

    /// Phases during which a hand is running.
    #[must_use]
    pub const fn in_hand(&self) -> bool {
        self.is_betting() || matches!(self, Self::Showdown)
    }

    /// Next street, if the hand keeps going.
    #[must_use]
    pub const fn next_street(&self) -> Option<Self> {
        match self {
            Self::PreFlop => Some(Self::Flop),
            Self::Flop => Some(Self::Turn),
            Self::Turn => Some(Self::River),
            Self::River => Some(Self::Showdown),
            _ => None,
        }
    }

    /// Legal moves of the hand lifecycle. Every betting street may jump to
    /// showdown once the hand is decided, or fall back to `BetweenHands`
    /// when the hand is abandoned.
    #[must_use]
    pub fn can_transition(from: &Self, to: &Self) -> bool {
        use TablePhase::{BetweenHands, Flop, PreFlop, River, Showdown, Turn, WaitingForPlayers};

        match (from, to) {
            (WaitingForPlayers, BetweenHands)
            | (BetweenHands, PreFlop | WaitingForPlayers)
            | (PreFlop, Flop)
            | (Flop, Turn)
            | (Turn, River)
            | (Showdown, BetweenHands | WaitingForPlayers) => true,
            (PreFlop | Flop | Turn | River, Showdown | BetweenHands) => true,
            _ => false,
        }
    }

    #[must_use]
    pub fn machine() -> StateMachine<Self> {
        StateMachine::new(Self::WaitingForPlayers, Self::can_transition)
    }
}

impl fmt::Display for TablePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::WaitingForPlayers => "waiting for players",
            Self::BetweenHands => "between hands",
            Self::PreFlop => "pre-flop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
        };
        write!(f, "{repr}")
    }
}
