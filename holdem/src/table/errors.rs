//! Table error types.

use thiserror::Error;

use crate::{
    game::{
        entities::{Chips, DeckExhausted, Username},
        state_machine::{StateMachineError, TablePhase},
    },
    wallet::WalletError,
};

/// Failures joining, leaving, or running a hand.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TableError {
    #[error("need {required} chips, have {available}")]
    InsufficientFunds { required: Chips, available: Chips },

    #[error("table is full")]
    TableFull,

    #[error("{0} is already at the table")]
    AlreadySeated(Username),

    #[error("not at the table")]
    NotSeated,

    #[error("buy-in must be between {min} and {max} chips")]
    BuyInOutOfRange { min: Chips, max: Chips },

    #[error("need {required} players to deal")]
    NotEnoughPlayers { required: usize },

    #[error(transparent)]
    DeckExhausted(#[from] DeckExhausted),

    #[error(transparent)]
    IllegalTransition(#[from] StateMachineError<TablePhase>),

    #[error("ledger error: {0}")]
    Wallet(WalletError),
}

impl From<WalletError> for TableError {
    fn from(value: WalletError) -> Self {
        match value {
            WalletError::InsufficientBalance {
                available,
                required,
            } => Self::InsufficientFunds {
                required,
                available,
            },
            other => Self::Wallet(other),
        }
    }
}

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_balance_maps_to_insufficient_funds() {
        let err = TableError::from(WalletError::InsufficientBalance {
            available: 50,
            required: 400,
        });
        assert_eq!(
            err,
            TableError::InsufficientFunds {
                required: 400,
                available: 50,
            }
        );
    }

    #[test]
    fn test_illegal_transition_message() {
        let err = TableError::from(StateMachineError::Illegal {
            from: TablePhase::Flop,
            to: TablePhase::PreFlop,
        });
        assert_eq!(err.to_string(), "illegal transition from flop to pre-flop");
    }
}
