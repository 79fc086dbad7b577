//! Wallet error types.

use thiserror::Error;

use super::models::TableId;
use crate::game::entities::{Chips, Username};

/// Wallet errors
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum WalletError {
    /// Insufficient balance
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: Chips, required: Chips },

    /// Wallet not found
    #[error("Wallet not found for user {0}")]
    WalletNotFound(Username),

    /// Escrow not found
    #[error("Escrow not found for table {0}")]
    EscrowNotFound(TableId),

    /// Duplicate transaction (idempotency key already used)
    #[error("Duplicate transaction: {0}")]
    DuplicateTransaction(String),

    /// Invalid amount (must be positive)
    #[error("Invalid amount: {0}")]
    InvalidAmount(Chips),

    /// Balance would overflow
    #[error("Balance overflow")]
    BalanceOverflow,

    /// Ledger could not be reached
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

impl WalletError {
    /// Get a client-safe error message that doesn't leak sensitive information
    pub fn client_message(&self) -> String {
        match self {
            WalletError::WalletNotFound(_) => "Wallet not found".to_string(),
            WalletError::EscrowNotFound(_) => "Escrow not found".to_string(),
            WalletError::Unavailable(_) => "Ledger unavailable, try again later".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for wallet operations
pub type WalletResult<T> = Result<T, WalletError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_hides_identities() {
        let err = WalletError::WalletNotFound("alice".into());
        assert_eq!(err.client_message(), "Wallet not found");
        let err = WalletError::Unavailable("connection reset by peer".to_string());
        assert!(!err.client_message().contains("peer"));
    }

    #[test]
    fn test_client_message_passes_through_safe_errors() {
        let err = WalletError::InsufficientBalance {
            available: 10,
            required: 50,
        };
        assert_eq!(err.client_message(), err.to_string());
    }
}
