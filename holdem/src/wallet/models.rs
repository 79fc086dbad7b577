//! Wallet data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::entities::{Chips, Username};

/// Table ID type, the table's configured name
pub type TableId = String;

/// Wallet entry model, one line of the append-only journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletEntry {
    pub id: u64,
    pub user: Username,
    pub table_id: Option<TableId>,
    pub amount: Chips,
    pub balance_after: Chips,
    pub direction: EntryDirection,
    pub entry_type: EntryType,
    pub idempotency_key: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Entry direction, seen from the user's wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryDirection {
    Debit,
    Credit,
}

impl std::fmt::Display for EntryDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryDirection::Debit => write!(f, "debit"),
            EntryDirection::Credit => write!(f, "credit"),
        }
    }
}

/// Entry type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// Chips taken to a table on join
    BuyIn,
    /// Table stack returned on leave or elimination
    CashOut,
    /// Contribution returned when a hand is abandoned
    Refund,
    /// Chips added from outside the tables
    Deposit,
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryType::BuyIn => write!(f, "buy_in"),
            EntryType::CashOut => write!(f, "cash_out"),
            EntryType::Refund => write!(f, "refund"),
            EntryType::Deposit => write!(f, "deposit"),
        }
    }
}

/// Transfer request (chips from wallet to table escrow or back)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub user: Username,
    pub table_id: TableId,
    pub amount: Chips,
    pub entry_type: EntryType,
    pub idempotency_key: String,
    pub description: Option<String>,
}

impl TransferRequest {
    /// Request with a fresh idempotency key.
    pub fn new(user: Username, table_id: TableId, amount: Chips, entry_type: EntryType) -> Self {
        Self {
            user,
            table_id,
            amount,
            entry_type,
            idempotency_key: format!("{entry_type}_{}", Uuid::new_v4()),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
