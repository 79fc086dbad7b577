//! Chip custody outside the table.
//!
//! This module implements:
//! - The [`Ledger`] trait the table debits buy-ins from and credits
//!   cash-outs and refunds to
//! - [`InMemoryLedger`], holding table chips in per-table escrow
//! - An append-only journal with idempotency keys

pub mod errors;
pub mod ledger;
pub mod models;

pub use errors::{WalletError, WalletResult};
pub use ledger::{InMemoryLedger, Ledger};
pub use models::{EntryDirection, EntryType, TableId, TransferRequest, WalletEntry};
