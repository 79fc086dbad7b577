//! A single continuous table run as an async actor.
//!
//! This module implements:
//! - Table: seats, blinds, streets and showdown as synchronous steps
//! - TableActor: async actor owning a Table, with per-turn timeouts
//! - Message-based communication with tokio channels
//! - Table configuration
//!
//! ## Architecture
//!
//! The table runs in its own Tokio task with an mpsc message inbox. Joins,
//! leaves, actions and state queries are all messages; the actor applies
//! them between steps of the hand, so the table is only ever touched by one
//! task.
//!
//! ## Example
//!
//! ```no_run
//! use holdem::{
//!     notify::LogNotifier,
//!     table::{TableActor, TableConfig},
//!     wallet::InMemoryLedger,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let ledger = Arc::new(InMemoryLedger::with_balances([("alice", 1_000), ("bob", 1_000)]));
//!     let notifier = Arc::new(LogNotifier::new("main"));
//!     let (actor, handle) = TableActor::new(TableConfig::default(), ledger, notifier);
//!
//!     // Spawn table actor
//!     tokio::spawn(actor.run());
//!
//!     handle.join("alice", 500).await;
//!     handle.join("bob", 500).await;
//! }
//! ```

pub mod actor;
pub mod config;
pub mod errors;
pub mod hand;
pub mod messages;

pub use actor::{TableActor, TableHandle};
pub use config::{TableConfig, TableSpeed};
pub use errors::{TableError, TableResult};
pub use hand::Table;
pub use messages::{PlayerSnapshot, TableEvent, TableMessage, TableResponse, TableSnapshot};
