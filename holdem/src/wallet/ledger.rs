//! Ledger interface the table talks to, plus an in-memory implementation
//! with table escrow and an append-only journal.

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use std::{
    collections::{HashMap, HashSet},
    sync::atomic::{AtomicBool, Ordering},
};
use tokio::sync::Mutex;

use super::{
    errors::{WalletError, WalletResult},
    models::{EntryDirection, EntryType, TableId, TransferRequest, WalletEntry},
};
use crate::game::entities::{Chips, Username};

/// Where table chips come from and go back to.
///
/// `debit` moves chips from the user's wallet onto the table, `credit` moves
/// them back. Both return the user's new wallet balance.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn get_balance(&self, user: &Username) -> WalletResult<Chips>;

    async fn debit(&self, request: TransferRequest) -> WalletResult<Chips>;

    async fn credit(&self, request: TransferRequest) -> WalletResult<Chips>;
}

#[derive(Debug, Default)]
struct LedgerState {
    wallets: HashMap<Username, Chips>,
    escrows: HashMap<TableId, Chips>,
    entries: Vec<WalletEntry>,
    idempotency_keys: HashSet<String>,
}

impl LedgerState {
    fn record(
        &mut self,
        request: TransferRequest,
        direction: EntryDirection,
        balance_after: Chips,
    ) {
        self.idempotency_keys.insert(request.idempotency_key.clone());
        let id = self.entries.len() as u64 + 1;
        self.entries.push(WalletEntry {
            id,
            user: request.user,
            table_id: Some(request.table_id).filter(|t| !t.is_empty()),
            amount: request.amount,
            balance_after,
            direction,
            entry_type: request.entry_type,
            idempotency_key: request.idempotency_key,
            description: request.description,
            created_at: Utc::now(),
        });
    }

    fn check(&self, request: &TransferRequest) -> WalletResult<()> {
        if request.amount == 0 {
            return Err(WalletError::InvalidAmount(request.amount));
        }
        if self.idempotency_keys.contains(&request.idempotency_key) {
            return Err(WalletError::DuplicateTransaction(
                request.idempotency_key.clone(),
            ));
        }
        Ok(())
    }
}

/// Process-local ledger. Chips on tables are held in per-table escrow so
/// that wallet balances plus escrow never change except through deposits.
#[derive(Debug)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    available: AtomicBool,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Ledger with opening balances.
    pub fn with_balances<I, U>(balances: I) -> Self
    where
        I: IntoIterator<Item = (U, Chips)>,
        U: Into<Username>,
    {
        let state = LedgerState {
            wallets: balances.into_iter().map(|(u, c)| (u.into(), c)).collect(),
            ..LedgerState::default()
        };
        Self {
            state: Mutex::new(state),
            available: AtomicBool::new(true),
        }
    }

    /// Add chips to a wallet from outside the tables.
    pub async fn deposit(&self, user: &Username, amount: Chips) -> WalletResult<Chips> {
        let mut state = self.state.lock().await;
        let request = TransferRequest::new(user.clone(), String::new(), amount, EntryType::Deposit);
        state.check(&request)?;
        let balance = state.wallets.entry(user.clone()).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or(WalletError::BalanceOverflow)?;
        let balance_after = *balance;
        state.record(request, EntryDirection::Credit, balance_after);
        Ok(balance_after)
    }

    /// Journal lines for `user`, oldest first.
    pub async fn entries(&self, user: &Username) -> Vec<WalletEntry> {
        let state = self.state.lock().await;
        state
            .entries
            .iter()
            .filter(|e| &e.user == user)
            .cloned()
            .collect()
    }

    pub async fn escrow_balance(&self, table_id: &str) -> Chips {
        let state = self.state.lock().await;
        state.escrows.get(table_id).copied().unwrap_or_default()
    }

    /// Simulate an outage; every call fails with `Unavailable` while unset.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> WalletResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(WalletError::Unavailable("in-memory ledger offline".to_string()))
        }
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn get_balance(&self, user: &Username) -> WalletResult<Chips> {
        self.ensure_available()?;
        let state = self.state.lock().await;
        state
            .wallets
            .get(user)
            .copied()
            .ok_or_else(|| WalletError::WalletNotFound(user.clone()))
    }

    async fn debit(&self, request: TransferRequest) -> WalletResult<Chips> {
        self.ensure_available()?;
        let mut state = self.state.lock().await;
        state.check(&request)?;

        let available = state
            .wallets
            .get(&request.user)
            .copied()
            .ok_or_else(|| WalletError::WalletNotFound(request.user.clone()))?;
        if available < request.amount {
            return Err(WalletError::InsufficientBalance {
                available,
                required: request.amount,
            });
        }

        let balance_after = available - request.amount;
        state.wallets.insert(request.user.clone(), balance_after);
        *state.escrows.entry(request.table_id.clone()).or_default() += request.amount;
        debug!(
            "{}: debited {} from {} ({})",
            request.table_id, request.amount, request.user, request.entry_type
        );
        state.record(request, EntryDirection::Debit, balance_after);
        Ok(balance_after)
    }

    async fn credit(&self, request: TransferRequest) -> WalletResult<Chips> {
        self.ensure_available()?;
        let mut state = self.state.lock().await;
        state.check(&request)?;

        let escrow = state
            .escrows
            .get(&request.table_id)
            .copied()
            .ok_or_else(|| WalletError::EscrowNotFound(request.table_id.clone()))?;
        if escrow < request.amount {
            return Err(WalletError::InsufficientBalance {
                available: escrow,
                required: request.amount,
            });
        }

        let current = state.wallets.get(&request.user).copied().unwrap_or_default();
        let balance_after = current
            .checked_add(request.amount)
            .ok_or(WalletError::BalanceOverflow)?;
        state.escrows.insert(request.table_id.clone(), escrow - request.amount);
        state.wallets.insert(request.user.clone(), balance_after);
        debug!(
            "{}: credited {} to {} ({})",
            request.table_id, request.amount, request.user, request.entry_type
        );
        state.record(request, EntryDirection::Credit, balance_after);
        Ok(balance_after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "main";

    fn request(user: &str, amount: Chips, entry_type: EntryType) -> TransferRequest {
        TransferRequest::new(user.into(), TABLE.to_string(), amount, entry_type)
    }

    #[tokio::test]
    async fn test_buy_in_then_cash_out() {
        let ledger = InMemoryLedger::with_balances([("alice", 1_000)]);
        let alice = Username::new("alice");

        assert_eq!(ledger.debit(request("alice", 400, EntryType::BuyIn)).await, Ok(600));
        assert_eq!(ledger.escrow_balance(TABLE).await, 400);
        assert_eq!(ledger.credit(request("alice", 250, EntryType::CashOut)).await, Ok(850));
        assert_eq!(ledger.escrow_balance(TABLE).await, 150);
        assert_eq!(ledger.get_balance(&alice).await, Ok(850));

        let entries = ledger.entries(&alice).await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].direction, EntryDirection::Debit);
        assert_eq!(entries[1].entry_type, EntryType::CashOut);
        assert_eq!(entries[1].balance_after, 850);
    }

    #[tokio::test]
    async fn test_insufficient_balance() {
        let ledger = InMemoryLedger::with_balances([("alice", 100)]);
        assert_eq!(
            ledger.debit(request("alice", 400, EntryType::BuyIn)).await,
            Err(WalletError::InsufficientBalance {
                available: 100,
                required: 400,
            })
        );
        assert!(ledger.entries(&"alice".into()).await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_wallet() {
        let ledger = InMemoryLedger::new();
        assert!(matches!(
            ledger.debit(request("bob", 10, EntryType::BuyIn)).await,
            Err(WalletError::WalletNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_credit_cannot_exceed_escrow() {
        let ledger = InMemoryLedger::with_balances([("alice", 100), ("bob", 100)]);
        ledger.debit(request("alice", 100, EntryType::BuyIn)).await.unwrap();
        assert!(ledger.credit(request("bob", 150, EntryType::CashOut)).await.is_err());
        assert_eq!(ledger.credit(request("bob", 100, EntryType::CashOut)).await, Ok(200));
    }

    #[tokio::test]
    async fn test_duplicate_transaction_rejected() {
        let ledger = InMemoryLedger::with_balances([("alice", 1_000)]);
        let first = request("alice", 100, EntryType::BuyIn);
        let replay = first.clone();
        ledger.debit(first).await.unwrap();
        assert!(matches!(
            ledger.debit(replay).await,
            Err(WalletError::DuplicateTransaction(_))
        ));
        assert_eq!(ledger.get_balance(&"alice".into()).await, Ok(900));
    }

    #[tokio::test]
    async fn test_zero_amount_rejected() {
        let ledger = InMemoryLedger::with_balances([("alice", 1_000)]);
        assert_eq!(
            ledger.debit(request("alice", 0, EntryType::BuyIn)).await,
            Err(WalletError::InvalidAmount(0))
        );
    }

    #[tokio::test]
    async fn test_outage() {
        let ledger = InMemoryLedger::with_balances([("alice", 1_000)]);
        ledger.set_available(false);
        assert!(matches!(
            ledger.get_balance(&"alice".into()).await,
            Err(WalletError::Unavailable(_))
        ));
        ledger.set_available(true);
        assert_eq!(ledger.get_balance(&"alice".into()).await, Ok(1_000));
    }

    #[tokio::test]
    async fn test_deposit_creates_wallet() {
        let ledger = InMemoryLedger::new();
        let carol = Username::new("carol");
        assert_eq!(ledger.deposit(&carol, 500).await, Ok(500));
        assert_eq!(ledger.deposit(&carol, 250).await, Ok(750));
        assert_eq!(ledger.entries(&carol).await.len(), 2);
    }
}
