//! Table actor implementation with async message handling.
//!
//! The actor task owns the [`Table`]. Every request arrives through its
//! inbox, which makes the inbox the only place where ordering is decided.
//! While a player is on the clock the actor races the inbox against that
//! player's deadline.

use log::{debug, error, info, warn};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{
    sync::{
        mpsc::{self, error::TryRecvError, error::TrySendError},
        oneshot,
    },
    time::{self, Instant},
};

use super::{
    config::TableConfig,
    errors::TableError,
    hand::{ActionRecord, HandResult, JoinOutcome, LeaveOutcome, StreetOutcome, Table},
    messages::{TableEvent, TableMessage, TableResponse, TableSnapshot},
};
use crate::{
    game::entities::{Action, Chips, Deck, Username},
    notify::{Notifier, TableFact},
    wallet::{EntryType, Ledger, TableId, TransferRequest, WalletError},
};

const INBOX_CAPACITY: usize = 100;

/// Table actor handle for sending messages
#[derive(Clone, Debug)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
    table_id: TableId,
}

impl TableHandle {
    /// Create a new table handle
    pub fn new(sender: mpsc::Sender<TableMessage>, table_id: TableId) -> Self {
        Self { sender, table_id }
    }

    /// Get table ID
    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    /// Send a message to the table
    pub async fn send(&self, message: TableMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| "Table is closed".to_string())
    }

    async fn request(
        &self,
        build: impl FnOnce(oneshot::Sender<TableResponse>) -> TableMessage,
    ) -> TableResponse {
        let (response, receiver) = oneshot::channel();
        if let Err(e) = self.send(build(response)).await {
            return TableResponse::Error(e);
        }
        receiver
            .await
            .unwrap_or_else(|_| TableResponse::Error("Table is closed".to_string()))
    }

    pub async fn join(&self, username: impl Into<Username>, buy_in: Chips) -> TableResponse {
        let username = username.into();
        self.request(|response| TableMessage::JoinTable {
            username,
            buy_in,
            response,
        })
        .await
    }

    pub async fn leave(&self, username: impl Into<Username>) -> TableResponse {
        let username = username.into();
        self.request(|response| TableMessage::LeaveTable { username, response })
            .await
    }

    pub async fn act(&self, username: impl Into<Username>, action: Action) -> TableResponse {
        let username = username.into();
        self.request(|response| TableMessage::TakeAction {
            username,
            action,
            response,
        })
        .await
    }

    pub async fn close(&self) -> TableResponse {
        self.request(|response| TableMessage::Close { response }).await
    }

    /// Current table state, or `None` once the table is gone.
    pub async fn state(&self) -> Option<TableSnapshot> {
        let (response, receiver) = oneshot::channel();
        self.send(TableMessage::GetState { response }).await.ok()?;
        receiver.await.ok()
    }

    /// Stop sending events to `subscriber`.
    pub async fn unsubscribe(&self, subscriber: impl Into<String>) -> Result<(), String> {
        self.send(TableMessage::Unsubscribe {
            subscriber: subscriber.into(),
        })
        .await
    }

    /// Receive table events until the receiver is dropped.
    pub async fn subscribe(
        &self,
        subscriber: impl Into<String>,
        capacity: usize,
    ) -> Option<mpsc::Receiver<TableEvent>> {
        let (sender, receiver) = mpsc::channel(capacity);
        self.send(TableMessage::Subscribe {
            subscriber: subscriber.into(),
            sender,
        })
        .await
        .ok()?;
        Some(receiver)
    }
}

/// How a turn ended.
#[derive(Debug)]
enum TurnOutcome {
    Acted(ActionRecord),
    TimedOut,
    /// The turn moved on without an action, e.g. the player left.
    Skipped,
    Closed,
}

/// A credit the ledger refused. The chips stay in escrow until a retry
/// between hands or on shutdown goes through.
#[derive(Debug)]
struct Owed {
    username: Username,
    amount: Chips,
    entry_type: EntryType,
}

/// Table actor managing a single poker table
pub struct TableActor {
    /// Table ID
    id: TableId,

    /// Seats, hand state and rules
    table: Table,

    /// Message inbox
    inbox: mpsc::Receiver<TableMessage>,

    /// Ledger for buy-ins, cash-outs and refunds
    ledger: Arc<dyn Ledger>,

    /// Sink for player-facing facts
    notifier: Arc<dyn Notifier>,

    /// Subscribers for table events
    subscribers: HashMap<String, mpsc::Sender<TableEvent>>,

    /// Contributions handed back by a hand abandoned on close, credited as
    /// refunds when the table shuts down
    refunds: HashMap<Username, Chips>,

    /// Credits that failed and are waiting for the ledger to come back
    owed: Vec<Owed>,

    /// Is table closed
    is_closed: bool,
}

impl TableActor {
    /// Create a new table actor and the handle for sending it messages.
    pub fn new(
        config: TableConfig,
        ledger: Arc<dyn Ledger>,
        notifier: Arc<dyn Notifier>,
    ) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let id = config.name.clone();

        let actor = Self {
            id: id.clone(),
            table: Table::new(config),
            inbox,
            ledger,
            notifier,
            subscribers: HashMap::new(),
            refunds: HashMap::new(),
            owed: Vec::new(),
            is_closed: false,
        };

        (actor, TableHandle::new(sender, id))
    }

    /// Deal the next hand from `deck` instead of a fresh shuffle.
    pub fn set_next_deck(&mut self, deck: Deck) {
        self.table.set_next_deck(deck);
    }

    /// Run the table actor event loop
    pub async fn run(mut self) {
        info!("{}: table starting", self.id);

        loop {
            self.drain_inbox().await;
            if self.is_closed {
                break;
            }

            self.between_hands().await;
            if self.table.can_start_hand() {
                self.play_hand().await;
                if self.is_closed {
                    break;
                }
                let pause = self.table.config().pause_between_hands();
                self.idle_for(pause).await;
                continue;
            }

            match self.inbox.recv().await {
                Some(message) => self.handle_message(message).await,
                None => self.is_closed = true,
            }
        }

        self.shutdown().await;
        info!("{}: table closed", self.id);
    }

    /// Handle whatever is already queued without waiting.
    async fn drain_inbox(&mut self) {
        while !self.is_closed {
            match self.inbox.try_recv() {
                Ok(message) => self.handle_message(message).await,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.is_closed = true,
            }
        }
    }

    /// Keep serving requests until `duration` has passed.
    async fn idle_for(&mut self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        let sleep = time::sleep(duration);
        tokio::pin!(sleep);
        while !self.is_closed {
            tokio::select! {
                () = &mut sleep => return,
                message = self.inbox.recv() => match message {
                    Some(message) => self.handle_message(message).await,
                    None => self.is_closed = true,
                },
            }
        }
    }

    /// Handle a table message
    async fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::JoinTable {
                username,
                buy_in,
                response,
            } => {
                let result = self.handle_join(username, buy_in).await;
                let _ = response.send(result);
            }

            TableMessage::LeaveTable { username, response } => {
                let result = self.handle_leave(username).await;
                let _ = response.send(result);
            }

            TableMessage::TakeAction {
                username, response, ..
            } => {
                // Only the turn being awaited accepts actions.
                let err = self.table.turn_error(&username);
                debug!("{}: rejected action from {username}: {err}", self.id);
                let _ = response.send(err.into());
            }

            TableMessage::GetState { response } => {
                let _ = response.send(self.table.snapshot());
            }

            TableMessage::Close { response } => {
                info!("{}: close requested", self.id);
                self.is_closed = true;
                let _ = response.send(TableResponse::Success);
            }

            TableMessage::Subscribe { subscriber, sender } => {
                debug!("{}: {subscriber} subscribed to table events", self.id);
                self.subscribers.insert(subscriber, sender);
            }

            TableMessage::Unsubscribe { subscriber } => {
                debug!("{}: {subscriber} unsubscribed from table events", self.id);
                self.subscribers.remove(&subscriber);
            }
        }
    }

    /// Broadcast an event to all subscribers
    fn emit(&mut self, event: TableEvent) {
        debug!("{}: {event}", self.id);
        let id = &self.id;
        self.subscribers
            .retain(|subscriber, sender| match sender.try_send(event.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    warn!("{id}: subscriber {subscriber} channel full, dropping event");
                    true
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("{id}: subscriber {subscriber} disconnected, removing");
                    false
                }
            });
    }

    /// Credit `amount` back to `username`'s wallet.
    async fn credit(
        &self,
        username: &Username,
        amount: Chips,
        entry_type: EntryType,
    ) -> Result<(), WalletError> {
        if amount == 0 {
            return Ok(());
        }
        let request = TransferRequest::new(username.clone(), self.id.clone(), amount, entry_type)
            .with_description(format!("{entry_type} from table {}", self.id));
        match self.ledger.credit(request).await {
            Ok(balance) => {
                debug!("{}: {username} credited {amount}, balance {balance}", self.id);
                Ok(())
            }
            Err(e) => {
                error!(
                    "{}: failed to credit {amount} ({entry_type}) to {username}: {e}",
                    self.id
                );
                Err(e)
            }
        }
    }

    /// Credit `amount`, or remember it as owed when the ledger refuses.
    /// Returns what was actually credited.
    async fn pay_out(&mut self, username: &Username, amount: Chips, entry_type: EntryType) -> Chips {
        match self.credit(username, amount, entry_type).await {
            Ok(()) => amount,
            Err(_) => {
                self.owed.push(Owed {
                    username: username.clone(),
                    amount,
                    entry_type,
                });
                0
            }
        }
    }

    /// Retry every credit the ledger refused earlier.
    async fn settle_owed(&mut self) {
        for owed in std::mem::take(&mut self.owed) {
            match self.credit(&owed.username, owed.amount, owed.entry_type).await {
                Ok(()) => info!(
                    "{}: settled {} ({}) owed to {}",
                    self.id, owed.amount, owed.entry_type, owed.username
                ),
                Err(_) => self.owed.push(owed),
            }
        }
    }

    async fn handle_join(&mut self, username: Username, buy_in: Chips) -> TableResponse {
        if self.is_closed {
            return TableResponse::Error("Table is closed".to_string());
        }
        if let Err(e) = self.table.check_join(&username, buy_in) {
            return e.into();
        }

        let request = TransferRequest::new(username.clone(), self.id.clone(), buy_in, EntryType::BuyIn)
            .with_description(format!("Buy-in to table {}", self.id));
        if let Err(e) = self.ledger.debit(request).await {
            warn!("{}: buy-in for {username} failed: {e}", self.id);
            return TableError::from(e).into();
        }

        match self.table.join(username.clone(), buy_in) {
            Ok(outcome) => {
                info!("{}: {username} joined with {buy_in} chips", self.id);
                self.emit(TableEvent::PlayerJoined {
                    username,
                    buy_in,
                });
                match outcome {
                    JoinOutcome::Seated(seat) => {
                        TableResponse::SuccessWithMessage(format!("seated at seat {seat}"))
                    }
                    JoinOutcome::Waitlisted => TableResponse::SuccessWithMessage(
                        "waitlisted, seated at the next hand".to_string(),
                    ),
                }
            }
            Err(e) => {
                // Give the buy-in back.
                self.pay_out(&username, buy_in, EntryType::Refund).await;
                e.into()
            }
        }
    }

    async fn handle_leave(&mut self, username: Username) -> TableResponse {
        match self.table.leave(&username) {
            Ok(LeaveOutcome::Removed { chips }) => {
                let cashed_out = self.pay_out(&username, chips, EntryType::CashOut).await;
                self.emit(TableEvent::PlayerLeft {
                    username,
                    cashed_out,
                });
                if cashed_out == chips {
                    TableResponse::SuccessWithMessage(format!("cashed out {cashed_out}"))
                } else {
                    TableResponse::Error(format!(
                        "left the table, cash-out of {chips} is pending"
                    ))
                }
            }
            Ok(LeaveOutcome::Pending) => {
                let fact = TableFact::ActionTaken {
                    username,
                    action: Action::Fold,
                    pot: self.table.pot(),
                };
                self.notifier.broadcast(&self.table.usernames(), &[fact]);
                TableResponse::SuccessWithMessage(
                    "folded, cashed out after the hand".to_string(),
                )
            }
            Err(e) => e.into(),
        }
    }

    /// Settle departures and eliminations, then seat the waitlist.
    async fn between_hands(&mut self) {
        self.settle_owed().await;

        for player in self.table.take_departed() {
            let cashed_out = self.pay_out(&player.name, player.stack, EntryType::CashOut).await;
            self.emit(TableEvent::PlayerLeft {
                username: player.name,
                cashed_out,
            });
        }

        for player in self.table.boot_broke() {
            let cashed_out = self.pay_out(&player.name, player.stack, EntryType::CashOut).await;
            self.emit(TableEvent::PlayerEliminated {
                username: player.name,
                cashed_out,
            });
        }

        for (username, seat) in self.table.seat_waiting() {
            debug!("{}: seated {username} from the waitlist at {seat}", self.id);
        }
    }

    async fn play_hand(&mut self) {
        let start = match self.table.start_hand() {
            Ok(start) => start,
            Err(e) => {
                self.abort_hand(&e.to_string());
                return;
            }
        };

        let players = self.table.usernames();
        self.notifier.broadcast(
            &players,
            &[TableFact::HandStarting {
                hand_number: start.hand_number,
                button: start.button.clone(),
                blinds: self.table.config().blinds(),
            }],
        );
        for (username, cards) in &start.hole_cards {
            self.notifier.tell(
                username,
                &[TableFact::HoleCards {
                    cards: cards.clone(),
                }],
            );
        }
        self.emit(TableEvent::HandStarted {
            hand_number: start.hand_number,
            button: start.button,
            players,
        });

        loop {
            while let Some(username) = self.table.next_to_act().map(|p| p.name.clone()) {
                let timeout = self.table.config().action_timeout();
                let prompt = TableFact::TurnPrompt {
                    username: username.clone(),
                    choices: self.table.action_choices(&username),
                    timeout,
                };
                self.notifier.tell(&username, &[prompt]);

                match self.await_action(&username, timeout).await {
                    TurnOutcome::Acted(record) => self.announce_action(record),
                    TurnOutcome::TimedOut => self.time_out(&username),
                    TurnOutcome::Skipped => {}
                    TurnOutcome::Closed => {
                        self.abort_hand("table closed");
                        return;
                    }
                }
            }

            match self.table.advance_street() {
                Ok(StreetOutcome::Dealt { phase, board }) => {
                    self.notifier
                        .broadcast(&self.table.usernames(), &[TableFact::BoardDealt {
                            phase,
                            board,
                        }]);
                }
                Ok(StreetOutcome::Showdown | StreetOutcome::Uncontested) => break,
                Err(e) => {
                    self.abort_hand(&e.to_string());
                    return;
                }
            }
        }

        match self.table.finish_hand() {
            Ok(result) => self.announce_result(result),
            Err(e) => self.abort_hand(&e.to_string()),
        }
    }

    /// Wait for `username` to act, serving every other request meanwhile.
    async fn await_action(&mut self, username: &Username, timeout: Duration) -> TurnOutcome {
        let sleep = time::sleep_until(Instant::now() + timeout);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                () = &mut sleep => return TurnOutcome::TimedOut,

                message = self.inbox.recv() => match message {
                    None => {
                        self.is_closed = true;
                        return TurnOutcome::Closed;
                    }
                    Some(TableMessage::TakeAction {
                        username: from,
                        action,
                        response,
                    }) if &from == username => match self.table.act(&from, action) {
                        Ok(record) => {
                            let _ = response.send(TableResponse::Success);
                            return TurnOutcome::Acted(record);
                        }
                        Err(e) => {
                            self.notifier.tell(&from, &[TableFact::ActionRejected {
                                reason: e.to_string(),
                            }]);
                            let _ = response.send(e.into());
                        }
                    },
                    Some(message) => {
                        self.handle_message(message).await;
                        if self.is_closed {
                            return TurnOutcome::Closed;
                        }
                        if self.table.next_to_act().map(|p| &p.name) != Some(username) {
                            return TurnOutcome::Skipped;
                        }
                    }
                },
            }
        }
    }

    fn announce_action(&mut self, record: ActionRecord) {
        let fact = TableFact::ActionTaken {
            username: record.username,
            action: record.action,
            pot: record.pot,
        };
        self.notifier.broadcast(&self.table.usernames(), &[fact]);
    }

    fn time_out(&mut self, username: &Username) {
        info!("{}: {username} timed out", self.id);
        self.notifier.broadcast(
            &self.table.usernames(),
            &[TableFact::TimedOut {
                username: username.clone(),
            }],
        );
        self.emit(TableEvent::PlayerTimedOut {
            username: username.clone(),
        });
        match self.table.act(username, Action::Fold) {
            Ok(record) => self.announce_action(record),
            Err(e) => {
                error!("{}: timeout fold for {username} rejected: {e}", self.id);
                self.table.force_fold(username);
            }
        }
    }

    fn announce_result(&mut self, result: HandResult) {
        let mut facts = Vec::with_capacity(result.reveals.len() + result.winners.len());
        for reveal in &result.reveals {
            facts.push(TableFact::Showdown {
                username: reveal.username.clone(),
                cards: reveal.cards.clone(),
                value: reveal.value.clone(),
            });
        }
        for (username, amount) in &result.winners {
            let value = result
                .reveals
                .iter()
                .find(|r| &r.username == username)
                .map(|r| r.value.clone());
            facts.push(TableFact::Winner {
                username: username.clone(),
                amount: *amount,
                value,
            });
        }
        self.notifier.broadcast(&self.table.usernames(), &facts);
        self.emit(TableEvent::HandEnded {
            hand_number: result.hand_number,
            winners: result.winners,
            uncontested: result.uncontested,
        });
    }

    fn abort_hand(&mut self, reason: &str) {
        error!("{}: abandoning hand #{}: {reason}", self.id, self.table.hand_count());
        let refunds = self.table.abort_hand();
        if self.is_closed {
            for (username, amount) in &refunds {
                *self.refunds.entry(username.clone()).or_default() += amount;
            }
        }
        self.emit(TableEvent::HandAborted {
            reason: reason.to_string(),
            refunds,
        });
    }

    /// Return every chip on the table to the ledger.
    async fn shutdown(&mut self) {
        if self.table.in_hand() {
            self.abort_hand("table closed");
        }
        self.settle_owed().await;
        let refunds = std::mem::take(&mut self.refunds);
        for (username, chips) in self.table.clear() {
            let refund = refunds.get(&username).copied().unwrap_or_default().min(chips);
            let refunded = self.pay_out(&username, refund, EntryType::Refund).await;
            let cashed_out = self.pay_out(&username, chips - refund, EntryType::CashOut).await;
            self.emit(TableEvent::PlayerLeft {
                username,
                cashed_out: refunded + cashed_out,
            });
        }
        for owed in &self.owed {
            error!(
                "{}: {} chips owed to {} ({}) left in escrow",
                self.id, owed.amount, owed.username, owed.entry_type
            );
        }
        self.subscribers.clear();
    }
}
