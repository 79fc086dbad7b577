//! Table actor message types.

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use super::errors::TableError;
use crate::game::{
    entities::{Action, Blinds, Card, Chips, SeatIndex, Username},
    state_machine::TablePhase,
    validation::ActionError,
};

/// Messages that can be sent to a TableActor
#[derive(Debug)]
pub enum TableMessage {
    /// Join table request, debits the buy-in from the ledger
    JoinTable {
        username: Username,
        buy_in: Chips,
        response: oneshot::Sender<TableResponse>,
    },

    /// Leave table request
    LeaveTable {
        username: Username,
        response: oneshot::Sender<TableResponse>,
    },

    /// Player action (fold, check, call, raise, all-in)
    TakeAction {
        username: Username,
        action: Action,
        response: oneshot::Sender<TableResponse>,
    },

    /// Get current table state
    GetState {
        response: oneshot::Sender<TableSnapshot>,
    },

    /// Close table, abandoning any running hand
    Close {
        response: oneshot::Sender<TableResponse>,
    },

    /// Subscribe to table events
    Subscribe {
        subscriber: String,
        sender: mpsc::Sender<TableEvent>,
    },

    /// Unsubscribe from table events
    Unsubscribe { subscriber: String },
}

/// Domain events delivered to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableEvent {
    HandStarted {
        hand_number: u64,
        button: Username,
        players: Vec<Username>,
    },
    HandEnded {
        hand_number: u64,
        winners: Vec<(Username, Chips)>,
        uncontested: bool,
    },
    PlayerJoined {
        username: Username,
        buy_in: Chips,
    },
    PlayerLeft {
        username: Username,
        cashed_out: Chips,
    },
    PlayerEliminated {
        username: Username,
        cashed_out: Chips,
    },
    PlayerTimedOut {
        username: Username,
    },
    HandAborted {
        reason: String,
        refunds: Vec<(Username, Chips)>,
    },
}

impl std::fmt::Display for TableEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableEvent::HandStarted {
                hand_number,
                button,
                players,
            } => write!(
                f,
                "hand #{hand_number} started with {} players, {button} has the button",
                players.len()
            ),
            TableEvent::HandEnded {
                hand_number,
                winners,
                uncontested,
            } => {
                let winners = winners
                    .iter()
                    .map(|(name, amount)| format!("{name} +{amount}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                let how = if *uncontested { " uncontested" } else { "" };
                write!(f, "hand #{hand_number} ended{how}: {winners}")
            }
            TableEvent::PlayerJoined { username, buy_in } => {
                write!(f, "{username} joined with {buy_in}")
            }
            TableEvent::PlayerLeft {
                username,
                cashed_out,
            } => write!(f, "{username} left with {cashed_out}"),
            TableEvent::PlayerEliminated {
                username,
                cashed_out,
            } => write!(f, "{username} eliminated with {cashed_out}"),
            TableEvent::PlayerTimedOut { username } => write!(f, "{username} timed out"),
            TableEvent::HandAborted { reason, refunds } => {
                let refunded: Chips = refunds.iter().map(|(_, amount)| amount).sum();
                write!(f, "hand aborted ({reason}), {refunded} refunded")
            }
        }
    }
}

/// Response from table operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableResponse {
    /// Operation succeeded
    Success,

    /// Operation succeeded with message
    SuccessWithMessage(String),

    /// Operation failed
    Error(String),

    /// Table is full
    TableFull,

    /// Insufficient chips for buy-in
    InsufficientChips { required: Chips, available: Chips },

    /// Not your turn
    NotYourTurn,

    /// Invalid action for current game state
    InvalidAction(String),

    /// Player not at table
    NotAtTable,
}

impl TableResponse {
    /// Check if response is success
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            TableResponse::Success | TableResponse::SuccessWithMessage(_)
        )
    }

    /// Get error message if response is error
    pub fn error_message(&self) -> Option<String> {
        match self {
            TableResponse::Error(msg) => Some(msg.clone()),
            TableResponse::TableFull => Some("Table is full".to_string()),
            TableResponse::InsufficientChips {
                required,
                available,
            } => Some(format!(
                "Insufficient chips: need {required}, have {available}"
            )),
            TableResponse::NotYourTurn => Some("Not your turn".to_string()),
            TableResponse::InvalidAction(msg) => Some(format!("Invalid action: {msg}")),
            TableResponse::NotAtTable => Some("Not at table".to_string()),
            TableResponse::Success | TableResponse::SuccessWithMessage(_) => None,
        }
    }
}

impl From<TableError> for TableResponse {
    fn from(value: TableError) -> Self {
        match value {
            TableError::InsufficientFunds {
                required,
                available,
            } => TableResponse::InsufficientChips {
                required,
                available,
            },
            TableError::TableFull => TableResponse::TableFull,
            TableError::NotSeated => TableResponse::NotAtTable,
            TableError::Wallet(e) => TableResponse::Error(e.client_message()),
            other => TableResponse::Error(other.to_string()),
        }
    }
}

impl From<ActionError> for TableResponse {
    fn from(value: ActionError) -> Self {
        match value {
            ActionError::NotYourTurn => TableResponse::NotYourTurn,
            ActionError::NotSeated => TableResponse::NotAtTable,
            other => TableResponse::InvalidAction(other.to_string()),
        }
    }
}

/// Public view of one seated player. Hole cards are never included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub username: Username,
    pub seat: SeatIndex,
    pub stack: Chips,
    pub bet: Chips,
    pub folded: bool,
    pub all_in: bool,
    pub is_dealer: bool,
    pub last_action: Option<Action>,
}

/// Table state response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub table_name: String,
    pub phase: TablePhase,
    pub hand_number: u64,
    pub blinds: Blinds,
    pub max_players: usize,
    /// Chips in the middle, current street bets included
    pub pot: Chips,
    pub board: Vec<Card>,
    pub players: Vec<PlayerSnapshot>,
    pub waitlist: Vec<Username>,
    pub next_to_act: Option<Username>,
}

impl TableSnapshot {
    pub fn player(&self, username: &Username) -> Option<&PlayerSnapshot> {
        self.players.iter().find(|p| &p.username == username)
    }
}
