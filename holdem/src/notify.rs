//! Player-facing notifications.
//!
//! The table describes what happened as structured [`TableFact`]s and hands
//! them to a [`Notifier`]; turning facts into text or network frames is the
//! sink's job.

use log::info;
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};
use tokio::sync::mpsc;

use crate::game::{
    entities::{Action, ActionChoices, Blinds, Card, Chips, Username},
    functional::HandValue,
    state_machine::TablePhase,
};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum TableFact {
    HandStarting {
        hand_number: u64,
        button: Username,
        blinds: Blinds,
    },
    HoleCards {
        cards: Vec<Card>,
    },
    BoardDealt {
        phase: TablePhase,
        board: Vec<Card>,
    },
    ActionTaken {
        username: Username,
        action: Action,
        pot: Chips,
    },
    TurnPrompt {
        username: Username,
        choices: ActionChoices,
        timeout: Duration,
    },
    TimedOut {
        username: Username,
    },
    Showdown {
        username: Username,
        cards: Vec<Card>,
        value: HandValue,
    },
    Winner {
        username: Username,
        amount: Chips,
        value: Option<HandValue>,
    },
    ActionRejected {
        reason: String,
    },
}

fn cards_repr(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|c| c.to_string().trim_start().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for TableFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HandStarting {
                hand_number,
                button,
                blinds,
            } => write!(f, "hand #{hand_number}, {button} on the button, blinds {blinds}"),
            Self::HoleCards { cards } => write!(f, "your cards: {}", cards_repr(cards)),
            Self::BoardDealt { phase, board } => write!(f, "{phase}: {}", cards_repr(board)),
            Self::ActionTaken {
                username,
                action,
                pot,
            } => write!(f, "{username} {action} (pot {pot})"),
            Self::TurnPrompt {
                username,
                choices,
                timeout,
            } => write!(
                f,
                "{username}, it's your turn ({}s): {choices}",
                timeout.as_secs_f32()
            ),
            Self::TimedOut { username } => write!(f, "{username} ran out of time and folds"),
            Self::Showdown {
                username,
                cards,
                value,
            } => write!(f, "{username} shows {} ({value})", cards_repr(cards)),
            Self::Winner {
                username,
                amount,
                value: Some(value),
            } => write!(f, "{username} wins {amount} with {value}"),
            Self::Winner {
                username,
                amount,
                value: None,
            } => write!(f, "{username} wins {amount}"),
            Self::ActionRejected { reason } => write!(f, "rejected: {reason}"),
        }
    }
}

/// Outbound sink for facts. Implementations must not block the table.
pub trait Notifier: Send + Sync {
    fn tell(&self, username: &Username, facts: &[TableFact]);

    fn broadcast(&self, usernames: &[Username], facts: &[TableFact]) {
        for username in usernames {
            self.tell(username, facts);
        }
    }
}

/// Writes every fact to the log.
#[derive(Clone, Debug, Default)]
pub struct LogNotifier {
    prefix: String,
}

impl LogNotifier {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Notifier for LogNotifier {
    fn tell(&self, username: &Username, facts: &[TableFact]) {
        for fact in facts {
            info!("{} -> {username}: {fact}", self.prefix);
        }
    }

    fn broadcast(&self, usernames: &[Username], facts: &[TableFact]) {
        // One line per fact instead of one per recipient.
        for fact in facts {
            info!("{} -> {} players: {fact}", self.prefix, usernames.len());
        }
    }
}

/// A fact addressed to one player.
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub username: Username,
    pub fact: TableFact,
}

/// Forwards facts over an unbounded channel.
#[derive(Clone, Debug)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn tell(&self, username: &Username, facts: &[TableFact]) {
        for fact in facts {
            let notification = Notification {
                username: username.clone(),
                fact: fact.clone(),
            };
            // A dropped receiver means nobody is listening any more.
            if self.sender.send(notification).is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Suit;

    #[test]
    fn test_fact_display() {
        let fact = TableFact::ActionTaken {
            username: "alice".into(),
            action: Action::Raise(40),
            pot: 70,
        };
        assert_eq!(fact.to_string(), "alice raises 40 (pot 70)");

        let fact = TableFact::HoleCards {
            cards: vec![Card(14, Suit::Spade), Card(10, Suit::Heart)],
        };
        assert_eq!(fact.to_string(), "your cards: A/♠ 10/♥");
    }

    #[test]
    fn test_channel_notifier_broadcast() {
        let (notifier, mut receiver) = ChannelNotifier::new();
        let players: Vec<Username> = vec!["alice".into(), "bob".into()];
        notifier.broadcast(
            &players,
            &[TableFact::TimedOut {
                username: "bob".into(),
            }],
        );
        let first = receiver.try_recv().unwrap();
        let second = receiver.try_recv().unwrap();
        assert_eq!(first.username, Username::new("alice"));
        assert_eq!(second.username, Username::new("bob"));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_channel_notifier_survives_dropped_receiver() {
        let (notifier, receiver) = ChannelNotifier::new();
        drop(receiver);
        notifier.tell(&"alice".into(), &[TableFact::ActionRejected {
            reason: "not your turn".to_string(),
        }]);
    }
}
