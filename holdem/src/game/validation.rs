//! Action validation: decides whether a requested action is legal for the
//! acting player and turns it into the chip movement it implies.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::{
    betting::BettingRound,
    entities::{Action, ActionChoice, ActionChoices, Bet, BetAction, Chips, Player},
    state_machine::TablePhase,
};

/// Why an action was refused. Returned to the requester only; the table is
/// left untouched.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum ActionError {
    #[error("can't check, {to_call} to call")]
    CannotCheck { to_call: Chips },
    #[error("nothing to call")]
    NothingToCall,
    #[error("raise must be at least {min}")]
    RaiseTooSmall { min: Chips },
    #[error("need {needed} chips, have {available}")]
    InsufficientChips { needed: Chips, available: Chips },
    #[error("no chips left")]
    NoChips,
    #[error("already folded")]
    PlayerFolded,
    #[error("already all-in")]
    PlayerAllIn,
    #[error("no actions during {phase}")]
    ActionNotAvailable { phase: TablePhase },
    #[error("not your turn")]
    NotYourTurn,
    #[error("not seated")]
    NotSeated,
}

/// Smallest legal raise on a street.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum MinRaisePolicy {
    /// Every raise is at least one big blind.
    #[default]
    BigBlind,
    /// Every raise is at least as large as the last full raise on the
    /// street, and never below the big blind.
    LastRaise,
}

impl MinRaisePolicy {
    #[must_use]
    pub fn min_raise(&self, round: &BettingRound, big_blind: Chips) -> Chips {
        match self {
            Self::BigBlind => big_blind,
            Self::LastRaise => round.last_raise.max(big_blind),
        }
    }
}

impl fmt::Display for MinRaisePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::BigBlind => "big blind",
            Self::LastRaise => "last raise",
        };
        write!(f, "{repr}")
    }
}

impl std::str::FromStr for MinRaisePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], " ").as_str() {
            "big blind" | "bb" => Ok(Self::BigBlind),
            "last raise" => Ok(Self::LastRaise),
            other => Err(format!("unknown minimum raise policy '{other}'")),
        }
    }
}

/// A legal action with its chip movement resolved.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Validated {
    Fold,
    Check,
    Bet(Bet),
}

/// Check `action` against the player's stack and the current street.
///
/// A call the player can't cover becomes an all-in, as does a raise that
/// would put in exactly the whole stack.
pub fn validate(
    player: &Player,
    action: Action,
    round: &BettingRound,
    policy: MinRaisePolicy,
    big_blind: Chips,
) -> Result<Validated, ActionError> {
    if player.folded {
        return Err(ActionError::PlayerFolded);
    }
    if player.all_in {
        return Err(ActionError::PlayerAllIn);
    }

    let to_call = round.current_bet.saturating_sub(player.bet);
    let stack = player.stack;
    match action {
        Action::Fold => Ok(Validated::Fold),
        Action::Check if to_call == 0 => Ok(Validated::Check),
        Action::Check => Err(ActionError::CannotCheck { to_call }),
        Action::Call if to_call == 0 => Err(ActionError::NothingToCall),
        Action::Call | Action::Raise(_) | Action::AllIn if stack == 0 => Err(ActionError::NoChips),
        Action::Call if stack <= to_call => Ok(Validated::Bet(Bet {
            action: BetAction::AllIn,
            amount: stack,
            raise_by: 0,
        })),
        Action::Call => Ok(Validated::Bet(Bet {
            action: BetAction::Call,
            amount: to_call,
            raise_by: 0,
        })),
        Action::Raise(by) => {
            let min = policy.min_raise(round, big_blind);
            if by < min {
                return Err(ActionError::RaiseTooSmall { min });
            }
            // An amount past the chip range can never be covered.
            let needed = to_call.saturating_add(by);
            if needed > stack {
                return Err(ActionError::InsufficientChips {
                    needed,
                    available: stack,
                });
            }
            let action = if needed == stack {
                BetAction::AllIn
            } else {
                BetAction::Raise
            };
            Ok(Validated::Bet(Bet {
                action,
                amount: needed,
                raise_by: by,
            }))
        }
        Action::AllIn => Ok(Validated::Bet(Bet {
            action: BetAction::AllIn,
            amount: stack,
            raise_by: (player.bet + stack).saturating_sub(round.current_bet),
        })),
    }
}

/// Legal actions for `player`, with the amounts shown as hints.
#[must_use]
pub fn action_choices(
    player: &Player,
    round: &BettingRound,
    policy: MinRaisePolicy,
    big_blind: Chips,
) -> ActionChoices {
    if !player.can_act() {
        return ActionChoices::default();
    }

    let to_call = round.current_bet.saturating_sub(player.bet);
    let min = policy.min_raise(round, big_blind);
    let mut choices = vec![ActionChoice::Fold, ActionChoice::AllIn(player.stack)];
    if to_call == 0 {
        choices.push(ActionChoice::Check);
    } else if player.stack > to_call {
        choices.push(ActionChoice::Call(to_call));
    }
    if player.stack > to_call.saturating_add(min) {
        choices.push(ActionChoice::Raise(min));
    }
    ActionChoices::from(choices)
}
