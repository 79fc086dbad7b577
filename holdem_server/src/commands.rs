//! Console input grammar.
//!
//! Every line is either a console verb (`help`, `state`, `quit`) or a
//! player name followed by that player's command, e.g. `alice raise 40`.

use holdem::{
    constants::MAX_USER_INPUT_LENGTH,
    entities::{Action, Chips, Username},
};
use thiserror::Error;

/// A player name plus the longest command.
const MAX_LINE_LENGTH: usize = 2 * MAX_USER_INPUT_LENGTH;

pub const USAGE: &str = "\
COMMANDS:
  <player> join <buy-in>    Buy in and take a seat
  <player> leave            Leave the table and cash out
  <player> fold | f         Fold
  <player> check | c | k    Check
  <player> call             Call the current bet
  <player> raise <n> | r <n>  Raise by n over the bet to call
  <player> all-in | a       Put the whole stack in
  state                     Show the table
  help                      Show this message
  quit                      Close the table, refund and exit
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    State,
    Quit,
    Join { username: Username, buy_in: Chips },
    Leave { username: Username },
    Act { username: Username, action: Action },
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Empty input. Type 'help' to see available commands")]
    Empty,
    #[error("Input is longer than {} characters", MAX_LINE_LENGTH)]
    TooLong,
    #[error("Invalid amount '{0}'. Must be a positive number (e.g., 'raise 100')")]
    InvalidAmount(String),
    #[error("'{0}' needs an amount (e.g., '{0} 100')")]
    MissingAmount(&'static str),
    #[error("'{0}' needs a player name first (e.g., 'alice {0}')")]
    MissingPlayer(String),
    #[error("Unrecognized command '{0}'. Type 'help' to see available commands")]
    UnrecognizedCommand(String),
}

/// Parse one console line. Text that doesn't parse never reaches the table.
pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let trimmed = input.trim();
    if trimmed.len() > MAX_LINE_LENGTH {
        return Err(ParseError::TooLong);
    }

    let parts: Vec<&str> = trimmed.split_ascii_whitespace().collect();
    match parts.as_slice() {
        [] => Err(ParseError::Empty),
        ["help"] => Ok(Command::Help),
        ["state"] => Ok(Command::State),
        ["quit" | "exit"] => Ok(Command::Quit),
        [verb] => match parse_action(&parts) {
            Ok(_) => Err(ParseError::MissingPlayer((*verb).to_string())),
            Err(_) if matches!(*verb, "join" | "leave" | "raise" | "r") => {
                Err(ParseError::MissingPlayer((*verb).to_string()))
            }
            Err(_) => Err(ParseError::UnrecognizedCommand((*verb).to_string())),
        },
        [player, rest @ ..] => {
            let username = Username::new(player);
            match rest {
                ["join"] => Err(ParseError::MissingAmount("join")),
                ["join", amount] => Ok(Command::Join {
                    username,
                    buy_in: parse_amount(amount)?,
                }),
                ["leave"] => Ok(Command::Leave { username }),
                _ => Ok(Command::Act {
                    username,
                    action: parse_action(rest)?,
                }),
            }
        }
    }
}

/// Parse the action part of a player command.
pub fn parse_action(parts: &[&str]) -> Result<Action, ParseError> {
    match parts {
        ["fold" | "f"] => Ok(Action::Fold),
        ["check" | "c" | "k"] => Ok(Action::Check),
        ["call"] => Ok(Action::Call),
        ["all-in" | "allin" | "a"] => Ok(Action::AllIn),
        ["raise" | "r"] => Err(ParseError::MissingAmount("raise")),
        ["raise" | "r", amount] => Ok(Action::Raise(parse_amount(amount)?)),
        _ => Err(ParseError::UnrecognizedCommand(parts.join(" "))),
    }
}

fn parse_amount(value: &str) -> Result<Chips, ParseError> {
    match value.parse::<Chips>() {
        Ok(amount) if amount > 0 => Ok(amount),
        _ => Err(ParseError::InvalidAmount(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn act(input: &str) -> Result<Action, ParseError> {
        match parse_command(input)? {
            Command::Act { action, .. } => Ok(action),
            other => panic!("expected an action, got {other:?}"),
        }
    }

    // === Console verbs ===

    #[test]
    fn test_parse_console_verbs() {
        assert_eq!(parse_command("help"), Ok(Command::Help));
        assert_eq!(parse_command(" state "), Ok(Command::State));
        assert_eq!(parse_command("quit"), Ok(Command::Quit));
        assert_eq!(parse_command("exit"), Ok(Command::Quit));
    }

    // === Player actions ===

    #[test]
    fn test_parse_fold_aliases() {
        assert_eq!(act("alice fold"), Ok(Action::Fold));
        assert_eq!(act("alice f"), Ok(Action::Fold));
    }

    #[test]
    fn test_parse_check_aliases() {
        assert_eq!(act("alice check"), Ok(Action::Check));
        assert_eq!(act("alice c"), Ok(Action::Check));
        assert_eq!(act("alice k"), Ok(Action::Check));
    }

    #[test]
    fn test_parse_call_and_all_in() {
        assert_eq!(act("bob call"), Ok(Action::Call));
        assert_eq!(act("bob all-in"), Ok(Action::AllIn));
        assert_eq!(act("bob allin"), Ok(Action::AllIn));
        assert_eq!(act("bob a"), Ok(Action::AllIn));
    }

    #[test]
    fn test_parse_raise() {
        assert_eq!(act("bob raise 40"), Ok(Action::Raise(40)));
        assert_eq!(act("bob r 100"), Ok(Action::Raise(100)));
    }

    #[test]
    fn test_parse_raise_errors() {
        assert_eq!(act("bob raise"), Err(ParseError::MissingAmount("raise")));
        assert_eq!(
            act("bob raise lots"),
            Err(ParseError::InvalidAmount("lots".to_string()))
        );
        assert_eq!(
            act("bob raise 0"),
            Err(ParseError::InvalidAmount("0".to_string()))
        );
        assert_eq!(
            act("bob raise -5"),
            Err(ParseError::InvalidAmount("-5".to_string()))
        );
    }

    // === Membership ===

    #[test]
    fn test_parse_join_and_leave() {
        assert_eq!(
            parse_command("carol join 500"),
            Ok(Command::Join {
                username: Username::new("carol"),
                buy_in: 500,
            })
        );
        assert_eq!(
            parse_command("carol leave"),
            Ok(Command::Leave {
                username: Username::new("carol"),
            })
        );
        assert_eq!(
            parse_command("carol join"),
            Err(ParseError::MissingAmount("join"))
        );
    }

    // === Rejected input ===

    #[test]
    fn test_action_without_player() {
        assert_eq!(
            parse_command("fold"),
            Err(ParseError::MissingPlayer("fold".to_string()))
        );
        assert_eq!(
            parse_command("leave"),
            Err(ParseError::MissingPlayer("leave".to_string()))
        );
    }

    #[test]
    fn test_unrecognized_and_empty() {
        assert_eq!(parse_command("   "), Err(ParseError::Empty));
        assert_eq!(
            parse_command("alice dance"),
            Err(ParseError::UnrecognizedCommand("dance".to_string()))
        );
        assert_eq!(
            parse_command("dance"),
            Err(ParseError::UnrecognizedCommand("dance".to_string()))
        );
    }

    #[test]
    fn test_too_long() {
        let input = format!("alice {}", "raise ".repeat(20));
        assert_eq!(parse_command(&input), Err(ParseError::TooLong));
    }

    #[test]
    fn test_error_messages_are_helpful() {
        let msg = ParseError::InvalidAmount("abc".to_string()).to_string();
        assert!(msg.contains("abc"));
        assert!(msg.contains("positive number"));
        let msg = ParseError::MissingPlayer("call".to_string()).to_string();
        assert!(msg.contains("alice call"));
    }
}
