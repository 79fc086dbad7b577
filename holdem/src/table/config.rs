//! Table configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::game::{
    constants::{MAX_PLAYERS, MIN_PLAYERS},
    entities::{Blinds, Chips},
    validation::MinRaisePolicy,
};

/// Table speed variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableSpeed {
    Normal,
    Turbo,
    Hyper,
}

impl std::fmt::Display for TableSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableSpeed::Normal => write!(f, "normal"),
            TableSpeed::Turbo => write!(f, "turbo"),
            TableSpeed::Hyper => write!(f, "hyper"),
        }
    }
}

impl std::str::FromStr for TableSpeed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(TableSpeed::Normal),
            "turbo" => Ok(TableSpeed::Turbo),
            "hyper" => Ok(TableSpeed::Hyper),
            other => Err(format!("unknown table speed '{other}'")),
        }
    }
}

/// Table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Table name, used as the log prefix
    pub name: String,

    /// Maximum number of seated players (2..=10)
    pub max_players: usize,

    /// Players needed before a hand is dealt
    pub min_players: usize,

    /// Small blind amount
    pub small_blind: Chips,

    /// Big blind amount
    pub big_blind: Chips,

    /// Minimum buy-in in big blinds (e.g., 20 BB)
    pub min_buy_in_bb: u16,

    /// Maximum buy-in in big blinds (e.g., 100 BB)
    pub max_buy_in_bb: u16,

    /// Table speed, sets the default turn timeout
    pub speed: TableSpeed,

    /// Turn timeout overriding the speed preset
    pub action_timeout_ms: Option<u64>,

    /// How the minimum raise is computed
    pub min_raise: MinRaisePolicy,

    /// Pause after each hand before the next one is dealt
    pub pause_between_hands_ms: u64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Default Table".to_string(),
            max_players: MAX_PLAYERS,
            min_players: MIN_PLAYERS,
            small_blind: 10,
            big_blind: 20,
            min_buy_in_bb: 20,
            max_buy_in_bb: 100,
            speed: TableSpeed::Normal,
            action_timeout_ms: None,
            min_raise: MinRaisePolicy::BigBlind,
            pause_between_hands_ms: 2_000,
        }
    }
}

impl TableConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.small_blind == 0 {
            return Err("Small blind must be positive".to_string());
        }

        if self.big_blind <= self.small_blind {
            return Err("Big blind must be greater than small blind".to_string());
        }

        if self.max_buy_in_bb < self.min_buy_in_bb || self.min_buy_in_bb == 0 {
            return Err("Buy-in range must be non-empty and start above zero".to_string());
        }

        if self
            .big_blind
            .checked_mul(Chips::from(self.max_buy_in_bb))
            .is_none()
        {
            return Err("Maximum buy-in overflows the chip count".to_string());
        }

        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.max_players) {
            return Err(format!(
                "Max players must be between {MIN_PLAYERS} and {MAX_PLAYERS}"
            ));
        }

        if self.min_players < MIN_PLAYERS || self.min_players > self.max_players {
            return Err(format!(
                "Min players must be between {MIN_PLAYERS} and max players"
            ));
        }

        if self.action_timeout_ms == Some(0) {
            return Err("Action timeout must be positive".to_string());
        }

        Ok(())
    }

    pub fn blinds(&self) -> Blinds {
        Blinds {
            small: self.small_blind,
            big: self.big_blind,
        }
    }

    /// Get minimum buy-in in chips
    pub fn min_buy_in_chips(&self) -> Chips {
        self.big_blind.saturating_mul(Chips::from(self.min_buy_in_bb))
    }

    /// Get maximum buy-in in chips
    pub fn max_buy_in_chips(&self) -> Chips {
        self.big_blind.saturating_mul(Chips::from(self.max_buy_in_bb))
    }

    /// Get action timeout based on table speed, unless overridden
    pub fn action_timeout(&self) -> Duration {
        if let Some(ms) = self.action_timeout_ms {
            return Duration::from_millis(ms);
        }
        let secs = match self.speed {
            TableSpeed::Normal => 30,
            TableSpeed::Turbo => 15,
            TableSpeed::Hyper => 5,
        };
        Duration::from_secs(secs)
    }

    pub fn pause_between_hands(&self) -> Duration {
        Duration::from_millis(self.pause_between_hands_ms)
    }
}
