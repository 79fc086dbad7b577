//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use holdem::{
    Chips,
    constants::MAX_USER_INPUT_LENGTH,
    game::validation::MinRaisePolicy,
    table::{TableConfig, TableSpeed},
};

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Rules of the hosted table
    pub table: TableConfig,
    /// Players given a wallet in the in-memory ledger
    pub players: Vec<String>,
    /// Wallet balance each player starts with
    pub starting_balance: Chips,
}

/// Values given on the command line, which win over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub name: Option<String>,
    pub speed: Option<TableSpeed>,
    pub players: Option<Vec<String>>,
    pub starting_balance: Option<Chips>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but can't be parsed
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        let defaults = TableConfig::default();

        let speed = match overrides.speed {
            Some(speed) => speed,
            None => parse_env_with("TABLE_SPEED", defaults.speed, str::parse)?,
        };
        let min_raise = parse_env_with("TABLE_MIN_RAISE", defaults.min_raise, str::parse)?;
        let action_timeout_ms = std::env::var("TABLE_ACTION_TIMEOUT_MS")
            .ok()
            .map(|v| {
                v.parse().map_err(|_| ConfigError::Invalid {
                    var: "TABLE_ACTION_TIMEOUT_MS".to_string(),
                    reason: format!("'{v}' is not a number of milliseconds"),
                })
            })
            .transpose()?;

        let table = TableConfig {
            name: overrides
                .name
                .or_else(|| std::env::var("TABLE_NAME").ok())
                .unwrap_or(defaults.name),
            max_players: parse_env_or("TABLE_MAX_PLAYERS", defaults.max_players),
            min_players: parse_env_or("TABLE_MIN_PLAYERS", defaults.min_players),
            small_blind: parse_env_or("TABLE_SMALL_BLIND", defaults.small_blind),
            big_blind: parse_env_or("TABLE_BIG_BLIND", defaults.big_blind),
            min_buy_in_bb: parse_env_or("TABLE_MIN_BUY_IN_BB", defaults.min_buy_in_bb),
            max_buy_in_bb: parse_env_or("TABLE_MAX_BUY_IN_BB", defaults.max_buy_in_bb),
            speed,
            action_timeout_ms,
            min_raise,
            pause_between_hands_ms: parse_env_or(
                "TABLE_PAUSE_BETWEEN_HANDS_MS",
                defaults.pause_between_hands_ms,
            ),
        };

        let players = overrides
            .players
            .or_else(|| std::env::var("PLAYERS").ok().map(|v| split_players(&v)))
            .unwrap_or_else(|| split_players("alice,bob,carol"));
        let starting_balance = overrides
            .starting_balance
            .unwrap_or_else(|| parse_env_or("STARTING_BALANCE", 10_000));

        Ok(ServerConfig {
            table,
            players,
            starting_balance,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.table.validate().map_err(|reason| ConfigError::Invalid {
            var: "TABLE_*".to_string(),
            reason,
        })?;

        if self.players.is_empty() {
            return Err(ConfigError::Invalid {
                var: "PLAYERS".to_string(),
                reason: "At least one player is required".to_string(),
            });
        }

        if let Some(name) = self
            .players
            .iter()
            .find(|name| name.is_empty() || name.len() > MAX_USER_INPUT_LENGTH)
        {
            return Err(ConfigError::Invalid {
                var: "PLAYERS".to_string(),
                reason: format!(
                    "Player name '{name}' must be 1 to {MAX_USER_INPUT_LENGTH} characters"
                ),
            });
        }

        if self.starting_balance < self.table.min_buy_in_chips() {
            return Err(ConfigError::Invalid {
                var: "STARTING_BALANCE".to_string(),
                reason: format!(
                    "Must cover the minimum buy-in ({})",
                    self.table.min_buy_in_chips()
                ),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

pub(crate) fn split_players(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Like [`parse_env_or`], but a value that is present and malformed is an error.
fn parse_env_with<T>(
    key: &str,
    default: T,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(value) => parse(&value).map_err(|reason| ConfigError::Invalid {
            var: key.to_string(),
            reason,
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig {
            table: TableConfig::default(),
            players: vec!["alice".to_string(), "bob".to_string()],
            starting_balance: 10_000,
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid {
            var: "PLAYERS".to_string(),
            reason: "At least one player is required".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("PLAYERS"));
        assert!(msg.contains("At least one player"));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_big_blind_too_small() {
        let mut config = config();
        config.table.small_blind = 20;
        config.table.big_blind = 10;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "TABLE_*"));
    }

    #[test]
    fn test_config_validation_requires_players() {
        let mut config = config();
        config.players.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_long_name() {
        let mut config = config();
        config.players.push("x".repeat(MAX_USER_INPUT_LENGTH + 1));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_balance_below_buy_in() {
        let mut config = config();
        config.starting_balance = config.table.min_buy_in_chips() - 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_split_players_trims_and_skips_empty() {
        assert_eq!(split_players(" alice, ,bob,"), vec!["alice", "bob"]);
    }

    #[test]
    fn test_overrides_win() {
        let config = ServerConfig::from_env(Overrides {
            name: Some("Override".to_string()),
            speed: Some(TableSpeed::Hyper),
            players: Some(vec!["zed".to_string()]),
            starting_balance: Some(777),
        })
        .unwrap();
        assert_eq!(config.table.name, "Override");
        assert_eq!(config.table.speed, TableSpeed::Hyper);
        assert_eq!(config.players, vec!["zed"]);
        assert_eq!(config.starting_balance, 777);
    }

    #[test]
    fn test_min_raise_parses() {
        let policy: MinRaisePolicy = "last-raise".parse().unwrap();
        assert_eq!(policy, MinRaisePolicy::LastRaise);
    }
}
