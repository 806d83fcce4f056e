//! Configuration management for the masquerade game server

use crate::error::GameError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::game::cards::POOL_SIZE;

/// Table-level configuration for a game room
///
/// Rule constants (damage values, penalties, the sniper soft cap) are fixed
/// and live next to the code that applies them; this struct only carries the
/// knobs an operator would reasonably tune.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Maximum number of seated players
    pub max_players: usize,
    /// Cards dealt to each player at game start
    pub hand_size: usize,
    /// Score every player starts with
    pub starting_score: i32,
    /// Window for the target to call or decline a bluff (milliseconds)
    pub challenge_timeout_ms: u64,
    /// Window for a revealed player to pick discard-or-lose (milliseconds)
    pub forced_choice_timeout_ms: u64,
    /// Game ends when the round number exceeds this
    pub max_rounds: u32,
    /// Game ends when this much wall-clock time has elapsed (seconds)
    pub time_limit_secs: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_players: 6,
            hand_size: 5,
            starting_score: 100,
            challenge_timeout_ms: 5000,
            forced_choice_timeout_ms: 5000,
            max_rounds: 25,
            time_limit_secs: 1800, // 30 minutes
        }
    }
}

impl GameConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        let content = fs::read_to_string(path).map_err(|e| GameError::Configuration {
            message: format!("Failed to read config file: {}", e),
            field: "config_file".to_string(),
        })?;

        let config: GameConfig =
            toml::from_str(&content).map_err(|e| GameError::Configuration {
                message: format!("Failed to parse config file: {}", e),
                field: "config_format".to_string(),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), GameError> {
        let content = toml::to_string_pretty(self).map_err(|e| GameError::Configuration {
            message: format!("Failed to serialize config: {}", e),
            field: "config_serialization".to_string(),
        })?;

        fs::write(path, content).map_err(|e| GameError::Configuration {
            message: format!("Failed to write config file: {}", e),
            field: "config_write".to_string(),
        })?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), GameError> {
        if self.max_players < 2 {
            return Err(GameError::Configuration {
                message: "at least 2 players are required".to_string(),
                field: "max_players".to_string(),
            });
        }

        if self.hand_size == 0 {
            return Err(GameError::Configuration {
                message: "hand size must be at least 1".to_string(),
                field: "hand_size".to_string(),
            });
        }

        // A full table must be dealable from the fixed pool.
        if self.max_players * self.hand_size > POOL_SIZE {
            return Err(GameError::Configuration {
                message: format!(
                    "cannot deal {} cards to {} players from a {}-card pool",
                    self.hand_size, self.max_players, POOL_SIZE
                ),
                field: "max_players".to_string(),
            });
        }

        if self.challenge_timeout_ms == 0 || self.forced_choice_timeout_ms == 0 {
            return Err(GameError::Configuration {
                message: "timeout windows must be non-zero".to_string(),
                field: "challenge_timeout_ms".to_string(),
            });
        }

        if self.max_rounds == 0 {
            return Err(GameError::Configuration {
                message: "round limit must be at least 1".to_string(),
                field: "max_rounds".to_string(),
            });
        }

        if self.time_limit_secs == 0 {
            return Err(GameError::Configuration {
                message: "time limit must be non-zero".to_string(),
                field: "time_limit_secs".to_string(),
            });
        }

        Ok(())
    }
}
