//! Error types for the masquerade game server

use thiserror::Error;

/// Main error type for game operations
///
/// Every variant is a synchronous rejection: the world state is left
/// unchanged and the caller is notified. No variant is fatal to the process.
/// Late or duplicate messages (unknown challenge/choice ids) are not errors
/// at all; handlers ignore them silently.
#[derive(Debug, Clone, Error)]
pub enum GameError {
    /// Malformed request data: empty name, unknown target, unknown card
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Well-formed request that the rules forbid right now: not your turn,
    /// a challenge is already pending, card not held and caller not
    /// privileged
    #[error("Illegal action: {message}")]
    IllegalAction { message: String },

    /// Configuration error: bad file, bad field value
    #[error("Configuration error: {message}")]
    Configuration { message: String, field: String },
}

impl GameError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        GameError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn illegal_action(message: impl Into<String>) -> Self {
        GameError::IllegalAction {
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the crate
pub type GameResult<T> = Result<T, GameError>;
