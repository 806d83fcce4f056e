//! Masquerade - authoritative server core for a hidden-role bluffing card
//! game
//!
//! Players hold secret cards; on their turn they declare a card and target,
//! the target may call the bluff within a timed window, and the outcome
//! resolves deterministically against a single locked world:
//! - at most one challenge is outstanding at any instant
//! - every window resolves exactly once, reply or timeout
//! - disconnects resolve pending work immediately instead of stalling it
//!
//! The transport layer is an external collaborator behind the [`Gateway`]
//! trait; this crate never touches sockets.

pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod gateway;
pub mod observability;

// Re-export commonly used types for convenience
pub use error::{GameError, GameResult};

// Re-export the engine surface
pub use engine::challenge::{PendingChallenge, PendingChoice};
pub use engine::scheduler::{Scheduler, TimerHandle};
pub use engine::GameServer;

// Re-export core game types
pub use config::GameConfig;
pub use game::cards::CardKind;
pub use game::effects::GiftMode;
pub use game::end::{EndTrigger, RankEntry};
pub use game::GameWorld;

// Re-export the gateway surface
pub use gateway::{
    ForcedChoice, Gateway, InboundEvent, OutboundEvent, PlayerPublic, StateSnapshot,
};
