//! Session gateway interface: inbound/outbound message types and the
//! delivery trait
//!
//! The transport layer (connections, identity, rooms) lives outside this
//! crate. It promises reliable in-order room broadcast, point-to-point
//! delivery, and a disconnect notification; the core promises never to hand
//! it anything but value-copies of sanitized state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::cards::CardKind;
use crate::game::effects::GiftMode;
use crate::game::end::{EndTrigger, RankEntry};

/// Delivery surface the core writes to
///
/// Implementations must not call back into the core; they queue or forward.
pub trait Gateway: Send + Sync {
    /// Deliver to every connection in the room
    fn broadcast(&self, event: OutboundEvent);
    /// Deliver to one player's connection; unknown names are dropped
    fn send_to(&self, player: &str, event: OutboundEvent);
}

/// The forced binary decision imposed on a publicly revealed player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForcedChoice {
    DiscardOne,
    LoseOne,
}

/// Everything a client may send, after the transport has mapped the
/// connection to a payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    Join {
        player: String,
    },
    StartGame {
        player: String,
    },
    PlayCard {
        player: String,
        card: CardKind,
        #[serde(default)]
        target: Option<String>,
        #[serde(default)]
        mode: GiftMode,
        #[serde(default)]
        second_target: Option<String>,
    },
    CallBluff {
        player: String,
        challenge_id: Uuid,
    },
    DeclineBluff {
        player: String,
        challenge_id: Uuid,
    },
    ForcedChoiceReply {
        player: String,
        choice: ForcedChoice,
        #[serde(default)]
        discard: Option<CardKind>,
    },
    EndTurn {
        player: String,
        #[serde(default)]
        discard: Option<CardKind>,
    },
    AdminResetGame {
        player: String,
    },
    RequestState {
        player: String,
    },
    RequestHand {
        player: String,
    },
    /// Implicit, produced by the gateway when a connection drops
    Disconnect {
        player: String,
    },
}

impl InboundEvent {
    /// The identity the event claims to act for
    pub fn player(&self) -> &str {
        match self {
            InboundEvent::Join { player }
            | InboundEvent::StartGame { player }
            | InboundEvent::PlayCard { player, .. }
            | InboundEvent::CallBluff { player, .. }
            | InboundEvent::DeclineBluff { player, .. }
            | InboundEvent::ForcedChoiceReply { player, .. }
            | InboundEvent::EndTurn { player, .. }
            | InboundEvent::AdminResetGame { player }
            | InboundEvent::RequestState { player }
            | InboundEvent::RequestHand { player }
            | InboundEvent::Disconnect { player } => player,
        }
    }
}

/// Everything the core emits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    /// Sanitized world state, broadcast after every mutation
    State(StateSnapshot),
    /// Per-action error with a human-readable reason, point-to-point
    Error { message: String },
    PlayerJoined {
        player: String,
        total_players: usize,
    },
    PlayerLeft {
        player: String,
    },
    GameStarted {
        message: String,
    },
    /// Public, non-revealing notice that a declaration awaits its window
    ChallengeOpened {
        challenge_id: Uuid,
        attacker: String,
        card: CardKind,
        target: String,
    },
    /// Point-to-point prompt sent only to the eligible responder
    ChallengePrompt {
        challenge_id: Uuid,
        attacker: String,
        card: CardKind,
        timeout_ms: u64,
    },
    ChallengeResult {
        success: bool,
        message: String,
    },
    /// Point-to-point prompt for the discard-or-lose decision
    ForcedChoicePrompt {
        prompt_id: Uuid,
        timeout_ms: u64,
    },
    /// Point-to-point reveal of one card (celebrant peek)
    CardRevealed {
        owner: String,
        card: CardKind,
    },
    /// Point-to-point view of the requester's own hand
    YourHand {
        cards: Vec<CardKind>,
    },
    GameOver {
        trigger: EndTrigger,
        ranking: Vec<RankEntry>,
    },
}

/// Public view of one player: never exposes hand contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPublic {
    pub name: String,
    pub score: i32,
    pub hand_size: usize,
    pub guardian_active: bool,
    pub is_privileged: bool,
}

/// Consistent post-mutation snapshot of the world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub players: Vec<PlayerPublic>,
    pub current_turn: Option<String>,
    pub game_started: bool,
    pub turn_index: u32,
    pub round: u32,
    pub draw_pile: usize,
    pub discard_pile: usize,
    pub pending_challenge: Option<Uuid>,
    pub logs: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_event_json_shape() {
        let json = r#"{
            "type": "play_card",
            "player": "alice",
            "card": "sniper",
            "target": "bob"
        }"#;
        let event: InboundEvent = serde_json::from_str(json).expect("parse");
        match event {
            InboundEvent::PlayCard {
                player,
                card,
                target,
                mode,
                second_target,
            } => {
                assert_eq!(player, "alice");
                assert_eq!(card, CardKind::Sniper);
                assert_eq!(target.as_deref(), Some("bob"));
                assert_eq!(mode, GiftMode::Keep);
                assert!(second_target.is_none());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_outbound_event_round_trip() {
        let event = OutboundEvent::ChallengeResult {
            success: true,
            message: "bob did not challenge".to_string(),
        };
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains("challenge_result"));
        let back: OutboundEvent = serde_json::from_str(&json).expect("parse");
        assert!(matches!(back, OutboundEvent::ChallengeResult { success: true, .. }));
    }

    #[test]
    fn test_snapshot_has_no_hand_contents() {
        let snapshot = StateSnapshot {
            players: vec![PlayerPublic {
                name: "alice".to_string(),
                score: 97,
                hand_size: 5,
                guardian_active: false,
                is_privileged: false,
            }],
            current_turn: Some("alice".to_string()),
            game_started: true,
            turn_index: 3,
            round: 2,
            draw_pile: 20,
            discard_pile: 0,
            pending_challenge: None,
            logs: vec![],
        };
        let json = serde_json::to_string(&snapshot).expect("serialize");
        // Hand sizes only, never a hand field or card tags.
        assert!(json.contains("\"hand_size\":5"));
        assert!(!json.contains("\"hand\""));
        assert!(!json.contains("joker"));
        assert!(!json.contains("sniper"));
    }
}
