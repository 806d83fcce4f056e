//! The game world: one owning structure for all mutable state
//!
//! Everything here is owned exclusively by [`GameWorld`]; the gateway only
//! ever sees value-copies taken after a mutation completes. The engine
//! passes the world explicitly into each handler under a single lock.

pub mod cards;
pub mod deck;
pub mod effects;
pub mod end;
pub mod player;
pub mod turn;

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::thread_rng;
use std::collections::HashMap;

use crate::config::GameConfig;
use crate::engine::challenge::{PendingChallenge, PendingChoice};
use crate::error::{GameError, GameResult};
use crate::game::cards::CardKind;
use crate::game::deck::Deck;
use crate::game::player::PlayerRegistry;
use crate::game::turn::TurnSequencer;
use crate::gateway::{PlayerPublic, StateSnapshot};

/// The single shared mutable world
#[derive(Debug)]
pub struct GameWorld {
    pub config: GameConfig,
    pub players: PlayerRegistry,
    pub deck: Deck,
    pub turns: TurnSequencer,
    pub game_started: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub logs: Vec<String>,
    /// At most one outstanding challenge; while present, no new card may be
    /// declared by anyone
    pub pending_challenge: Option<PendingChallenge>,
    /// Outstanding forced choices, keyed by the revealed player
    pub pending_choices: HashMap<String, PendingChoice>,
}

impl GameWorld {
    pub fn new(config: GameConfig) -> Self {
        Self {
            players: PlayerRegistry::new(config.max_players),
            deck: Deck::empty(),
            turns: TurnSequencer::idle(),
            game_started: false,
            started_at: None,
            logs: Vec::new(),
            pending_challenge: None,
            pending_choices: HashMap::new(),
            config,
        }
    }

    pub fn log(&mut self, line: impl Into<String>) {
        self.logs.push(line.into());
    }

    pub fn round(&self) -> u32 {
        self.turns.round()
    }

    /// Wall-clock time since the current game started
    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|t| Utc::now() - t)
    }

    /// Shuffle the pool and the seating, deal fresh hands, reset scores and
    /// flags, and open round one. Shared by game start and admin reset.
    pub fn deal_new_game(&mut self) -> GameResult<()> {
        if self.players.len() < 2 {
            return Err(GameError::illegal_action(
                "at least 2 players are required to start",
            ));
        }

        let mut deck = Deck::shuffled();
        let mut order: Vec<String> = self.players.names().to_vec();
        order.shuffle(&mut thread_rng());

        let starting_score = self.config.starting_score;
        let hand_size = self.config.hand_size;
        for name in &order {
            let hand = deck.deal(hand_size);
            if let Some(player) = self.players.get_mut(name) {
                player.reset(starting_score, hand);
            }
        }

        self.deck = deck;
        self.turns.start(order);
        self.game_started = true;
        self.started_at = Some(Utc::now());
        self.logs.clear();
        Ok(())
    }

    /// The requester's own hand; a privileged player is shown one of every
    /// kind since possession never constrains them
    pub fn hand_for(&self, name: &str) -> Option<Vec<CardKind>> {
        let player = self.players.get(name)?;
        if player.is_privileged {
            Some(CardKind::ALL.to_vec())
        } else {
            Some(player.hand.clone())
        }
    }

    /// Sanitized snapshot for broadcast: hand sizes, never hand contents
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            players: self
                .players
                .iter()
                .map(|p| PlayerPublic {
                    name: p.name.clone(),
                    score: p.score,
                    hand_size: p.hand.len(),
                    guardian_active: p.guardian_active,
                    is_privileged: p.is_privileged,
                })
                .collect(),
            current_turn: self.turns.current_turn().map(|s| s.to_string()),
            game_started: self.game_started,
            turn_index: self.turns.turn_index(),
            round: self.round(),
            draw_pile: self.deck.draw_len(),
            discard_pile: self.deck.discard_len(),
            pending_challenge: self.pending_challenge.as_ref().map(|c| c.id),
            logs: self.logs.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cards::POOL_SIZE;

    fn world_with_players(names: &[&str]) -> GameWorld {
        let mut world = GameWorld::new(GameConfig::default());
        for name in names {
            world
                .players
                .join(name, world.config.starting_score)
                .expect("join");
        }
        world
    }

    #[test]
    fn test_deal_splits_pool_between_hands_and_draw_pile() {
        let mut world = world_with_players(&["alice", "bob"]);
        world.deal_new_game().expect("deal");

        // Two 5-card hands plus a remainder draw pile of pool - 10.
        for name in ["alice", "bob"] {
            assert_eq!(world.players.get(name).expect("seated").hand.len(), 5);
        }
        assert_eq!(world.deck.draw_len(), POOL_SIZE - 10);
        assert_eq!(world.deck.discard_len(), 0);
        assert!(world.game_started);
        assert!(world.turns.current_turn().is_some());
        assert_eq!(world.round(), 1);
    }

    #[test]
    fn test_deal_requires_two_players() {
        let mut world = world_with_players(&["alice"]);
        assert!(world.deal_new_game().is_err());
        assert!(!world.game_started);
    }

    #[test]
    fn test_snapshot_is_sanitized() {
        let mut world = world_with_players(&["alice", "bob"]);
        world.deal_new_game().expect("deal");

        let snapshot = world.snapshot();
        assert_eq!(snapshot.players.len(), 2);
        for player in &snapshot.players {
            assert_eq!(player.hand_size, 5);
        }
        assert_eq!(snapshot.draw_pile, POOL_SIZE - 10);
    }

    #[test]
    fn test_privileged_hand_view_shows_every_kind() {
        let mut world = world_with_players(&["admin", "bob"]);
        world.deal_new_game().expect("deal");

        let hand = world.hand_for("admin").expect("seated");
        assert_eq!(hand, CardKind::ALL.to_vec());

        let hand = world.hand_for("bob").expect("seated");
        assert_eq!(hand.len(), 5);
    }
}
