//! Per-player state and the join-time registry

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{GameError, GameResult};
use crate::game::cards::CardKind;

/// Per-player statistics, used only for tie-breaking at game end
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Challenges this player made that exposed a bluff
    pub challenges_won: u32,
    /// Bluffs this player got away with (unchallenged or declined)
    pub bluffs_won: u32,
    /// Turns this player has completed
    pub turns_taken: u32,
}

/// Mutable state for one seated player
#[derive(Debug, Clone)]
pub struct Player {
    pub name: String,
    /// Face-down hand; order carries no meaning
    pub hand: Vec<CardKind>,
    pub score: i32,
    /// One-shot defensive flag set by the guardian card
    pub guardian_active: bool,
    /// Pending once-per-turn damage mark: target identity plus the turn
    /// marker current when the mark was granted
    pub mark_target: Option<String>,
    pub mark_turn: Option<Uuid>,
    /// Privileged players bypass possession checks and never consume cards
    pub is_privileged: bool,
    pub stats: PlayerStats,
}

impl Player {
    pub fn new(name: &str, starting_score: i32) -> Self {
        Self {
            name: name.to_string(),
            hand: Vec::new(),
            score: starting_score,
            guardian_active: false,
            mark_target: None,
            mark_turn: None,
            is_privileged: name.eq_ignore_ascii_case("admin"),
            stats: PlayerStats::default(),
        }
    }

    pub fn holds(&self, card: CardKind) -> bool {
        self.hand.contains(&card)
    }

    /// Remove one copy of `card` from the hand; returns false if not held
    pub fn remove_card(&mut self, card: CardKind) -> bool {
        match self.hand.iter().position(|c| *c == card) {
            Some(idx) => {
                self.hand.swap_remove(idx);
                true
            }
            None => false,
        }
    }

    /// Reset for a fresh deal (game start or admin reset)
    pub fn reset(&mut self, starting_score: i32, hand: Vec<CardKind>) {
        self.hand = hand;
        self.score = starting_score;
        self.guardian_active = false;
        self.mark_target = None;
        self.mark_turn = None;
        self.stats = PlayerStats::default();
    }
}

/// Owns every seated player, keyed by identity
///
/// Enforces the join-time invariants: non-empty name, uniqueness, capacity.
/// Iteration order is join order, which keeps snapshots stable.
#[derive(Debug, Clone)]
pub struct PlayerRegistry {
    players: HashMap<String, Player>,
    names: Vec<String>,
    capacity: usize,
}

impl PlayerRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            players: HashMap::new(),
            names: Vec::new(),
            capacity,
        }
    }

    /// Admit a player, or report a named error
    pub fn join(&mut self, name: &str, starting_score: i32) -> GameResult<&Player> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::invalid_input("player name cannot be empty"));
        }
        if self.players.len() >= self.capacity {
            return Err(GameError::illegal_action("the game is full"));
        }
        if self.players.contains_key(name) {
            return Err(GameError::illegal_action(format!(
                "player name '{name}' is already taken"
            )));
        }

        self.names.push(name.to_string());
        self.players
            .insert(name.to_string(), Player::new(name, starting_score));
        Ok(&self.players[name])
    }

    pub fn remove(&mut self, name: &str) -> Option<Player> {
        self.names.retain(|n| n != name);
        self.players.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.players.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Player> {
        self.players.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Player> {
        self.players.get_mut(name)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Player names in join order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Players in join order
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.names.iter().filter_map(|n| self.players.get(n))
    }

    /// Apply a score delta if the player is still seated
    pub fn add_score(&mut self, name: &str, delta: i32) {
        if let Some(player) = self.players.get_mut(name) {
            player.score += delta;
        }
    }

    /// Sum of all cards currently held in hands
    pub fn cards_in_hands(&self) -> usize {
        self.players.values().map(|p| p.hand.len()).sum()
    }
}
