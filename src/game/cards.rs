//! Card kinds, the fixed pool composition and display names

use serde::{Deserialize, Serialize};
use std::fmt;

/// Total number of cards in the fixed pool
pub const POOL_SIZE: usize = 30;

/// The closed set of card kinds a hand may contain
///
/// Identity comparison happens on this enum only; human-facing names live in
/// [`CardKind::display_name`] and never participate in game logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    /// Standard damage card: fixed damage plus a small self-penalty
    Joker,
    /// Split-effect card: self-gain against one target, or spread damage
    /// across two
    Gifter,
    /// High-damage card with a soft cap against high-score targets
    Sniper,
    /// Defensive card: intercepts the next attack against its owner
    Guardian,
    /// Information card: private peek plus a once-per-turn damage mark
    Celebrant,
    /// Public-reveal card: forces the target into discard-or-lose
    Detective,
}

impl CardKind {
    pub const ALL: [CardKind; 6] = [
        CardKind::Joker,
        CardKind::Gifter,
        CardKind::Sniper,
        CardKind::Guardian,
        CardKind::Celebrant,
        CardKind::Detective,
    ];

    /// Human-facing name, decoupled from identity
    pub fn display_name(&self) -> &'static str {
        match self {
            CardKind::Joker => "Joker",
            CardKind::Gifter => "Gift Giver",
            CardKind::Sniper => "Sniper",
            CardKind::Guardian => "Guardian",
            CardKind::Celebrant => "Celebrant",
            CardKind::Detective => "Detective",
        }
    }

    /// Number of copies of this kind in the fixed pool
    pub fn pool_count(&self) -> usize {
        match self {
            CardKind::Joker => 8,
            CardKind::Gifter => 8,
            CardKind::Sniper => 5,
            CardKind::Guardian => 4,
            CardKind::Celebrant => 3,
            CardKind::Detective => 2,
        }
    }

    /// Attack cards deal direct score damage and are subject to guardian
    /// interception and the once-per-turn mark bonus
    pub fn is_attack(&self) -> bool {
        matches!(self, CardKind::Joker | CardKind::Gifter | CardKind::Sniper)
    }

    /// Every kind except the defensive one names a target and therefore
    /// opens a challenge window when declared
    pub fn requires_target(&self) -> bool {
        !matches!(self, CardKind::Guardian)
    }

    /// The full unshuffled pool
    pub fn pool() -> Vec<CardKind> {
        let mut cards = Vec::with_capacity(POOL_SIZE);
        for kind in CardKind::ALL {
            for _ in 0..kind.pool_count() {
                cards.push(kind);
            }
        }
        cards
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_composition() {
        let pool = CardKind::pool();
        assert_eq!(pool.len(), POOL_SIZE);

        let count = |kind| pool.iter().filter(|c| **c == kind).count();
        assert_eq!(count(CardKind::Joker), 8);
        assert_eq!(count(CardKind::Gifter), 8);
        assert_eq!(count(CardKind::Sniper), 5);
        assert_eq!(count(CardKind::Guardian), 4);
        assert_eq!(count(CardKind::Celebrant), 3);
        assert_eq!(count(CardKind::Detective), 2);
    }

    #[test]
    fn test_targeting_classification() {
        assert!(!CardKind::Guardian.requires_target());
        for kind in CardKind::ALL {
            if kind != CardKind::Guardian {
                assert!(kind.requires_target(), "{kind} should require a target");
            }
        }

        assert!(CardKind::Joker.is_attack());
        assert!(CardKind::Gifter.is_attack());
        assert!(CardKind::Sniper.is_attack());
        assert!(!CardKind::Celebrant.is_attack());
        assert!(!CardKind::Detective.is_attack());
        assert!(!CardKind::Guardian.is_attack());
    }

    #[test]
    fn test_display_names_are_lookup_only() {
        // Two distinct kinds must never collide on display name
        let mut names: Vec<&str> = CardKind::ALL.iter().map(|c| c.display_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), CardKind::ALL.len());
    }
}
