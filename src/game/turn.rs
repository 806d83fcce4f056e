//! Turn order, round counting and the once-per-turn marker

use uuid::Uuid;

/// Owns the play order, whose turn it is, and the turn marker
///
/// The marker is an opaque token regenerated every time the turn advances.
/// Anything "once per turn" records the marker when granted and is honored
/// only while that marker is still current, so a bonus can never leak across
/// turns even if the same check runs twice.
#[derive(Debug, Clone)]
pub struct TurnSequencer {
    order: Vec<String>,
    current: Option<String>,
    turn_index: u32,
    turn_marker: Uuid,
}

impl TurnSequencer {
    /// Sequencer for a game that has not started
    pub fn idle() -> Self {
        Self {
            order: Vec::new(),
            current: None,
            turn_index: 0,
            turn_marker: Uuid::new_v4(),
        }
    }

    /// Fix the play order at game start; the first player acts first
    pub fn start(&mut self, order: Vec<String>) {
        self.current = order.first().cloned();
        self.order = order;
        self.turn_index = 0;
        self.turn_marker = Uuid::new_v4();
    }

    /// The acting player, or none before the game starts
    pub fn current_turn(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Completed turns since game start; never reset mid-game
    pub fn turn_index(&self) -> u32 {
        self.turn_index
    }

    /// The marker scoping once-per-turn bonuses
    pub fn marker(&self) -> Uuid {
        self.turn_marker
    }

    /// One round is one full pass over the play order
    pub fn round(&self) -> u32 {
        if self.order.is_empty() {
            return 1;
        }
        self.turn_index / self.order.len() as u32 + 1
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Drop a player from the play order (disconnect teardown)
    pub fn remove(&mut self, name: &str) {
        self.order.retain(|n| n != name);
        if self.order.is_empty() {
            self.current = None;
        }
    }

    /// Advance to the successor of `just_acted`, wrapping around
    ///
    /// If `just_acted` has already been removed from the order, falls back
    /// to advancing from the previous current player, or to the first
    /// remaining player if that one is gone too. Stamps a fresh marker and
    /// counts the completed turn.
    pub fn advance(&mut self, just_acted: &str) -> Option<&str> {
        if self.order.is_empty() {
            self.current = None;
            return None;
        }

        let successor_of = |name: &str| -> Option<String> {
            self.order
                .iter()
                .position(|n| n == name)
                .map(|idx| self.order[(idx + 1) % self.order.len()].clone())
        };

        let next = successor_of(just_acted)
            .or_else(|| self.current.as_deref().and_then(successor_of))
            .unwrap_or_else(|| self.order[0].clone());

        self.current = Some(next);
        self.turn_index += 1;
        self.turn_marker = Uuid::new_v4();
        self.current_turn()
    }
}
