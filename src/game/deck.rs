//! Draw and discard piles with draw-time reshuffling

use rand::seq::SliceRandom;
use rand::thread_rng;

use crate::game::cards::CardKind;

/// The shared card pool: a draw pile consumed from the back and a discard
/// pile that is reshuffled into it when the draw pile runs dry.
///
/// Together with all dealt hands the two piles always account for exactly
/// the fixed pool size while a game is running.
#[derive(Debug, Clone, Default)]
pub struct Deck {
    draw_pile: Vec<CardKind>,
    discard_pile: Vec<CardKind>,
}

impl Deck {
    /// Empty deck, used before the first deal
    pub fn empty() -> Self {
        Self::default()
    }

    /// Freshly shuffled full pool, discard pile empty
    pub fn shuffled() -> Self {
        let mut draw_pile = CardKind::pool();
        draw_pile.shuffle(&mut thread_rng());
        Self {
            draw_pile,
            discard_pile: Vec::new(),
        }
    }

    /// Deal up to `n` cards off the draw pile
    pub fn deal(&mut self, n: usize) -> Vec<CardKind> {
        let mut hand = Vec::with_capacity(n);
        for _ in 0..n {
            match self.draw() {
                Some(card) => hand.push(card),
                None => break,
            }
        }
        hand
    }

    /// Draw one card, reshuffling the discard pile into the draw pile if
    /// the draw pile is empty. Yields `None` only when both piles are empty.
    pub fn draw(&mut self) -> Option<CardKind> {
        if self.draw_pile.is_empty() && !self.discard_pile.is_empty() {
            self.discard_pile.shuffle(&mut thread_rng());
            std::mem::swap(&mut self.draw_pile, &mut self.discard_pile);
        }
        self.draw_pile.pop()
    }

    /// Place a card on the discard pile
    pub fn discard(&mut self, card: CardKind) {
        self.discard_pile.push(card);
    }

    pub fn draw_len(&self) -> usize {
        self.draw_pile.len()
    }

    pub fn discard_len(&self) -> usize {
        self.discard_pile.len()
    }
}
