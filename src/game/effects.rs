//! Card effect resolution
//!
//! [`resolve`] applies one declared card to the world pieces it touches
//! (registry and deck) and reports everything that must leave the core:
//! public log lines, private reveals, forced-choice prompts. It never talks
//! to the gateway or the scheduler itself; the engine owns all I/O.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::cards::CardKind;
use crate::game::deck::Deck;
use crate::game::player::PlayerRegistry;

/// Damage and penalty constants, fixed by the rules
pub const JOKER_DAMAGE: i32 = 2;
pub const JOKER_SELF_PENALTY: i32 = 1;
pub const GIFT_DAMAGE: i32 = 1;
pub const GIFT_SELF_GAIN: i32 = 1;
pub const SNIPER_DAMAGE: i32 = 3;
pub const SNIPER_SELF_PENALTY: i32 = 1;
/// Sniper damage is reduced against targets above this score
pub const SNIPER_SOFT_CAP: i32 = 80;
pub const SNIPER_REDUCED_DAMAGE: i32 = 2;
/// Counter-penalty paid by an intercepted attacker
pub const GUARDIAN_COUNTER_SNIPER: i32 = 2;
pub const GUARDIAN_COUNTER: i32 = 1;
/// Extra damage granted by a consumed mark
pub const MARK_BONUS: i32 = 1;

/// The two modes of the split-effect card
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GiftMode {
    /// Mode A: the attacker gains a point and one target takes damage
    #[default]
    Keep,
    /// Mode B: two distinct targets take equal damage, the attacker gains
    /// nothing
    Split,
}

/// One resolution request
#[derive(Debug, Clone)]
pub struct EffectRequest {
    pub attacker: String,
    pub card: CardKind,
    pub target: Option<String>,
    pub second_target: Option<String>,
    pub mode: GiftMode,
    /// Whether the attacker truly held the card at declaration time; a card
    /// is only ever consumed when this is true
    pub had_card: bool,
}

/// Everything a resolution produced that the engine must act on
#[derive(Debug, Default)]
pub struct EffectOutcome {
    /// Public log lines, in order
    pub log: Vec<String>,
    /// Point-to-point card reveals: (recipient, owner, card)
    pub reveals: Vec<(String, String, CardKind)>,
    /// Players who must now pick discard-one or lose-one
    pub forced_choices: Vec<String>,
}

impl EffectOutcome {
    fn log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }
}

/// Apply one card to the world
///
/// Resolution order: guardian self-buff, then interception, then the card's
/// own rule, then consumption. Privileged attackers never consume a card;
/// neither does a bluffing attacker who never held it.
pub fn resolve(
    players: &mut PlayerRegistry,
    deck: &mut Deck,
    turn_marker: Uuid,
    req: &EffectRequest,
) -> EffectOutcome {
    let mut out = EffectOutcome::default();

    let attacker = req.attacker.as_str();
    if !players.contains(attacker) {
        return out;
    }

    match req.card {
        CardKind::Guardian => {
            // Stealth: no public log line.
            if let Some(p) = players.get_mut(attacker) {
                p.guardian_active = true;
            }
        }
        CardKind::Celebrant => resolve_celebrant(players, turn_marker, req, &mut out),
        CardKind::Detective => resolve_detective(players, req, &mut out),
        CardKind::Gifter if req.mode == GiftMode::Split => {
            resolve_gift_split(players, turn_marker, req, &mut out)
        }
        CardKind::Joker | CardKind::Gifter | CardKind::Sniper => {
            resolve_attack(players, turn_marker, req, &mut out)
        }
    }

    consume_card(players, deck, req);
    out
}

/// Private peek plus the once-per-turn mark
fn resolve_celebrant(
    players: &mut PlayerRegistry,
    turn_marker: Uuid,
    req: &EffectRequest,
    out: &mut EffectOutcome,
) {
    let Some(target) = valid_target(players, req.target.as_deref()) else {
        return;
    };

    let peeked = players.get(&target).and_then(|t| t.hand.first().copied());
    match peeked {
        Some(card) => {
            // The card identity goes to the attacker only.
            out.reveals.push((req.attacker.clone(), target.clone(), card));
            out.log(format!(
                "{} used {} to peek at one of {}'s cards (marked)",
                req.attacker,
                req.card.display_name(),
                target
            ));
        }
        None => out.log(format!(
            "{} used {} on {}, but they hold no cards (marked anyway)",
            req.attacker,
            req.card.display_name(),
            target
        )),
    }

    if let Some(p) = players.get_mut(&req.attacker) {
        p.mark_target = Some(target);
        p.mark_turn = Some(turn_marker);
    }
}

/// Public reveal plus the forced discard-or-lose choice
fn resolve_detective(players: &mut PlayerRegistry, req: &EffectRequest, out: &mut EffectOutcome) {
    let Some(target) = valid_target(players, req.target.as_deref()) else {
        return;
    };

    let revealed = players.get(&target).and_then(|t| t.hand.first().copied());
    match revealed {
        Some(card) => out.log(format!(
            "{} used {} to expose one of {}'s cards: {}",
            req.attacker,
            req.card.display_name(),
            target,
            card.display_name()
        )),
        None => out.log(format!(
            "{} used {} on {}, but they hold no cards",
            req.attacker,
            req.card.display_name(),
            target
        )),
    }

    out.forced_choices.push(target);
}

/// Mode B of the split-effect card: two distinct targets, no attacker gain.
/// Interception is evaluated per target independently.
fn resolve_gift_split(
    players: &mut PlayerRegistry,
    turn_marker: Uuid,
    req: &EffectRequest,
    out: &mut EffectOutcome,
) {
    let Some(first) = valid_target(players, req.target.as_deref()) else {
        return;
    };

    // Invalid split parameters silently fall back to mode A.
    let second = match valid_target(players, req.second_target.as_deref()) {
        Some(s) if s != first => s,
        _ => {
            let fallback = EffectRequest {
                mode: GiftMode::Keep,
                ..req.clone()
            };
            resolve_attack(players, turn_marker, &fallback, out);
            return;
        }
    };

    for (idx, target) in [first, second].into_iter().enumerate() {
        if intercepted(players, &req.attacker, &target, req.card, out) {
            continue;
        }
        let mut damage = GIFT_DAMAGE;
        if idx == 0 {
            damage += mark_bonus(players, &req.attacker, &target, turn_marker);
        }
        players.add_score(&target, -damage);
        out.log(format!(
            "{} used {} (split) on {} for -{}",
            req.attacker,
            req.card.display_name(),
            target,
            damage
        ));
    }
}

/// Single-target attacks: joker, sniper, and mode A of the gift
fn resolve_attack(
    players: &mut PlayerRegistry,
    turn_marker: Uuid,
    req: &EffectRequest,
    out: &mut EffectOutcome,
) {
    let Some(target) = valid_target(players, req.target.as_deref()) else {
        return;
    };

    let target_score = players.get(&target).map(|t| t.score).unwrap_or_default();

    let (mut damage, self_penalty) = match req.card {
        CardKind::Joker => (JOKER_DAMAGE, JOKER_SELF_PENALTY),
        CardKind::Sniper if target_score > SNIPER_SOFT_CAP => {
            // Anti-runaway safeguard: full power only against the leaders'
            // pursuers, reduced against anyone still riding high.
            (SNIPER_REDUCED_DAMAGE, SNIPER_SELF_PENALTY)
        }
        CardKind::Sniper => (SNIPER_DAMAGE, SNIPER_SELF_PENALTY),
        CardKind::Gifter => {
            // Mode A gain applies even if the attack is then intercepted.
            players.add_score(&req.attacker, GIFT_SELF_GAIN);
            (GIFT_DAMAGE, 0)
        }
        _ => return,
    };

    if intercepted(players, &req.attacker, &target, req.card, out) {
        return;
    }

    damage += mark_bonus(players, &req.attacker, &target, turn_marker);
    players.add_score(&target, -damage);
    if self_penalty != 0 {
        players.add_score(&req.attacker, -self_penalty);
    }

    match req.card {
        CardKind::Gifter => out.log(format!(
            "{} used {} for +{} and hit {} for -{}",
            req.attacker,
            req.card.display_name(),
            GIFT_SELF_GAIN,
            target,
            damage
        )),
        _ => out.log(format!(
            "{} used {} on {} for -{} (self -{})",
            req.attacker,
            req.card.display_name(),
            target,
            damage,
            self_penalty
        )),
    }
}

/// Guardian interception check for one target
///
/// A defended target takes no damage; the attacker pays the counter-penalty
/// and the one-shot flag resets.
fn intercepted(
    players: &mut PlayerRegistry,
    attacker: &str,
    target: &str,
    card: CardKind,
    out: &mut EffectOutcome,
) -> bool {
    let defended = players
        .get(target)
        .map(|t| t.guardian_active)
        .unwrap_or(false);
    if !defended {
        return false;
    }

    let counter = if card == CardKind::Sniper {
        GUARDIAN_COUNTER_SNIPER
    } else {
        GUARDIAN_COUNTER
    };
    players.add_score(attacker, -counter);
    if let Some(t) = players.get_mut(target) {
        t.guardian_active = false;
    }
    out.log(format!(
        "{attacker} attacked {target}, but the {} blocked it! {attacker} takes -{counter}",
        CardKind::Guardian.display_name()
    ));
    true
}

/// Consume the once-per-turn mark if it applies to this exact target in
/// this exact turn; returns the extra damage
fn mark_bonus(
    players: &mut PlayerRegistry,
    attacker: &str,
    target: &str,
    turn_marker: Uuid,
) -> i32 {
    let Some(p) = players.get_mut(attacker) else {
        return 0;
    };
    if p.mark_target.as_deref() == Some(target) && p.mark_turn == Some(turn_marker) {
        p.mark_target = None;
        p.mark_turn = None;
        MARK_BONUS
    } else {
        0
    }
}

/// Move the played card from the attacker's hand to the discard pile.
/// Privileged attackers and attackers who never held the card keep their
/// hand untouched.
fn consume_card(players: &mut PlayerRegistry, deck: &mut Deck, req: &EffectRequest) {
    if !req.had_card {
        return;
    }
    let Some(p) = players.get_mut(&req.attacker) else {
        return;
    };
    if p.is_privileged {
        return;
    }
    if p.remove_card(req.card) {
        deck.discard(req.card);
    }
}

fn valid_target(players: &PlayerRegistry, target: Option<&str>) -> Option<String> {
    target
        .filter(|t| players.contains(t))
        .map(|t| t.to_string())
}
