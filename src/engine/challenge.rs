//! The challenge engine: declaration windows, bluff calls, forced choices
//!
//! At most one challenge is outstanding system-wide; while it exists no new
//! card may be declared. Every window resolves exactly once: the reply and
//! the timeout both funnel through the world lock, where an id-checked take
//! decides the winner and turns the loser into a no-op.

use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::engine::scheduler::TimerHandle;
use crate::engine::GameServer;
use crate::error::GameResult;
use crate::game::cards::CardKind;
use crate::game::effects::{EffectRequest, GiftMode};
use crate::game::GameWorld;
use crate::gateway::{ForcedChoice, OutboundEvent};

/// Penalty for an attacker caught bluffing
pub const BLUFF_CAUGHT_PENALTY: i32 = 5;
/// Penalty for a challenger who accused a truthful attacker
pub const FAILED_CHALLENGE_PENALTY: i32 = 3;
/// Point loss for the forced choice (chosen or defaulted on timeout)
pub const CHOICE_POINT_LOSS: i32 = 1;

/// The single outstanding "did you really have that card" prompt
#[derive(Debug)]
pub struct PendingChallenge {
    pub id: Uuid,
    pub attacker: String,
    pub card: CardKind,
    pub target: String,
    pub second_target: Option<String>,
    pub mode: GiftMode,
    /// Whether the attacker truly held the card at declaration time.
    /// Privileged attackers are always treated as holding it.
    pub had_card: bool,
    /// Window timer; dropping the record disarms it
    pub timer: TimerHandle,
}

impl PendingChallenge {
    fn effect_request(&self) -> EffectRequest {
        EffectRequest {
            attacker: self.attacker.clone(),
            card: self.card,
            target: Some(self.target.clone()),
            second_target: self.second_target.clone(),
            mode: self.mode,
            had_card: self.had_card,
        }
    }
}

/// One outstanding discard-or-lose decision, keyed by its target
#[derive(Debug)]
pub struct PendingChoice {
    pub id: Uuid,
    pub timer: TimerHandle,
}

impl GameServer {
    /// Open the challenge window for a declared, targeted card
    ///
    /// The declaration is broadcast publicly without revealing `had_card`;
    /// only the target receives the point-to-point prompt.
    pub(crate) fn open_challenge(
        self: &Arc<Self>,
        world: &mut GameWorld,
        attacker: &str,
        card: CardKind,
        target: String,
        mode: GiftMode,
        second_target: Option<String>,
    ) {
        let id = Uuid::new_v4();
        let had_card = world
            .players
            .get(attacker)
            .map(|p| p.is_privileged || p.holds(card))
            .unwrap_or(false);

        let timeout_ms = world.config.challenge_timeout_ms;
        let server = Arc::clone(self);
        let timer = self
            .scheduler
            .schedule(Duration::from_millis(timeout_ms), move || {
                server.on_challenge_timeout(id)
            });

        // Modifiers only matter for the split-effect card.
        let (mode, second_target) = if card == CardKind::Gifter {
            (mode, second_target)
        } else {
            (GiftMode::Keep, None)
        };

        world.pending_challenge = Some(PendingChallenge {
            id,
            attacker: attacker.to_string(),
            card,
            target: target.clone(),
            second_target,
            mode,
            had_card,
            timer,
        });
        world.log(format!(
            "{attacker} declared {} against {target} (awaiting challenge)",
            card.display_name()
        ));
        tracing::info!(
            challenge_id = %id,
            attacker,
            card = %card,
            target = %target,
            "challenge window opened"
        );

        self.gateway.send_to(
            &target,
            OutboundEvent::ChallengePrompt {
                challenge_id: id,
                attacker: attacker.to_string(),
                card,
                timeout_ms,
            },
        );
        self.gateway.broadcast(OutboundEvent::ChallengeOpened {
            challenge_id: id,
            attacker: attacker.to_string(),
            card,
            target,
        });
        self.broadcast_state(world);
    }

    /// The target contests the declaration
    pub fn call_bluff(self: &Arc<Self>, caller: &str, challenge_id: Uuid) -> GameResult<()> {
        let mut guard = self.world();
        let world = &mut *guard;

        let Some(pc) = world.pending_challenge.take() else {
            return Ok(());
        };
        if pc.id != challenge_id || pc.target != caller {
            // Late duplicate or ineligible caller: restore and ignore.
            tracing::debug!(challenge_id = %challenge_id, caller, "ignoring stale bluff call");
            world.pending_challenge = Some(pc);
            return Ok(());
        }
        pc.timer.cancel();

        let display = pc.card.display_name();
        if !pc.had_card {
            world.players.add_score(&pc.attacker, -BLUFF_CAUGHT_PENALTY);
            if let Some(caller) = world.players.get_mut(&pc.target) {
                caller.stats.challenges_won += 1;
            }
            let message = format!(
                "{} called it! {} did not hold {display}; {} takes -{BLUFF_CAUGHT_PENALTY} and the effect is cancelled",
                pc.target, pc.attacker, pc.attacker
            );
            world.log(message.clone());
            tracing::info!(challenge_id = %pc.id, attacker = %pc.attacker, "bluff exposed");
            self.gateway.broadcast(OutboundEvent::ChallengeResult {
                success: true,
                message,
            });
            self.finish_turn(world, &pc.attacker);
        } else {
            world.players.add_score(&pc.target, -FAILED_CHALLENGE_PENALTY);
            let message = format!(
                "{} challenged in vain! {} truly held {display}; {} takes -{FAILED_CHALLENGE_PENALTY} and the effect resolves",
                pc.target, pc.attacker, pc.target
            );
            world.log(message.clone());
            tracing::info!(challenge_id = %pc.id, attacker = %pc.attacker, "challenge failed");
            self.gateway.broadcast(OutboundEvent::ChallengeResult {
                success: false,
                message,
            });
            self.apply_effect(world, &pc.effect_request());
            self.finish_turn(world, &pc.attacker);
        }
        Ok(())
    }

    /// The target explicitly lets the declaration stand
    pub fn decline_bluff(self: &Arc<Self>, caller: &str, challenge_id: Uuid) -> GameResult<()> {
        let mut guard = self.world();
        let world = &mut *guard;

        let Some(pc) = world.pending_challenge.take() else {
            return Ok(());
        };
        if pc.id != challenge_id || pc.target != caller {
            world.pending_challenge = Some(pc);
            return Ok(());
        }
        pc.timer.cancel();

        self.resolve_unchallenged(world, pc, false);
        Ok(())
    }

    /// Window expired with no reply: tacit acceptance
    pub(crate) fn on_challenge_timeout(self: &Arc<Self>, challenge_id: Uuid) {
        let mut guard = self.world();
        let world = &mut *guard;

        let Some(pc) = world.pending_challenge.take() else {
            return;
        };
        if pc.id != challenge_id {
            // A reply won the race and a new challenge is already open.
            world.pending_challenge = Some(pc);
            return;
        }

        tracing::info!(challenge_id = %pc.id, attacker = %pc.attacker, "challenge window expired");
        self.resolve_unchallenged(world, pc, true);
    }

    /// Non-challenge is acceptance regardless of truth: the effect applies,
    /// the card is consumed only if truly held, and an untruthful attacker
    /// is credited a successful bluff.
    pub(crate) fn resolve_unchallenged(
        self: &Arc<Self>,
        world: &mut GameWorld,
        pc: PendingChallenge,
        timed_out: bool,
    ) {
        let verb = if timed_out {
            "did not respond in time"
        } else {
            "declined to challenge"
        };
        let message = format!("{} {verb}; {}'s action stands", pc.target, pc.attacker);
        world.log(message.clone());
        self.gateway.broadcast(OutboundEvent::ChallengeResult {
            success: true,
            message,
        });

        if !pc.had_card {
            if let Some(attacker) = world.players.get_mut(&pc.attacker) {
                attacker.stats.bluffs_won += 1;
            }
        }

        self.apply_effect(world, &pc.effect_request());
        self.finish_turn(world, &pc.attacker);
    }

    /// Arm the discard-or-lose window for a publicly revealed player
    pub(crate) fn open_forced_choice(self: &Arc<Self>, world: &mut GameWorld, target: &str) {
        let id = Uuid::new_v4();
        let timeout_ms = world.config.forced_choice_timeout_ms;

        let server = Arc::clone(self);
        let name = target.to_string();
        let timer = self
            .scheduler
            .schedule(Duration::from_millis(timeout_ms), move || {
                server.on_choice_timeout(&name, id)
            });

        // Replacing an earlier prompt for the same player disarms it.
        world
            .pending_choices
            .insert(target.to_string(), PendingChoice { id, timer });
        self.gateway.send_to(
            target,
            OutboundEvent::ForcedChoicePrompt {
                prompt_id: id,
                timeout_ms,
            },
        );
    }

    /// The revealed player picks discard-one or lose-one
    pub fn forced_choice_reply(
        &self,
        player: &str,
        choice: ForcedChoice,
        discard: Option<CardKind>,
    ) -> GameResult<()> {
        let mut guard = self.world();
        let world = &mut *guard;

        // Unknown or already-resolved prompt: a harmless late message.
        if world.pending_choices.remove(player).is_none() {
            return Ok(());
        }

        match choice {
            ForcedChoice::DiscardOne => {
                let discarded = match world.players.get_mut(player) {
                    Some(p) if !p.hand.is_empty() => {
                        let card = discard.filter(|c| p.holds(*c)).unwrap_or(p.hand[0]);
                        p.remove_card(card);
                        Some(card)
                    }
                    _ => None,
                };
                match discarded {
                    Some(card) => {
                        world.deck.discard(card);
                        world.log(format!("{player} discarded a card under duress"));
                    }
                    None => {
                        world.players.add_score(player, -CHOICE_POINT_LOSS);
                        world.log(format!(
                            "{player} had no card to discard and loses a point instead"
                        ));
                    }
                }
            }
            ForcedChoice::LoseOne => {
                world.players.add_score(player, -CHOICE_POINT_LOSS);
                world.log(format!("{player} chose to lose a point"));
            }
        }

        self.after_mutation(world);
        Ok(())
    }

    /// Forced-choice window expired: default to the point loss
    pub(crate) fn on_choice_timeout(&self, player: &str, prompt_id: Uuid) {
        let mut guard = self.world();
        let world = &mut *guard;

        let current = world.pending_choices.get(player).map(|c| c.id);
        if current != Some(prompt_id) {
            // The reply won the race, or a newer prompt replaced this one.
            return;
        }
        world.pending_choices.remove(player);

        world.players.add_score(player, -CHOICE_POINT_LOSS);
        world.log(format!("{player} did not choose in time and loses a point"));
        tracing::info!(player, "forced choice defaulted to point loss");
        self.after_mutation(world);
    }
}
