//! The game engine: one locked world, one gateway, one scheduler
//!
//! All mutating operations (inbound actions, challenge replies, forced
//! choices, timeout callbacks) take the world lock for one logical
//! read-modify-write, then broadcast a consistent snapshot. No operation
//! blocks the process; windows are scheduled work on the runtime.

pub mod challenge;
pub mod scheduler;


use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::GameConfig;
use crate::engine::scheduler::Scheduler;
use crate::error::{GameError, GameResult};
use crate::game::cards::CardKind;
use crate::game::effects::{self, EffectRequest, GiftMode};
use crate::game::end::{self, EndTrigger};
use crate::game::GameWorld;
use crate::gateway::{Gateway, InboundEvent, OutboundEvent};

/// The authoritative server core for one room
pub struct GameServer {
    world: Mutex<GameWorld>,
    pub(crate) gateway: Arc<dyn Gateway>,
    pub(crate) scheduler: Scheduler,
}

impl GameServer {
    pub fn new(config: GameConfig, gateway: Arc<dyn Gateway>) -> Arc<Self> {
        Arc::new(Self {
            world: Mutex::new(GameWorld::new(config)),
            gateway,
            scheduler: Scheduler::new(),
        })
    }

    /// Take the world lock. A poisoned lock is recovered rather than
    /// propagated; the world is kept consistent by the handlers themselves.
    pub(crate) fn world(&self) -> MutexGuard<'_, GameWorld> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a closure against the locked world
    ///
    /// Escape hatch for embedders that need direct inspection (and for
    /// tests that rig deterministic hands). Ordinary traffic goes through
    /// [`GameServer::handle`].
    pub fn with_world<R>(&self, f: impl FnOnce(&mut GameWorld) -> R) -> R {
        f(&mut self.world())
    }

    /// Dispatch one inbound event, reporting any rejection back to the
    /// claimed sender
    pub fn handle(self: &Arc<Self>, event: InboundEvent) {
        let player = event.player().to_string();
        let result = match event {
            InboundEvent::Join { player } => self.join(&player),
            InboundEvent::StartGame { .. } => self.start_game(),
            InboundEvent::PlayCard {
                player,
                card,
                target,
                mode,
                second_target,
            } => self.play_card(&player, card, target, mode, second_target),
            InboundEvent::CallBluff {
                player,
                challenge_id,
            } => self.call_bluff(&player, challenge_id),
            InboundEvent::DeclineBluff {
                player,
                challenge_id,
            } => self.decline_bluff(&player, challenge_id),
            InboundEvent::ForcedChoiceReply {
                player,
                choice,
                discard,
            } => self.forced_choice_reply(&player, choice, discard),
            InboundEvent::EndTurn { player, discard } => self.end_turn(&player, discard),
            InboundEvent::AdminResetGame { player } => self.admin_reset(&player),
            InboundEvent::RequestState { player } => self.request_state(&player),
            InboundEvent::RequestHand { player } => self.request_hand(&player),
            InboundEvent::Disconnect { player } => {
                self.disconnect(&player);
                Ok(())
            }
        };

        if let Err(err) = result {
            tracing::debug!(player = %player, error = %err, "rejected inbound event");
            self.gateway.send_to(
                &player,
                OutboundEvent::Error {
                    message: err.to_string(),
                },
            );
        }
    }

    /// Admit a player into the room
    pub fn join(&self, name: &str) -> GameResult<()> {
        let mut guard = self.world();
        let world = &mut *guard;

        let starting_score = world.config.starting_score;
        let player = world.players.join(name, starting_score)?.name.clone();
        let total_players = world.players.len();
        tracing::info!(player = %player, total_players, "player joined");

        self.gateway.broadcast(OutboundEvent::PlayerJoined {
            player,
            total_players,
        });
        self.broadcast_state(world);
        Ok(())
    }

    /// Deal a fresh game to the seated players
    pub fn start_game(&self) -> GameResult<()> {
        let mut guard = self.world();
        let world = &mut *guard;

        if world.game_started {
            return Err(GameError::illegal_action("the game has already started"));
        }
        world.deal_new_game()?;
        tracing::info!(players = world.players.len(), "game started");

        self.gateway.broadcast(OutboundEvent::GameStarted {
            message: format!(
                "Game on! Each player was dealt {} cards",
                world.config.hand_size
            ),
        });
        self.broadcast_state(world);
        Ok(())
    }

    /// Declare a card. Targeted cards open a challenge window; the guardian
    /// resolves immediately and ends the turn.
    pub fn play_card(
        self: &Arc<Self>,
        player: &str,
        card: CardKind,
        target: Option<String>,
        mode: GiftMode,
        second_target: Option<String>,
    ) -> GameResult<()> {
        let mut guard = self.world();
        let world = &mut *guard;

        if !world.game_started {
            return Err(GameError::illegal_action("the game has not started"));
        }
        if !world.players.contains(player) {
            return Err(GameError::invalid_input("unknown player"));
        }
        if world.turns.current_turn() != Some(player) {
            return Err(GameError::illegal_action("it is not your turn"));
        }
        if world.pending_challenge.is_some() {
            return Err(GameError::illegal_action(
                "the previous action is still awaiting its challenge window",
            ));
        }

        if card.requires_target() {
            let target = target
                .ok_or_else(|| GameError::invalid_input("this card requires a target"))?;
            if !world.players.contains(&target) {
                return Err(GameError::invalid_input("unknown target"));
            }
            if target == player {
                return Err(GameError::invalid_input("you cannot target yourself"));
            }
            self.open_challenge(world, player, card, target, mode, second_target);
            return Ok(());
        }

        // Guardian: no target, no challenge window. Possession is checked
        // here because there is no bluff to call.
        let allowed = world
            .players
            .get(player)
            .map(|p| p.is_privileged || p.holds(card))
            .unwrap_or(false);
        if !allowed {
            return Err(GameError::illegal_action("you do not hold that card"));
        }

        let req = EffectRequest {
            attacker: player.to_string(),
            card,
            target: None,
            second_target: None,
            mode: GiftMode::Keep,
            had_card: true,
        };
        self.apply_effect(world, &req);
        self.finish_turn(world, player);
        Ok(())
    }

    /// Optional discard-then-draw, then pass the turn
    pub fn end_turn(&self, player: &str, discard: Option<CardKind>) -> GameResult<()> {
        let mut guard = self.world();
        let world = &mut *guard;

        if !world.game_started {
            return Err(GameError::illegal_action("the game has not started"));
        }
        if world.turns.current_turn() != Some(player) {
            return Err(GameError::illegal_action("it is not your turn"));
        }
        if world.pending_challenge.is_some() {
            return Err(GameError::illegal_action(
                "the previous action is still awaiting its challenge window",
            ));
        }

        let discarded = match (discard, world.players.get_mut(player)) {
            (Some(card), Some(p)) if p.holds(card) => {
                p.remove_card(card);
                Some(card)
            }
            _ => None,
        };
        match discarded {
            Some(card) => {
                world.deck.discard(card);
                match world.deck.draw() {
                    Some(drawn) => {
                        if let Some(p) = world.players.get_mut(player) {
                            p.hand.push(drawn);
                        }
                        world.log(format!("{player} discarded one card and drew a new one"));
                    }
                    None => world.log(format!(
                        "{player} discarded one card but the deck was empty"
                    )),
                }
            }
            None => world.log(format!("{player} ended the turn")),
        }

        self.finish_turn(world, player);
        Ok(())
    }

    /// Privileged-only full reshuffle and reset
    pub fn admin_reset(&self, player: &str) -> GameResult<()> {
        let mut guard = self.world();
        let world = &mut *guard;

        let privileged = world
            .players
            .get(player)
            .map(|p| p.is_privileged)
            .unwrap_or(false);
        if !privileged {
            return Err(GameError::illegal_action(
                "only the administrator can reset the game",
            ));
        }

        // Disarm every outstanding window before re-dealing; the dropped
        // handles cancel their timers.
        world.pending_challenge = None;
        world.pending_choices.clear();
        world.deal_new_game()?;
        tracing::info!(by = player, "game reset by administrator");

        self.gateway.broadcast(OutboundEvent::GameStarted {
            message: "The administrator restarted the game".to_string(),
        });
        self.broadcast_state(world);
        Ok(())
    }

    /// Point-to-point snapshot on demand
    pub fn request_state(&self, player: &str) -> GameResult<()> {
        let guard = self.world();
        self.gateway
            .send_to(player, OutboundEvent::State(guard.snapshot()));
        Ok(())
    }

    /// Point-to-point view of the requester's own hand
    pub fn request_hand(&self, player: &str) -> GameResult<()> {
        let guard = self.world();
        if let Some(cards) = guard.hand_for(player) {
            self.gateway
                .send_to(player, OutboundEvent::YourHand { cards });
        }
        Ok(())
    }

    /// Centralized teardown for a dropped connection
    ///
    /// Resolves or cancels any window referencing the player, removes them
    /// from registry and turn order, hands the turn on if it was theirs,
    /// and broadcasts the removal. Not an error path: pending work resolves
    /// immediately instead of waiting for its timeout.
    pub fn disconnect(self: &Arc<Self>, player: &str) {
        let mut guard = self.world();
        let world = &mut *guard;
        tracing::info!(player, "player disconnected");

        if let Some(pc) = world.pending_challenge.take() {
            if pc.target == player {
                // The target resigning from the challenge is tacit
                // acceptance: resolve as an unchallenged timeout.
                self.resolve_unchallenged(world, pc, true);
            } else if pc.attacker == player {
                let message = format!("{player} disconnected; their action is cancelled");
                world.log(message.clone());
                self.gateway.broadcast(OutboundEvent::ChallengeResult {
                    success: false,
                    message,
                });
                self.finish_turn(world, player);
            } else {
                world.pending_challenge = Some(pc);
            }
        }

        // Their forced-choice window, if any, is disarmed by the drop.
        world.pending_choices.remove(player);

        let was_current = world.turns.current_turn() == Some(player);
        world.players.remove(player);
        world.turns.remove(player);
        self.gateway.broadcast(OutboundEvent::PlayerLeft {
            player: player.to_string(),
        });

        if was_current && world.game_started {
            world.turns.advance(player);
        }
        self.after_mutation(world);
    }

    /// Run one resolved effect against the world and act on its outcome
    pub(crate) fn apply_effect(self: &Arc<Self>, world: &mut GameWorld, req: &EffectRequest) {
        let marker = world.turns.marker();
        let outcome = effects::resolve(&mut world.players, &mut world.deck, marker, req);

        for line in outcome.log {
            tracing::info!(effect = %line, "effect resolved");
            world.log(line);
        }
        for (recipient, owner, card) in outcome.reveals {
            self.gateway
                .send_to(&recipient, OutboundEvent::CardRevealed { owner, card });
        }
        for target in outcome.forced_choices {
            self.open_forced_choice(world, &target);
        }
    }

    /// Count the completed turn, advance, then check end conditions and
    /// broadcast
    pub(crate) fn finish_turn(&self, world: &mut GameWorld, just_acted: &str) {
        if let Some(p) = world.players.get_mut(just_acted) {
            p.stats.turns_taken += 1;
        }
        world.turns.advance(just_acted);
        self.after_mutation(world);
    }

    /// End-condition check plus the post-mutation broadcast
    pub(crate) fn after_mutation(&self, world: &mut GameWorld) {
        if world.game_started {
            let trigger = end::evaluate(
                &world.players,
                world.round(),
                world.elapsed(),
                &world.config,
            );
            if let Some(trigger) = trigger {
                self.finish_game(world, trigger);
                return;
            }
        }
        self.broadcast_state(world);
    }

    fn finish_game(&self, world: &mut GameWorld, trigger: EndTrigger) {
        world.game_started = false;
        // Disarm every outstanding window.
        world.pending_challenge = None;
        world.pending_choices.clear();

        let line = match &trigger {
            EndTrigger::Eliminated { player } => {
                format!("game over: {player} was driven to zero")
            }
            EndTrigger::RoundLimit { rounds } => {
                format!("game over: round limit reached after {rounds} rounds")
            }
            EndTrigger::TimeLimit { elapsed_secs } => {
                format!("game over: time limit reached after {elapsed_secs}s")
            }
        };
        world.log(line);
        tracing::info!(?trigger, "game over");

        let ranking = end::ranking(&world.players);
        self.broadcast_state(world);
        self.gateway
            .broadcast(OutboundEvent::GameOver { trigger, ranking });
    }

    pub(crate) fn broadcast_state(&self, world: &GameWorld) {
        self.gateway
            .broadcast(OutboundEvent::State(world.snapshot()));
    }

    /// Handy for embedders: a default-configured server
    pub fn with_defaults(gateway: Arc<dyn Gateway>) -> Arc<Self> {
        Self::new(GameConfig::default(), gateway)
    }
}
