//! End-to-end scenarios driven through the public inbound event surface

use std::sync::{Arc, Mutex};
use std::time::Duration;

use masquerade::game::cards::POOL_SIZE;
use masquerade::{
    CardKind, EndTrigger, ForcedChoice, GameConfig, GameServer, Gateway, GiftMode, InboundEvent,
    OutboundEvent,
};

/// Gateway double recording every delivery in order
#[derive(Default)]
struct MockGateway {
    events: Mutex<Vec<(Option<String>, OutboundEvent)>>,
}

impl Gateway for MockGateway {
    fn broadcast(&self, event: OutboundEvent) {
        self.events.lock().expect("gateway lock").push((None, event));
    }

    fn send_to(&self, player: &str, event: OutboundEvent) {
        self.events
            .lock()
            .expect("gateway lock")
            .push((Some(player.to_string()), event));
    }
}

impl MockGateway {
    fn all(&self) -> Vec<(Option<String>, OutboundEvent)> {
        self.events.lock().expect("gateway lock").clone()
    }

    fn errors_for(&self, player: &str) -> Vec<String> {
        self.all()
            .into_iter()
            .filter_map(|(to, e)| match e {
                OutboundEvent::Error { message } if to.as_deref() == Some(player) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn last_game_over(&self) -> Option<(EndTrigger, Vec<masquerade::RankEntry>)> {
        self.all().into_iter().rev().find_map(|(_, e)| match e {
            OutboundEvent::GameOver { trigger, ranking } => Some((trigger, ranking)),
            _ => None,
        })
    }
}

fn fast_config() -> GameConfig {
    GameConfig {
        challenge_timeout_ms: 40,
        forced_choice_timeout_ms: 40,
        ..GameConfig::default()
    }
}

fn seated_server(names: &[&str]) -> (Arc<GameServer>, Arc<MockGateway>) {
    let gateway = Arc::new(MockGateway::default());
    let server = GameServer::new(fast_config(), gateway.clone());
    for name in names {
        server.handle(InboundEvent::Join {
            player: name.to_string(),
        });
    }
    (server, gateway)
}

/// Fix the play order and re-deal deterministically: the holder gets exactly
/// one copy of `card`, everyone else keeps a 5-card hand, and the 30-card
/// pool stays intact
fn rig_turn_and_card(server: &Arc<GameServer>, order: &[&str], holder: &str, card: CardKind) {
    server.with_world(|world| {
        world
            .turns
            .start(order.iter().map(|s| s.to_string()).collect());

        let mut pool: Vec<CardKind> = Vec::new();
        let names: Vec<String> = world.players.names().to_vec();
        for name in &names {
            let hand = &mut world.players.get_mut(name).expect("seated").hand;
            pool.append(hand);
        }
        while let Some(c) = world.deck.draw() {
            pool.push(c);
        }

        let idx = pool
            .iter()
            .position(|c| *c == card)
            .expect("kind available");
        let granted = pool.swap_remove(idx);
        for name in &names {
            let hand = if name == holder {
                vec![granted]
            } else {
                pool.split_off(pool.len() - 5)
            };
            world.players.get_mut(name).expect("seated").hand = hand;
        }
        for leftover in pool {
            world.deck.discard(leftover);
        }
    });
}

#[tokio::test]
async fn test_join_start_and_deal_shape() {
    let (server, gateway) = seated_server(&["alice", "bob"]);
    server.handle(InboundEvent::StartGame {
        player: "alice".to_string(),
    });

    server.with_world(|world| {
        assert!(world.game_started);
        for name in ["alice", "bob"] {
            assert_eq!(world.players.get(name).expect("seated").hand.len(), 5);
            assert_eq!(world.players.get(name).expect("seated").score, 100);
        }
        // 30-card pool minus two 5-card hands.
        assert_eq!(world.deck.draw_len(), POOL_SIZE - 10);
    });

    let started = gateway
        .all()
        .iter()
        .any(|(_, e)| matches!(e, OutboundEvent::GameStarted { .. }));
    assert!(started);
}

#[tokio::test]
async fn test_join_rejections_are_named_errors() {
    let (server, gateway) = seated_server(&["alice"]);

    server.handle(InboundEvent::Join {
        player: "alice".to_string(),
    });
    assert!(!gateway.errors_for("alice").is_empty());

    server.handle(InboundEvent::Join {
        player: "   ".to_string(),
    });
    // The registry rejected the blank name before seating anyone.
    server.with_world(|world| assert_eq!(world.players.len(), 1));

    // Starting alone is rejected with a reason.
    server.handle(InboundEvent::StartGame {
        player: "alice".to_string(),
    });
    server.with_world(|world| assert!(!world.game_started));
}

#[tokio::test]
async fn test_capacity_is_enforced() {
    let (server, gateway) = seated_server(&["p1", "p2", "p3", "p4", "p5", "p6"]);
    server.handle(InboundEvent::Join {
        player: "p7".to_string(),
    });

    server.with_world(|world| assert_eq!(world.players.len(), 6));
    assert!(gateway
        .errors_for("p7")
        .iter()
        .any(|m| m.contains("full")));
}

#[tokio::test]
async fn test_bluff_goes_unchallenged_through_the_event_surface() {
    let (server, _gateway) = seated_server(&["alice", "bob"]);
    server.handle(InboundEvent::StartGame {
        player: "alice".to_string(),
    });
    rig_turn_and_card(&server, &["alice", "bob"], "alice", CardKind::Joker);

    // Alice declares a card she does not hold; bob never answers.
    server.handle(InboundEvent::PlayCard {
        player: "alice".to_string(),
        card: CardKind::Sniper,
        target: Some("bob".to_string()),
        mode: GiftMode::Keep,
        second_target: None,
    });
    tokio::time::sleep(Duration::from_millis(150)).await;

    server.with_world(|world| {
        let alice = world.players.get("alice").expect("seated");
        assert_eq!(alice.stats.bluffs_won, 1);
        assert_eq!(alice.hand, vec![CardKind::Joker]);
        assert!(world.players.get("bob").expect("seated").score < 100);
    });
}

#[tokio::test]
async fn test_broadcast_state_never_leaks_hands() {
    let (server, gateway) = seated_server(&["alice", "bob"]);
    server.handle(InboundEvent::StartGame {
        player: "alice".to_string(),
    });

    for (_, event) in gateway.all() {
        if let OutboundEvent::State(snapshot) = event {
            let json = serde_json::to_string(&snapshot).expect("serialize");
            assert!(!json.contains("\"hand\""));
            for player in &snapshot.players {
                assert!(player.hand_size <= 5);
            }
        }
    }
}

#[tokio::test]
async fn test_own_hand_is_point_to_point_only() {
    let (server, gateway) = seated_server(&["alice", "bob"]);
    server.handle(InboundEvent::StartGame {
        player: "alice".to_string(),
    });
    server.handle(InboundEvent::RequestHand {
        player: "alice".to_string(),
    });

    let hands: Vec<(Option<String>, OutboundEvent)> = gateway
        .all()
        .into_iter()
        .filter(|(_, e)| matches!(e, OutboundEvent::YourHand { .. }))
        .collect();
    assert_eq!(hands.len(), 1);
    assert_eq!(hands[0].0.as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_celebrant_peek_is_private() {
    let (server, gateway) = seated_server(&["alice", "bob"]);
    server.handle(InboundEvent::StartGame {
        player: "alice".to_string(),
    });
    rig_turn_and_card(&server, &["alice", "bob"], "alice", CardKind::Celebrant);

    server.handle(InboundEvent::PlayCard {
        player: "alice".to_string(),
        card: CardKind::Celebrant,
        target: Some("bob".to_string()),
        mode: GiftMode::Keep,
        second_target: None,
    });
    let challenge_id = server
        .with_world(|world| world.pending_challenge.as_ref().map(|c| c.id))
        .expect("window open");
    server.handle(InboundEvent::DeclineBluff {
        player: "bob".to_string(),
        challenge_id,
    });

    let reveals: Vec<(Option<String>, OutboundEvent)> = gateway
        .all()
        .into_iter()
        .filter(|(_, e)| matches!(e, OutboundEvent::CardRevealed { .. }))
        .collect();
    assert_eq!(reveals.len(), 1);
    assert_eq!(reveals[0].0.as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_forced_choice_round_trip() {
    let (server, _gateway) = seated_server(&["alice", "bob"]);
    server.handle(InboundEvent::StartGame {
        player: "alice".to_string(),
    });
    rig_turn_and_card(&server, &["alice", "bob"], "alice", CardKind::Detective);

    server.handle(InboundEvent::PlayCard {
        player: "alice".to_string(),
        card: CardKind::Detective,
        target: Some("bob".to_string()),
        mode: GiftMode::Keep,
        second_target: None,
    });
    let challenge_id = server
        .with_world(|world| world.pending_challenge.as_ref().map(|c| c.id))
        .expect("window open");
    server.handle(InboundEvent::DeclineBluff {
        player: "bob".to_string(),
        challenge_id,
    });

    let hand_before = server.with_world(|world| {
        world.players.get("bob").expect("seated").hand.len()
    });
    server.handle(InboundEvent::ForcedChoiceReply {
        player: "bob".to_string(),
        choice: ForcedChoice::DiscardOne,
        discard: None,
    });

    server.with_world(|world| {
        let bob = world.players.get("bob").expect("seated");
        assert_eq!(bob.hand.len(), hand_before - 1);
        assert_eq!(bob.score, 100);
        assert!(world.pending_choices.is_empty());
    });
}

#[tokio::test]
async fn test_round_limit_ends_with_ranking() {
    let gateway = Arc::new(MockGateway::default());
    let server = GameServer::new(
        GameConfig {
            max_rounds: 1,
            ..fast_config()
        },
        gateway.clone(),
    );
    for name in ["alice", "bob"] {
        server.handle(InboundEvent::Join {
            player: name.to_string(),
        });
    }
    server.handle(InboundEvent::StartGame {
        player: "alice".to_string(),
    });
    server.with_world(|world| {
        world
            .turns
            .start(vec!["alice".to_string(), "bob".to_string()]);
        world.players.get_mut("alice").expect("seated").score = 60;
        world.players.get_mut("bob").expect("seated").stats.challenges_won = 1;
    });

    // Two plain turns complete round one; the next check trips the limit.
    server.handle(InboundEvent::EndTurn {
        player: "alice".to_string(),
        discard: None,
    });
    server.handle(InboundEvent::EndTurn {
        player: "bob".to_string(),
        discard: None,
    });

    let (trigger, ranking) = gateway.last_game_over().expect("game over");
    assert!(matches!(trigger, EndTrigger::RoundLimit { .. }));
    // Bob leads on score; ranking is descending.
    assert_eq!(ranking[0].name, "bob");
    assert_eq!(ranking[1].name, "alice");
    server.with_world(|world| assert!(!world.game_started));
}

#[tokio::test]
async fn test_time_limit_ends_the_game() {
    let (server, gateway) = seated_server(&["alice", "bob"]);
    server.handle(InboundEvent::StartGame {
        player: "alice".to_string(),
    });
    server.with_world(|world| {
        world
            .turns
            .start(vec!["alice".to_string(), "bob".to_string()]);
        // Backdate the start beyond the limit.
        world.started_at = Some(
            chrono::Utc::now() - chrono::Duration::seconds(world.config.time_limit_secs as i64 + 5),
        );
    });

    server.handle(InboundEvent::EndTurn {
        player: "alice".to_string(),
        discard: None,
    });

    let (trigger, _) = gateway.last_game_over().expect("game over");
    assert!(matches!(trigger, EndTrigger::TimeLimit { .. }));
}

#[tokio::test]
async fn test_disconnect_mid_game_hands_the_turn_on() {
    let (server, gateway) = seated_server(&["alice", "bob", "carol"]);
    server.handle(InboundEvent::StartGame {
        player: "alice".to_string(),
    });
    server.with_world(|world| {
        world.turns.start(vec![
            "alice".to_string(),
            "bob".to_string(),
            "carol".to_string(),
        ]);
    });

    server.handle(InboundEvent::Disconnect {
        player: "alice".to_string(),
    });

    server.with_world(|world| {
        assert!(!world.players.contains("alice"));
        assert_eq!(world.turns.order().len(), 2);
        assert_eq!(world.turns.current_turn(), Some("bob"));
    });
    let left = gateway
        .all()
        .iter()
        .any(|(_, e)| matches!(e, OutboundEvent::PlayerLeft { player } if player == "alice"));
    assert!(left);
}

#[tokio::test]
async fn test_unknown_ids_are_silently_ignored() {
    let (server, gateway) = seated_server(&["alice", "bob"]);
    server.handle(InboundEvent::StartGame {
        player: "alice".to_string(),
    });

    let before = gateway.all().len();
    server.handle(InboundEvent::CallBluff {
        player: "bob".to_string(),
        challenge_id: uuid::Uuid::new_v4(),
    });
    server.handle(InboundEvent::ForcedChoiceReply {
        player: "bob".to_string(),
        choice: ForcedChoice::LoseOne,
        discard: None,
    });

    // Harmless late messages: no errors, no broadcasts, no state change.
    assert_eq!(gateway.all().len(), before);
    server.with_world(|world| {
        assert_eq!(world.players.get("bob").expect("seated").score, 100);
    });
}
