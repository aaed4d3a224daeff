use super::test_support::*;
use super::*;

use futures_util::SinkExt;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

use emberfall_protocol::{ChatChannel, CombatAction, QueueMode, TargetKind};

use crate::infrastructure::ports::CharacterStore;

#[tokio::test]
async fn upgrade_without_token_is_rejected() {
    let world = build_test_world();
    let (addr, server) = spawn_ws_server(world.state.clone()).await;

    let result = connect_async(format!("ws://{addr}/ws")).await;
    assert!(result.is_err());

    server.abort();
}

#[tokio::test]
async fn handshake_sends_connection_success_then_pong() {
    let world = build_test_world();
    let (addr, server) = spawn_ws_server(world.state.clone()).await;

    let mut ws = ws_connect(addr).await;
    let first = ws_recv_server(&mut ws).await;
    assert!(matches!(first, ServerMessage::ConnectionSuccess { .. }));

    ws_send_client(&mut ws, &ClientMessage::Heartbeat).await;
    ws_expect_message(&mut ws, |m| matches!(m, ServerMessage::Pong)).await;

    server.abort();
}

#[tokio::test]
async fn select_character_announces_online_to_other_connections() {
    let world = build_test_world();
    let (addr, server) = spawn_ws_server(world.state.clone()).await;

    let mut observer = ws_connect(addr).await;
    ws_expect_message(&mut observer, |m| {
        matches!(m, ServerMessage::ConnectionSuccess { .. })
    })
    .await;

    let _hero_ws = connect_as(addr, world.hero).await;

    let status = ws_expect_message(&mut observer, |m| {
        matches!(m, ServerMessage::CharacterStatus { is_online: true, .. })
    })
    .await;
    match status {
        ServerMessage::CharacterStatus {
            character_id,
            character,
            ..
        } => {
            assert_eq!(character_id, world.hero.to_string());
            assert_eq!(character.unwrap().name, "Aldric");
        }
        other => panic!("unexpected frame: {other:?}"),
    }

    server.abort();
}

#[tokio::test]
async fn global_chat_reaches_other_connections() {
    let world = build_test_world();
    let (addr, server) = spawn_ws_server(world.state.clone()).await;

    let mut hero_ws = connect_as(addr, world.hero).await;
    let mut rival_ws = connect_as(addr, world.rival).await;

    ws_send_client(
        &mut hero_ws,
        &ClientMessage::Chat {
            character_id: world.hero.to_string(),
            channel: ChatChannel::Global,
            message: "well met".into(),
            target_character_id: None,
        },
    )
    .await;

    let chat = ws_expect_message(&mut rival_ws, |m| {
        matches!(m, ServerMessage::ChatMessage { .. })
    })
    .await;
    match chat {
        ServerMessage::ChatMessage {
            channel,
            sender,
            message,
            ..
        } => {
            assert_eq!(channel, ChatChannel::Global);
            assert_eq!(sender.name, "Aldric");
            assert_eq!(message, "well met");
        }
        other => panic!("unexpected frame: {other:?}"),
    }

    server.abort();
}

#[tokio::test]
async fn whisper_to_offline_character_errors() {
    let world = build_test_world();
    let (addr, server) = spawn_ws_server(world.state.clone()).await;

    let mut hero_ws = connect_as(addr, world.hero).await;

    ws_send_client(
        &mut hero_ws,
        &ClientMessage::Chat {
            character_id: world.hero.to_string(),
            channel: ChatChannel::Whisper,
            message: "psst".into(),
            target_character_id: Some(world.rival.to_string()),
        },
    )
    .await;

    let error = ws_expect_message(&mut hero_ws, |m| {
        matches!(m, ServerMessage::Error { .. })
    })
    .await;
    assert!(matches!(
        error,
        ServerMessage::Error {
            code: ErrorCode::NotFound,
            ..
        }
    ));

    server.abort();
}

#[tokio::test]
async fn movement_echoes_to_sender_and_broadcasts_nearby() {
    let world = build_test_world();
    let (addr, server) = spawn_ws_server(world.state.clone()).await;

    // Both spawn in town at (0, 0), inside each other's area.
    let mut hero_ws = connect_as(addr, world.hero).await;
    let mut rival_ws = connect_as(addr, world.rival).await;

    ws_send_client(
        &mut hero_ws,
        &ClientMessage::Movement {
            character_id: world.hero.to_string(),
            x: 3,
            y: 4,
            direction: Some("north".into()),
        },
    )
    .await;

    let confirmed = ws_expect_message(&mut hero_ws, |m| {
        matches!(m, ServerMessage::MovementConfirmed { .. })
    })
    .await;
    assert!(matches!(
        confirmed,
        ServerMessage::MovementConfirmed { x: 3, y: 4 }
    ));

    let moved = ws_expect_message(&mut rival_ws, |m| {
        matches!(m, ServerMessage::CharacterMovement { .. })
    })
    .await;
    match moved {
        ServerMessage::CharacterMovement {
            character_id,
            position,
            ..
        } => {
            assert_eq!(character_id, world.hero.to_string());
            assert_eq!((position.x, position.y), (3, 4));
        }
        other => panic!("unexpected frame: {other:?}"),
    }

    server.abort();
}

#[tokio::test]
async fn acting_as_another_character_is_rejected() {
    let world = build_test_world();
    let (addr, server) = spawn_ws_server(world.state.clone()).await;

    let mut hero_ws = connect_as(addr, world.hero).await;

    ws_send_client(
        &mut hero_ws,
        &ClientMessage::Movement {
            character_id: world.rival.to_string(),
            x: 1,
            y: 1,
            direction: None,
        },
    )
    .await;

    let error = ws_expect_message(&mut hero_ws, |m| {
        matches!(m, ServerMessage::Error { .. })
    })
    .await;
    assert!(matches!(
        error,
        ServerMessage::Error {
            code: ErrorCode::Unauthorized,
            ..
        }
    ));

    server.abort();
}

#[tokio::test]
async fn start_battle_then_kill_the_floor_monster() {
    let world = build_test_world();
    let (addr, server) = spawn_ws_server(world.state.clone()).await;

    let mut hero_ws = connect_as(addr, world.hero).await;

    ws_send_client(
        &mut hero_ws,
        &ClientMessage::StartBattle {
            character_id: world.hero.to_string(),
            dungeon_id: world.dungeon.to_string(),
        },
    )
    .await;

    let started = ws_expect_message(&mut hero_ws, |m| {
        matches!(m, ServerMessage::BattleStarted { .. })
    })
    .await;
    match started {
        ServerMessage::BattleStarted {
            dungeon, monsters, ..
        } => {
            assert_eq!(dungeon.name, "Gnarlfang Warren");
            assert_eq!(monsters.len(), 1);
            assert_eq!(monsters[0].name, "Warren Guard");
        }
        other => panic!("unexpected frame: {other:?}"),
    }

    // A level-1 warrior swing exceeds the guard's 5 health.
    ws_send_client(
        &mut hero_ws,
        &ClientMessage::Combat {
            character_id: world.hero.to_string(),
            action: CombatAction::Attack,
            target_id: world.guard.to_string(),
            target_kind: TargetKind::Monster,
            skill_id: None,
            item_id: None,
        },
    )
    .await;

    let result = ws_expect_message(&mut hero_ws, |m| {
        matches!(m, ServerMessage::CombatResult { .. })
    })
    .await;
    assert!(matches!(
        result,
        ServerMessage::CombatResult { is_dead: true, .. }
    ));

    let death = ws_expect_message(&mut hero_ws, |m| {
        matches!(m, ServerMessage::MonsterDeath { .. })
    })
    .await;
    match death {
        ServerMessage::MonsterDeath {
            monster_id,
            killer_id,
            experience,
            loot,
            ..
        } => {
            assert_eq!(monster_id, world.guard.to_string());
            assert_eq!(killer_id, world.hero.to_string());
            assert_eq!(experience, 25);
            assert_eq!(loot.len(), 1);
        }
        other => panic!("unexpected frame: {other:?}"),
    }

    // Rewards are persisted, not just broadcast.
    let hero = world
        .characters
        .get(world.hero)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hero.experience, 25);
    assert!(hero.gold >= 1);

    server.abort();
}

#[tokio::test]
async fn skill_strike_fells_the_monster_and_spends_mana() {
    let world = build_test_world();
    let (addr, server) = spawn_ws_server(world.state.clone()).await;

    let mut hero_ws = connect_as(addr, world.hero).await;

    ws_send_client(
        &mut hero_ws,
        &ClientMessage::StartBattle {
            character_id: world.hero.to_string(),
            dungeon_id: world.dungeon.to_string(),
        },
    )
    .await;
    ws_expect_message(&mut hero_ws, |m| {
        matches!(m, ServerMessage::BattleStarted { .. })
    })
    .await;

    // Ember Lash hits for a flat 10, past the guard's 5 health.
    ws_send_client(
        &mut hero_ws,
        &ClientMessage::Combat {
            character_id: world.hero.to_string(),
            action: CombatAction::Skill,
            target_id: world.guard.to_string(),
            target_kind: TargetKind::Monster,
            skill_id: Some(world.lash.to_string()),
            item_id: None,
        },
    )
    .await;

    let used = ws_expect_message(&mut hero_ws, |m| {
        matches!(m, ServerMessage::SkillUsed { .. })
    })
    .await;
    match used {
        ServerMessage::SkillUsed {
            skill_id, effects, ..
        } => {
            assert_eq!(skill_id, world.lash.to_string());
            assert_eq!(effects.len(), 1);
            assert_eq!(effects[0].effect, "damage");
            assert_eq!(effects[0].value, 10);
        }
        other => panic!("unexpected frame: {other:?}"),
    }

    let death = ws_expect_message(&mut hero_ws, |m| {
        matches!(m, ServerMessage::MonsterDeath { .. })
    })
    .await;
    assert!(matches!(
        death,
        ServerMessage::MonsterDeath { experience: 25, .. }
    ));

    let hero = world.characters.get(world.hero).await.unwrap().unwrap();
    assert_eq!(hero.mana, 85);
    assert_eq!(hero.experience, 25);

    server.abort();
}

#[tokio::test]
async fn healing_skill_restores_the_casters_health() {
    let world = build_test_world();

    let mut wounded = world.characters.get(world.hero).await.unwrap().unwrap();
    wounded.health = 50;
    world.characters.save(&wounded).await.unwrap();

    let (addr, server) = spawn_ws_server(world.state.clone()).await;
    let mut hero_ws = connect_as(addr, world.hero).await;

    ws_send_client(
        &mut hero_ws,
        &ClientMessage::Combat {
            character_id: world.hero.to_string(),
            action: CombatAction::Skill,
            target_id: world.hero.to_string(),
            target_kind: TargetKind::Character,
            skill_id: Some(world.mend.to_string()),
            item_id: None,
        },
    )
    .await;

    ws_expect_message(&mut hero_ws, |m| {
        matches!(m, ServerMessage::SkillUsed { .. })
    })
    .await;

    let hero = world.characters.get(world.hero).await.unwrap().unwrap();
    assert_eq!(hero.health, 80);
    assert_eq!(hero.mana, 90);

    server.abort();
}

#[tokio::test]
async fn skill_use_without_mana_is_rejected() {
    let world = build_test_world();

    let mut drained = world.characters.get(world.hero).await.unwrap().unwrap();
    drained.mana = 5;
    world.characters.save(&drained).await.unwrap();

    let (addr, server) = spawn_ws_server(world.state.clone()).await;
    let mut hero_ws = connect_as(addr, world.hero).await;

    ws_send_client(
        &mut hero_ws,
        &ClientMessage::Combat {
            character_id: world.hero.to_string(),
            action: CombatAction::Skill,
            target_id: world.hero.to_string(),
            target_kind: TargetKind::Character,
            skill_id: Some(world.mend.to_string()),
            item_id: None,
        },
    )
    .await;

    let error = ws_expect_message(&mut hero_ws, |m| matches!(m, ServerMessage::Error { .. })).await;
    match error {
        ServerMessage::Error { code, message } => {
            assert_eq!(code, ErrorCode::Validation);
            assert!(message.contains("mana"));
        }
        other => panic!("unexpected frame: {other:?}"),
    }
    // Nothing was spent or healed.
    let hero = world.characters.get(world.hero).await.unwrap().unwrap();
    assert_eq!(hero.mana, 5);

    server.abort();
}

#[tokio::test]
async fn queue_join_matches_two_ranked_players() {
    let world = build_test_world();
    let (addr, server) = spawn_ws_server(world.state.clone()).await;

    let mut hero_ws = connect_as(addr, world.hero).await;
    let mut rival_ws = connect_as(addr, world.rival).await;

    ws_send_client(
        &mut hero_ws,
        &ClientMessage::QueueJoin {
            character_id: world.hero.to_string(),
            match_type: QueueMode::Ranked,
        },
    )
    .await;
    ws_expect_message(&mut hero_ws, |m| {
        matches!(m, ServerMessage::QueueJoined { position: 1 })
    })
    .await;

    ws_send_client(
        &mut rival_ws,
        &ClientMessage::QueueJoin {
            character_id: world.rival.to_string(),
            match_type: QueueMode::Ranked,
        },
    )
    .await;

    let rival_match = ws_expect_message(&mut rival_ws, |m| {
        matches!(m, ServerMessage::MatchFound { .. })
    })
    .await;
    match rival_match {
        ServerMessage::MatchFound { opponent, battle } => {
            assert_eq!(opponent.name, "Aldric");
            assert!(!battle.rounds.is_empty());
        }
        other => panic!("unexpected frame: {other:?}"),
    }

    // The waiting player is notified directly.
    let hero_match = ws_expect_message(&mut hero_ws, |m| {
        matches!(m, ServerMessage::MatchFound { .. })
    })
    .await;
    match hero_match {
        ServerMessage::MatchFound { opponent, .. } => {
            assert_eq!(opponent.name, "Mirelle");
        }
        other => panic!("unexpected frame: {other:?}"),
    }

    // Ranked resolution moved both ratings by the fixed swing.
    let hero = world.characters.get(world.hero).await.unwrap().unwrap();
    let rival = world.characters.get(world.rival).await.unwrap().unwrap();
    assert_eq!(hero.rating.max(rival.rating), 1025);
    assert_eq!(hero.rating.min(rival.rating), 975);

    server.abort();
}

#[tokio::test]
async fn unknown_frame_type_yields_structured_error() {
    let world = build_test_world();
    let (addr, server) = spawn_ws_server(world.state.clone()).await;

    let mut ws = ws_connect(addr).await;
    ws_expect_message(&mut ws, |m| {
        matches!(m, ServerMessage::ConnectionSuccess { .. })
    })
    .await;

    ws.send(WsMessage::Text(r#"{"type":"CAST_FIREBALL_XL"}"#.into()))
        .await
        .unwrap();

    let error = ws_expect_message(&mut ws, |m| matches!(m, ServerMessage::Error { .. })).await;
    assert!(matches!(
        error,
        ServerMessage::Error {
            code: ErrorCode::UnknownMessage,
            ..
        }
    ));

    server.abort();
}

#[tokio::test]
async fn disconnect_abandons_the_active_instance() {
    let world = build_test_world();
    let (addr, server) = spawn_ws_server(world.state.clone()).await;

    let mut observer = connect_as(addr, world.rival).await;
    let mut hero_ws = connect_as(addr, world.hero).await;

    ws_send_client(
        &mut hero_ws,
        &ClientMessage::StartBattle {
            character_id: world.hero.to_string(),
            dungeon_id: world.dungeon.to_string(),
        },
    )
    .await;
    ws_expect_message(&mut hero_ws, |m| {
        matches!(m, ServerMessage::BattleStarted { .. })
    })
    .await;
    let instance_id = world.state.app.registry.active_instance_of(world.hero);
    assert!(instance_id.is_some());

    drop(hero_ws);

    // Cleanup runs before the offline announcement.
    ws_expect_message(&mut observer, |m| {
        matches!(m, ServerMessage::CharacterStatus { is_online: false, .. })
    })
    .await;

    // The sole participant left with the boss alive: the run failed and the
    // character is free to re-enter.
    assert!(world
        .state
        .app
        .registry
        .active_instance_of(world.hero)
        .is_none());
    let hero = world.characters.get(world.hero).await.unwrap().unwrap();
    assert!(!hero.in_battle);
    let check = world
        .state
        .app
        .registry
        .can_enter(world.hero, world.dungeon)
        .await
        .unwrap();
    assert!(check.is_allowed());

    server.abort();
}

#[tokio::test]
async fn disconnect_announces_offline() {
    let world = build_test_world();
    let (addr, server) = spawn_ws_server(world.state.clone()).await;

    let mut observer = connect_as(addr, world.rival).await;
    let hero_ws = connect_as(addr, world.hero).await;

    // Observer sees the hero come online, then drop offline.
    ws_expect_message(&mut observer, |m| {
        matches!(
            m,
            ServerMessage::CharacterStatus { is_online: true, character_id, .. }
                if *character_id == world.hero.to_string()
        )
    })
    .await;

    drop(hero_ws);

    ws_expect_message(&mut observer, |m| {
        matches!(
            m,
            ServerMessage::CharacterStatus { is_online: false, character_id, .. }
                if *character_id == world.hero.to_string()
        )
    })
    .await;

    server.abort();
}
