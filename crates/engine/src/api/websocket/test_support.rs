use super::*;

use std::net::SocketAddr;
use std::time::Duration;

use axum::routing::get;
use chrono::{TimeZone, Utc};
use futures_util::{SinkExt, StreamExt};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::net::TcpListener;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

use emberfall_domain::{
    Character, CharacterId, ClassKind, Difficulty, DungeonDefinition, DungeonId, Floor,
    GuaranteedReward, ItemId, Monster, MonsterDrop, MonsterId, MonsterKind, RewardTable, Skill,
    SkillEffect, SkillEffectKind, SkillId,
};

use crate::api::{ConnectionManager, SessionBroadcaster};
use crate::app::App;
use crate::infrastructure::clock::FixedClock;
use crate::infrastructure::memory::{MemoryCatalog, MemoryCharacterStore};
use crate::infrastructure::ports::ClockPort;

pub(crate) type WsClient = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

pub(crate) const RECV_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) struct TestWorld {
    pub(crate) state: Arc<WsState>,
    pub(crate) characters: Arc<MemoryCharacterStore>,
    pub(crate) dungeon: DungeonId,
    pub(crate) guard: MonsterId,
    pub(crate) hero: CharacterId,
    pub(crate) rival: CharacterId,
    pub(crate) lash: SkillId,
    pub(crate) mend: SkillId,
}

/// In-memory world: a two-floor dungeon (a weak guard and a boss) plus two
/// level-1 characters. The hero knows a flat-damage skill and a heal.
pub(crate) fn build_test_world() -> TestWorld {
    let clock: Arc<dyn ClockPort> = Arc::new(FixedClock(
        Utc.timestamp_opt(1_700_000_000, 0).single().unwrap(),
    ));
    let now = clock.now();

    let catalog = Arc::new(MemoryCatalog::new());
    let lash = catalog.insert_skill(Skill {
        id: SkillId::new(),
        name: "Ember Lash".into(),
        mana_cost: 15,
        level_required: 1,
        effects: vec![SkillEffect {
            kind: SkillEffectKind::Damage,
            base: 10,
            scaling: None,
        }],
    });
    let mend = catalog.insert_skill(Skill {
        id: SkillId::new(),
        name: "Mend".into(),
        mana_cost: 10,
        level_required: 1,
        effects: vec![SkillEffect {
            kind: SkillEffectKind::Heal,
            base: 30,
            scaling: None,
        }],
    });

    let characters = Arc::new(MemoryCharacterStore::new());
    let mut aldric = Character::new("Aldric", ClassKind::Warrior, now);
    aldric.learn_skill(lash);
    aldric.learn_skill(mend);
    let hero = characters.insert(aldric);
    let rival = characters.insert(Character::new("Mirelle", ClassKind::Mage, now));

    let hide = ItemId::new();
    // One warrior swing kills the guard.
    let guard = catalog.insert_monster(Monster {
        id: MonsterId::new(),
        name: "Warren Guard".into(),
        kind: MonsterKind::Normal,
        level: 1,
        max_health: 5,
        min_damage: 1,
        max_damage: 2,
        defense: 0,
        experience_value: 25,
        min_gold: 1,
        max_gold: 3,
        drops: vec![MonsterDrop {
            item: hide,
            chance: 100,
            min_quantity: 1,
            max_quantity: 1,
        }],
    });
    let boss = catalog.insert_monster(Monster {
        id: MonsterId::new(),
        name: "Gnarlfang".into(),
        kind: MonsterKind::Boss,
        level: 5,
        max_health: 500,
        min_damage: 5,
        max_damage: 10,
        defense: 3,
        experience_value: 200,
        min_gold: 20,
        max_gold: 40,
        drops: Vec::new(),
    });
    let dungeon = catalog.insert_dungeon(DungeonDefinition {
        id: DungeonId::new(),
        name: "Gnarlfang Warren".into(),
        difficulty: Difficulty::Easy,
        min_level: 1,
        max_level: 10,
        max_players: 4,
        cooldown_secs: 1800,
        floors: vec![Floor::monster(guard), Floor::boss(boss)],
        boss_rewards: RewardTable {
            guaranteed: vec![GuaranteedReward {
                item: hide,
                quantity: 2,
            }],
            chances: Vec::new(),
        },
    });

    let app = Arc::new(App::new(
        characters.clone(),
        catalog,
        clock,
        Arc::new(tokio::sync::Mutex::new(StdRng::seed_from_u64(7))),
    ));
    let connections = Arc::new(ConnectionManager::new());
    let broadcaster = Arc::new(SessionBroadcaster::new(
        connections.clone(),
        app.registry.clone(),
    ));
    let state = Arc::new(WsState {
        app,
        connections,
        broadcaster,
    });

    TestWorld {
        state,
        characters,
        dungeon,
        guard,
        hero,
        rival,
        lash,
        mend,
    }
}

pub(crate) async fn spawn_ws_server(
    state: Arc<WsState>,
) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let router = axum::Router::new().route("/ws", get(ws_handler).with_state(state));

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (addr, handle)
}

pub(crate) async fn ws_connect(addr: SocketAddr) -> WsClient {
    let url = format!("ws://{addr}/ws?token=tester");
    let (ws, _resp) = connect_async(url).await.unwrap();
    ws
}

pub(crate) async fn ws_send_client(ws: &mut WsClient, msg: &ClientMessage) {
    let json = serde_json::to_string(msg).unwrap();
    ws.send(WsMessage::Text(json.into())).await.unwrap();
}

pub(crate) async fn ws_recv_server(ws: &mut WsClient) -> ServerMessage {
    loop {
        let msg = ws.next().await.unwrap().unwrap();
        if let WsMessage::Text(text) = msg {
            return serde_json::from_str::<ServerMessage>(&text).unwrap();
        }
    }
}

/// Receive frames until one matches, panicking on timeout. Lets tests skip
/// unrelated broadcasts that interleave on shared connections.
pub(crate) async fn ws_expect_message<F>(ws: &mut WsClient, mut predicate: F) -> ServerMessage
where
    F: FnMut(&ServerMessage) -> bool,
{
    tokio::time::timeout(RECV_TIMEOUT, async {
        loop {
            let msg = ws_recv_server(ws).await;
            if predicate(&msg) {
                return msg;
            }
        }
    })
    .await
    .unwrap()
}

/// Connect and bind a character, consuming the handshake frames.
pub(crate) async fn connect_as(addr: SocketAddr, character_id: CharacterId) -> WsClient {
    let mut ws = ws_connect(addr).await;
    ws_expect_message(&mut ws, |m| {
        matches!(m, ServerMessage::ConnectionSuccess { .. })
    })
    .await;
    ws_send_client(
        &mut ws,
        &ClientMessage::SelectCharacter {
            character_id: character_id.to_string(),
        },
    )
    .await;
    ws_expect_message(&mut ws, |m| {
        matches!(
            m,
            ServerMessage::CharacterStatus { character_id: id, is_online: true, .. }
                if *id == character_id.to_string()
        )
    })
    .await;
    ws
}
