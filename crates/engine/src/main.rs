//! Emberfall Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::routing::get;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod app;
mod infrastructure;
mod services;

use emberfall_domain::{
    Character, ChanceReward, ClassKind, Difficulty, DungeonDefinition, DungeonId, EffectScaling,
    Floor, GuaranteedReward, ItemId, Monster, MonsterDrop, MonsterId, MonsterKind, RewardTable,
    ScalingStat, Skill, SkillEffect, SkillEffectKind, SkillId,
};

use api::{websocket::WsState, ConnectionManager, SessionBroadcaster};
use app::App;
use infrastructure::{
    clock::SystemClock,
    memory::{MemoryCatalog, MemoryCharacterStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (Taskfile runs the engine from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "emberfall_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Emberfall Engine");

    // Load configuration
    let server_host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let server_port: u16 = std::env::var("SERVER_PORT")
        .or_else(|_| std::env::var("PORT"))
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .unwrap_or(3000);

    // Create clock and rng for the services
    let clock: Arc<dyn infrastructure::ports::ClockPort> = Arc::new(SystemClock);
    let rng = Arc::new(Mutex::new(StdRng::from_entropy()));

    // Create stores. The in-memory adapters back development runs; the
    // character database sits behind the same ports in deployment.
    let characters = Arc::new(MemoryCharacterStore::new());
    let catalog = Arc::new(MemoryCatalog::new());
    seed_demo_content(&characters, &catalog, clock.as_ref());

    // Create application
    let app = Arc::new(App::new(
        characters.clone(),
        catalog.clone(),
        clock,
        rng,
    ));

    // Create connection manager and broadcaster
    let connections = Arc::new(ConnectionManager::new());
    let broadcaster = Arc::new(SessionBroadcaster::new(
        connections.clone(),
        app.registry.clone(),
    ));

    // Create shared API state
    let ws_state = Arc::new(WsState {
        app,
        connections,
        broadcaster,
    });

    // Build router; HTTP and WebSocket share the same state so HTTP
    // handlers can broadcast to live connections.
    let mut router = api::http::routes()
        .route("/ws", get(api::websocket::ws_handler))
        .with_state(ws_state)
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = build_cors_layer_from_env() {
        router = router.layer(cors);
    }

    // Start server
    let addr: SocketAddr = format!("{server_host}:{server_port}").parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

fn build_cors_layer_from_env() -> Option<CorsLayer> {
    let allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let Some(allowed_origins) = allowed_origins else {
        return None;
    };

    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::OPTIONS,
        ])
        // The browser client sends JSON bodies which trigger CORS preflights.
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    if allowed_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        if origins.is_empty() {
            return None;
        }

        cors = cors.allow_origin(origins);
    }

    Some(cors)
}

/// Seed the in-memory stores with a playable starter set and log the ids a
/// client needs to connect.
fn seed_demo_content(
    characters: &MemoryCharacterStore,
    catalog: &MemoryCatalog,
    clock: &dyn infrastructure::ports::ClockPort,
) {
    let now = clock.now();

    let rat_hide = ItemId::new();
    let warren_key = ItemId::new();

    let cave_rat = catalog.insert_monster(Monster {
        id: MonsterId::new(),
        name: "Cave Rat".into(),
        kind: MonsterKind::Normal,
        level: 2,
        max_health: 40,
        min_damage: 3,
        max_damage: 6,
        defense: 2,
        experience_value: 25,
        min_gold: 2,
        max_gold: 8,
        drops: vec![MonsterDrop {
            item: rat_hide,
            chance: 60,
            min_quantity: 1,
            max_quantity: 2,
        }],
    });

    let gnarlfang = catalog.insert_monster(Monster {
        id: MonsterId::new(),
        name: "Gnarlfang".into(),
        kind: MonsterKind::Boss,
        level: 5,
        max_health: 180,
        min_damage: 8,
        max_damage: 14,
        defense: 5,
        experience_value: 200,
        min_gold: 30,
        max_gold: 60,
        drops: vec![MonsterDrop {
            item: warren_key,
            chance: 100,
            min_quantity: 1,
            max_quantity: 1,
        }],
    });

    let dungeon = catalog.insert_dungeon(DungeonDefinition {
        id: DungeonId::new(),
        name: "Gnarlfang Warren".into(),
        difficulty: Difficulty::Easy,
        min_level: 1,
        max_level: 10,
        max_players: 4,
        cooldown_secs: 1800,
        floors: vec![Floor::monster(cave_rat), Floor::boss(gnarlfang)],
        boss_rewards: RewardTable {
            guaranteed: vec![GuaranteedReward {
                item: warren_key,
                quantity: 1,
            }],
            chances: vec![ChanceReward {
                item: rat_hide,
                quantity: 3,
                chance: 25,
            }],
        },
    });

    let firebolt = catalog.insert_skill(Skill {
        id: SkillId::new(),
        name: "Firebolt".into(),
        mana_cost: 12,
        level_required: 1,
        effects: vec![SkillEffect {
            kind: SkillEffectKind::Damage,
            base: 8,
            scaling: Some(EffectScaling {
                stat: ScalingStat::Intelligence,
                ratio: 1.5,
            }),
        }],
    });
    let mending_light = catalog.insert_skill(Skill {
        id: SkillId::new(),
        name: "Mending Light".into(),
        mana_cost: 10,
        level_required: 1,
        effects: vec![SkillEffect {
            kind: SkillEffectKind::Heal,
            base: 25,
            scaling: Some(EffectScaling {
                stat: ScalingStat::Intelligence,
                ratio: 0.8,
            }),
        }],
    });

    let aldric = characters.insert(Character::new("Aldric", ClassKind::Warrior, now));
    let mut mage = Character::new("Mirelle", ClassKind::Mage, now);
    mage.learn_skill(firebolt);
    mage.learn_skill(mending_light);
    let mirelle = characters.insert(mage);

    tracing::info!(
        dungeon = %dungeon,
        characters = %format!("{aldric}, {mirelle}"),
        "Seeded demo content"
    );
}
