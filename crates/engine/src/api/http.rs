//! HTTP routes.
//!
//! Every response uses the `{"success": bool, ...}` envelope the browser
//! client expects; service errors map onto status codes by category.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use emberfall_domain::{CharacterId, DungeonId, InstanceId, LeaveOutcome, MonsterId};
use emberfall_protocol::ServerMessage;

use crate::api::broadcast::Scope;
use crate::api::dto::{dungeon_summary, error_code, loot_dtos, snapshot_summary};
use crate::api::websocket::WsState;
use crate::services::instance_registry::ProgressAction;
use crate::services::SessionError;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<WsState>> {
    Router::new()
        .route("/health", get(health))
        .route("/api/dungeons", get(list_dungeons))
        .route(
            "/api/dungeons/{id}/can-enter/{character_id}",
            get(can_enter),
        )
        .route("/api/dungeons/{id}/enter", post(enter_dungeon))
        .route("/api/dungeons/{id}/leave", post(leave_dungeon))
        .route("/api/dungeons/{id}/advance", post(advance_floor))
        .route("/api/dungeons/{id}/progress", put(record_progress))
        .route("/api/dungeons/{id}/complete", post(complete_dungeon))
        .route("/api/dungeons/{id}/instances", get(list_instances))
}

async fn health() -> &'static str {
    "OK"
}

async fn list_dungeons(State(state): State<Arc<WsState>>) -> Result<Json<Value>, ApiError> {
    let dungeons = state
        .app
        .catalog
        .list_dungeons()
        .await
        .map_err(SessionError::from)?;
    let summaries: Vec<_> = dungeons.iter().map(dungeon_summary).collect();
    Ok(ok(summaries))
}

async fn can_enter(
    State(state): State<Arc<WsState>>,
    Path((id, character_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, ApiError> {
    let check = state
        .app
        .registry
        .can_enter(
            CharacterId::from_uuid(character_id),
            DungeonId::from_uuid(id),
        )
        .await?;
    Ok(ok(check))
}

#[derive(Debug, Deserialize)]
struct EnterBody {
    character_id: Uuid,
}

async fn enter_dungeon(
    State(state): State<Arc<WsState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<EnterBody>,
) -> Result<Json<Value>, ApiError> {
    let character_id = CharacterId::from_uuid(body.character_id);
    let entered = state
        .app
        .registry
        .enter(DungeonId::from_uuid(id), character_id)
        .await?;

    if !entered.founded {
        if let Ok(Some(character)) = state.app.characters.get(character_id).await {
            state
                .broadcaster
                .publish_except(
                    ServerMessage::PlayerJoinedBattle {
                        character_id: character_id.to_string(),
                        character_name: character.name,
                    },
                    Scope::Instance(entered.instance_id),
                    Some(character_id),
                )
                .await;
        }
    }

    Ok(ok(json!({
        "instance_id": entered.instance_id.to_string(),
        "floor": entered.floor,
        "founded": entered.founded,
        "participants": entered.participants.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
    })))
}

#[derive(Debug, Deserialize)]
struct InstanceBody {
    character_id: Uuid,
    instance_id: Uuid,
}

async fn leave_dungeon(
    State(state): State<Arc<WsState>>,
    Path(_id): Path<Uuid>,
    Json(body): Json<InstanceBody>,
) -> Result<Json<Value>, ApiError> {
    let character_id = CharacterId::from_uuid(body.character_id);
    let instance_id = InstanceId::from_uuid(body.instance_id);
    let left = state.app.registry.leave(instance_id, character_id).await?;

    match left.outcome {
        LeaveOutcome::Left { remaining } => {
            state
                .broadcaster
                .publish(
                    ServerMessage::PlayerLeftBattle {
                        character_id: character_id.to_string(),
                        remaining,
                    },
                    Scope::Instance(instance_id),
                )
                .await;
            Ok(ok(json!({"outcome": "left", "remaining": remaining})))
        }
        LeaveOutcome::InstanceCompleted => Ok(ok(json!({"outcome": "completed"}))),
        LeaveOutcome::InstanceFailed => Ok(ok(json!({"outcome": "failed"}))),
    }
}

async fn advance_floor(
    State(state): State<Arc<WsState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<InstanceBody>,
) -> Result<Json<Value>, ApiError> {
    let instance_id = InstanceId::from_uuid(body.instance_id);
    let floor = state
        .app
        .registry
        .advance_floor(instance_id, CharacterId::from_uuid(body.character_id))
        .await?;

    let monsters = match state
        .app
        .catalog
        .dungeon(DungeonId::from_uuid(id))
        .await
        .map_err(SessionError::from)?
    {
        Some(definition) => {
            crate::api::websocket::floor_monsters(&state, &definition, floor).await
        }
        None => Vec::new(),
    };
    state
        .broadcaster
        .publish(
            ServerMessage::FloorAdvanced {
                instance_id: instance_id.to_string(),
                floor,
                monsters,
            },
            Scope::Instance(instance_id),
        )
        .await;

    Ok(ok(json!({"floor": floor})))
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ProgressKind {
    MonsterKilled,
    BossDefeated,
    TreasureLooted,
}

#[derive(Debug, Deserialize)]
struct ProgressBody {
    instance_id: Uuid,
    action: ProgressKind,
    #[serde(default)]
    monster_id: Option<Uuid>,
    #[serde(default)]
    floor: Option<u32>,
}

async fn record_progress(
    State(state): State<Arc<WsState>>,
    Path(_id): Path<Uuid>,
    Json(body): Json<ProgressBody>,
) -> Result<Json<Value>, ApiError> {
    let action = match body.action {
        ProgressKind::MonsterKilled => {
            let monster = body.monster_id.ok_or_else(|| {
                SessionError::Validation("monster_id is required for monster_killed".into())
            })?;
            ProgressAction::MonsterKilled {
                monster: MonsterId::from_uuid(monster),
            }
        }
        ProgressKind::BossDefeated => ProgressAction::BossDefeated,
        ProgressKind::TreasureLooted => ProgressAction::TreasureLooted { floor: body.floor },
    };
    let snapshot = state
        .app
        .registry
        .record_progress(InstanceId::from_uuid(body.instance_id), action)
        .await?;
    Ok(ok(json!({
        "floor": snapshot.floor,
        "boss_defeated": snapshot.boss_defeated,
    })))
}

async fn complete_dungeon(
    State(state): State<Arc<WsState>>,
    Path(_id): Path<Uuid>,
    Json(body): Json<InstanceBody>,
) -> Result<Json<Value>, ApiError> {
    let instance_id = InstanceId::from_uuid(body.instance_id);
    let participants = state.app.registry.participants(instance_id).await?;
    let rewards = state
        .app
        .registry
        .complete(instance_id, CharacterId::from_uuid(body.character_id))
        .await?;

    let frame = ServerMessage::InstanceCompleted {
        instance_id: instance_id.to_string(),
        rewards: loot_dtos(&rewards),
    };
    for participant in participants {
        state
            .broadcaster
            .publish(frame.clone(), Scope::Direct(participant))
            .await;
    }

    Ok(ok(json!({"rewards": loot_dtos(&rewards)})))
}

async fn list_instances(
    State(state): State<Arc<WsState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let snapshots = state
        .app
        .registry
        .list_instances(DungeonId::from_uuid(id))
        .await;
    let summaries: Vec<_> = snapshots.iter().map(snapshot_summary).collect();
    Ok(ok(summaries))
}

fn ok<T: serde::Serialize>(data: T) -> Json<Value> {
    Json(json!({"success": true, "data": data}))
}

/// Service error carrier implementing the envelope + status mapping.
struct ApiError(SessionError);

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SessionError::Validation(_) => StatusCode::BAD_REQUEST,
            SessionError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            SessionError::NotFound { .. } => StatusCode::NOT_FOUND,
            SessionError::Conflict(_) => StatusCode::CONFLICT,
            SessionError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = Json(json!({
            "success": false,
            "error": {
                "code": error_code(&self.0),
                "message": self.0.to_string(),
            }
        }));
        (status, body).into_response()
    }
}
