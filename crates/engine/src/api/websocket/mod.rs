//! WebSocket handling for game clients.
//!
//! One task per connection reads frames; a bounded channel plus forward
//! task writes them. All game traffic after the upgrade is JSON
//! `ClientMessage`/`ServerMessage` frames.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

mod ws_battle;
mod ws_chat;
mod ws_combat;
mod ws_movement;
mod ws_queue;
mod ws_session;

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
mod ws_tests;

pub(crate) use ws_battle::floor_monsters;

use emberfall_domain::{Character, CharacterId, ConnectionId};
use emberfall_protocol::{
    CharacterBrief, CharacterStatusDto, ClientMessage, ErrorCode, PositionDto, ServerMessage,
};

use crate::api::broadcast::SessionBroadcaster;
use crate::api::connections::ConnectionManager;
use crate::app::App;
use crate::services::SessionError;

/// Buffer size for per-connection message channel.
const CONNECTION_CHANNEL_BUFFER: usize = 256;

/// Manhattan radius for area-scoped traffic (local chat, movement).
pub(super) const AREA_RADIUS: i64 = 50;

/// Combined state for WebSocket and HTTP handlers.
pub struct WsState {
    pub app: Arc<App>,
    pub connections: Arc<ConnectionManager>,
    pub broadcaster: Arc<SessionBroadcaster>,
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Caller identity token; verification is the auth collaborator's
    /// concern, absence rejects the upgrade.
    pub token: Option<String>,
}

/// WebSocket upgrade handler - entry point for new connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<Arc<WsState>>,
) -> Response {
    let Some(token) = query.token.filter(|t| !t.is_empty()) else {
        return (StatusCode::UNAUTHORIZED, "token is required").into_response();
    };
    ws.on_upgrade(move |socket| handle_socket(socket, state, token))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<WsState>, user_id: String) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let connection_id = ConnectionId::new();

    // Bounded channel feeding the forward task.
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(CONNECTION_CHANNEL_BUFFER);

    state
        .connections
        .register(connection_id, user_id, tx.clone())
        .await;

    tracing::info!(connection_id = %connection_id, "WebSocket connection established");

    let _ = tx.try_send(ServerMessage::ConnectionSuccess {
        connection_id: connection_id.to_string(),
        message: "Connected to game server".into(),
    });

    // Forward messages from the channel to the socket.
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(text.as_str())
            {
                Ok(msg) => {
                    if let Some(response) = handle_message(msg, &state, connection_id).await {
                        if tx.try_send(response).is_err() {
                            tracing::warn!(
                                connection_id = %connection_id,
                                "Failed to send response, channel full or closed"
                            );
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(connection_id = %connection_id, error = %e, "Failed to parse message");
                    let error = ServerMessage::Error {
                        code: ErrorCode::ParseError,
                        message: format!("Invalid message format: {e}"),
                    };
                    let _ = tx.try_send(error);
                }
            },
            Ok(Message::Ping(_)) => {
                let _ = tx.try_send(ServerMessage::Pong);
            }
            Ok(Message::Close(_)) => {
                tracing::info!(connection_id = %connection_id, "WebSocket closed by client");
                break;
            }
            Err(e) => {
                tracing::error!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // Cleanup runs exactly once, with the info unregister returned.
    if let Some(info) = state.connections.unregister(connection_id).await {
        ws_session::disconnect_cleanup(&state, info).await;
    }
    send_task.abort();

    tracing::info!(connection_id = %connection_id, "WebSocket connection terminated");
}

/// Dispatch a parsed client message to the appropriate handler.
async fn handle_message(
    msg: ClientMessage,
    state: &WsState,
    connection_id: ConnectionId,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Heartbeat => Some(ServerMessage::Pong),

        ClientMessage::SelectCharacter { character_id } => {
            ws_session::handle_select_character(state, connection_id, &character_id).await
        }

        ClientMessage::Chat {
            character_id,
            channel,
            message,
            target_character_id,
        } => {
            ws_chat::handle_chat(
                state,
                connection_id,
                &character_id,
                channel,
                message,
                target_character_id.as_deref(),
            )
            .await
        }

        ClientMessage::Movement {
            character_id,
            x,
            y,
            direction,
        } => ws_movement::handle_movement(state, connection_id, &character_id, x, y, direction).await,

        ClientMessage::Combat {
            character_id,
            action,
            target_id,
            target_kind,
            skill_id,
            ..
        } => {
            ws_combat::handle_combat(
                state,
                connection_id,
                &character_id,
                action,
                &target_id,
                target_kind,
                skill_id.as_deref(),
            )
            .await
        }

        ClientMessage::StartBattle {
            character_id,
            dungeon_id,
        } => ws_battle::handle_start_battle(state, connection_id, &character_id, &dungeon_id).await,

        ClientMessage::LeaveBattle { character_id } => {
            ws_battle::handle_leave_battle(state, connection_id, &character_id).await
        }

        ClientMessage::QueueJoin {
            character_id,
            match_type,
        } => ws_queue::handle_queue_join(state, connection_id, &character_id, match_type).await,

        ClientMessage::QueueLeave { character_id } => {
            ws_queue::handle_queue_leave(state, connection_id, &character_id).await
        }

        ClientMessage::Unknown => Some(error_response(
            ErrorCode::UnknownMessage,
            "Unknown message type",
        )),
    }
}

// =============================================================================
// Shared handler helpers
// =============================================================================

pub(super) fn error_response(code: ErrorCode, message: impl Into<String>) -> ServerMessage {
    ServerMessage::Error {
        code,
        message: message.into(),
    }
}

/// Map a service error onto an `ERROR` frame.
pub(super) fn session_error_response(e: SessionError) -> ServerMessage {
    error_response(crate::api::dto::error_code(&e), e.to_string())
}

/// Parse a client-supplied id, answering with a validation error frame.
pub(super) fn parse_id(value: &str, field: &str) -> Result<Uuid, ServerMessage> {
    Uuid::parse_str(value).map_err(|_| {
        error_response(
            ErrorCode::Validation,
            format!("{field} is not a valid id: {value}"),
        )
    })
}

/// Resolve the connection's bound character and check it against the id the
/// frame claims to act as.
pub(super) async fn bound_character(
    state: &WsState,
    connection_id: ConnectionId,
    claimed: &str,
) -> Result<CharacterId, ServerMessage> {
    let claimed = CharacterId::from_uuid(parse_id(claimed, "character_id")?);
    let info = state
        .connections
        .get(connection_id)
        .await
        .ok_or_else(|| error_response(ErrorCode::Unauthorized, "Connection not registered"))?;
    match info.character_id {
        Some(bound) if bound == claimed => Ok(claimed),
        Some(_) => Err(error_response(
            ErrorCode::Unauthorized,
            "Cannot act as another character",
        )),
        None => Err(error_response(
            ErrorCode::Unauthorized,
            "No character selected",
        )),
    }
}

/// Load a character, mapping store misses onto error frames.
pub(super) async fn load_character(
    state: &WsState,
    character_id: CharacterId,
) -> Result<Character, ServerMessage> {
    match state.app.characters.get(character_id).await {
        Ok(Some(character)) => Ok(character),
        Ok(None) => Err(error_response(ErrorCode::NotFound, "Character not found")),
        Err(e) => Err(session_error_response(e.into())),
    }
}

pub(super) fn brief(character: &Character) -> CharacterBrief {
    CharacterBrief {
        id: character.id.to_string(),
        name: character.name.clone(),
        level: character.level,
        class: class_name(character),
    }
}

pub(super) fn status_dto(character: &Character) -> CharacterStatusDto {
    CharacterStatusDto {
        id: character.id.to_string(),
        name: character.name.clone(),
        class: class_name(character),
        level: character.level,
        health: character.health,
        max_health: character.max_health,
        position: PositionDto {
            map: character.position.map.clone(),
            x: character.position.x,
            y: character.position.y,
            direction: None,
        },
    }
}

fn class_name(character: &Character) -> String {
    crate::api::dto::lowercase_name(&character.class)
}
