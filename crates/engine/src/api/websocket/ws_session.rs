//! Connection session lifecycle: character selection and disconnect cleanup.

use super::*;
use crate::api::broadcast::Scope;
use crate::api::connections::ConnectionInfo;
use emberfall_domain::StateConflict;

pub(super) async fn handle_select_character(
    state: &WsState,
    connection_id: ConnectionId,
    character_id: &str,
) -> Option<ServerMessage> {
    let character_id = match parse_id(character_id, "character_id") {
        Ok(id) => CharacterId::from_uuid(id),
        Err(e) => return Some(e),
    };
    let character = match load_character(state, character_id).await {
        Ok(c) => c,
        Err(e) => return Some(e),
    };

    state
        .connections
        .bind_character(connection_id, character_id, character.position.clone())
        .await;

    // Everyone, the selector included, sees the character come online.
    state
        .broadcaster
        .publish(
            ServerMessage::CharacterStatus {
                character_id: character_id.to_string(),
                is_online: true,
                character: Some(status_dto(&character)),
            },
            Scope::Global,
        )
        .await;
    None
}

/// Runs exactly once per connection, after `unregister` returned its final
/// info: abandon the active instance, drop any queue ticket, announce
/// offline.
pub(super) async fn disconnect_cleanup(state: &WsState, info: ConnectionInfo) {
    let Some(character_id) = info.character_id else {
        return;
    };

    if let Some(instance_id) = state.app.registry.active_instance_of(character_id) {
        match state.app.registry.leave(instance_id, character_id).await {
            Ok(result) => {
                let remaining = match result.outcome {
                    emberfall_domain::LeaveOutcome::Left { remaining } => remaining,
                    _ => 0,
                };
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
            }
            Err(e) => {
                tracing::warn!(
                    character_id = %character_id,
                    instance_id = %instance_id,
                    error = %e,
                    "Disconnect cleanup failed to leave instance"
                );
            }
        }
    }

    match state.app.matchmaking.dequeue(character_id).await {
        Ok(()) | Err(SessionError::Conflict(StateConflict::NotQueued)) => {}
        Err(e) => {
            tracing::warn!(
                character_id = %character_id,
                error = %e,
                "Disconnect cleanup failed to dequeue"
            );
        }
    }

    state
        .broadcaster
        .publish(
            ServerMessage::CharacterStatus {
                character_id: character_id.to_string(),
                is_online: false,
                character: None,
            },
            Scope::Global,
        )
        .await;
}
