//! Chat delivery: global, local area, and whispers.

use super::*;
use crate::api::broadcast::Scope;
use emberfall_protocol::ChatChannel;

pub(super) async fn handle_chat(
    state: &WsState,
    connection_id: ConnectionId,
    character_id: &str,
    channel: ChatChannel,
    message: String,
    target_character_id: Option<&str>,
) -> Option<ServerMessage> {
    let character_id = match bound_character(state, connection_id, character_id).await {
        Ok(id) => id,
        Err(e) => return Some(e),
    };
    if message.trim().is_empty() {
        return Some(error_response(ErrorCode::Validation, "Message is empty"));
    }
    let character = match load_character(state, character_id).await {
        Ok(c) => c,
        Err(e) => return Some(e),
    };

    let frame = ServerMessage::ChatMessage {
        channel,
        sender: brief(&character),
        message,
        timestamp: state.app.clock.now(),
    };

    match channel {
        ChatChannel::Global => {
            state.broadcaster.publish(frame, Scope::Global).await;
            None
        }
        ChatChannel::Local => {
            // The sender's own connection is inside the radius and gets the
            // echo through the same area delivery.
            state
                .broadcaster
                .publish(
                    frame,
                    Scope::Area {
                        origin: character.position.clone(),
                        radius: AREA_RADIUS,
                    },
                )
                .await;
            None
        }
        ChatChannel::Whisper => {
            let Some(target) = target_character_id else {
                return Some(error_response(
                    ErrorCode::Validation,
                    "Whisper requires target_character_id",
                ));
            };
            let target = match parse_id(target, "target_character_id") {
                Ok(id) => CharacterId::from_uuid(id),
                Err(e) => return Some(e),
            };
            if state.connections.connection_of(target).is_none() {
                return Some(error_response(
                    ErrorCode::NotFound,
                    "Character not found or offline",
                ));
            }
            state
                .broadcaster
                .publish(frame.clone(), Scope::Direct(target))
                .await;
            // Sender echo.
            state
                .broadcaster
                .publish(frame, Scope::Direct(character_id))
                .await;
            None
        }
    }
}
