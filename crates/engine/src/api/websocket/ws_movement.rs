//! Movement reports and area fan-out.

use super::*;
use crate::api::broadcast::Scope;

pub(super) async fn handle_movement(
    state: &WsState,
    connection_id: ConnectionId,
    character_id: &str,
    x: i32,
    y: i32,
    direction: Option<String>,
) -> Option<ServerMessage> {
    let character_id = match bound_character(state, connection_id, character_id).await {
        Ok(id) => id,
        Err(e) => return Some(e),
    };
    let mut character = match load_character(state, character_id).await {
        Ok(c) => c,
        Err(e) => return Some(e),
    };

    character.position.x = x;
    character.position.y = y;
    character.last_active = state.app.clock.now();
    if let Err(e) = state.app.characters.save(&character).await {
        return Some(session_error_response(e.into()));
    }
    state
        .connections
        .update_position(connection_id, character.position.clone())
        .await;

    // Observers near the new position see the move; the mover gets a
    // confirmation instead.
    state
        .broadcaster
        .publish_except(
            ServerMessage::CharacterMovement {
                character_id: character_id.to_string(),
                position: PositionDto {
                    map: character.position.map.clone(),
                    x,
                    y,
                    direction,
                },
                character_info: brief(&character),
            },
            Scope::Area {
                origin: character.position.clone(),
                radius: AREA_RADIUS,
            },
            Some(character_id),
        )
        .await;

    Some(ServerMessage::MovementConfirmed { x, y })
}
