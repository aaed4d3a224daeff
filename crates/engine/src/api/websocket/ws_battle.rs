//! Dungeon instance entry and exit over the socket.

use super::*;
use crate::api::broadcast::Scope;
use crate::api::dto::{dungeon_summary, lowercase_name};
use crate::services::instance_registry::EnterResult;
use emberfall_domain::{DungeonDefinition, DungeonId, LeaveOutcome};
use emberfall_protocol::{InstanceSummary, MonsterInfo};

pub(super) async fn handle_start_battle(
    state: &WsState,
    connection_id: ConnectionId,
    character_id: &str,
    dungeon_id: &str,
) -> Option<ServerMessage> {
    let character_id = match bound_character(state, connection_id, character_id).await {
        Ok(id) => id,
        Err(e) => return Some(e),
    };
    let dungeon_id = match parse_id(dungeon_id, "dungeon_id") {
        Ok(id) => DungeonId::from_uuid(id),
        Err(e) => return Some(e),
    };

    let entered = match state.app.registry.enter(dungeon_id, character_id).await {
        Ok(entered) => entered,
        Err(e) => return Some(session_error_response(e)),
    };

    if !entered.founded {
        let character = match load_character(state, character_id).await {
            Ok(c) => c,
            Err(e) => return Some(e),
        };
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

    let monsters = floor_monsters(state, &entered.definition, entered.floor).await;
    Some(ServerMessage::BattleStarted {
        dungeon: dungeon_summary(&entered.definition),
        instance: instance_summary(&entered),
        monsters,
    })
}

pub(super) async fn handle_leave_battle(
    state: &WsState,
    connection_id: ConnectionId,
    character_id: &str,
) -> Option<ServerMessage> {
    let character_id = match bound_character(state, connection_id, character_id).await {
        Ok(id) => id,
        Err(e) => return Some(e),
    };
    let Some(instance_id) = state.app.registry.active_instance_of(character_id) else {
        return Some(error_response(ErrorCode::NotFound, "No active battle found"));
    };

    let left = match state.app.registry.leave(instance_id, character_id).await {
        Ok(left) => left,
        Err(e) => return Some(session_error_response(e)),
    };

    if let LeaveOutcome::Left { remaining } = left.outcome {
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

    Some(ServerMessage::BattleLeft {
        instance_id: instance_id.to_string(),
    })
}

fn instance_summary(entered: &EnterResult) -> InstanceSummary {
    InstanceSummary {
        id: entered.instance_id.to_string(),
        dungeon_id: entered.definition.id.to_string(),
        state: "active".into(),
        floor: entered.floor,
        participants: entered
            .participants
            .iter()
            .map(|p| p.to_string())
            .collect(),
    }
}

/// Catalog snapshots for the monsters of a floor, at full health.
pub(crate) async fn floor_monsters(
    state: &WsState,
    definition: &DungeonDefinition,
    floor: u32,
) -> Vec<MonsterInfo> {
    let Some(monster_id) = definition.floor(floor).and_then(|f| f.monster) else {
        return Vec::new();
    };
    match state.app.catalog.monster(monster_id).await {
        Ok(Some(monster)) => vec![MonsterInfo {
            id: monster.id.to_string(),
            name: monster.name.clone(),
            kind: lowercase_name(&monster.kind),
            level: monster.level,
            health: monster.max_health,
            max_health: monster.max_health,
        }],
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::warn!(monster_id = %monster_id, error = %e, "Catalog lookup failed");
            Vec::new()
        }
    }
}
