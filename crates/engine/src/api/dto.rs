//! Conversions between domain values and wire DTOs shared by the HTTP and
//! WebSocket surfaces.

use emberfall_domain::{DungeonDefinition, InstanceState, LootGrant, SkillEffectKind, SkillOutcome};
use emberfall_protocol::{DungeonSummary, ErrorCode, InstanceSummary, LootDto, SkillEffectDto};

use crate::services::instance_registry::InstanceSnapshot;
use crate::services::SessionError;
use emberfall_domain::StateConflict;

pub(crate) fn error_code(e: &SessionError) -> ErrorCode {
    match e {
        SessionError::Validation(_) => ErrorCode::Validation,
        SessionError::Unauthorized(_) => ErrorCode::Unauthorized,
        SessionError::NotFound { .. } => ErrorCode::NotFound,
        SessionError::Conflict(StateConflict::NotQueued) => ErrorCode::NotQueued,
        SessionError::Conflict(_) => ErrorCode::Conflict,
        SessionError::Transient(_) => ErrorCode::Transient,
    }
}

pub(crate) fn dungeon_summary(definition: &DungeonDefinition) -> DungeonSummary {
    DungeonSummary {
        id: definition.id.to_string(),
        name: definition.name.clone(),
        difficulty: lowercase_name(&definition.difficulty),
        min_level: definition.min_level,
        max_level: definition.max_level,
        max_players: definition.max_players,
        total_floors: definition.total_floors(),
    }
}

pub(crate) fn snapshot_summary(snapshot: &InstanceSnapshot) -> InstanceSummary {
    InstanceSummary {
        id: snapshot.id.to_string(),
        dungeon_id: snapshot.dungeon_id.to_string(),
        state: match snapshot.state {
            InstanceState::Active => "active",
            InstanceState::Completed => "completed",
            InstanceState::Failed => "failed",
        }
        .into(),
        floor: snapshot.floor,
        participants: snapshot.participants.iter().map(|p| p.to_string()).collect(),
    }
}

pub(crate) fn loot_dtos(grants: &[LootGrant]) -> Vec<LootDto> {
    grants
        .iter()
        .map(|g| LootDto {
            id: g.item.to_string(),
            quantity: g.quantity,
        })
        .collect()
}

pub(crate) fn skill_effect_dtos(outcomes: &[SkillOutcome]) -> Vec<SkillEffectDto> {
    outcomes
        .iter()
        .map(|o| SkillEffectDto {
            effect: match o.kind {
                SkillEffectKind::Damage => "damage",
                SkillEffectKind::Heal => "heal",
            }
            .into(),
            value: o.value,
        })
        .collect()
}

/// A serde-derived enum's lowercase wire name.
pub(crate) fn lowercase_name<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_owned))
        .unwrap_or_default()
}
