//! Combat actions against dungeon monsters, and skill use.

use super::*;
use crate::api::broadcast::Scope;
use crate::services::instance_registry::KillRewards;
use emberfall_domain::{MonsterId, SkillEffectKind, SkillId};
use emberfall_protocol::{CombatAction, TargetKind};

pub(super) async fn handle_combat(
    state: &WsState,
    connection_id: ConnectionId,
    character_id: &str,
    action: CombatAction,
    target_id: &str,
    target_kind: TargetKind,
    skill_id: Option<&str>,
) -> Option<ServerMessage> {
    let character_id = match bound_character(state, connection_id, character_id).await {
        Ok(id) => id,
        Err(e) => return Some(e),
    };

    match action {
        CombatAction::Skill => {
            return handle_skill(state, character_id, target_id, target_kind, skill_id).await;
        }
        CombatAction::Item => {
            return Some(error_response(
                ErrorCode::NotSupported,
                "Item use is not supported yet",
            ));
        }
        CombatAction::Attack => {}
    }

    if target_kind != TargetKind::Monster {
        return Some(error_response(
            ErrorCode::NotSupported,
            "Duels are resolved through the PvP queue",
        ));
    }

    let Some(instance_id) = state.app.registry.active_instance_of(character_id) else {
        return Some(error_response(
            ErrorCode::Validation,
            "No active dungeon instance",
        ));
    };
    let monster_id = match parse_id(target_id, "target_id") {
        Ok(id) => MonsterId::from_uuid(id),
        Err(e) => return Some(e),
    };

    let character = match load_character(state, character_id).await {
        Ok(c) => c,
        Err(e) => return Some(e),
    };
    let monster = match state.app.catalog.monster(monster_id).await {
        Ok(Some(m)) => m,
        Ok(None) => return Some(error_response(ErrorCode::NotFound, "Target not found")),
        Err(e) => return Some(session_error_response(e.into())),
    };

    let damage = (character.base_damage() + character.weapon_damage - monster.defense).max(1);

    let outcome = match state
        .app
        .registry
        .strike_monster(instance_id, character_id, monster_id, damage)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => return Some(session_error_response(e)),
    };

    state
        .broadcaster
        .publish(
            ServerMessage::CombatResult {
                attacker_id: character_id.to_string(),
                target_id: monster_id.to_string(),
                damage,
                target_health: outcome.remaining_health,
                is_dead: outcome.remaining_health <= 0,
            },
            Scope::Instance(instance_id),
        )
        .await;

    if let Some(rewards) = outcome.rewards {
        state
            .broadcaster
            .publish(
                monster_death_frame(monster_id, character_id, &rewards),
                Scope::Instance(instance_id),
            )
            .await;
    }

    // Participants, the attacker included, already received the result via
    // the instance broadcast.
    None
}

/// Resolve a `SKILL` combat action: mana check, effect computation, damage
/// against an engaged monster or healing on a party member, then a
/// `SKILL_USED` broadcast with the applied effect lines.
async fn handle_skill(
    state: &WsState,
    caster_id: CharacterId,
    target_id: &str,
    target_kind: TargetKind,
    skill_id: Option<&str>,
) -> Option<ServerMessage> {
    let Some(raw_skill_id) = skill_id else {
        return Some(error_response(ErrorCode::Validation, "skill_id is required"));
    };
    let skill_id = match parse_id(raw_skill_id, "skill_id") {
        Ok(id) => SkillId::from_uuid(id),
        Err(e) => return Some(e),
    };

    let mut caster = match load_character(state, caster_id).await {
        Ok(c) => c,
        Err(e) => return Some(e),
    };
    let Some(skill_level) = caster.skill_level(skill_id) else {
        return Some(error_response(ErrorCode::NotFound, "Skill not known"));
    };
    let skill = match state.app.catalog.skill(skill_id).await {
        Ok(Some(s)) => s,
        Ok(None) => return Some(error_response(ErrorCode::NotFound, "Skill not found")),
        Err(e) => return Some(session_error_response(e.into())),
    };

    let outcomes = skill.effects_for(&caster.stats, skill_level);
    let damage: i32 = outcomes
        .iter()
        .filter(|o| o.kind == SkillEffectKind::Damage)
        .map(|o| o.value)
        .sum();
    let heal: i32 = outcomes
        .iter()
        .filter(|o| o.kind == SkillEffectKind::Heal)
        .map(|o| o.value)
        .sum();

    if !caster.spend_mana(skill.mana_cost) {
        return Some(error_response(ErrorCode::Validation, "Not enough mana"));
    }

    let frame = ServerMessage::SkillUsed {
        character_id: caster_id.to_string(),
        target_id: target_id.to_string(),
        skill_id: skill_id.to_string(),
        effects: crate::api::dto::skill_effect_dtos(&outcomes),
    };

    match target_kind {
        TargetKind::Monster => {
            if damage <= 0 {
                return Some(error_response(
                    ErrorCode::Validation,
                    "Skill has no effect on monsters",
                ));
            }
            let Some(instance_id) = state.app.registry.active_instance_of(caster_id) else {
                return Some(error_response(
                    ErrorCode::Validation,
                    "No active dungeon instance",
                ));
            };
            let monster_id = match parse_id(target_id, "target_id") {
                Ok(id) => MonsterId::from_uuid(id),
                Err(e) => return Some(e),
            };

            // The strike reloads the attacker for rewards; the mana spend
            // has to reach the store first.
            if let Err(e) = state.app.characters.save(&caster).await {
                return Some(session_error_response(e.into()));
            }
            let outcome = match state
                .app
                .registry
                .strike_monster(instance_id, caster_id, monster_id, damage)
                .await
            {
                Ok(o) => o,
                Err(e) => return Some(session_error_response(e)),
            };

            state
                .broadcaster
                .publish(frame, Scope::Instance(instance_id))
                .await;
            if let Some(rewards) = outcome.rewards {
                state
                    .broadcaster
                    .publish(
                        monster_death_frame(monster_id, caster_id, &rewards),
                        Scope::Instance(instance_id),
                    )
                    .await;
            }
            None
        }
        TargetKind::Character => {
            if heal <= 0 {
                return Some(error_response(
                    ErrorCode::NotSupported,
                    "Duels are resolved through the PvP queue",
                ));
            }
            let target = match parse_id(target_id, "target_id") {
                Ok(id) => CharacterId::from_uuid(id),
                Err(e) => return Some(e),
            };

            if target == caster_id {
                caster.heal(heal);
                if let Err(e) = state.app.characters.save(&caster).await {
                    return Some(session_error_response(e.into()));
                }
            } else {
                let Some(instance_id) = state.app.registry.active_instance_of(caster_id) else {
                    return Some(error_response(
                        ErrorCode::Validation,
                        "Can only heal party members inside a dungeon",
                    ));
                };
                let participants = match state.app.registry.participants(instance_id).await {
                    Ok(p) => p,
                    Err(e) => return Some(session_error_response(e)),
                };
                if !participants.contains(&target) {
                    return Some(error_response(
                        ErrorCode::Unauthorized,
                        "Target is not in your party",
                    ));
                }
                if let Err(e) = state.app.characters.save(&caster).await {
                    return Some(session_error_response(e.into()));
                }
                let mut ally = match load_character(state, target).await {
                    Ok(c) => c,
                    Err(e) => return Some(e),
                };
                ally.heal(heal);
                if let Err(e) = state.app.characters.save(&ally).await {
                    return Some(session_error_response(e.into()));
                }
            }

            match state.app.registry.active_instance_of(caster_id) {
                Some(instance_id) => {
                    state
                        .broadcaster
                        .publish(frame, Scope::Instance(instance_id))
                        .await;
                }
                None => {
                    state
                        .broadcaster
                        .publish(frame, Scope::Direct(caster_id))
                        .await;
                }
            }
            None
        }
    }
}

fn monster_death_frame(
    monster_id: MonsterId,
    killer: CharacterId,
    rewards: &KillRewards,
) -> ServerMessage {
    ServerMessage::MonsterDeath {
        monster_id: monster_id.to_string(),
        killer_id: killer.to_string(),
        experience: rewards.experience,
        gold: rewards.gold,
        loot: crate::api::dto::loot_dtos(&rewards.loot),
    }
}
