//! PvP queue commands.

use super::*;
use crate::api::broadcast::Scope;
use crate::services::EnqueueOutcome;
use emberfall_domain::{BattleReport, MatchType};
use emberfall_protocol::{BattleReportDto, BattleRoundDto, QueueMode};

pub(super) async fn handle_queue_join(
    state: &WsState,
    connection_id: ConnectionId,
    character_id: &str,
    match_type: QueueMode,
) -> Option<ServerMessage> {
    let character_id = match bound_character(state, connection_id, character_id).await {
        Ok(id) => id,
        Err(e) => return Some(e),
    };
    let match_type = match match_type {
        QueueMode::Ranked => MatchType::Ranked,
        QueueMode::Casual => MatchType::Casual,
    };

    match state.app.matchmaking.enqueue(character_id, match_type).await {
        Ok(EnqueueOutcome::Queued { position }) => {
            Some(ServerMessage::QueueJoined { position })
        }
        Ok(EnqueueOutcome::Matched(report)) => {
            let opponent_id = if report.participants[0] == character_id {
                report.participants[1]
            } else {
                report.participants[0]
            };
            let challenger = match load_character(state, character_id).await {
                Ok(c) => c,
                Err(e) => return Some(e),
            };
            let opponent = match load_character(state, opponent_id).await {
                Ok(c) => c,
                Err(e) => return Some(e),
            };

            let battle = battle_dto(&report);
            // The waiting party learns of the match through a direct push.
            state
                .broadcaster
                .publish(
                    ServerMessage::MatchFound {
                        opponent: brief(&challenger),
                        battle: battle.clone(),
                    },
                    Scope::Direct(opponent_id),
                )
                .await;
            Some(ServerMessage::MatchFound {
                opponent: brief(&opponent),
                battle,
            })
        }
        Err(e) => Some(session_error_response(e)),
    }
}

pub(super) async fn handle_queue_leave(
    state: &WsState,
    connection_id: ConnectionId,
    character_id: &str,
) -> Option<ServerMessage> {
    let character_id = match bound_character(state, connection_id, character_id).await {
        Ok(id) => id,
        Err(e) => return Some(e),
    };
    match state.app.matchmaking.dequeue(character_id).await {
        Ok(()) => Some(ServerMessage::QueueLeft),
        Err(e) => Some(session_error_response(e)),
    }
}

fn battle_dto(report: &BattleReport) -> BattleReportDto {
    BattleReportDto {
        id: report.id.to_string(),
        winner_id: report.winner.to_string(),
        loser_id: report.loser.to_string(),
        rounds: report
            .rounds
            .iter()
            .map(|r| BattleRoundDto {
                round: r.round,
                attacker_id: r.attacker.to_string(),
                defender_id: r.defender.to_string(),
                damage: r.damage,
                defender_health_after: r.defender_health_after,
                text: r.to_string(),
            })
            .collect(),
        log: report.log(),
    }
}
