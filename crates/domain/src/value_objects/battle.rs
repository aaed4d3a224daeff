//! PvP battle reports.
//!
//! A `BattleReport` is produced by the battle resolver and delivered to both
//! participants; it is not stored long-term.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{BattleId, CharacterId};

/// One attack within a battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleRound {
    /// 1-based round number. Both combatants act within the same round.
    pub round: u32,
    pub attacker: CharacterId,
    pub attacker_name: String,
    pub defender: CharacterId,
    pub defender_name: String,
    pub damage: i32,
    pub defender_health_after: i32,
}

impl fmt::Display for BattleRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Round {}: {} deals {} damage to {}",
            self.round, self.attacker_name, self.damage, self.defender_name
        )
    }
}

/// The full result of a simulated PvP battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleReport {
    pub id: BattleId,
    pub participants: [CharacterId; 2],
    pub rounds: Vec<BattleRound>,
    pub winner: CharacterId,
    pub loser: CharacterId,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl BattleReport {
    /// Render the round log as display lines for the client battle feed.
    pub fn log(&self) -> Vec<String> {
        self.rounds.iter().map(|r| r.to_string()).collect()
    }
}
