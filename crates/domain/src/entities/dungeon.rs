//! Dungeon definitions - immutable catalog entries.
//!
//! A definition describes the ordered floor list, entry requirements, and
//! boss rewards. Live playthroughs are `DungeonInstance`s; the catalog that
//! owns definitions is an external collaborator and the session core only
//! reads them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{DungeonId, MonsterId};
use crate::value_objects::reward::RewardTable;

/// Difficulty banding for a dungeon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
    Expert,
    Legendary,
}

/// What a floor asks of the party before it can be advanced past.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloorKind {
    /// Requires its monster defeated at least once.
    Monster,
    /// Requires its monster (the boss) defeated at least once.
    Boss,
    /// Loot room, no defeat required.
    Treasure,
    /// Scripted event, no defeat required.
    Event,
    /// Recovery room, no defeat required.
    Rest,
}

impl FloorKind {
    /// Whether advancing past this floor requires a defeat.
    pub fn requires_defeat(self) -> bool {
        matches!(self, Self::Monster | Self::Boss)
    }
}

/// One stage of a dungeon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Floor {
    pub kind: FloorKind,
    /// The monster that must be defeated, for monster/boss floors.
    pub monster: Option<MonsterId>,
    /// Floor-specific rewards (treasure rooms).
    pub rewards: Option<RewardTable>,
}

impl Floor {
    pub fn monster(monster: MonsterId) -> Self {
        Self {
            kind: FloorKind::Monster,
            monster: Some(monster),
            rewards: None,
        }
    }

    pub fn boss(monster: MonsterId) -> Self {
        Self {
            kind: FloorKind::Boss,
            monster: Some(monster),
            rewards: None,
        }
    }

    pub fn treasure(rewards: RewardTable) -> Self {
        Self {
            kind: FloorKind::Treasure,
            monster: None,
            rewards: Some(rewards),
        }
    }
}

/// Immutable dungeon catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DungeonDefinition {
    pub id: DungeonId,
    pub name: String,
    pub difficulty: Difficulty,
    pub min_level: u32,
    pub max_level: u32,
    pub max_players: u32,
    /// Per-character re-entry cooldown after a completed run, in seconds.
    pub cooldown_secs: i64,
    /// Ordered floors; floor numbers are 1-based indexes into this list.
    pub floors: Vec<Floor>,
    /// Rewards rolled when the instance is completed.
    pub boss_rewards: RewardTable,
}

impl DungeonDefinition {
    pub fn total_floors(&self) -> u32 {
        self.floors.len() as u32
    }

    /// Look up a floor by its 1-based number.
    pub fn floor(&self, number: u32) -> Option<&Floor> {
        if number == 0 {
            return None;
        }
        self.floors.get(number as usize - 1)
    }

    /// The boss floor's monster, if the definition has a boss floor.
    pub fn boss_monster(&self) -> Option<MonsterId> {
        self.floors
            .iter()
            .find(|f| f.kind == FloorKind::Boss)
            .and_then(|f| f.monster)
    }
}

/// Why entry was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum EntryDenial {
    LevelTooLow { min_level: u32 },
    LevelTooHigh { max_level: u32 },
    OnCooldown { remaining_secs: i64 },
}

/// Structured result of an entry check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "allowed", rename_all = "lowercase")]
pub enum EntryCheck {
    #[serde(rename = "true")]
    Allowed,
    #[serde(rename = "false")]
    Denied(EntryDenial),
}

impl EntryCheck {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Check whether a character of `level` may enter `definition` at `now`.
///
/// `last_completed_at` is the character's most recent completed run of this
/// definition, if any; the cooldown window is measured from it.
pub fn check_entry(
    definition: &DungeonDefinition,
    level: u32,
    last_completed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> EntryCheck {
    if level < definition.min_level {
        return EntryCheck::Denied(EntryDenial::LevelTooLow {
            min_level: definition.min_level,
        });
    }
    if level > definition.max_level {
        return EntryCheck::Denied(EntryDenial::LevelTooHigh {
            max_level: definition.max_level,
        });
    }
    if let Some(completed_at) = last_completed_at {
        let elapsed = now - completed_at;
        let cooldown = Duration::seconds(definition.cooldown_secs);
        if elapsed < cooldown {
            return EntryCheck::Denied(EntryDenial::OnCooldown {
                remaining_secs: (cooldown - elapsed).num_seconds(),
            });
        }
    }
    EntryCheck::Allowed
}
