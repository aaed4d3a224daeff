//! Monsters - immutable catalog entries referenced by dungeon floors.

use serde::{Deserialize, Serialize};

use crate::ids::{ItemId, MonsterId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonsterKind {
    Normal,
    Elite,
    Rare,
    Boss,
}

/// One entry in a monster's drop table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterDrop {
    pub item: ItemId,
    /// Drop chance in percent, 0..=100.
    pub chance: u8,
    pub min_quantity: u32,
    pub max_quantity: u32,
}

/// Immutable monster catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monster {
    pub id: MonsterId,
    pub name: String,
    pub kind: MonsterKind,
    pub level: u32,
    pub max_health: i32,
    pub min_damage: i32,
    pub max_damage: i32,
    pub defense: i32,
    pub experience_value: u64,
    pub min_gold: u64,
    pub max_gold: u64,
    pub drops: Vec<MonsterDrop>,
}

impl Monster {
    pub fn is_boss(&self) -> bool {
        self.kind == MonsterKind::Boss
    }
}
