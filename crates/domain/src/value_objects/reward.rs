//! Reward tables and loot grants.

use serde::{Deserialize, Serialize};

use crate::ids::ItemId;

/// A reward that is always granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuaranteedReward {
    pub item: ItemId,
    pub quantity: u32,
}

/// A reward granted with `chance` percent probability (0..=100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChanceReward {
    pub item: ItemId,
    pub quantity: u32,
    /// Percentage in 0..=100. 0 never grants, 100 always grants.
    pub chance: u8,
}

/// Rewards attached to a floor or the dungeon boss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RewardTable {
    pub guaranteed: Vec<GuaranteedReward>,
    pub chances: Vec<ChanceReward>,
}

/// One granted stack of items, as produced by a loot roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootGrant {
    pub item: ItemId,
    pub quantity: u32,
}
