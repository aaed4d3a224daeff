//! Characters - the session-relevant slice of a player's avatar.
//!
//! Identity, class, progression, inventory, PvP standing, and position.
//! All methods are pure state transitions; persistence lives behind the
//! engine's store port.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CharacterId, ItemId, SkillId};
use crate::value_objects::position::Position;
use crate::value_objects::reward::LootGrant;

/// Rating swing applied to both sides of a ranked battle.
pub const RATING_SWING: i32 = 25;

/// Rating every character starts at.
pub const DEFAULT_RATING: i32 = 1000;

/// Playable classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    Warrior,
    Mage,
    Rogue,
    Healer,
}

/// Primary attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    pub strength: i32,
    pub intelligence: i32,
    pub dexterity: i32,
    pub vitality: i32,
}

impl Default for StatBlock {
    fn default() -> Self {
        Self {
            strength: 10,
            intelligence: 10,
            dexterity: 10,
            vitality: 10,
        }
    }
}

/// One inventory stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySlot {
    pub item: ItemId,
    pub quantity: u32,
}

/// A learned skill and its trained level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownSkill {
    pub skill: SkillId,
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub class: ClassKind,
    pub level: u32,
    pub experience: u64,
    pub stats: StatBlock,
    pub health: i32,
    pub max_health: i32,
    pub mana: i32,
    pub max_mana: i32,
    /// Flat damage bonus from the equipped weapon.
    pub weapon_damage: i32,
    /// Flat mitigation from equipped gear.
    pub armor: i32,
    pub gold: u64,
    pub inventory: Vec<InventorySlot>,
    pub skills: Vec<KnownSkill>,
    pub position: Position,
    /// Set while the character occupies a dungeon instance or a PvP
    /// simulation; guards double-entry across sessions.
    pub in_battle: bool,
    pub rating: i32,
    pub pvp_wins: u32,
    pub pvp_losses: u32,
    pub last_active: DateTime<Utc>,
}

impl Character {
    pub fn new(name: impl Into<String>, class: ClassKind, now: DateTime<Utc>) -> Self {
        Self {
            id: CharacterId::new(),
            name: name.into(),
            class,
            level: 1,
            experience: 0,
            stats: StatBlock::default(),
            health: 100,
            max_health: 100,
            mana: 100,
            max_mana: 100,
            weapon_damage: 0,
            armor: 0,
            gold: 0,
            inventory: Vec::new(),
            skills: Vec::new(),
            position: Position::new("town", 0, 0),
            in_battle: false,
            rating: DEFAULT_RATING,
            pvp_wins: 0,
            pvp_losses: 0,
            last_active: now,
        }
    }

    /// Experience required to advance from the current level.
    pub fn xp_for_next_level(&self) -> u64 {
        (100.0 * 1.5f64.powi(self.level as i32 - 1)).floor() as u64
    }

    pub fn can_level_up(&self) -> bool {
        self.experience >= self.xp_for_next_level()
    }

    /// Consume experience and advance one level, growing stats by class.
    ///
    /// Returns `false` when the threshold has not been reached. Health and
    /// mana are refilled to their new maximums.
    pub fn level_up(&mut self) -> bool {
        if !self.can_level_up() {
            return false;
        }
        let cost = self.xp_for_next_level();
        self.level += 1;
        self.experience -= cost;

        match self.class {
            ClassKind::Warrior => {
                self.stats.strength += 3;
                self.stats.vitality += 2;
                self.stats.dexterity += 1;
                self.stats.intelligence += 1;
            }
            ClassKind::Mage => {
                self.stats.intelligence += 3;
                self.stats.vitality += 1;
                self.stats.dexterity += 1;
                self.stats.strength += 1;
            }
            ClassKind::Rogue => {
                self.stats.dexterity += 3;
                self.stats.strength += 2;
                self.stats.vitality += 1;
                self.stats.intelligence += 1;
            }
            ClassKind::Healer => {
                self.stats.intelligence += 2;
                self.stats.vitality += 2;
                self.stats.dexterity += 1;
                self.stats.strength += 1;
            }
        }

        self.max_health += 10 + self.stats.vitality * 2;
        self.max_mana += 10 + self.stats.intelligence * 2;
        self.health = self.max_health;
        self.mana = self.max_mana;
        true
    }

    /// Add experience, then apply as many level-ups as it pays for.
    ///
    /// Returns the number of levels gained.
    pub fn gain_experience(&mut self, amount: u64) -> u32 {
        self.experience += amount;
        let mut gained = 0;
        while self.level_up() {
            gained += 1;
        }
        gained
    }

    /// Base outgoing damage before the random multiplier.
    ///
    /// Warriors and healers scale off strength, mages off intelligence,
    /// rogues off dexterity.
    pub fn base_damage(&self) -> i32 {
        let raw = match self.class {
            ClassKind::Warrior => f64::from(self.stats.strength) * 2.0 * 1.2,
            ClassKind::Mage => f64::from(self.stats.intelligence) * 2.0,
            ClassKind::Rogue => f64::from(self.stats.dexterity) * 2.5,
            ClassKind::Healer => f64::from(self.stats.strength) * 2.0 * 0.8,
        };
        raw.floor() as i32
    }

    /// Flat damage mitigation: vitality plus gear.
    pub fn defense(&self) -> i32 {
        (f64::from(self.stats.vitality) * 1.5).floor() as i32 + self.armor
    }

    /// Merge a loot grant into the inventory, stacking onto an existing
    /// slot for the same item.
    pub fn grant_loot(&mut self, grant: &LootGrant) {
        if let Some(slot) = self.inventory.iter_mut().find(|s| s.item == grant.item) {
            slot.quantity += grant.quantity;
        } else {
            self.inventory.push(InventorySlot {
                item: grant.item,
                quantity: grant.quantity,
            });
        }
    }

    pub fn grant_gold(&mut self, amount: u64) {
        self.gold += amount;
    }

    /// Apply a ranked battle result: flat rating swing, win/loss tally.
    pub fn record_pvp_result(&mut self, won: bool) {
        if won {
            self.rating += RATING_SWING;
            self.pvp_wins += 1;
        } else {
            self.rating = (self.rating - RATING_SWING).max(0);
            self.pvp_losses += 1;
        }
    }

    /// Refill health and mana to their maximums.
    pub fn rest(&mut self) {
        self.health = self.max_health;
        self.mana = self.max_mana;
    }

    /// The trained level of a known skill.
    pub fn skill_level(&self, skill: SkillId) -> Option<u32> {
        self.skills
            .iter()
            .find(|k| k.skill == skill)
            .map(|k| k.level)
    }

    /// Learn a skill at level 1. Already-known skills are left untouched.
    pub fn learn_skill(&mut self, skill: SkillId) {
        if self.skill_level(skill).is_none() {
            self.skills.push(KnownSkill { skill, level: 1 });
        }
    }

    /// Spend mana, reporting whether the cost was covered.
    pub fn spend_mana(&mut self, cost: i32) -> bool {
        if self.mana < cost {
            return false;
        }
        self.mana -= cost;
        true
    }

    /// Restore health, capped at the maximum.
    pub fn heal(&mut self, amount: i32) {
        self.health = (self.health + amount).min(self.max_health);
    }
}
