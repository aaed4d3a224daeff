//! Loot rolls.
//!
//! All randomness flows through the caller-provided RNG so reward rolls are
//! reproducible under a fixed seed. Stack merging into inventories lives in
//! `Character::grant_loot`.

use rand::Rng;

use emberfall_domain::{ChanceReward, GuaranteedReward, LootGrant, MonsterDrop, RewardTable};

pub struct LootEngine;

impl LootEngine {
    /// Guaranteed entries always drop.
    pub fn roll_guaranteed(entries: &[GuaranteedReward]) -> Vec<LootGrant> {
        entries
            .iter()
            .map(|e| LootGrant {
                item: e.item,
                quantity: e.quantity,
            })
            .collect()
    }

    /// Independent percentage roll per entry: 0 never drops, 100 always.
    pub fn roll_chance<R: Rng>(entries: &[ChanceReward], rng: &mut R) -> Vec<LootGrant> {
        entries
            .iter()
            .filter(|e| rng.gen_range(0.0..100.0) < f64::from(e.chance))
            .map(|e| LootGrant {
                item: e.item,
                quantity: e.quantity,
            })
            .collect()
    }

    /// Guaranteed and chance entries of a reward table combined.
    pub fn roll_table<R: Rng>(table: &RewardTable, rng: &mut R) -> Vec<LootGrant> {
        let mut grants = Self::roll_guaranteed(&table.guaranteed);
        grants.extend(Self::roll_chance(&table.chances, rng));
        grants
    }

    /// Roll a monster's drop table; quantity is uniform inclusive within the
    /// entry's range.
    pub fn roll_monster_drops<R: Rng>(drops: &[MonsterDrop], rng: &mut R) -> Vec<LootGrant> {
        let mut grants = Vec::new();
        for drop in drops {
            if rng.gen_range(0.0..100.0) < f64::from(drop.chance) {
                let quantity = if drop.min_quantity == drop.max_quantity {
                    drop.min_quantity
                } else {
                    rng.gen_range(drop.min_quantity..=drop.max_quantity)
                };
                grants.push(LootGrant {
                    item: drop.item,
                    quantity,
                });
            }
        }
        grants
    }

    /// Uniform inclusive gold roll.
    pub fn roll_gold<R: Rng>(min: u64, max: u64, rng: &mut R) -> u64 {
        if min >= max {
            return min;
        }
        rng.gen_range(min..=max)
    }
}
