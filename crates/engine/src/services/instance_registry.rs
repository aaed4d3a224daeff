//! The instance registry - owner of every live dungeon playthrough.
//!
//! Each instance sits behind its own `Arc<Mutex<_>>`; the registry's maps
//! only locate instances, so two parties in different dungeons never contend.
//! The creation-order list makes the joinable scan deterministic: the oldest
//! open instance always wins. The active-character index enforces at most one
//! live instance per character, claimed atomically through the dashmap entry
//! API before the join is applied.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::rngs::StdRng;
use tokio::sync::Mutex;

use emberfall_domain::{
    check_entry, Character, CharacterId, DungeonDefinition, DungeonId, DungeonInstance,
    EntryCheck, EntryDenial, InstanceId, InstanceState, LeaveOutcome, LootGrant, Monster,
    MonsterId, StateConflict,
};

use crate::infrastructure::ports::{CatalogStore, CharacterStore, ClockPort};
use crate::services::error::SessionError;
use crate::services::loot::LootEngine;

/// Progress reported against a live instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressAction {
    MonsterKilled { monster: MonsterId },
    BossDefeated,
    /// Defaults to the current floor when none is given.
    TreasureLooted { floor: Option<u32> },
}

/// Result of entering a dungeon.
#[derive(Debug, Clone)]
pub struct EnterResult {
    pub instance_id: InstanceId,
    pub definition: DungeonDefinition,
    pub floor: u32,
    pub participants: Vec<CharacterId>,
    /// True when the enter founded a fresh instance instead of joining one.
    pub founded: bool,
}

/// Result of leaving an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveResult {
    pub instance_id: InstanceId,
    pub outcome: LeaveOutcome,
}

/// Snapshot of instance progress after a progress report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub floor: u32,
    pub boss_defeated: bool,
}

/// Rewards granted for a monster kill.
#[derive(Debug, Clone)]
pub struct KillRewards {
    pub experience: u64,
    pub gold: u64,
    pub loot: Vec<LootGrant>,
    pub levels_gained: u32,
}

/// Outcome of an attack against an engaged monster.
#[derive(Debug, Clone)]
pub struct StrikeOutcome {
    pub remaining_health: i32,
    pub rewards: Option<KillRewards>,
}

/// Read-only instance view for listings.
#[derive(Debug, Clone)]
pub struct InstanceSnapshot {
    pub id: InstanceId,
    pub dungeon_id: DungeonId,
    pub state: InstanceState,
    pub floor: u32,
    pub participants: Vec<CharacterId>,
}

pub struct InstanceRegistry {
    instances: DashMap<InstanceId, Arc<Mutex<DungeonInstance>>>,
    /// Instance ids in creation order; the joinable scan walks this.
    creation_order: Mutex<Vec<InstanceId>>,
    /// At most one active instance per character.
    active: DashMap<CharacterId, InstanceId>,
    /// Latest completed run per (character, dungeon), for cooldowns.
    completions: DashMap<(CharacterId, DungeonId), DateTime<Utc>>,
    characters: Arc<dyn CharacterStore>,
    catalog: Arc<dyn CatalogStore>,
    clock: Arc<dyn ClockPort>,
    rng: Arc<Mutex<StdRng>>,
}

impl InstanceRegistry {
    pub fn new(
        characters: Arc<dyn CharacterStore>,
        catalog: Arc<dyn CatalogStore>,
        clock: Arc<dyn ClockPort>,
        rng: Arc<Mutex<StdRng>>,
    ) -> Self {
        Self {
            instances: DashMap::new(),
            creation_order: Mutex::new(Vec::new()),
            active: DashMap::new(),
            completions: DashMap::new(),
            characters,
            catalog,
            clock,
            rng,
        }
    }

    /// Structured entry check for a character against a dungeon.
    pub async fn can_enter(
        &self,
        character_id: CharacterId,
        dungeon_id: DungeonId,
    ) -> Result<EntryCheck, SessionError> {
        let definition = self.definition(dungeon_id).await?;
        let character = self.character(character_id).await?;
        let last_completed = self
            .completions
            .get(&(character_id, dungeon_id))
            .map(|e| *e.value());
        Ok(check_entry(
            &definition,
            character.level,
            last_completed,
            self.clock.now(),
        ))
    }

    /// Enter a dungeon: join the oldest open instance or found a new one.
    pub async fn enter(
        &self,
        dungeon_id: DungeonId,
        character_id: CharacterId,
    ) -> Result<EnterResult, SessionError> {
        let definition = self.definition(dungeon_id).await?;
        let mut character = self.character(character_id).await?;

        if character.in_battle {
            return Err(StateConflict::AlreadyInBattle.into());
        }
        if let Some(existing) = self.active.get(&character_id) {
            return Err(StateConflict::AlreadyActive {
                instance: *existing.value(),
            }
            .into());
        }

        let last_completed = self
            .completions
            .get(&(character_id, dungeon_id))
            .map(|e| *e.value());
        match check_entry(&definition, character.level, last_completed, self.clock.now()) {
            EntryCheck::Allowed => {}
            EntryCheck::Denied(EntryDenial::OnCooldown { remaining_secs }) => {
                return Err(StateConflict::OnCooldown { remaining_secs }.into());
            }
            EntryCheck::Denied(denial) => {
                return Err(SessionError::Validation(format!(
                    "entry denied: {denial:?}"
                )));
            }
        }

        // The scan holds the creation-order lock, serializing enters so two
        // characters cannot overfill the same open instance.
        let mut order = self.creation_order.lock().await;
        for id in order.iter() {
            let Some(arc) = self.instances.get(id).map(|e| e.value().clone()) else {
                continue;
            };
            let mut instance = arc.lock().await;
            if instance.state() != InstanceState::Active
                || instance.dungeon_id != dungeon_id
                || !instance.has_capacity(definition.max_players)
            {
                continue;
            }
            self.claim_active(character_id, *id)?;
            if let Err(conflict) = instance.join(character_id, definition.max_players) {
                self.active.remove(&character_id);
                return Err(conflict.into());
            }
            let result = EnterResult {
                instance_id: *id,
                floor: instance.floor(),
                participants: instance.participants().to_vec(),
                definition,
                founded: false,
            };
            drop(instance);
            // The battle flag reaches the store before the scan lock is
            // released; queue joins double-check the active index.
            self.mark_in_battle(&mut character, true).await?;
            drop(order);
            tracing::info!(
                instance_id = %result.instance_id,
                character_id = %character_id,
                "Character joined dungeon instance"
            );
            return Ok(result);
        }

        // No open instance: found one.
        let instance = DungeonInstance::new(dungeon_id, character_id, self.clock.now());
        let instance_id = instance.id;
        self.claim_active(character_id, instance_id)?;
        let result = EnterResult {
            instance_id,
            floor: instance.floor(),
            participants: instance.participants().to_vec(),
            definition,
            founded: true,
        };
        self.instances
            .insert(instance_id, Arc::new(Mutex::new(instance)));
        order.push(instance_id);
        self.mark_in_battle(&mut character, true).await?;
        drop(order);
        tracing::info!(
            instance_id = %instance_id,
            character_id = %character_id,
            dungeon_id = %dungeon_id,
            "Founded dungeon instance"
        );
        Ok(result)
    }

    /// Leave an instance. Always accepted for participants; emptying the
    /// instance resolves it. Terminal instances are retained for history
    /// queries, the joinable scan skips them.
    pub async fn leave(
        &self,
        instance_id: InstanceId,
        character_id: CharacterId,
    ) -> Result<LeaveResult, SessionError> {
        let arc = self.instance(instance_id)?;
        let mut instance = arc.lock().await;
        if !instance.is_participant(character_id) {
            return Err(SessionError::not_found("participant", character_id));
        }
        let definition = self.definition(instance.dungeon_id).await?;
        let now = self.clock.now();
        let outcome = instance.leave(character_id, &definition, now)?;
        let dungeon_id = instance.dungeon_id;
        drop(instance);

        if outcome == LeaveOutcome::InstanceCompleted {
            self.completions.insert((character_id, dungeon_id), now);
        }
        if matches!(
            outcome,
            LeaveOutcome::InstanceCompleted | LeaveOutcome::InstanceFailed
        ) {
            tracing::info!(
                instance_id = %instance_id,
                ?outcome,
                "Instance resolved by final leave"
            );
        }

        self.active.remove(&character_id);
        let mut character = self.character(character_id).await?;
        self.mark_in_battle(&mut character, false).await?;
        Ok(LeaveResult {
            instance_id,
            outcome,
        })
    }

    /// Report progress against an instance.
    pub async fn record_progress(
        &self,
        instance_id: InstanceId,
        action: ProgressAction,
    ) -> Result<ProgressSnapshot, SessionError> {
        let arc = self.instance(instance_id)?;
        let mut instance = arc.lock().await;
        let definition = self.definition(instance.dungeon_id).await?;
        match action {
            ProgressAction::MonsterKilled { monster } => {
                instance.record_defeat(monster, &definition)?;
            }
            ProgressAction::BossDefeated => instance.record_boss_defeated()?,
            ProgressAction::TreasureLooted { floor } => {
                let floor = floor.unwrap_or_else(|| instance.floor());
                instance.record_treasure_looted(floor)?;
            }
        }
        Ok(ProgressSnapshot {
            floor: instance.floor(),
            boss_defeated: instance.boss_defeated(),
        })
    }

    /// Advance the party one floor. Participant-only.
    pub async fn advance_floor(
        &self,
        instance_id: InstanceId,
        character_id: CharacterId,
    ) -> Result<u32, SessionError> {
        let arc = self.instance(instance_id)?;
        let mut instance = arc.lock().await;
        if !instance.is_participant(character_id) {
            return Err(SessionError::Unauthorized(
                "not a participant of this instance".into(),
            ));
        }
        let definition = self.definition(instance.dungeon_id).await?;
        Ok(instance.advance_floor(&definition)?)
    }

    /// Complete a fully-cleared instance: boss rewards for every participant,
    /// cooldown timestamps recorded, battle flags cleared.
    pub async fn complete(
        &self,
        instance_id: InstanceId,
        character_id: CharacterId,
    ) -> Result<Vec<LootGrant>, SessionError> {
        let arc = self.instance(instance_id)?;
        let mut instance = arc.lock().await;
        if !instance.is_participant(character_id) {
            return Err(SessionError::Unauthorized(
                "not a participant of this instance".into(),
            ));
        }
        let definition = self.definition(instance.dungeon_id).await?;
        let now = self.clock.now();
        instance.complete(&definition, now)?;
        let participants = instance.participants().to_vec();
        let dungeon_id = instance.dungeon_id;
        drop(instance);

        let rewards = {
            let mut rng = self.rng.lock().await;
            LootEngine::roll_table(&definition.boss_rewards, &mut *rng)
        };

        for participant in &participants {
            self.completions.insert((*participant, dungeon_id), now);
            self.active.remove(participant);
            let mut character = self.character(*participant).await?;
            for grant in &rewards {
                character.grant_loot(grant);
            }
            self.mark_in_battle(&mut character, false).await?;
        }
        tracing::info!(
            instance_id = %instance_id,
            participants = participants.len(),
            "Instance completed"
        );
        Ok(rewards)
    }

    /// Apply an attack to a monster engaged on the instance's current floor.
    ///
    /// The monster is engaged at catalog max health on first strike; a kill
    /// records the defeat and pays out drops, gold, and experience.
    pub async fn strike_monster(
        &self,
        instance_id: InstanceId,
        attacker: CharacterId,
        monster_id: MonsterId,
        damage: i32,
    ) -> Result<StrikeOutcome, SessionError> {
        let arc = self.instance(instance_id)?;
        let mut instance = arc.lock().await;
        if !instance.is_participant(attacker) {
            return Err(SessionError::Unauthorized(
                "not a participant of this instance".into(),
            ));
        }
        let monster = self.monster(monster_id).await?;
        let definition = self.definition(instance.dungeon_id).await?;

        let before = instance.engage_monster(monster_id, monster.max_health);
        if before <= 0 {
            return Err(StateConflict::AlreadyResolved.into());
        }
        let remaining = instance.damage_monster(monster_id, damage);
        if remaining > 0 {
            return Ok(StrikeOutcome {
                remaining_health: remaining,
                rewards: None,
            });
        }

        instance.record_defeat(monster_id, &definition)?;
        drop(instance);

        let (loot, gold) = {
            let mut rng = self.rng.lock().await;
            let loot = LootEngine::roll_monster_drops(&monster.drops, &mut *rng);
            let gold = LootEngine::roll_gold(monster.min_gold, monster.max_gold, &mut *rng);
            (loot, gold)
        };

        let mut character = self.character(attacker).await?;
        for grant in &loot {
            character.grant_loot(grant);
        }
        character.grant_gold(gold);
        let levels_gained = character.gain_experience(monster.experience_value);
        self.characters.save(&character).await?;

        tracing::debug!(
            instance_id = %instance_id,
            monster_id = %monster_id,
            killer = %attacker,
            levels_gained,
            "Monster defeated"
        );
        Ok(StrikeOutcome {
            remaining_health: 0,
            rewards: Some(KillRewards {
                experience: monster.experience_value,
                gold,
                loot,
                levels_gained,
            }),
        })
    }

    /// The instance a character currently occupies, if any.
    pub fn active_instance_of(&self, character_id: CharacterId) -> Option<InstanceId> {
        self.active.get(&character_id).map(|e| *e.value())
    }

    /// Current participants of an instance.
    pub async fn participants(
        &self,
        instance_id: InstanceId,
    ) -> Result<Vec<CharacterId>, SessionError> {
        let arc = self.instance(instance_id)?;
        let instance = arc.lock().await;
        Ok(instance.participants().to_vec())
    }

    /// Snapshot of one instance.
    pub async fn snapshot(&self, instance_id: InstanceId) -> Result<InstanceSnapshot, SessionError> {
        let arc = self.instance(instance_id)?;
        let instance = arc.lock().await;
        Ok(InstanceSnapshot {
            id: instance.id,
            dungeon_id: instance.dungeon_id,
            state: instance.state(),
            floor: instance.floor(),
            participants: instance.participants().to_vec(),
        })
    }

    /// Snapshots of all live instances of a dungeon, in creation order.
    pub async fn list_instances(&self, dungeon_id: DungeonId) -> Vec<InstanceSnapshot> {
        let order = self.creation_order.lock().await;
        let mut snapshots = Vec::new();
        for id in order.iter() {
            let Some(arc) = self.instances.get(id).map(|e| e.value().clone()) else {
                continue;
            };
            let instance = arc.lock().await;
            if instance.dungeon_id == dungeon_id {
                snapshots.push(InstanceSnapshot {
                    id: instance.id,
                    dungeon_id: instance.dungeon_id,
                    state: instance.state(),
                    floor: instance.floor(),
                    participants: instance.participants().to_vec(),
                });
            }
        }
        snapshots
    }

    fn claim_active(
        &self,
        character_id: CharacterId,
        instance_id: InstanceId,
    ) -> Result<(), SessionError> {
        match self.active.entry(character_id) {
            Entry::Occupied(e) => Err(StateConflict::AlreadyActive {
                instance: *e.get(),
            }
            .into()),
            Entry::Vacant(v) => {
                v.insert(instance_id);
                Ok(())
            }
        }
    }

    async fn mark_in_battle(
        &self,
        character: &mut Character,
        in_battle: bool,
    ) -> Result<(), SessionError> {
        character.in_battle = in_battle;
        self.characters.save(character).await?;
        Ok(())
    }

    fn instance(
        &self,
        instance_id: InstanceId,
    ) -> Result<Arc<Mutex<DungeonInstance>>, SessionError> {
        self.instances
            .get(&instance_id)
            .map(|e| e.value().clone())
            .ok_or_else(|| SessionError::not_found("instance", instance_id))
    }

    async fn definition(&self, dungeon_id: DungeonId) -> Result<DungeonDefinition, SessionError> {
        self.catalog
            .dungeon(dungeon_id)
            .await?
            .ok_or_else(|| SessionError::not_found("dungeon", dungeon_id))
    }

    async fn monster(&self, monster_id: MonsterId) -> Result<Monster, SessionError> {
        self.catalog
            .monster(monster_id)
            .await?
            .ok_or_else(|| SessionError::not_found("monster", monster_id))
    }

    async fn character(&self, character_id: CharacterId) -> Result<Character, SessionError> {
        self.characters
            .get(character_id)
            .await?
            .ok_or_else(|| SessionError::not_found("character", character_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;

    use emberfall_domain::{
        ClassKind, Difficulty, Floor, ItemId, MonsterDrop, MonsterKind, RewardTable,
    };

    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::memory::{MemoryCatalog, MemoryCharacterStore};

    struct Harness {
        registry: InstanceRegistry,
        characters: Arc<MemoryCharacterStore>,
        dungeon_id: DungeonId,
        guard_id: MonsterId,
        boss_id: MonsterId,
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).single().unwrap()
    }

    fn monster(name: &str, kind: MonsterKind, max_health: i32) -> Monster {
        Monster {
            id: MonsterId::new(),
            name: name.into(),
            kind,
            level: 5,
            max_health,
            min_damage: 5,
            max_damage: 10,
            defense: 2,
            experience_value: 120,
            min_gold: 10,
            max_gold: 20,
            drops: vec![MonsterDrop {
                item: ItemId::new(),
                chance: 100,
                min_quantity: 1,
                max_quantity: 1,
            }],
        }
    }

    /// Two-floor dungeon (guard floor, boss floor), two player slots.
    fn harness() -> Harness {
        let characters = Arc::new(MemoryCharacterStore::new());
        let catalog = Arc::new(MemoryCatalog::new());
        let guard = monster("Crypt Guard", MonsterKind::Normal, 30);
        let boss = monster("Ember Tyrant", MonsterKind::Boss, 50);
        let guard_id = catalog.insert_monster(guard);
        let boss_id = catalog.insert_monster(boss);
        let dungeon_id = catalog.insert_dungeon(DungeonDefinition {
            id: DungeonId::new(),
            name: "Emberfall Crypt".into(),
            difficulty: Difficulty::Normal,
            min_level: 1,
            max_level: 100,
            max_players: 2,
            cooldown_secs: 3600,
            floors: vec![Floor::monster(guard_id), Floor::boss(boss_id)],
            boss_rewards: RewardTable {
                guaranteed: vec![emberfall_domain::GuaranteedReward {
                    item: ItemId::new(),
                    quantity: 1,
                }],
                chances: vec![],
            },
        });
        let registry = InstanceRegistry::new(
            characters.clone(),
            catalog,
            Arc::new(FixedClock(now())),
            Arc::new(Mutex::new(StdRng::seed_from_u64(99))),
        );
        Harness {
            registry,
            characters,
            dungeon_id,
            guard_id,
            boss_id,
        }
    }

    fn seed_character(h: &Harness, name: &str) -> CharacterId {
        h.characters
            .insert(Character::new(name, ClassKind::Warrior, now()))
    }

    #[tokio::test]
    async fn enter_joins_the_oldest_open_instance() {
        let h = harness();
        let a = seed_character(&h, "Aldric");
        let b = seed_character(&h, "Brynn");

        let first = h.registry.enter(h.dungeon_id, a).await.unwrap();
        assert!(first.founded);

        let second = h.registry.enter(h.dungeon_id, b).await.unwrap();
        assert!(!second.founded);
        assert_eq!(second.instance_id, first.instance_id);
        assert_eq!(second.participants, vec![a, b]);
    }

    #[tokio::test]
    async fn full_instance_forces_a_new_one() {
        let h = harness();
        let a = seed_character(&h, "Aldric");
        let b = seed_character(&h, "Brynn");
        let c = seed_character(&h, "Cedra");

        let first = h.registry.enter(h.dungeon_id, a).await.unwrap();
        h.registry.enter(h.dungeon_id, b).await.unwrap();

        let third = h.registry.enter(h.dungeon_id, c).await.unwrap();
        assert!(third.founded);
        assert_ne!(third.instance_id, first.instance_id);
    }

    #[tokio::test]
    async fn second_enter_by_same_character_conflicts() {
        let h = harness();
        let a = seed_character(&h, "Aldric");
        let first = h.registry.enter(h.dungeon_id, a).await.unwrap();

        let err = h.registry.enter(h.dungeon_id, a).await.unwrap_err();
        match err {
            SessionError::Conflict(StateConflict::AlreadyInBattle) => {}
            SessionError::Conflict(StateConflict::AlreadyActive { instance }) => {
                assert_eq!(instance, first.instance_id);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn sole_leaver_fails_the_instance_and_clears_flags() {
        let h = harness();
        let a = seed_character(&h, "Aldric");
        let entered = h.registry.enter(h.dungeon_id, a).await.unwrap();
        assert!(h.characters.get(a).await.unwrap().unwrap().in_battle);

        let left = h.registry.leave(entered.instance_id, a).await.unwrap();
        assert_eq!(left.outcome, LeaveOutcome::InstanceFailed);
        assert!(h.registry.active_instance_of(a).is_none());
        assert!(!h.characters.get(a).await.unwrap().unwrap().in_battle);

        // Failed runs never start a cooldown.
        let check = h.registry.can_enter(a, h.dungeon_id).await.unwrap();
        assert!(check.is_allowed());
    }

    #[tokio::test]
    async fn strike_kills_pay_out_and_gate_the_floor() {
        let h = harness();
        let a = seed_character(&h, "Aldric");
        let entered = h.registry.enter(h.dungeon_id, a).await.unwrap();
        let id = entered.instance_id;

        // Advancing before the kill is a floor conflict.
        let err = h.registry.advance_floor(id, a).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Conflict(StateConflict::FloorNotCleared { floor: 1 })
        ));

        let partial = h.registry.strike_monster(id, a, h.guard_id, 10).await.unwrap();
        assert_eq!(partial.remaining_health, 20);
        assert!(partial.rewards.is_none());

        let kill = h.registry.strike_monster(id, a, h.guard_id, 25).await.unwrap();
        assert_eq!(kill.remaining_health, 0);
        let rewards = kill.rewards.unwrap();
        assert_eq!(rewards.experience, 120);
        assert!((10..=20).contains(&rewards.gold));
        assert_eq!(rewards.loot.len(), 1);
        // 120 XP clears the 100 XP level-1 threshold.
        assert_eq!(rewards.levels_gained, 1);

        assert_eq!(h.registry.advance_floor(id, a).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn complete_rewards_participants_and_starts_cooldown() {
        let h = harness();
        let a = seed_character(&h, "Aldric");
        let entered = h.registry.enter(h.dungeon_id, a).await.unwrap();
        let id = entered.instance_id;

        h.registry.strike_monster(id, a, h.guard_id, 100).await.unwrap();
        h.registry.advance_floor(id, a).await.unwrap();
        h.registry.strike_monster(id, a, h.boss_id, 100).await.unwrap();

        let rewards = h.registry.complete(id, a).await.unwrap();
        assert_eq!(rewards.len(), 1);

        let character = h.characters.get(a).await.unwrap().unwrap();
        assert!(!character.in_battle);
        assert!(character.inventory.iter().any(|s| s.item == rewards[0].item));

        // Cooldown now blocks re-entry.
        let err = h.registry.enter(h.dungeon_id, a).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Conflict(StateConflict::OnCooldown { .. })
        ));
        // The completed instance is retained for history queries.
        let snap = h.registry.snapshot(id).await.unwrap();
        assert_eq!(snap.state, InstanceState::Completed);
    }

    #[tokio::test]
    async fn progress_reports_update_the_snapshot() {
        let h = harness();
        let a = seed_character(&h, "Aldric");
        let entered = h.registry.enter(h.dungeon_id, a).await.unwrap();
        let id = entered.instance_id;

        let snap = h
            .registry
            .record_progress(
                id,
                ProgressAction::MonsterKilled {
                    monster: h.guard_id,
                },
            )
            .await
            .unwrap();
        assert!(!snap.boss_defeated);

        let snap = h
            .registry
            .record_progress(id, ProgressAction::BossDefeated)
            .await
            .unwrap();
        assert!(snap.boss_defeated);
    }

    #[tokio::test]
    async fn outsiders_cannot_advance_someone_elses_instance() {
        let h = harness();
        let a = seed_character(&h, "Aldric");
        let outsider = seed_character(&h, "Vex");
        let entered = h.registry.enter(h.dungeon_id, a).await.unwrap();

        let err = h
            .registry
            .advance_floor(entered.instance_id, outsider)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Unauthorized(_)));
    }
}
