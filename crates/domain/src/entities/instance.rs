//! Dungeon instances - one live playthrough of a definition.
//!
//! The instance is the concurrency-sensitive aggregate of the session core.
//! Every mutating method enforces the state machine:
//!
//! - `Active -> Completed` (success) or `Active -> Failed` (abandonment),
//!   both terminal;
//! - the floor number never decreases and stays within `[1, total_floors]`;
//! - defeat counters only increment.
//!
//! Callers (the instance registry) serialize access; this type only encodes
//! the invariants.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::dungeon::DungeonDefinition;
use crate::error::StateConflict;
use crate::ids::{CharacterId, DungeonId, InstanceId, MonsterId};

/// Lifecycle state of an instance. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceState {
    Active,
    Completed,
    Failed,
}

impl InstanceState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// What happened when a participant left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// Other participants remain; the instance stays active.
    Left { remaining: u32 },
    /// The leaver was the last participant of a fully cleared run.
    InstanceCompleted,
    /// The leaver was the last participant and the run was not cleared.
    InstanceFailed,
}

/// One live playthrough of a dungeon definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DungeonInstance {
    pub id: InstanceId,
    pub dungeon_id: DungeonId,
    pub created_at: DateTime<Utc>,
    participants: Vec<CharacterId>,
    floor: u32,
    defeats: HashMap<MonsterId, u32>,
    boss_defeated: bool,
    completed_floors: Vec<u32>,
    treasures_looted: HashMap<u32, bool>,
    /// Remaining health of monsters engaged on the current floor.
    engagements: HashMap<MonsterId, i32>,
    state: InstanceState,
    completed_at: Option<DateTime<Utc>>,
}

impl DungeonInstance {
    pub fn new(dungeon_id: DungeonId, founder: CharacterId, now: DateTime<Utc>) -> Self {
        Self {
            id: InstanceId::new(),
            dungeon_id,
            created_at: now,
            participants: vec![founder],
            floor: 1,
            defeats: HashMap::new(),
            boss_defeated: false,
            completed_floors: Vec::new(),
            treasures_looted: HashMap::new(),
            engagements: HashMap::new(),
            state: InstanceState::Active,
            completed_at: None,
        }
    }

    pub fn state(&self) -> InstanceState {
        self.state
    }

    pub fn floor(&self) -> u32 {
        self.floor
    }

    pub fn participants(&self) -> &[CharacterId] {
        &self.participants
    }

    pub fn is_participant(&self, character: CharacterId) -> bool {
        self.participants.contains(&character)
    }

    pub fn boss_defeated(&self) -> bool {
        self.boss_defeated
    }

    pub fn completed_floors(&self) -> &[u32] {
        &self.completed_floors
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn defeat_count(&self, monster: MonsterId) -> u32 {
        self.defeats.get(&monster).copied().unwrap_or(0)
    }

    pub fn has_capacity(&self, max_players: u32) -> bool {
        (self.participants.len() as u32) < max_players
    }

    fn ensure_active(&self) -> Result<(), StateConflict> {
        if self.state.is_terminal() {
            return Err(StateConflict::AlreadyResolved);
        }
        Ok(())
    }

    /// Whether every floor has been cleared and the final boss defeated.
    pub fn fully_cleared(&self, definition: &DungeonDefinition) -> bool {
        self.boss_defeated && self.floor == definition.total_floors()
    }

    /// Add a participant. Joining an instance one already belongs to is a
    /// no-op; the registry enforces at-most-one active instance per
    /// character across instances.
    pub fn join(&mut self, character: CharacterId, max_players: u32) -> Result<(), StateConflict> {
        self.ensure_active()?;
        if self.is_participant(character) {
            return Ok(());
        }
        if !self.has_capacity(max_players) {
            return Err(StateConflict::CapacityExceeded { max_players });
        }
        self.participants.push(character);
        Ok(())
    }

    /// Remove a participant. Emptying the instance resolves it: completed
    /// when the run was fully cleared, failed otherwise.
    pub fn leave(
        &mut self,
        character: CharacterId,
        definition: &DungeonDefinition,
        now: DateTime<Utc>,
    ) -> Result<LeaveOutcome, StateConflict> {
        self.ensure_active()?;
        self.participants.retain(|p| *p != character);
        if !self.participants.is_empty() {
            return Ok(LeaveOutcome::Left {
                remaining: self.participants.len() as u32,
            });
        }
        if self.fully_cleared(definition) {
            self.state = InstanceState::Completed;
            self.completed_at = Some(now);
            Ok(LeaveOutcome::InstanceCompleted)
        } else {
            self.state = InstanceState::Failed;
            self.completed_at = Some(now);
            Ok(LeaveOutcome::InstanceFailed)
        }
    }

    /// Increment the defeat counter for a monster by exactly one.
    ///
    /// Defeating the definition's boss monster also raises the boss flag.
    pub fn record_defeat(
        &mut self,
        monster: MonsterId,
        definition: &DungeonDefinition,
    ) -> Result<u32, StateConflict> {
        self.ensure_active()?;
        let count = self.defeats.entry(monster).or_insert(0);
        *count += 1;
        if definition.boss_monster() == Some(monster) {
            self.boss_defeated = true;
        }
        Ok(*count)
    }

    /// Raise the boss flag directly (explicit progress report).
    pub fn record_boss_defeated(&mut self) -> Result<(), StateConflict> {
        self.ensure_active()?;
        self.boss_defeated = true;
        Ok(())
    }

    /// Mark the given floor's treasure as looted.
    pub fn record_treasure_looted(&mut self, floor: u32) -> Result<(), StateConflict> {
        self.ensure_active()?;
        self.treasures_looted.insert(floor, true);
        Ok(())
    }

    pub fn treasure_looted(&self, floor: u32) -> bool {
        self.treasures_looted.get(&floor).copied().unwrap_or(false)
    }

    /// Advance past the current floor by exactly one.
    ///
    /// Monster and boss floors require their monster defeated at least once.
    /// The final floor cannot be advanced past - completion handles it.
    pub fn advance_floor(&mut self, definition: &DungeonDefinition) -> Result<u32, StateConflict> {
        self.ensure_active()?;
        if self.floor >= definition.total_floors() {
            return Err(StateConflict::NotFullyCleared);
        }
        let current = definition
            .floor(self.floor)
            .ok_or(StateConflict::NotFullyCleared)?;
        if current.kind.requires_defeat() {
            let defeated = current
                .monster
                .map(|m| self.defeat_count(m) >= 1)
                .unwrap_or(false);
            if !defeated {
                return Err(StateConflict::FloorNotCleared { floor: self.floor });
            }
        }
        self.completed_floors.push(self.floor);
        self.floor += 1;
        self.engagements.clear();
        Ok(self.floor)
    }

    /// Transition `Active -> Completed`. Requires the final floor reached
    /// and the boss defeated.
    pub fn complete(
        &mut self,
        definition: &DungeonDefinition,
        now: DateTime<Utc>,
    ) -> Result<(), StateConflict> {
        self.ensure_active()?;
        if !self.fully_cleared(definition) {
            return Err(StateConflict::NotFullyCleared);
        }
        self.completed_floors.push(self.floor);
        self.state = InstanceState::Completed;
        self.completed_at = Some(now);
        Ok(())
    }

    /// Remaining health of an engaged monster, engaging it at `max_health`
    /// on first contact.
    pub fn engage_monster(&mut self, monster: MonsterId, max_health: i32) -> i32 {
        *self.engagements.entry(monster).or_insert(max_health)
    }

    /// Apply damage to an engaged monster, returning its remaining health.
    pub fn damage_monster(&mut self, monster: MonsterId, damage: i32) -> i32 {
        let health = self.engagements.entry(monster).or_insert(0);
        *health = (*health - damage).max(0);
        *health
    }
}
