//! In-memory store adapters.
//!
//! The session core runs against these in development and in tests; the
//! production character database sits behind the same ports in a separate
//! deployment unit.

use async_trait::async_trait;
use dashmap::DashMap;

use emberfall_domain::{
    Character, CharacterId, DungeonDefinition, DungeonId, Monster, MonsterId, Skill, SkillId,
};

use crate::infrastructure::ports::{CatalogStore, CharacterStore, StoreError};

/// DashMap-backed character store.
#[derive(Default)]
pub struct MemoryCharacterStore {
    characters: DashMap<CharacterId, Character>,
}

impl MemoryCharacterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a character, returning its id.
    pub fn insert(&self, character: Character) -> CharacterId {
        let id = character.id;
        self.characters.insert(id, character);
        id
    }
}

#[async_trait]
impl CharacterStore for MemoryCharacterStore {
    async fn get(&self, id: CharacterId) -> Result<Option<Character>, StoreError> {
        Ok(self.characters.get(&id).map(|c| c.clone()))
    }

    async fn save(&self, character: &Character) -> Result<(), StoreError> {
        self.characters.insert(character.id, character.clone());
        Ok(())
    }
}

/// DashMap-backed dungeon, monster, and skill catalog.
#[derive(Default)]
pub struct MemoryCatalog {
    dungeons: DashMap<DungeonId, DungeonDefinition>,
    monsters: DashMap<MonsterId, Monster>,
    skills: DashMap<SkillId, Skill>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_dungeon(&self, definition: DungeonDefinition) -> DungeonId {
        let id = definition.id;
        self.dungeons.insert(id, definition);
        id
    }

    pub fn insert_monster(&self, monster: Monster) -> MonsterId {
        let id = monster.id;
        self.monsters.insert(id, monster);
        id
    }

    pub fn insert_skill(&self, skill: Skill) -> SkillId {
        let id = skill.id;
        self.skills.insert(id, skill);
        id
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn dungeon(&self, id: DungeonId) -> Result<Option<DungeonDefinition>, StoreError> {
        Ok(self.dungeons.get(&id).map(|d| d.clone()))
    }

    async fn monster(&self, id: MonsterId) -> Result<Option<Monster>, StoreError> {
        Ok(self.monsters.get(&id).map(|m| m.clone()))
    }

    async fn skill(&self, id: SkillId) -> Result<Option<Skill>, StoreError> {
        Ok(self.skills.get(&id).map(|s| s.clone()))
    }

    async fn list_dungeons(&self) -> Result<Vec<DungeonDefinition>, StoreError> {
        let mut dungeons: Vec<_> = self.dungeons.iter().map(|d| d.clone()).collect();
        dungeons.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(dungeons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use emberfall_domain::ClassKind;

    #[tokio::test]
    async fn character_store_round_trips() {
        let store = MemoryCharacterStore::new();
        let now = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap();
        let id = store.insert(Character::new("Aldric", ClassKind::Warrior, now));

        let mut loaded = store.get(id).await.unwrap().unwrap();
        loaded.gold = 42;
        store.save(&loaded).await.unwrap();

        assert_eq!(store.get(id).await.unwrap().unwrap().gold, 42);
        assert!(store.get(CharacterId::new()).await.unwrap().is_none());
    }
}
