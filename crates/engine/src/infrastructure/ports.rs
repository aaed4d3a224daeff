//! Port traits for the session core's collaborators.
//!
//! The persistence layer behind `CharacterStore` and the content pipeline
//! behind `CatalogStore` are external concerns; the engine only sees these
//! traits. Tests substitute mockall mocks or the in-memory adapters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use emberfall_domain::{
    Character, CharacterId, DungeonDefinition, DungeonId, Monster, MonsterId, Skill, SkillId,
};

/// Persistence failures surfaced to callers as transient errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Character persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CharacterStore: Send + Sync {
    async fn get(&self, id: CharacterId) -> Result<Option<Character>, StoreError>;
    async fn save(&self, character: &Character) -> Result<(), StoreError>;
}

/// Read-only dungeon, monster, and skill catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn dungeon(&self, id: DungeonId) -> Result<Option<DungeonDefinition>, StoreError>;
    async fn monster(&self, id: MonsterId) -> Result<Option<Monster>, StoreError>;
    async fn skill(&self, id: SkillId) -> Result<Option<Skill>, StoreError>;
    async fn list_dungeons(&self) -> Result<Vec<DungeonDefinition>, StoreError>;
}

/// Clock abstraction so cooldowns and timestamps are testable.
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
