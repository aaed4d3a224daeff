//! Session services - the engine's core logic.

pub mod battle;
pub mod error;
pub mod instance_registry;
pub mod loot;
pub mod matchmaking;

pub use battle::BattleResolver;
pub use error::SessionError;
pub use instance_registry::InstanceRegistry;
pub use loot::LootEngine;
pub use matchmaking::{EnqueueOutcome, MatchmakingQueue};
