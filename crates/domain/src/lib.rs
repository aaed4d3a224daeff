//! Emberfall domain layer.
//!
//! Pure types and invariants for the real-time session core: dungeon
//! definitions and instances, characters, monsters, matchmaking tickets,
//! and battle reports. No I/O, no async, no ambient randomness - rolls and
//! clocks are injected by the engine.

pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use entities::character::{
    Character, ClassKind, InventorySlot, KnownSkill, StatBlock, DEFAULT_RATING, RATING_SWING,
};
pub use entities::dungeon::{
    check_entry, Difficulty, DungeonDefinition, EntryCheck, EntryDenial, Floor, FloorKind,
};
pub use entities::instance::{DungeonInstance, InstanceState, LeaveOutcome};
pub use entities::monster::{Monster, MonsterDrop, MonsterKind};
pub use entities::skill::{
    EffectScaling, ScalingStat, Skill, SkillEffect, SkillEffectKind, SkillOutcome,
};
pub use error::StateConflict;
pub use ids::{
    BattleId, CharacterId, ConnectionId, DungeonId, InstanceId, ItemId, MonsterId, SkillId,
};
pub use value_objects::battle::{BattleReport, BattleRound};
pub use value_objects::position::Position;
pub use value_objects::reward::{ChanceReward, GuaranteedReward, LootGrant, RewardTable};
pub use value_objects::ticket::{MatchType, MatchmakingTicket};
