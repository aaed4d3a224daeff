//! Emberfall Protocol - wire types shared by the engine and the browser client.
//!
//! This crate contains every type that crosses the network boundary:
//! - WebSocket message enums (`ClientMessage`, `ServerMessage`)
//! - Supporting DTOs and shared enums
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - only serde and chrono
//! 2. **No business logic** - pure data types and serialization
//! 3. **No domain IDs** - ids travel as raw `String`s and are parsed at the
//!    gateway

pub mod messages;
pub mod types;

pub use messages::{ClientMessage, ServerMessage};

pub use types::{
    BattleReportDto, BattleRoundDto, CharacterBrief, CharacterStatusDto, ChatChannel,
    CombatAction, DungeonSummary, ErrorCode, InstanceSummary, LootDto, MonsterInfo, PositionDto,
    QueueMode, SkillEffectDto, TargetKind,
};
