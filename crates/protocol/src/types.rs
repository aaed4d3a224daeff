//! Shared wire enums and DTOs.

use serde::{Deserialize, Serialize};

/// Chat delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatChannel {
    /// Every connected player.
    Global,
    /// Players within the local radius on the same map.
    Local,
    /// One named recipient plus a sender echo.
    Whisper,
}

/// Combat sub-action inside a `COMBAT` frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CombatAction {
    Attack,
    Skill,
    Item,
}

/// What a combat target id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Monster,
    Character,
}

/// PvP queue flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueMode {
    #[default]
    Ranked,
    Casual,
}

/// Machine-readable error category carried on `ERROR` frames and HTTP
/// envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Validation,
    Unauthorized,
    NotFound,
    Conflict,
    Transient,
    ParseError,
    UnknownMessage,
    NotSupported,
    NotQueued,
}

/// A position as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionDto {
    pub map: String,
    pub x: i32,
    pub y: i32,
    /// Client-reported facing, echoed to observers untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
}

/// The identity block attached to chat messages and party events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterBrief {
    pub id: String,
    pub name: String,
    pub level: u32,
    pub class: String,
}

/// Session-relevant character snapshot sent after `SELECT_CHARACTER`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterStatusDto {
    pub id: String,
    pub name: String,
    pub class: String,
    pub level: u32,
    pub health: i32,
    pub max_health: i32,
    pub position: PositionDto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonSummary {
    pub id: String,
    pub name: String,
    pub difficulty: String,
    pub min_level: u32,
    pub max_level: u32,
    pub max_players: u32,
    pub total_floors: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSummary {
    pub id: String,
    pub dungeon_id: String,
    pub state: String,
    pub floor: u32,
    pub participants: Vec<String>,
}

/// Monster snapshot included in battle frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterInfo {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub level: u32,
    pub health: i32,
    pub max_health: i32,
}

/// One applied effect line inside `SKILL_USED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillEffectDto {
    #[serde(rename = "type")]
    pub effect: String,
    pub value: i32,
}

/// One granted loot stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootDto {
    pub id: String,
    pub quantity: u32,
}

/// One round of a resolved PvP battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleRoundDto {
    pub round: u32,
    pub attacker_id: String,
    pub defender_id: String,
    pub damage: i32,
    pub defender_health_after: i32,
    pub text: String,
}

/// A resolved PvP battle as delivered in `MATCH_FOUND`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleReportDto {
    pub id: String,
    pub winner_id: String,
    pub loser_id: String,
    pub rounds: Vec<BattleRoundDto>,
    pub log: Vec<String>,
}
