//! WebSocket message types for engine-client communication.
//!
//! Frames are JSON objects tagged by a SCREAMING_SNAKE_CASE `type` field,
//! matching what the browser client sends and expects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    BattleReportDto, CharacterBrief, CharacterStatusDto, ChatChannel, CombatAction,
    DungeonSummary, ErrorCode, InstanceSummary, LootDto, MonsterInfo, PositionDto, QueueMode,
    SkillEffectDto, TargetKind,
};

// =============================================================================
// Client Messages (browser -> engine)
// =============================================================================

/// Messages from the browser client to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Bind a character to this connection and announce it online.
    SelectCharacter { character_id: String },
    /// Send a chat line on a channel.
    Chat {
        character_id: String,
        channel: ChatChannel,
        message: String,
        /// Recipient, required for whisper.
        #[serde(default)]
        target_character_id: Option<String>,
    },
    /// Report a position change.
    Movement {
        character_id: String,
        x: i32,
        y: i32,
        #[serde(default)]
        direction: Option<String>,
    },
    /// Perform a combat action against a target.
    Combat {
        character_id: String,
        action: CombatAction,
        target_id: String,
        target_kind: TargetKind,
        #[serde(default)]
        skill_id: Option<String>,
        #[serde(default)]
        item_id: Option<String>,
    },
    /// Enter a dungeon, joining an open instance or founding one.
    StartBattle {
        character_id: String,
        dungeon_id: String,
    },
    /// Leave the active dungeon instance.
    LeaveBattle { character_id: String },
    /// Join the PvP matchmaking queue.
    QueueJoin {
        character_id: String,
        #[serde(default)]
        match_type: QueueMode,
    },
    /// Leave the PvP matchmaking queue.
    QueueLeave { character_id: String },
    /// Keepalive ping.
    Heartbeat,
    /// Any frame with an unrecognized `type` tag.
    #[serde(other)]
    Unknown,
}

// =============================================================================
// Server Messages (engine -> browser)
// =============================================================================

/// Messages from the engine to the browser client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// First frame after a successful upgrade.
    ConnectionSuccess {
        connection_id: String,
        message: String,
    },
    /// A character's online state changed; carries a snapshot when the
    /// character came online.
    CharacterStatus {
        character_id: String,
        is_online: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        character: Option<CharacterStatusDto>,
    },
    /// A chat line delivered on a channel.
    ChatMessage {
        channel: ChatChannel,
        sender: CharacterBrief,
        message: String,
        timestamp: DateTime<Utc>,
    },
    /// Another character moved within the observer's area.
    CharacterMovement {
        character_id: String,
        position: PositionDto,
        character_info: CharacterBrief,
    },
    /// Echo of the sender's own accepted movement.
    MovementConfirmed { x: i32, y: i32 },
    /// An attack landed.
    CombatResult {
        attacker_id: String,
        target_id: String,
        damage: i32,
        target_health: i32,
        is_dead: bool,
    },
    /// A monster died; rewards for the killer.
    MonsterDeath {
        monster_id: String,
        killer_id: String,
        experience: u64,
        gold: u64,
        loot: Vec<LootDto>,
    },
    /// A skill resolved against a target; effect lines as applied.
    SkillUsed {
        character_id: String,
        target_id: String,
        skill_id: String,
        effects: Vec<SkillEffectDto>,
    },
    /// The sender entered a dungeon instance.
    BattleStarted {
        dungeon: DungeonSummary,
        instance: InstanceSummary,
        monsters: Vec<MonsterInfo>,
    },
    /// Another participant joined the instance.
    PlayerJoinedBattle {
        character_id: String,
        character_name: String,
    },
    /// A participant left the instance.
    PlayerLeftBattle {
        character_id: String,
        remaining: u32,
    },
    /// Echo to the leaver.
    BattleLeft { instance_id: String },
    /// The party advanced to a new floor.
    FloorAdvanced {
        instance_id: String,
        floor: u32,
        monsters: Vec<MonsterInfo>,
    },
    /// The instance completed; boss rewards for each participant.
    InstanceCompleted {
        instance_id: String,
        rewards: Vec<LootDto>,
    },
    /// The instance failed.
    InstanceFailed { instance_id: String },
    /// Enqueued for PvP; 1-based queue position.
    QueueJoined { position: u32 },
    /// A PvP opponent was found and the battle resolved.
    MatchFound {
        opponent: CharacterBrief,
        battle: BattleReportDto,
    },
    /// Dequeued from PvP.
    QueueLeft,
    /// Structured error.
    Error {
        code: ErrorCode,
        message: String,
    },
    /// Keepalive reply.
    Pong,
}
