//! Matchmaking tickets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::CharacterId;

/// The kind of PvP match a character queued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Ranked,
    Casual,
}

impl Default for MatchType {
    fn default() -> Self {
        Self::Ranked
    }
}

/// A character's standing request to be matched for PvP.
///
/// At most one ticket exists per character at a time; the queue removes it
/// atomically with a successful match or an explicit dequeue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchmakingTicket {
    pub character: CharacterId,
    /// Rating snapshot taken at enqueue time.
    pub rating: i32,
    pub match_type: MatchType,
    pub queued_at: DateTime<Utc>,
}
