//! Domain error types.
//!
//! `StateConflict` covers every way a session operation can be rejected by
//! the current state of an instance, queue, or character. Callers surface
//! these as structured results - nothing in the session core swallows one.

use thiserror::Error;

use crate::ids::InstanceId;

/// A state-conflict rejection from the session core.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateConflict {
    /// The current floor's required monster or boss has not been defeated.
    #[error("floor {floor} has not been cleared")]
    FloorNotCleared { floor: u32 },

    /// The instance already holds the maximum number of participants.
    #[error("instance is full ({max_players} players)")]
    CapacityExceeded { max_players: u32 },

    /// The character is already a participant in another active instance.
    #[error("character is already in active instance {instance}")]
    AlreadyActive { instance: InstanceId },

    /// The character already holds a matchmaking ticket.
    #[error("character is already in queue")]
    AlreadyQueued,

    /// The character is flagged as in battle.
    #[error("character is already in battle")]
    AlreadyInBattle,

    /// The character completed this dungeon too recently.
    #[error("dungeon is on cooldown for {remaining_secs} more seconds")]
    OnCooldown { remaining_secs: i64 },

    /// Completion requires the final floor reached and its boss defeated.
    #[error("dungeon is not fully cleared")]
    NotFullyCleared,

    /// No matchmaking ticket exists for the character.
    #[error("character is not in queue")]
    NotQueued,

    /// The instance already reached a terminal state.
    #[error("instance is already completed or failed")]
    AlreadyResolved,
}
