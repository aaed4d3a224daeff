//! PvP matchmaking.
//!
//! The ticket list lives behind one async mutex and the whole
//! enqueue -> scan -> match -> resolve sequence runs under a single guard,
//! so a ticket can never be matched twice and a character can never hold
//! two tickets.

use std::sync::Arc;

use rand::rngs::StdRng;
use tokio::sync::Mutex;

use emberfall_domain::{
    BattleReport, Character, CharacterId, MatchType, MatchmakingTicket, StateConflict,
};

use crate::infrastructure::ports::{CharacterStore, ClockPort};
use crate::services::battle::BattleResolver;
use crate::services::error::SessionError;
use crate::services::instance_registry::InstanceRegistry;

/// Maximum rating distance between matched opponents.
pub const RATING_WINDOW: i32 = 200;

/// What `enqueue` produced.
#[derive(Debug)]
pub enum EnqueueOutcome {
    /// No compatible opponent yet; 1-based queue position.
    Queued { position: u32 },
    /// Matched immediately; the battle is already resolved and persisted.
    Matched(Box<BattleReport>),
}

pub struct MatchmakingQueue {
    tickets: Mutex<Vec<MatchmakingTicket>>,
    characters: Arc<dyn CharacterStore>,
    registry: Arc<InstanceRegistry>,
    clock: Arc<dyn ClockPort>,
    rng: Arc<Mutex<StdRng>>,
}

impl MatchmakingQueue {
    pub fn new(
        characters: Arc<dyn CharacterStore>,
        registry: Arc<InstanceRegistry>,
        clock: Arc<dyn ClockPort>,
        rng: Arc<Mutex<StdRng>>,
    ) -> Self {
        Self {
            tickets: Mutex::new(Vec::new()),
            characters,
            registry,
            clock,
            rng,
        }
    }

    /// Join the queue, matching immediately when a compatible ticket exists.
    ///
    /// Candidates are scanned in insertion order; the first ticket with the
    /// same match type within `RATING_WINDOW` wins.
    pub async fn enqueue(
        &self,
        character_id: CharacterId,
        match_type: MatchType,
    ) -> Result<EnqueueOutcome, SessionError> {
        let character = self.character(character_id).await?;
        if character.in_battle {
            return Err(StateConflict::AlreadyInBattle.into());
        }

        let mut tickets = self.tickets.lock().await;
        // The store flag can lag an in-flight dungeon enter; the registry's
        // active index is claimed before that enter returns, so check both.
        if self.registry.active_instance_of(character_id).is_some() {
            return Err(StateConflict::AlreadyInBattle.into());
        }
        if tickets.iter().any(|t| t.character == character_id) {
            return Err(StateConflict::AlreadyQueued.into());
        }

        let opponent_idx = tickets.iter().position(|t| {
            t.match_type == match_type && (t.rating - character.rating).abs() <= RATING_WINDOW
        });

        let Some(idx) = opponent_idx else {
            tickets.push(MatchmakingTicket {
                character: character_id,
                rating: character.rating,
                match_type,
                queued_at: self.clock.now(),
            });
            let position = tickets.len() as u32;
            tracing::debug!(character_id = %character_id, position, "Queued for PvP");
            return Ok(EnqueueOutcome::Queued { position });
        };

        // Remove the opponent's ticket before any await on stores so no
        // concurrent enqueue can see it.
        let opponent_ticket = tickets.remove(idx);
        let mut opponent = match self.character(opponent_ticket.character).await {
            Ok(c) => c,
            Err(e) => {
                // Opponent vanished from the store; drop their ticket and
                // queue the caller instead.
                tracing::warn!(
                    character_id = %opponent_ticket.character,
                    error = %e,
                    "Discarding stale ticket"
                );
                tickets.push(MatchmakingTicket {
                    character: character_id,
                    rating: character.rating,
                    match_type,
                    queued_at: self.clock.now(),
                });
                let position = tickets.len() as u32;
                return Ok(EnqueueOutcome::Queued { position });
            }
        };

        let mut challenger = character;
        let report = self
            .resolve(&mut challenger, &mut opponent, match_type)
            .await?;
        tracing::info!(
            battle_id = %report.id,
            winner = %report.winner,
            loser = %report.loser,
            "PvP match resolved"
        );
        Ok(EnqueueOutcome::Matched(Box::new(report)))
    }

    /// Remove a character's ticket. Safe to race with a match: when the
    /// ticket is already gone this returns `NotQueued` instead of touching
    /// any state.
    pub async fn dequeue(&self, character_id: CharacterId) -> Result<(), SessionError> {
        let mut tickets = self.tickets.lock().await;
        let before = tickets.len();
        tickets.retain(|t| t.character != character_id);
        if tickets.len() == before {
            return Err(StateConflict::NotQueued.into());
        }
        tracing::debug!(character_id = %character_id, "Left PvP queue");
        Ok(())
    }

    pub async fn is_queued(&self, character_id: CharacterId) -> bool {
        let tickets = self.tickets.lock().await;
        tickets.iter().any(|t| t.character == character_id)
    }

    pub async fn len(&self) -> usize {
        self.tickets.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Flag both combatants, simulate, apply ratings, persist.
    async fn resolve(
        &self,
        challenger: &mut Character,
        opponent: &mut Character,
        match_type: MatchType,
    ) -> Result<BattleReport, SessionError> {
        challenger.in_battle = true;
        opponent.in_battle = true;

        let report = {
            let mut rng = self.rng.lock().await;
            BattleResolver::simulate(challenger, opponent, &mut *rng, self.clock.now())
        };

        if match_type == MatchType::Ranked {
            let challenger_won = report.winner == challenger.id;
            challenger.record_pvp_result(challenger_won);
            opponent.record_pvp_result(!challenger_won);
        }

        challenger.in_battle = false;
        opponent.in_battle = false;
        self.characters.save(challenger).await?;
        self.characters.save(opponent).await?;
        Ok(report)
    }

    async fn character(&self, character_id: CharacterId) -> Result<Character, SessionError> {
        self.characters
            .get(character_id)
            .await?
            .ok_or_else(|| SessionError::not_found("character", character_id))
    }
}
