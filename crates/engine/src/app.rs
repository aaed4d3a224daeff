//! Application state and composition.

use std::sync::Arc;

use rand::rngs::StdRng;
use tokio::sync::Mutex;

use crate::infrastructure::ports::{CatalogStore, CharacterStore, ClockPort};
use crate::services::{InstanceRegistry, MatchmakingQueue};

/// Main application state.
///
/// Holds the session services and their collaborator ports. Passed to
/// HTTP/WebSocket handlers via Axum state.
pub struct App {
    pub registry: Arc<InstanceRegistry>,
    pub matchmaking: Arc<MatchmakingQueue>,
    pub characters: Arc<dyn CharacterStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub clock: Arc<dyn ClockPort>,
}

impl App {
    pub fn new(
        characters: Arc<dyn CharacterStore>,
        catalog: Arc<dyn CatalogStore>,
        clock: Arc<dyn ClockPort>,
        rng: Arc<Mutex<StdRng>>,
    ) -> Self {
        let registry = Arc::new(InstanceRegistry::new(
            characters.clone(),
            catalog.clone(),
            clock.clone(),
            rng.clone(),
        ));
        let matchmaking = Arc::new(MatchmakingQueue::new(
            characters.clone(),
            registry.clone(),
            clock.clone(),
            rng,
        ));
        Self {
            registry,
            matchmaking,
            characters,
            catalog,
            clock,
        }
    }
}
