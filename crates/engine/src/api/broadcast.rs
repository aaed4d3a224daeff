//! Event fan-out to connected clients.
//!
//! Delivery is per-connection `try_send`: a slow client with a full queue is
//! logged and skipped, never blocking delivery to the rest. A closed channel
//! means the reader is gone, so the connection is unregistered instead of
//! being retried on every future broadcast.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use emberfall_domain::{CharacterId, ConnectionId, InstanceId, Position};
use emberfall_protocol::ServerMessage;

use crate::api::connections::ConnectionManager;
use crate::services::InstanceRegistry;

/// Who an event is addressed to.
#[derive(Debug, Clone)]
pub enum Scope {
    /// Every connected client.
    Global,
    /// Current participants of a dungeon instance.
    Instance(InstanceId),
    /// Clients whose bound position is within `radius` (Manhattan) of the
    /// origin, on the same map.
    Area { origin: Position, radius: i64 },
    /// One character.
    Direct(CharacterId),
}

pub struct SessionBroadcaster {
    connections: Arc<ConnectionManager>,
    registry: Arc<InstanceRegistry>,
}

impl SessionBroadcaster {
    pub fn new(connections: Arc<ConnectionManager>, registry: Arc<InstanceRegistry>) -> Self {
        Self {
            connections,
            registry,
        }
    }

    /// Deliver a message to every connection the scope selects.
    pub async fn publish(&self, message: ServerMessage, scope: Scope) {
        self.publish_except(message, scope, None).await;
    }

    /// Deliver a message to the scope, skipping `except` (the usual sender
    /// exclusion for area broadcasts).
    pub async fn publish_except(
        &self,
        message: ServerMessage,
        scope: Scope,
        except: Option<CharacterId>,
    ) {
        let mut dead: Vec<ConnectionId> = Vec::new();
        match scope {
            Scope::Global => {
                for (info, sender) in self.connections.snapshot().await {
                    if except.is_some() && info.character_id == except {
                        continue;
                    }
                    if !Self::deliver(&info.connection_id, &sender, &message) {
                        dead.push(info.connection_id);
                    }
                }
            }
            Scope::Instance(instance_id) => {
                let participants = match self.registry.participants(instance_id).await {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::debug!(
                            instance_id = %instance_id,
                            error = %e,
                            "Skipping instance broadcast"
                        );
                        return;
                    }
                };
                for participant in participants {
                    if Some(participant) == except {
                        continue;
                    }
                    if let Some(sender) = self.connections.sender_of(participant).await {
                        if !Self::deliver_direct(participant, &sender, &message) {
                            if let Some(conn) = self.connections.connection_of(participant) {
                                dead.push(conn);
                            }
                        }
                    }
                }
            }
            Scope::Area { origin, radius } => {
                for (info, sender) in self.connections.snapshot().await {
                    if info.character_id.is_none() || info.character_id == except {
                        continue;
                    }
                    let in_range = info
                        .position
                        .as_ref()
                        .and_then(|p| p.distance(&origin))
                        .is_some_and(|d| d <= radius);
                    if in_range && !Self::deliver(&info.connection_id, &sender, &message) {
                        dead.push(info.connection_id);
                    }
                }
            }
            Scope::Direct(character_id) => {
                if let Some(sender) = self.connections.sender_of(character_id).await {
                    if !Self::deliver_direct(character_id, &sender, &message) {
                        if let Some(conn) = self.connections.connection_of(character_id) {
                            dead.push(conn);
                        }
                    }
                }
            }
        }

        for connection_id in dead {
            tracing::warn!(
                connection_id = %connection_id,
                "Dropping connection with a closed channel"
            );
            self.connections.unregister(connection_id).await;
        }
    }

    /// `try_send` delivery. Returns `false` when the channel is closed and
    /// the connection should be dropped.
    fn deliver(
        connection_id: &ConnectionId,
        sender: &mpsc::Sender<ServerMessage>,
        message: &ServerMessage,
    ) -> bool {
        match sender.try_send(message.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    "Client queue full, dropping message"
                );
                true
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!(connection_id = %connection_id, "Client channel closed");
                false
            }
        }
    }

    fn deliver_direct(
        character_id: CharacterId,
        sender: &mpsc::Sender<ServerMessage>,
        message: &ServerMessage,
    ) -> bool {
        match sender.try_send(message.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(
                    character_id = %character_id,
                    "Client queue full, dropping message"
                );
                true
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!(character_id = %character_id, "Client channel closed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tokio::sync::Mutex;

    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::memory::{MemoryCatalog, MemoryCharacterStore};

    fn broadcaster_with(connections: Arc<ConnectionManager>) -> SessionBroadcaster {
        let registry = Arc::new(InstanceRegistry::new(
            Arc::new(MemoryCharacterStore::new()),
            Arc::new(MemoryCatalog::new()),
            Arc::new(FixedClock(
                Utc.timestamp_opt(1_700_000_000, 0).single().unwrap(),
            )),
            Arc::new(Mutex::new(StdRng::seed_from_u64(1))),
        ));
        SessionBroadcaster::new(connections, registry)
    }

    #[tokio::test]
    async fn closed_channels_are_unregistered_on_broadcast() {
        let connections = Arc::new(ConnectionManager::new());
        let broadcaster = broadcaster_with(connections.clone());

        let live = ConnectionId::new();
        let gone = ConnectionId::new();
        let (live_tx, mut live_rx) = mpsc::channel(8);
        let (gone_tx, gone_rx) = mpsc::channel(8);
        connections.register(live, "live-user".into(), live_tx).await;
        connections.register(gone, "gone-user".into(), gone_tx).await;
        drop(gone_rx);

        for _ in 0..3 {
            broadcaster
                .publish(ServerMessage::Pong, Scope::Global)
                .await;
        }

        for _ in 0..3 {
            assert!(matches!(live_rx.try_recv(), Ok(ServerMessage::Pong)));
        }
        assert!(connections.get(live).await.is_some());
        assert!(connections.get(gone).await.is_none());
    }

    #[tokio::test]
    async fn full_queues_drop_the_message_but_keep_the_connection() {
        let connections = Arc::new(ConnectionManager::new());
        let broadcaster = broadcaster_with(connections.clone());

        let slow = ConnectionId::new();
        let (slow_tx, _slow_rx) = mpsc::channel(1);
        connections.register(slow, "slow-user".into(), slow_tx).await;

        broadcaster
            .publish(ServerMessage::Pong, Scope::Global)
            .await;
        broadcaster
            .publish(ServerMessage::Pong, Scope::Global)
            .await;

        assert!(connections.get(slow).await.is_some());
    }
}
