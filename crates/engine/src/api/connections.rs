//! Connection management for WebSocket clients.
//!
//! Tracks connected clients, their bound characters, and last reported
//! positions. The character index gives the broadcaster O(1) direct
//! delivery.

use std::collections::HashMap;

use dashmap::DashMap;
use tokio::sync::{mpsc, RwLock};

use emberfall_domain::{CharacterId, ConnectionId, Position};
use emberfall_protocol::ServerMessage;

/// Information about a connected client.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub connection_id: ConnectionId,
    /// User identity from the upgrade token.
    pub user_id: String,
    /// The character bound by SELECT_CHARACTER, if any.
    pub character_id: Option<CharacterId>,
    /// Last position reported over this connection.
    pub position: Option<Position>,
}

/// Manages all active WebSocket connections.
pub struct ConnectionManager {
    /// Map of connection_id -> (ConnectionInfo, sender channel)
    connections: RwLock<HashMap<ConnectionId, (ConnectionInfo, mpsc::Sender<ServerMessage>)>>,
    /// Character -> connection index for direct delivery.
    by_character: DashMap<CharacterId, ConnectionId>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            by_character: DashMap::new(),
        }
    }

    /// Register a new connection.
    pub async fn register(
        &self,
        connection_id: ConnectionId,
        user_id: String,
        sender: mpsc::Sender<ServerMessage>,
    ) {
        let info = ConnectionInfo {
            connection_id,
            user_id,
            character_id: None,
            position: None,
        };
        let mut connections = self.connections.write().await;
        connections.insert(connection_id, (info, sender));
        tracing::debug!(connection_id = %connection_id, "Connection registered");
    }

    /// Unregister a connection, returning its final info so disconnect
    /// cleanup runs exactly once with the bound character.
    pub async fn unregister(&self, connection_id: ConnectionId) -> Option<ConnectionInfo> {
        let removed = {
            let mut connections = self.connections.write().await;
            connections.remove(&connection_id).map(|(info, _)| info)
        };
        if let Some(info) = &removed {
            if let Some(character_id) = info.character_id {
                self.by_character
                    .remove_if(&character_id, |_, conn| *conn == connection_id);
            }
            tracing::debug!(connection_id = %connection_id, "Connection unregistered");
        }
        removed
    }

    /// Get connection info by ID.
    pub async fn get(&self, connection_id: ConnectionId) -> Option<ConnectionInfo> {
        let connections = self.connections.read().await;
        connections
            .get(&connection_id)
            .map(|(info, _)| info.clone())
    }

    /// Bind a character to a connection, replacing any stale binding the
    /// character held on another connection.
    pub async fn bind_character(
        &self,
        connection_id: ConnectionId,
        character_id: CharacterId,
        position: Position,
    ) {
        let mut connections = self.connections.write().await;
        if let Some((info, _)) = connections.get_mut(&connection_id) {
            info.character_id = Some(character_id);
            info.position = Some(position);
            self.by_character.insert(character_id, connection_id);
            tracing::info!(
                connection_id = %connection_id,
                character_id = %character_id,
                "Character bound to connection"
            );
        }
    }

    /// Update a connection's last reported position.
    pub async fn update_position(&self, connection_id: ConnectionId, position: Position) {
        let mut connections = self.connections.write().await;
        if let Some((info, _)) = connections.get_mut(&connection_id) {
            info.position = Some(position);
        }
    }

    /// The connection a character is bound to.
    pub fn connection_of(&self, character_id: CharacterId) -> Option<ConnectionId> {
        self.by_character.get(&character_id).map(|e| *e.value())
    }

    /// Snapshot of every connection and its sender, for the broadcaster.
    pub async fn snapshot(&self) -> Vec<(ConnectionInfo, mpsc::Sender<ServerMessage>)> {
        let connections = self.connections.read().await;
        connections
            .values()
            .map(|(info, sender)| (info.clone(), sender.clone()))
            .collect()
    }

    /// Sender for a specific character, if connected.
    pub async fn sender_of(
        &self,
        character_id: CharacterId,
    ) -> Option<mpsc::Sender<ServerMessage>> {
        let connection_id = self.connection_of(character_id)?;
        let connections = self.connections.read().await;
        connections.get(&connection_id).map(|(_, s)| s.clone())
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
