//! Connection manager
//!
//! Manages all active WebSocket connections using DashMap for thread-safe access.

use super::Connection;
use async_trait::async_trait;
use dashmap::DashMap;
use estate_core::{ConnectionId, OutboundEvent, Transport};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Manages all active WebSocket connections
///
/// Acts as the relay's transport: events addressed to a connection id are
/// pushed onto that connection's outbound channel.
pub struct ConnectionManager {
    /// Active connections by connection ID
    connections: DashMap<ConnectionId, Arc<Connection>>,
}

impl ConnectionManager {
    /// Create a new connection manager
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Create a new connection manager wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a new connection
    pub fn add_connection(
        &self,
        connection_id: ConnectionId,
        sender: mpsc::Sender<OutboundEvent>,
    ) -> Arc<Connection> {
        let connection = Connection::new(connection_id.clone(), sender);
        self.connections.insert(connection_id.clone(), connection.clone());

        tracing::debug!(connection_id = %connection_id, "Connection added");

        connection
    }

    /// Remove a connection
    pub fn remove_connection(&self, connection_id: &ConnectionId) -> Option<Arc<Connection>> {
        let removed = self.connections.remove(connection_id).map(|(_, conn)| conn);

        if let Some(conn) = &removed {
            tracing::debug!(
                connection_id = %connection_id,
                open_ms = conn.age().as_millis(),
                "Connection removed"
            );
        }

        removed
    }

    /// Get a connection by ID
    pub fn get_connection(&self, connection_id: &ConnectionId) -> Option<Arc<Connection>> {
        self.connections.get(connection_id).map(|r| r.clone())
    }

    /// Get the total number of active connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Snapshot of the live connection handles.
    ///
    /// Collected first so no shard lock is held while sending.
    fn live_connections(&self) -> Vec<Arc<Connection>> {
        self.connections.iter().map(|r| r.value().clone()).collect()
    }
}

#[async_trait]
impl Transport for ConnectionManager {
    async fn send_to(&self, connection_id: &ConnectionId, event: &OutboundEvent) -> bool {
        match self.get_connection(connection_id) {
            Some(conn) => conn.send(event.clone()),
            None => false,
        }
    }

    async fn broadcast(&self, event: &OutboundEvent, except: Option<&ConnectionId>) -> usize {
        let mut sent = 0;

        for conn in self.live_connections() {
            if except == Some(conn.id()) {
                continue;
            }
            if conn.send(event.clone()) {
                sent += 1;
            }
        }

        tracing::trace!(event = event.name(), sent = sent, "Event broadcast");

        sent
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connections", &self.connections.len())
            .finish()
    }
}
