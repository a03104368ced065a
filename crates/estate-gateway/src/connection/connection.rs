//! Individual WebSocket connection
//!
//! The socket itself is owned by its send task; this handle only holds the
//! channel feeding that task.

use estate_core::{ConnectionId, OutboundEvent};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, error::TrySendError};

/// Channel buffer size for outgoing events
pub const OUTBOUND_BUFFER_SIZE: usize = 64;

/// A single WebSocket connection
#[derive(Debug)]
pub struct Connection {
    /// Transport-assigned connection id
    id: ConnectionId,

    /// Channel to the socket's send task
    sender: mpsc::Sender<OutboundEvent>,

    /// Connection creation time
    created_at: Instant,
}

impl Connection {
    /// Create a new connection
    pub fn new(id: ConnectionId, sender: mpsc::Sender<OutboundEvent>) -> Arc<Self> {
        Arc::new(Self {
            id,
            sender,
            created_at: Instant::now(),
        })
    }

    /// Get the connection ID
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Queue an event for the socket without waiting.
    ///
    /// Returns `false` if the buffer is full or the send task has gone away.
    pub fn send(&self, event: OutboundEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::warn!(
                    connection_id = %self.id,
                    event = event.name(),
                    "Outbound buffer full, dropping event"
                );
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// How long the connection has been open
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}
