//! Presence registry port

use async_trait::async_trait;

use crate::presence::PresenceEntry;
use crate::value_objects::{ConnectionId, UserId};

/// Tracks which users currently have a live connection, and through which one.
///
/// Implementations own their state; one registry is constructed per gateway
/// instance and shared by the relay and the lifecycle handler.
#[async_trait]
pub trait PresenceRegistry: Send + Sync {
    /// Record that `user_id` is reachable through `connection_id`.
    ///
    /// Returns `true` if the registry changed.
    async fn register(&self, user_id: UserId, connection_id: ConnectionId) -> bool;

    /// Drop the entry bound to `connection_id`, if any
    async fn unregister(&self, connection_id: &ConnectionId) -> Option<PresenceEntry>;

    /// Ordered snapshot of every entry
    async fn list_all(&self) -> Vec<PresenceEntry>;

    /// Entries whose user is in `user_ids`, in registry order
    async fn find_by_user_ids(&self, user_ids: &[UserId]) -> Vec<PresenceEntry>;

    /// Number of online users
    async fn len(&self) -> usize;

    /// Whether nobody is online
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
