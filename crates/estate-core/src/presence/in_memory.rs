//! Process-local presence registry
//!
//! State lives in this process only and is lost on restart. Running more than
//! one gateway instance needs a shared `PresenceRegistry` implementation.

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{PresenceEntry, RegistrationPolicy};
use crate::traits::PresenceRegistry;
use crate::value_objects::{ConnectionId, UserId};

/// Ordered in-memory registry.
///
/// Entries keep registration order so presence snapshots are stable. Every
/// operation takes the lock once and runs to completion.
#[derive(Debug, Default)]
pub struct InMemoryPresenceRegistry {
    policy: RegistrationPolicy,
    entries: RwLock<Vec<PresenceEntry>>,
}

impl InMemoryPresenceRegistry {
    /// Create an empty registry with the given policy
    #[must_use]
    pub fn new(policy: RegistrationPolicy) -> Self {
        Self {
            policy,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// The policy applied on duplicate registration
    pub fn policy(&self) -> RegistrationPolicy {
        self.policy
    }
}

#[async_trait]
impl PresenceRegistry for InMemoryPresenceRegistry {
    async fn register(&self, user_id: UserId, connection_id: ConnectionId) -> bool {
        let mut entries = self.entries.write();

        if let Some(existing) = entries.iter().find(|e| e.user_id == user_id) {
            if self.policy == RegistrationPolicy::KeepFirst
                || existing.connection_id == connection_id
            {
                tracing::trace!(
                    user_id = %user_id,
                    connection_id = %connection_id,
                    kept = %existing.connection_id,
                    "Registration left existing entry in place"
                );
                return false;
            }

            // A connection speaks for one user at a time
            entries.retain(|e| e.user_id == user_id || e.connection_id != connection_id);
            if let Some(existing) = entries.iter_mut().find(|e| e.user_id == user_id) {
                tracing::debug!(
                    user_id = %user_id,
                    old_connection_id = %existing.connection_id,
                    connection_id = %connection_id,
                    "Presence entry replaced"
                );
                existing.connection_id = connection_id;
            }
            return true;
        }

        entries.retain(|e| e.connection_id != connection_id);
        tracing::debug!(user_id = %user_id, connection_id = %connection_id, "Presence entry added");
        entries.push(PresenceEntry {
            user_id,
            connection_id,
        });

        true
    }

    async fn unregister(&self, connection_id: &ConnectionId) -> Option<PresenceEntry> {
        let mut entries = self.entries.write();
        let position = entries.iter().position(|e| &e.connection_id == connection_id)?;
        let removed = entries.remove(position);

        tracing::debug!(
            user_id = %removed.user_id,
            connection_id = %connection_id,
            "Presence entry removed"
        );

        Some(removed)
    }

    async fn list_all(&self) -> Vec<PresenceEntry> {
        self.entries.read().clone()
    }

    async fn find_by_user_ids(&self, user_ids: &[UserId]) -> Vec<PresenceEntry> {
        self.entries
            .read()
            .iter()
            .filter(|e| user_ids.contains(&e.user_id))
            .cloned()
            .collect()
    }

    async fn len(&self) -> usize {
        self.entries.read().len()
    }
}
