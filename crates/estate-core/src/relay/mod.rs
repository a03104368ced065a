//! Event relay
//!
//! Forwards events from their origin connection to the live connections of
//! their recipients. Best effort: a recipient that is offline, or whose
//! connection does not accept the event, simply misses it. Offline delivery
//! is the job of the persisted conversation store.

mod outcome;

pub use outcome::RelayOutcome;

use std::sync::Arc;

use crate::events::{MessagePayload, OutboundEvent, TypingPayload};
use crate::traits::{PresenceRegistry, Transport};
use crate::value_objects::ConnectionId;

/// Routes events between connections using the presence registry
#[derive(Clone)]
pub struct EventRelay {
    registry: Arc<dyn PresenceRegistry>,
    transport: Arc<dyn Transport>,
}

impl EventRelay {
    pub fn new(registry: Arc<dyn PresenceRegistry>, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// The registry this relay resolves recipients against
    pub fn registry(&self) -> &Arc<dyn PresenceRegistry> {
        &self.registry
    }

    /// Deliver a message to every online participant except the sender
    pub async fn relay_message(&self, message: &MessagePayload) -> RelayOutcome {
        let recipients = message.recipients();
        let targets = self.registry.find_by_user_ids(&recipients).await;

        let event = OutboundEvent::MessageDelivered(message.clone());
        let mut delivered = 0;

        for target in &targets {
            if self.transport.send_to(&target.connection_id, &event).await {
                delivered += 1;
            } else {
                tracing::debug!(
                    user_id = %target.user_id,
                    connection_id = %target.connection_id,
                    "Connection did not accept message"
                );
            }
        }

        let outcome = RelayOutcome::new(recipients.len(), delivered);

        tracing::debug!(
            conversation_id = %message.conversation_id,
            sender_id = %message.sender_id,
            recipients = outcome.recipients,
            delivered = outcome.delivered,
            "Message relayed"
        );

        outcome
    }

    /// Tell every other connection that the sender started typing
    pub async fn relay_typing(&self, origin: &ConnectionId, payload: &TypingPayload) -> usize {
        // Typing is not scoped to conversation participants: every other
        // connection receives it.
        let sent = self
            .transport
            .broadcast(&OutboundEvent::UserTyping(payload.clone()), Some(origin))
            .await;

        tracing::trace!(
            conversation_id = %payload.conversation_id,
            sender_id = %payload.sender_id,
            sent = sent,
            "Typing broadcast"
        );

        sent
    }

    /// Tell every other connection that the sender stopped typing
    pub async fn relay_stop_typing(&self, origin: &ConnectionId, payload: &TypingPayload) -> usize {
        let sent = self
            .transport
            .broadcast(&OutboundEvent::UserStopTyping(payload.clone()), Some(origin))
            .await;

        tracing::trace!(
            conversation_id = %payload.conversation_id,
            sender_id = %payload.sender_id,
            sent = sent,
            "Stop-typing broadcast"
        );

        sent
    }

    /// Send the current presence snapshot to every connection except `except`
    pub async fn broadcast_presence(&self, except: Option<&ConnectionId>) -> usize {
        let snapshot = self.registry.list_all().await;
        let online = snapshot.len();

        let sent = self
            .transport
            .broadcast(&OutboundEvent::PresenceSnapshot(snapshot), except)
            .await;

        tracing::debug!(online = online, sent = sent, "Presence snapshot broadcast");

        sent
    }

    /// Send an event to a single connection
    pub async fn send_to(&self, connection_id: &ConnectionId, event: &OutboundEvent) -> bool {
        self.transport.send_to(connection_id, event).await
    }
}

impl std::fmt::Debug for EventRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRelay").finish_non_exhaustive()
    }
}
