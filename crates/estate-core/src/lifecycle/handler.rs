//! Lifecycle handler
//!
//! Reacts to inbound events on a connected socket: presence changes are
//! followed by a snapshot broadcast, chat and typing events go through the
//! relay.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{InvalidEventError, LifecycleError};
use crate::events::{EventLimits, InboundEvent};
use crate::relay::EventRelay;
use crate::traits::UserIdentity;
use crate::value_objects::UserId;

use super::{ConnectionLifecycle, ConnectionPhase};

/// What the transport should do after an event was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading from the connection
    Continue,
    /// The client asked to leave; close the connection
    Close,
}

/// Behaviour switches for the lifecycle handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Require announced user ids and sender ids to match the verified identity
    pub strict_identity: bool,
    /// Validation limits for inbound events
    pub limits: EventLimits,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            strict_identity: true,
            limits: EventLimits::default(),
        }
    }
}

/// Shared handler driving every connection's lifecycle
///
/// Presence changes are serialized: a registry change and the snapshot
/// broadcast that follows it happen under one gate, so every connection
/// receives snapshots in the order the registry changed.
#[derive(Debug, Clone)]
pub struct LifecycleHandler {
    relay: EventRelay,
    config: LifecycleConfig,
    presence_gate: Arc<Mutex<()>>,
}

impl LifecycleHandler {
    pub fn new(relay: EventRelay, config: LifecycleConfig) -> Self {
        Self {
            relay,
            config,
            presence_gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn relay(&self) -> &EventRelay {
        &self.relay
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Parse a text frame and handle the resulting event
    pub async fn handle_frame(
        &self,
        connection: &mut ConnectionLifecycle,
        text: &str,
    ) -> Result<Flow, LifecycleError> {
        ensure_connected(connection)?;
        let event = InboundEvent::parse(text, &self.config.limits)?;
        self.handle_event(connection, event).await
    }

    /// Handle a binary frame, which the protocol does not use
    pub fn reject_binary(&self, connection: &ConnectionLifecycle) -> LifecycleError {
        match ensure_connected(connection) {
            Ok(_) => LifecycleError::from(InvalidEventError::UnsupportedFrame),
            Err(e) => e,
        }
    }

    /// Handle a typed inbound event
    pub async fn handle_event(
        &self,
        connection: &mut ConnectionLifecycle,
        event: InboundEvent,
    ) -> Result<Flow, LifecycleError> {
        let identity = ensure_connected(connection)?;

        tracing::trace!(
            connection_id = %connection.connection_id(),
            event = event.name(),
            "Handling event"
        );

        match event {
            InboundEvent::AnnounceIdentity(payload) => {
                self.check_identity(identity, &payload.user_id)?;
                let user_id = UserId::new(payload.user_id);

                let _gate = self.presence_gate.lock().await;
                self.relay
                    .registry()
                    .register(user_id.clone(), connection.connection_id().clone())
                    .await;

                tracing::info!(
                    connection_id = %connection.connection_id(),
                    user_id = %user_id,
                    "User announced"
                );

                connection.set_announced(user_id);
                self.relay.broadcast_presence(None).await;
                Ok(Flow::Continue)
            }
            InboundEvent::SendMessage(message) => {
                self.check_identity(identity, &message.sender_id)?;
                self.relay.relay_message(&message).await;
                Ok(Flow::Continue)
            }
            InboundEvent::Typing(payload) => {
                self.check_identity(identity, &payload.sender_id)?;
                self.relay
                    .relay_typing(connection.connection_id(), &payload)
                    .await;
                Ok(Flow::Continue)
            }
            InboundEvent::StopTyping(payload) => {
                self.check_identity(identity, &payload.sender_id)?;
                self.relay
                    .relay_stop_typing(connection.connection_id(), &payload)
                    .await;
                Ok(Flow::Continue)
            }
            InboundEvent::Disconnect => {
                self.disconnect(connection).await;
                Ok(Flow::Close)
            }
        }
    }

    /// Tear down a connection: drop its presence entry and tell everyone else.
    ///
    /// Safe to call more than once; only the first call has an effect.
    pub async fn disconnect(&self, connection: &mut ConnectionLifecycle) {
        let previous = connection.close();
        if previous != ConnectionPhase::Connected {
            return;
        }

        let connection_id = connection.connection_id();
        let _gate = self.presence_gate.lock().await;
        match self.relay.registry().unregister(connection_id).await {
            Some(entry) => tracing::info!(
                connection_id = %connection_id,
                user_id = %entry.user_id,
                "User went offline"
            ),
            None => tracing::debug!(connection_id = %connection_id, "Connection closed"),
        }

        self.relay.broadcast_presence(Some(connection_id)).await;
    }

    fn check_identity(&self, identity: UserIdentity, claimed: &str) -> Result<(), LifecycleError> {
        if self.config.strict_identity && identity.user_id != *claimed {
            return Err(LifecycleError::IdentityMismatch {
                authenticated: identity.user_id,
                claimed: claimed.to_string(),
            });
        }
        Ok(())
    }
}

fn ensure_connected(connection: &ConnectionLifecycle) -> Result<UserIdentity, LifecycleError> {
    match connection.phase() {
        ConnectionPhase::Connecting => Err(LifecycleError::NotAuthenticated),
        ConnectionPhase::Disconnected => Err(LifecycleError::Disconnected),
        ConnectionPhase::Connected => connection
            .identity()
            .cloned()
            .ok_or(LifecycleError::NotAuthenticated),
    }
}
