//! Delivery port
//!
//! The relay decides who gets an event; the transport knows how to reach a
//! connection. Delivery is best effort: a connection that is gone or cannot
//! keep up simply does not receive the event.

use async_trait::async_trait;

use crate::events::OutboundEvent;
use crate::value_objects::ConnectionId;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver an event to one connection. Returns `false` if it was not accepted.
    async fn send_to(&self, connection_id: &ConnectionId, event: &OutboundEvent) -> bool;

    /// Deliver an event to every connection except `except`.
    ///
    /// Returns the number of connections that accepted it.
    async fn broadcast(&self, event: &OutboundEvent, except: Option<&ConnectionId>) -> usize;
}
