//! Wire events
//!
//! Every frame is a JSON object `{ "event": <name>, "data": <payload> }`.
//! Inbound frames are validated into a closed set of typed events before
//! anything acts on them.

mod inbound;
mod outbound;
mod payloads;

pub use inbound::InboundEvent;
pub use outbound::{ErrorPayload, OutboundEvent};
pub use payloads::{AnnounceIdentity, MessagePayload, TypingPayload};

/// Default upper bound on message content, in characters
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 4000;

/// Limits applied when validating inbound events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventLimits {
    pub max_content_length: usize,
}

impl Default for EventLimits {
    fn default() -> Self {
        Self {
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
        }
    }
}
