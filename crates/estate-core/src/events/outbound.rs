//! Outbound events (gateway to client)

use serde::{Deserialize, Serialize};

use super::{MessagePayload, TypingPayload};
use crate::error::LifecycleError;
use crate::presence::PresenceEntry;

/// Every event the gateway sends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum OutboundEvent {
    /// Full, ordered list of who is online
    PresenceSnapshot(Vec<PresenceEntry>),
    /// A message from another participant
    MessageDelivered(MessagePayload),
    /// Someone started typing
    UserTyping(TypingPayload),
    /// Someone stopped typing
    UserStopTyping(TypingPayload),
    /// An event from this connection was rejected
    Error(ErrorPayload),
}

/// Error report sent back to the originating connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

impl From<&LifecycleError> for ErrorPayload {
    fn from(err: &LifecycleError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl OutboundEvent {
    /// Build an error event from a lifecycle error
    #[must_use]
    pub fn error(err: &LifecycleError) -> Self {
        Self::Error(ErrorPayload::from(err))
    }

    /// Wire name of the event
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PresenceSnapshot(_) => "presenceSnapshot",
            Self::MessageDelivered(_) => "messageDelivered",
            Self::UserTyping(_) => "userTyping",
            Self::UserStopTyping(_) => "userStopTyping",
            Self::Error(_) => "error",
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
