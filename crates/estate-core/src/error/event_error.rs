//! Rejections of inbound events at the boundary

use thiserror::Error;

/// An inbound frame that cannot be turned into a typed event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidEventError {
    #[error("Malformed event: {0}")]
    Malformed(String),

    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Event {0} requires a data payload")]
    MissingData(&'static str),

    #[error("Invalid {event} payload: {reason}")]
    InvalidPayload { event: &'static str, reason: String },

    #[error("Message content too long: max {max} characters")]
    ContentTooLong { max: usize },

    #[error("Binary frames are not supported")]
    UnsupportedFrame,
}

impl InvalidEventError {
    /// Get an error code string for client responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "MALFORMED_EVENT",
            Self::UnknownEvent(_) => "UNKNOWN_EVENT",
            Self::MissingData(_) | Self::InvalidPayload { .. } => "INVALID_PAYLOAD",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::UnsupportedFrame => "UNSUPPORTED_FRAME",
        }
    }
}
