//! Inbound events (client to gateway)

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::{AnnounceIdentity, EventLimits, MessagePayload, TypingPayload};
use crate::error::InvalidEventError;

/// Every event a client may send
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum InboundEvent {
    /// Bind this connection to a user and make it visible in presence
    AnnounceIdentity(AnnounceIdentity),
    /// Relay a chat message to the other online participants
    SendMessage(MessagePayload),
    /// Sender started typing
    Typing(TypingPayload),
    /// Sender stopped typing
    StopTyping(TypingPayload),
    /// Client is leaving
    Disconnect,
}

/// Untyped frame, used to report precise errors before typing the payload
#[derive(Debug, Deserialize)]
struct RawFrame {
    event: String,
    #[serde(default)]
    data: Option<Value>,
}

impl InboundEvent {
    pub const ANNOUNCE_IDENTITY: &'static str = "announceIdentity";
    pub const SEND_MESSAGE: &'static str = "sendMessage";
    pub const TYPING: &'static str = "typing";
    pub const STOP_TYPING: &'static str = "stopTyping";
    pub const DISCONNECT: &'static str = "disconnect";

    /// Parse and validate a text frame
    pub fn parse(text: &str, limits: &EventLimits) -> Result<Self, InvalidEventError> {
        let raw: RawFrame =
            serde_json::from_str(text).map_err(|e| InvalidEventError::Malformed(e.to_string()))?;

        let event = match raw.event.as_str() {
            Self::ANNOUNCE_IDENTITY => {
                Self::AnnounceIdentity(typed_payload(Self::ANNOUNCE_IDENTITY, raw.data)?)
            }
            Self::SEND_MESSAGE => {
                let message: MessagePayload = typed_payload(Self::SEND_MESSAGE, raw.data)?;
                if message.content.chars().count() > limits.max_content_length {
                    return Err(InvalidEventError::ContentTooLong {
                        max: limits.max_content_length,
                    });
                }
                Self::SendMessage(message)
            }
            Self::TYPING => Self::Typing(typed_payload(Self::TYPING, raw.data)?),
            Self::STOP_TYPING => Self::StopTyping(typed_payload(Self::STOP_TYPING, raw.data)?),
            Self::DISCONNECT => Self::Disconnect,
            other => return Err(InvalidEventError::UnknownEvent(other.to_string())),
        };

        Ok(event)
    }

    /// Wire name of the event
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AnnounceIdentity(_) => Self::ANNOUNCE_IDENTITY,
            Self::SendMessage(_) => Self::SEND_MESSAGE,
            Self::Typing(_) => Self::TYPING,
            Self::StopTyping(_) => Self::STOP_TYPING,
            Self::Disconnect => Self::DISCONNECT,
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn typed_payload<T>(event: &'static str, data: Option<Value>) -> Result<T, InvalidEventError>
where
    T: DeserializeOwned + Validate,
{
    let data = data
        .filter(|d| !d.is_null())
        .ok_or(InvalidEventError::MissingData(event))?;

    let payload: T = serde_json::from_value(data).map_err(|e| InvalidEventError::InvalidPayload {
        event,
        reason: e.to_string(),
    })?;

    payload.validate().map_err(|e| InvalidEventError::InvalidPayload {
        event,
        reason: e.to_string(),
    })?;

    Ok(payload)
}
