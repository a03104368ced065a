//! Event payloads shared by inbound and outbound events

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use crate::value_objects::UserId;

/// Payload of `announceIdentity`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnnounceIdentity {
    #[validate(custom(function = "not_blank"))]
    pub user_id: String,
}

/// A chat message between conversation participants.
///
/// The message has already been persisted by the marketplace backend; this
/// payload only carries it to whoever is online.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    #[validate(custom(function = "not_blank"))]
    pub conversation_id: String,

    #[validate(custom(function = "not_blank"))]
    pub sender_id: String,

    #[validate(custom(function = "not_blank"))]
    pub content: String,

    #[validate(
        length(min = 1, message = "must not be empty"),
        custom(function = "none_blank")
    )]
    pub participants: Vec<String>,
}

impl MessagePayload {
    /// Participants other than the sender, deduplicated, in order
    pub fn recipients(&self) -> Vec<UserId> {
        let mut recipients: Vec<UserId> = Vec::with_capacity(self.participants.len());
        for participant in &self.participants {
            if participant != &self.sender_id && !recipients.iter().any(|r| r == participant.as_str()) {
                recipients.push(UserId::new(participant.clone()));
            }
        }
        recipients
    }
}

/// Payload of `typing` / `stopTyping` and their outbound counterparts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    #[validate(custom(function = "not_blank"))]
    pub conversation_id: String,

    #[validate(custom(function = "not_blank"))]
    pub sender_id: String,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some(Cow::Borrowed("must not be blank"));
        return Err(err);
    }
    Ok(())
}

fn none_blank(values: &[String]) -> Result<(), ValidationError> {
    if values.iter().any(|v| v.trim().is_empty()) {
        let mut err = ValidationError::new("blank");
        err.message = Some(Cow::Borrowed("must not contain blank ids"));
        return Err(err);
    }
    Ok(())
}
