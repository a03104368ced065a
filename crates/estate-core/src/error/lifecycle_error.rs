//! Errors raised while a connection processes an event

use thiserror::Error;

use super::InvalidEventError;
use crate::value_objects::UserId;

/// Why an event from a connection was not processed.
///
/// None of these are fatal: the connection stays open and the error is
/// reported back to it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    InvalidEvent(#[from] InvalidEventError),

    #[error("Identity mismatch: connection is authenticated as {authenticated}, event claims {claimed}")]
    IdentityMismatch { authenticated: UserId, claimed: String },

    #[error("Connection is not authenticated")]
    NotAuthenticated,

    #[error("Connection is disconnected")]
    Disconnected,
}

impl LifecycleError {
    /// Get an error code string for client responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidEvent(e) => e.code(),
            Self::IdentityMismatch { .. } => "IDENTITY_MISMATCH",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::Disconnected => "DISCONNECTED",
        }
    }
}
