//! Authentication verifier port
//!
//! Token issuance and validation belong to the marketplace backend. The gateway
//! only needs to turn a bearer credential into a user identity or refuse it.

use thiserror::Error;

use crate::value_objects::UserId;

/// Identity resolved from a verified credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: UserId,
}

impl UserIdentity {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Reasons a connection is refused at connect time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthRejection {
    #[error("Missing authentication")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Connection already authenticated")]
    AlreadyAuthenticated,
}

impl AuthRejection {
    /// Get an error code string for client responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "MISSING_AUTH",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::AlreadyAuthenticated => "ALREADY_AUTHENTICATED",
        }
    }
}

/// Verifies a bearer credential presented when a connection opens
pub trait TokenVerifier: Send + Sync {
    /// Resolve the credential to a user identity, or reject it
    fn verify(&self, token: &str) -> Result<UserIdentity, AuthRejection>;
}
