//! Per-connection state

use serde::{Deserialize, Serialize};

use crate::traits::{AuthRejection, TokenVerifier, UserIdentity};
use crate::value_objects::{ConnectionId, UserId};

/// Connection phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionPhase {
    /// Transport is up, credential not yet verified
    Connecting,
    /// Credential verified; events are accepted
    Connected,
    /// Closed; no further events are accepted
    Disconnected,
}

/// State of a single connection
#[derive(Debug)]
pub struct ConnectionLifecycle {
    connection_id: ConnectionId,
    phase: ConnectionPhase,
    identity: Option<UserIdentity>,
    announced: Option<UserId>,
}

impl ConnectionLifecycle {
    /// Start tracking a new connection
    pub fn new(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            phase: ConnectionPhase::Connecting,
            identity: None,
            announced: None,
        }
    }

    /// Verify the credential presented at connect time.
    ///
    /// Accepts either a bare token or an `Authorization` value with a
    /// `Bearer` scheme (any case). On success the connection becomes
    /// `Connected`; on rejection it stays `Connecting` and the caller must
    /// refuse the connection.
    pub fn authenticate(
        &mut self,
        verifier: &dyn TokenVerifier,
        token: Option<&str>,
    ) -> Result<&UserIdentity, AuthRejection> {
        if self.phase != ConnectionPhase::Connecting {
            return Err(AuthRejection::AlreadyAuthenticated);
        }

        let token = token
            .map(strip_bearer)
            .filter(|t| !t.is_empty())
            .ok_or(AuthRejection::MissingToken)?;
        let identity = verifier.verify(token)?;

        tracing::debug!(
            connection_id = %self.connection_id,
            user_id = %identity.user_id,
            "Connection authenticated"
        );

        self.phase = ConnectionPhase::Connected;
        Ok(self.identity.insert(identity))
    }

    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    /// Identity resolved from the credential
    pub fn identity(&self) -> Option<&UserIdentity> {
        self.identity.as_ref()
    }

    /// User this connection last announced itself as
    pub fn announced_user(&self) -> Option<&UserId> {
        self.announced.as_ref()
    }

    pub(crate) fn set_announced(&mut self, user_id: UserId) {
        self.announced = Some(user_id);
    }

    /// Move to `Disconnected`, returning the previous phase
    pub(crate) fn close(&mut self) -> ConnectionPhase {
        std::mem::replace(&mut self.phase, ConnectionPhase::Disconnected)
    }
}

fn strip_bearer(value: &str) -> &str {
    let value = value.trim();
    if value.eq_ignore_ascii_case("bearer") {
        return "";
    }
    match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ => value,
    }
}
