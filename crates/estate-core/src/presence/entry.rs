//! Presence entry

use serde::{Deserialize, Serialize};

use crate::value_objects::{ConnectionId, UserId};

/// A user that is online, and the connection it is reachable through
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEntry {
    pub user_id: UserId,
    pub connection_id: ConnectionId,
}

impl PresenceEntry {
    pub fn new(user_id: impl Into<UserId>, connection_id: impl Into<ConnectionId>) -> Self {
        Self {
            user_id: user_id.into(),
            connection_id: connection_id.into(),
        }
    }
}
