//! Ports - the capabilities the real-time layer consumes
//!
//! The domain defines what it needs; the gateway and the shared
//! infrastructure crate provide the implementations.

mod auth;
mod registry;
mod transport;

pub use auth::{AuthRejection, TokenVerifier, UserIdentity};
pub use registry::PresenceRegistry;
pub use transport::Transport;
