//! # estate-core
//!
//! Real-time layer of the marketplace: who is online, and how chat and typing
//! events reach the live connections of their recipients.
//! This crate has zero dependencies on infrastructure (web framework, sockets, etc.).

pub mod error;
pub mod events;
pub mod lifecycle;
pub mod presence;
pub mod relay;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use error::{InvalidEventError, LifecycleError};
pub use events::{
    AnnounceIdentity, ErrorPayload, EventLimits, InboundEvent, MessagePayload, OutboundEvent,
    TypingPayload,
};
pub use lifecycle::{ConnectionLifecycle, ConnectionPhase, Flow, LifecycleConfig, LifecycleHandler};
pub use presence::{InMemoryPresenceRegistry, PresenceEntry, RegistrationPolicy};
pub use relay::{EventRelay, RelayOutcome};
pub use traits::{AuthRejection, PresenceRegistry, TokenVerifier, Transport, UserIdentity};
pub use value_objects::{ConnectionId, UserId};
