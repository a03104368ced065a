//! Presence - the in-memory online-user registry

mod entry;
mod in_memory;
mod policy;

pub use entry::PresenceEntry;
pub use in_memory::InMemoryPresenceRegistry;
pub use policy::{ParsePolicyError, RegistrationPolicy};
