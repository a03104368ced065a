//! Error types for the real-time layer

mod event_error;
mod lifecycle_error;

pub use event_error::InvalidEventError;
pub use lifecycle_error::LifecycleError;
