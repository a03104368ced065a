//! Value objects - identifiers used across the real-time layer

mod ids;

pub use ids::{ConnectionId, UserId};
