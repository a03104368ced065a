//! Connection management
//!
//! Tracks open WebSocket connections and delivers outbound events to them.

mod connection;
mod manager;

pub use connection::{Connection, OUTBOUND_BUFFER_SIZE};
pub use manager::ConnectionManager;
