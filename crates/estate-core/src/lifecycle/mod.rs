//! Connection lifecycle
//!
//! Each connection moves `Connecting -> Connected -> Disconnected`. The
//! credential check happens while connecting; once connected, inbound events
//! mutate presence and go through the relay. Disconnected is terminal.

mod connection;
mod handler;

pub use connection::{ConnectionLifecycle, ConnectionPhase};
pub use handler::{Flow, LifecycleConfig, LifecycleHandler};
