//! # estate-gateway
//!
//! WebSocket gateway that tracks who is online and relays chat and typing
//! events between live connections.

pub mod connection;
pub mod server;

pub use server::{create_app, create_gateway_state, run};
