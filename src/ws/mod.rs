//! WebSocket client library
//!
//! Provides a reusable WebSocket client with automatic reconnection,
//! ping/pong handling, and bounded exponential backoff.

mod client;
mod types;

pub use client::WsClient;
pub use types::{WsCommand, WsConfig, WsError, WsMessage};
