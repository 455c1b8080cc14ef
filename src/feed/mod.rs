//! Diff feed module
//!
//! Subscribes to the exchange's differential order book channel and routes
//! accepted diffs into the reconciliation engine.

mod manager;
mod types;

pub use manager::{ConnectionState, FeedConnectionManager};
pub use types::{diff_channel, DepthUpdate, FeedError, FeedEvent, SubscribeMessage};
