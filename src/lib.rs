//! depth-mirror: local order book mirror for diff-feed exchanges
//!
//! This library provides the core components for:
//! - Sequence-gated reconciliation of snapshots and diffs into a bounded book
//! - The diff stream lifecycle with reconnection and backoff
//! - Periodic REST snapshot refresh for drift correction
//! - HMAC-signed limit order submission
//! - Structured logging and Prometheus metrics

pub mod cli;
pub mod config;
pub mod execution;
pub mod feed;
pub mod orderbook;
pub mod snapshot;
pub mod telemetry;
pub mod ws;
