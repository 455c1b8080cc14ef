//! Snapshot module
//!
//! Full order book snapshots over REST, applied at startup and on a fixed
//! interval to correct drift in the streamed book.

mod refresher;
mod rest;

pub use refresher::SnapshotRefresher;
pub use rest::{BitstampRestClient, RestConfig};

use crate::feed::DepthUpdate;
use async_trait::async_trait;

/// Source of full order book snapshots
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch the current book for `market`
    async fn fetch_snapshot(&self, market: &str) -> anyhow::Result<DepthUpdate>;
}
