//! Execution module
//!
//! Signed limit order submission

mod signing;
mod submitter;
mod types;

pub use signing::{canonical_query, HmacSigner};
pub use submitter::{OrderSubmitter, SubmitterConfig};
pub use types::{ExecutionError, Order, OrderResponse};

use async_trait::async_trait;

/// Trait for order placement implementations
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Place a GTC limit order
    ///
    /// Exchange rejections come back as a non-success [`OrderResponse`], not
    /// as an error.
    async fn create_order(&self, order: &Order) -> Result<OrderResponse, ExecutionError>;
}
