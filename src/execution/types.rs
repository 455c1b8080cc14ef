//! Execution types

use crate::orderbook::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A limit order to be submitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Market symbol
    pub market: String,
    /// Trade side
    pub side: Side,
    /// Limit price
    pub price: Decimal,
    /// Order quantity
    pub amount: Decimal,
}

impl Order {
    pub fn new(market: impl Into<String>, side: Side, price: Decimal, amount: Decimal) -> Self {
        Self {
            market: market.into(),
            side,
            price,
            amount,
        }
    }
}

/// Raw exchange response to an order request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as returned by the exchange
    pub body: String,
}

impl OrderResponse {
    /// True for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Order submission errors
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// API key or secret not configured
    #[error("API credentials are not configured")]
    MissingCredentials,
    /// Order rejected before sending
    #[error("Invalid order: {0}")]
    InvalidOrder(String),
    /// Request could not be sent or the response could not be read
    #[error("Order request failed: {0}")]
    Transport(#[from] reqwest::Error),
}
