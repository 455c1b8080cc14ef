//! Order book module
//!
//! Local mirror of the exchange book, kept in sync from REST snapshots and the
//! diff stream. All writes go through [`ReconciliationEngine`].

mod book;
mod engine;
mod sequencer;

pub use book::{OrderBook, PriceLevelBook};
pub use engine::{ApplyOutcome, BatchKind, BookConfig, ReconciliationEngine, SharedEngine};
pub use sequencer::UpdateSequencer;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Amounts below this are treated as an absent level
pub const AMOUNT_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 8);

/// Book side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Bids
    Buy,
    /// Asks
    Sell,
}

impl Side {
    /// Uppercase form used in order requests
    pub fn as_order_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    /// Lowercase label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

/// Side name that is none of buy, bid, sell or ask
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown side: {0}")]
pub struct ParseSideError(pub String);

impl std::str::FromStr for Side {
    type Err = ParseSideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" | "bid" => Ok(Side::Buy),
            "sell" | "ask" => Ok(Side::Sell),
            _ => Err(ParseSideError(s.to_string())),
        }
    }
}

/// A price level in the order book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Price at this level
    pub price: Decimal,
    /// Amount resting at this price
    pub amount: Decimal,
}
