//! Wire types for the diff stream and REST snapshots
//!
//! Levels arrive as `["price", "amount"]` string pairs and markers as
//! string-encoded microsecond timestamps. Both are validated here, so nothing
//! past this module sees a raw string.

use crate::orderbook::PriceLevel;
use rust_decimal::Decimal;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Event name carrying book data
pub const EVENT_DATA: &str = "data";
/// Server asks the client to reconnect
pub const EVENT_REQUEST_RECONNECT: &str = "bts:request_reconnect";
/// Subscription acknowledged
pub const EVENT_SUBSCRIPTION_SUCCEEDED: &str = "bts:subscription_succeeded";
/// Server-side error
pub const EVENT_ERROR: &str = "bts:error";

/// Feed decoding errors
#[derive(Debug, Error)]
pub enum FeedError {
    /// Payload is not valid JSON or does not match the expected shape
    #[error("Failed to decode feed message: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Both sides of a book update with its feed marker
///
/// Used for stream diffs and REST snapshots alike.
#[derive(Debug, Clone, Deserialize)]
pub struct DepthUpdate {
    /// Microsecond timestamp used as the sequence marker
    #[serde(deserialize_with = "de_marker")]
    pub microtimestamp: u64,
    #[serde(default, deserialize_with = "de_levels")]
    pub bids: Vec<PriceLevel>,
    #[serde(default, deserialize_with = "de_levels")]
    pub asks: Vec<PriceLevel>,
}

impl DepthUpdate {
    /// Keep at most `depth` levels per side
    pub fn truncate(&mut self, depth: usize) {
        self.bids.truncate(depth);
        self.asks.truncate(depth);
    }
}

/// Subscribe request sent after the socket opens
#[derive(Debug, Serialize)]
pub struct SubscribeMessage {
    event: &'static str,
    data: SubscribeData,
}

#[derive(Debug, Serialize)]
struct SubscribeData {
    channel: String,
}

impl SubscribeMessage {
    /// Subscribe to the diff channel for `market`
    pub fn diff_order_book(market: &str) -> Self {
        Self {
            event: "bts:subscribe",
            data: SubscribeData {
                channel: diff_channel(market),
            },
        }
    }
}

/// Diff channel name for a market
pub fn diff_channel(market: &str) -> String {
    format!("diff_order_book_{}", market.to_lowercase())
}

/// A classified inbound envelope
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// Book diff
    Data(DepthUpdate),
    /// Server asked us to reconnect
    ReconnectRequest,
    /// Subscription acknowledged
    Subscribed,
    /// Server reported an error
    ServerError(String),
    /// Anything else, by event name
    Other(String),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl FeedEvent {
    /// Decode and classify a text frame
    pub fn parse(text: &str) -> Result<Self, FeedError> {
        let envelope: Envelope = serde_json::from_str(text)?;

        let event = match envelope.event.as_str() {
            EVENT_DATA => FeedEvent::Data(serde_json::from_value(envelope.data)?),
            EVENT_REQUEST_RECONNECT => FeedEvent::ReconnectRequest,
            EVENT_SUBSCRIPTION_SUCCEEDED => FeedEvent::Subscribed,
            EVENT_ERROR => {
                let message = envelope
                    .data
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or_default()
                    .to_string();
                FeedEvent::ServerError(message)
            }
            _ => FeedEvent::Other(envelope.event),
        };

        Ok(event)
    }
}

fn de_marker<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Marker {
        Text(String),
        Number(u64),
    }

    match Marker::deserialize(deserializer)? {
        Marker::Number(n) => Ok(n),
        Marker::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid marker: {s:?}"))),
    }
}

fn de_levels<'de, D>(deserializer: D) -> Result<Vec<PriceLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Vec<String>> = Vec::deserialize(deserializer)?;
    raw.into_iter()
        .map(|entry| -> Result<PriceLevel, D::Error> {
            let [price, amount, ..] = entry.as_slice() else {
                return Err(de::Error::custom(format!(
                    "level needs price and amount, got {} fields",
                    entry.len()
                )));
            };
            Ok(PriceLevel {
                price: parse_decimal(price)?,
                amount: parse_decimal(amount)?,
            })
        })
        .collect()
}

fn parse_decimal<E: de::Error>(s: &str) -> Result<Decimal, E> {
    Decimal::from_str(s).map_err(|_| E::custom(format!("invalid decimal: {s:?}")))
}
