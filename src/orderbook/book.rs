//! Order book state management

use super::{PriceLevel, Side};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-side price -> amount mappings for one market
///
/// Prices are unique keys within a side. The best bid is the highest key, the
/// best ask the lowest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceLevelBook {
    bids: BTreeMap<Decimal, Decimal>,
    asks: BTreeMap<Decimal, Decimal>,
}

impl PriceLevelBook {
    /// Create an empty book
    pub fn new() -> Self {
        Self::default()
    }

    fn side(&self, side: Side) -> &BTreeMap<Decimal, Decimal> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut BTreeMap<Decimal, Decimal> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Insert or replace the level at `price`
    ///
    /// The caller is responsible for clamping `amount`.
    pub fn upsert(&mut self, side: Side, price: Decimal, amount: Decimal) {
        self.side_mut(side).insert(price, amount);
    }

    /// Remove the level at `price` if present
    pub fn delete(&mut self, side: Side, price: Decimal) {
        self.side_mut(side).remove(&price);
    }

    /// Amount resting at `price`, if any
    pub fn get(&self, side: Side, price: Decimal) -> Option<Decimal> {
        self.side(side).get(&price).copied()
    }

    /// Number of levels on a side
    pub fn len(&self, side: Side) -> usize {
        self.side(side).len()
    }

    /// True when both sides are empty
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Best price on a side
    pub fn best(&self, side: Side) -> Option<Decimal> {
        match side {
            Side::Buy => self.bids.keys().next_back().copied(),
            Side::Sell => self.asks.keys().next().copied(),
        }
    }

    /// Levels on a side, best to worst
    pub fn levels(&self, side: Side) -> Box<dyn Iterator<Item = PriceLevel> + '_> {
        let to_level = |(price, amount): (&Decimal, &Decimal)| PriceLevel {
            price: *price,
            amount: *amount,
        };
        match side {
            Side::Buy => Box::new(self.bids.iter().rev().map(to_level)),
            Side::Sell => Box::new(self.asks.iter().map(to_level)),
        }
    }

    /// Drop every level outside the spread window around `best_price`
    pub fn prune_outside_spread(&mut self, side: Side, best_price: Decimal, spread: Decimal) {
        self.side_mut(side)
            .retain(|price, _| within_spread(side, best_price, spread, *price));
    }

    /// Evict the levels furthest from the touch until at most `max_levels` remain
    ///
    /// Returns the number of evicted levels.
    pub fn cap_depth(&mut self, side: Side, max_levels: usize) -> usize {
        let levels = self.side_mut(side);
        let mut evicted = 0;
        while levels.len() > max_levels {
            match side {
                Side::Buy => levels.pop_first(),
                Side::Sell => levels.pop_last(),
            };
            evicted += 1;
        }
        evicted
    }

    /// Owned, ordered copy of the book for readers
    pub fn view(&self, market: impl Into<String>, last_update_id: u64) -> OrderBook {
        OrderBook {
            market: market.into(),
            bids: self.levels(Side::Buy).collect(),
            asks: self.levels(Side::Sell).collect(),
            last_update_id,
            updated_at: Utc::now(),
        }
    }
}

/// Whether `price` lies inside the acceptable band for `side`
///
/// Bids accept `[best * (1 - spread), best]`, asks accept `[best, best * (1 + spread)]`.
/// A non-positive best price accepts everything. A bound that overflows the
/// decimal range leaves that end of the band open.
pub fn within_spread(side: Side, best_price: Decimal, spread: Decimal, price: Decimal) -> bool {
    if best_price <= Decimal::ZERO {
        return true;
    }
    match side {
        Side::Buy => {
            let floor = Decimal::ONE
                .checked_sub(spread)
                .and_then(|factor| best_price.checked_mul(factor));
            floor.map_or(true, |floor| floor <= price) && price <= best_price
        }
        Side::Sell => {
            let ceiling = Decimal::ONE
                .checked_add(spread)
                .and_then(|factor| best_price.checked_mul(factor));
            best_price <= price && ceiling.map_or(true, |ceiling| price <= ceiling)
        }
    }
}

/// L2 view of a market's book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBook {
    /// Market symbol
    pub market: String,
    /// Bid levels, sorted best (highest) to worst
    pub bids: Vec<PriceLevel>,
    /// Ask levels, sorted best (lowest) to worst
    pub asks: Vec<PriceLevel>,
    /// Feed marker of the last accepted update
    pub last_update_id: u64,
    /// When this view was taken
    pub updated_at: DateTime<Utc>,
}

impl OrderBook {
    /// Get best bid price
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().map(|l| l.price)
    }

    /// Get best ask price
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first().map(|l| l.price)
    }

    /// Get mid price, `None` if either side is empty or the sum overflows
    pub fn mid_price(&self) -> Option<Decimal> {
        let sum = self.best_bid()?.checked_add(self.best_ask()?)?;
        Some(sum / Decimal::TWO)
    }

    /// Get spread
    pub fn spread(&self) -> Option<Decimal> {
        self.best_ask()?.checked_sub(self.best_bid()?)
    }
}
