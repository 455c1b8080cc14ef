//! Reconciliation of snapshot and diff batches into the local book

use super::book::within_spread;
use super::{OrderBook, PriceLevel, PriceLevelBook, Side, UpdateSequencer, AMOUNT_EPSILON};
use crate::telemetry;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Engine shared between the stream handler and the snapshot refresher
///
/// The single lock serializes every write to the book and the marker.
pub type SharedEngine = Arc<RwLock<ReconciliationEngine>>;

/// Book bounding parameters
#[derive(Debug, Clone, PartialEq)]
pub struct BookConfig {
    /// Per-level amount ceiling (0 = unlimited)
    pub max_amount_per_order: Decimal,
    /// Fraction of the best price kept around the touch after a snapshot
    pub spread: Decimal,
    /// Maximum levels held per side
    pub max_levels: usize,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            max_amount_per_order: Decimal::ZERO,
            spread: Decimal::new(5, 2), // 0.05
            max_levels: 100,
        }
    }
}

impl BookConfig {
    /// Clamp an amount to the configured ceiling
    pub fn clamp_amount(&self, amount: Decimal) -> Decimal {
        if self.max_amount_per_order.is_zero() {
            amount
        } else {
            amount.min(self.max_amount_per_order)
        }
    }
}

/// Where a batch came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    /// REST snapshot, authoritative around the touch
    Snapshot,
    /// Incremental stream update
    Diff,
}

/// Result of gating an update through the sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Marker was newer, book mutated
    Applied,
    /// Marker was not newer, update dropped in full
    Stale,
}

/// Owns one market's book and marker
#[derive(Debug)]
pub struct ReconciliationEngine {
    market: String,
    config: BookConfig,
    book: PriceLevelBook,
    sequencer: UpdateSequencer,
}

impl ReconciliationEngine {
    /// Create an engine with an empty book
    pub fn new(market: impl Into<String>, config: BookConfig) -> Self {
        Self {
            market: market.into(),
            config,
            book: PriceLevelBook::new(),
            sequencer: UpdateSequencer::new(),
        }
    }

    /// Wrap the engine for sharing across tasks
    pub fn into_shared(self) -> SharedEngine {
        Arc::new(RwLock::new(self))
    }

    pub fn market(&self) -> &str {
        &self.market
    }

    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    pub fn book(&self) -> &PriceLevelBook {
        &self.book
    }

    /// Last accepted feed marker
    pub fn last_update_id(&self) -> u64 {
        self.sequencer.last_update_id()
    }

    /// Owned copy of the current book
    pub fn view(&self) -> OrderBook {
        self.book.view(&self.market, self.last_update_id())
    }

    /// Gate an update on its marker and apply both sides
    ///
    /// Empty sides are skipped. A stale marker leaves the book untouched.
    pub fn apply_update(
        &mut self,
        marker: u64,
        bids: &[PriceLevel],
        asks: &[PriceLevel],
        kind: BatchKind,
    ) -> ApplyOutcome {
        if !self.sequencer.accept(marker) {
            tracing::trace!(
                market = %self.market,
                marker,
                last_update_id = self.sequencer.last_update_id(),
                ?kind,
                "Dropping stale update"
            );
            telemetry::record_stale_batch();
            return ApplyOutcome::Stale;
        }

        self.apply_batch(Side::Buy, bids, kind);
        self.apply_batch(Side::Sell, asks, kind);

        telemetry::record_applied_batch(kind);
        telemetry::set_book_levels(Side::Buy, self.book.len(Side::Buy));
        telemetry::set_book_levels(Side::Sell, self.book.len(Side::Sell));

        ApplyOutcome::Applied
    }

    /// Merge one side's levels into the book
    ///
    /// `levels` must be ordered best to worst as delivered by the source; the
    /// first entry defines the best price for spread pruning. Malformed entries
    /// are deleted or skipped, never surfaced.
    pub fn apply_batch(&mut self, side: Side, levels: &[PriceLevel], kind: BatchKind) {
        let Some(first) = levels.first() else {
            return;
        };
        let best_price = first.price;
        let is_snapshot = kind == BatchKind::Snapshot;

        for level in levels {
            if level.amount < AMOUNT_EPSILON {
                self.book.delete(side, level.price);
                continue;
            }

            if is_snapshot && !within_spread(side, best_price, self.config.spread, level.price) {
                self.book.delete(side, level.price);
                continue;
            }

            if level.price <= Decimal::ZERO {
                continue;
            }

            let amount = self.config.clamp_amount(level.amount);
            self.book.upsert(side, level.price, amount);
        }

        if is_snapshot && self.book.len(side) > 0 {
            self.book
                .prune_outside_spread(side, best_price, self.config.spread);
        }

        let evicted = self.book.cap_depth(side, self.config.max_levels);
        if evicted > 0 {
            tracing::trace!(
                market = %self.market,
                side = side.as_str(),
                evicted,
                "Capped book depth"
            );
        }
    }
}
