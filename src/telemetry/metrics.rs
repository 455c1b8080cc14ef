//! Prometheus metrics

use crate::orderbook::{BatchKind, Side};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

const BATCHES_APPLIED: &str = "depthmirror_batches_applied_total";
const BATCHES_STALE: &str = "depthmirror_batches_stale_total";
const RECONNECTS: &str = "depthmirror_reconnects_total";
const DECODE_ERRORS: &str = "depthmirror_decode_errors_total";
const ORDERS_SUBMITTED: &str = "depthmirror_orders_submitted_total";
const ORDERS_FAILED: &str = "depthmirror_orders_failed_total";
const BOOK_LEVELS: &str = "depthmirror_book_levels";

/// Start the Prometheus scrape endpoint on `port`
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics exporter: {}", e))?;

    tracing::info!(%addr, "Metrics exporter listening");
    Ok(())
}

/// Count an accepted update
pub fn record_applied_batch(kind: BatchKind) {
    let kind = match kind {
        BatchKind::Snapshot => "snapshot",
        BatchKind::Diff => "diff",
    };
    metrics::counter!(BATCHES_APPLIED, "kind" => kind).increment(1);
}

/// Count an update dropped by the sequencer
pub fn record_stale_batch() {
    metrics::counter!(BATCHES_STALE).increment(1);
}

/// Count a stream reconnect
pub fn record_reconnect() {
    metrics::counter!(RECONNECTS).increment(1);
}

/// Count a feed payload that failed to decode
pub fn record_decode_error() {
    metrics::counter!(DECODE_ERRORS).increment(1);
}

/// Count an order submission and whether the exchange accepted it
pub fn record_order_result(success: bool) {
    metrics::counter!(ORDERS_SUBMITTED).increment(1);
    if !success {
        metrics::counter!(ORDERS_FAILED).increment(1);
    }
}

/// Publish the current level count for a side
pub fn set_book_levels(side: Side, levels: usize) {
    metrics::gauge!(BOOK_LEVELS, "side" => side.as_str()).set(levels as f64);
}
