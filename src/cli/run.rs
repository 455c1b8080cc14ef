//! Run command implementation

use crate::config::Config;
use crate::feed::FeedConnectionManager;
use crate::orderbook::{ReconciliationEngine, SharedEngine};
use crate::snapshot::{BitstampRestClient, RestConfig, SnapshotRefresher};
use crate::ws::{WsClient, WsConfig};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Market symbol (defaults to the configured one)
    #[arg(short, long)]
    pub market: Option<String>,

    /// Seconds between top-of-book log lines
    #[arg(long, default_value = "10")]
    pub report_interval: u64,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let market = self
            .market
            .clone()
            .unwrap_or_else(|| config.market.symbol.clone());

        let engine = ReconciliationEngine::new(&market, config.book.book_config()).into_shared();

        let source = Arc::new(BitstampRestClient::new(RestConfig::new(
            &config.exchange.snapshot_url,
        ))?);
        let refresher = SnapshotRefresher::new(&market, source, engine.clone())
            .depths(config.book.depth, config.book.refresh_depth)
            .interval(config.sync.snapshot_interval());

        // The stream only starts once there is a base to merge into
        refresher.bootstrap().await?;
        let refresh_handle = refresher.spawn();

        let ws_config = WsConfig::new(&config.exchange.ws_url)
            .max_reconnects(0)
            .initial_delay(config.sync.reconnect_initial_delay())
            .max_delay(config.sync.reconnect_max_delay())
            .ping_interval(config.sync.ping_interval());
        let manager = FeedConnectionManager::new(&market, engine.clone());
        let mut feed_handle = tokio::spawn(manager.run(WsClient::new(ws_config)));

        let mut report = tokio::time::interval(Duration::from_secs(self.report_interval.max(1)));

        loop {
            tokio::select! {
                _ = report.tick() => {
                    log_top_of_book(&engine).await;
                }
                _ = &mut feed_handle => {
                    tracing::warn!(market = %market, "Diff feed ended");
                    break;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received shutdown signal");
                    break;
                }
            }
        }

        refresh_handle.abort();
        feed_handle.abort();

        Ok(())
    }
}

async fn log_top_of_book(engine: &SharedEngine) {
    let view = engine.read().await.view();
    tracing::info!(
        market = %view.market,
        last_update_id = view.last_update_id,
        best_bid = ?view.best_bid(),
        best_ask = ?view.best_ask(),
        spread = ?view.spread(),
        bid_levels = view.bids.len(),
        ask_levels = view.asks.len(),
        "Top of book"
    );
}
