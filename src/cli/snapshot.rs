//! Snapshot command implementation

use crate::config::Config;
use crate::orderbook::{ApplyOutcome, ReconciliationEngine};
use crate::snapshot::{BitstampRestClient, RestConfig, SnapshotRefresher};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Market symbol (defaults to the configured one)
    #[arg(short, long)]
    pub market: Option<String>,

    /// Levels per side (defaults to book.depth)
    #[arg(short, long)]
    pub depth: Option<usize>,
}

impl SnapshotArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let market = self
            .market
            .clone()
            .unwrap_or_else(|| config.market.symbol.clone());
        let depth = self.depth.unwrap_or(config.book.depth);

        let engine = ReconciliationEngine::new(&market, config.book.book_config()).into_shared();
        let source = Arc::new(BitstampRestClient::new(RestConfig::new(
            &config.exchange.snapshot_url,
        ))?);
        let refresher = SnapshotRefresher::new(&market, source, engine.clone());

        if refresher.refresh(depth).await? == ApplyOutcome::Stale {
            anyhow::bail!("Snapshot carried no usable marker");
        }

        let view = engine.read().await.view();
        println!("{}", serde_json::to_string_pretty(&view)?);

        Ok(())
    }
}
