//! Periodic snapshot refresh

use super::SnapshotSource;
use crate::orderbook::{ApplyOutcome, BatchKind, SharedEngine};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Pulls full snapshots and applies them as authoritative passes
pub struct SnapshotRefresher {
    market: String,
    source: Arc<dyn SnapshotSource>,
    engine: SharedEngine,
    bootstrap_depth: usize,
    refresh_depth: usize,
    interval: Duration,
}

impl SnapshotRefresher {
    /// Create a refresher with 30/10 level depths and a 60s interval
    pub fn new(
        market: impl Into<String>,
        source: Arc<dyn SnapshotSource>,
        engine: SharedEngine,
    ) -> Self {
        Self {
            market: market.into(),
            source,
            engine,
            bootstrap_depth: 30,
            refresh_depth: 10,
            interval: Duration::from_secs(60),
        }
    }

    /// Levels per side taken at startup and on each refresh
    pub fn depths(mut self, bootstrap: usize, refresh: usize) -> Self {
        self.bootstrap_depth = bootstrap;
        self.refresh_depth = refresh;
        self
    }

    /// Time between refreshes
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Seed the book before the stream starts
    pub async fn bootstrap(&self) -> anyhow::Result<ApplyOutcome> {
        self.refresh(self.bootstrap_depth).await
    }

    /// Fetch one snapshot, keep the top `depth` levels per side, and apply it
    pub async fn refresh(&self, depth: usize) -> anyhow::Result<ApplyOutcome> {
        let mut snapshot = self.source.fetch_snapshot(&self.market).await?;
        snapshot.truncate(depth);

        let outcome = self.engine.write().await.apply_update(
            snapshot.microtimestamp,
            &snapshot.bids,
            &snapshot.asks,
            BatchKind::Snapshot,
        );

        match outcome {
            ApplyOutcome::Applied => tracing::info!(
                market = %self.market,
                marker = snapshot.microtimestamp,
                bids = snapshot.bids.len(),
                asks = snapshot.asks.len(),
                "Processed snapshot"
            ),
            ApplyOutcome::Stale => tracing::debug!(
                market = %self.market,
                marker = snapshot.microtimestamp,
                "Discarded stale snapshot"
            ),
        }

        Ok(outcome)
    }

    /// Refresh on every interval tick, forever
    ///
    /// The first tick is skipped since [`bootstrap`](Self::bootstrap) already
    /// ran. Failures are logged and retried on the next tick.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = self.refresh(self.refresh_depth).await {
                tracing::warn!(market = %self.market, error = %e, "Snapshot refresh failed");
            }
        }
    }

    /// Run the refresh loop on its own task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::DepthUpdate;
    use crate::orderbook::{BookConfig, ReconciliationEngine, Side};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Serves canned snapshots, repeating the last one when drained
    struct StubSource {
        snapshots: Mutex<VecDeque<String>>,
    }

    impl StubSource {
        fn new(snapshots: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                snapshots: Mutex::new(snapshots.iter().map(|s| s.to_string()).collect()),
            })
        }
    }

    #[async_trait]
    impl SnapshotSource for StubSource {
        async fn fetch_snapshot(&self, _market: &str) -> anyhow::Result<DepthUpdate> {
            let json = {
                let mut snapshots = self.snapshots.lock().unwrap();
                if snapshots.len() > 1 {
                    snapshots.pop_front()
                } else {
                    snapshots.front().cloned()
                }
            };
            let json = json.ok_or_else(|| anyhow::anyhow!("no snapshot"))?;
            Ok(serde_json::from_str(&json)?)
        }
    }

    fn shared_engine() -> SharedEngine {
        ReconciliationEngine::new("btcusd", BookConfig::default()).into_shared()
    }

    #[tokio::test]
    async fn test_bootstrap_applies_limited_depth() {
        let source = StubSource::new(&[
            r#"{"microtimestamp":"10",
                "bids":[["100","1"],["99.9","1"],["99.8","1"]],
                "asks":[["100.1","1"],["100.2","1"],["100.3","1"]]}"#,
        ]);
        let engine = shared_engine();
        let refresher = SnapshotRefresher::new("btcusd", source, engine.clone()).depths(2, 1);

        let outcome = refresher.bootstrap().await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Applied);

        let engine = engine.read().await;
        assert_eq!(engine.last_update_id(), 10);
        assert_eq!(engine.book().len(Side::Buy), 2);
        assert_eq!(engine.book().len(Side::Sell), 2);
        assert_eq!(engine.book().get(Side::Buy, dec!(99.8)), None);
    }

    #[tokio::test]
    async fn test_snapshot_prunes_sell_side_outside_spread() {
        let source = StubSource::new(&[
            r#"{"microtimestamp":"1","bids":[],
                "asks":[["100","1"],["101","1"],["106","1"],["107","1"]]}"#,
        ]);
        let engine = shared_engine();
        let refresher = SnapshotRefresher::new("btcusd", source, engine.clone());
        refresher.bootstrap().await.unwrap();

        let prices: Vec<_> = engine
            .read()
            .await
            .book()
            .levels(Side::Sell)
            .map(|l| l.price)
            .collect();
        assert_eq!(prices, vec![dec!(100), dec!(101)]);
    }

    #[tokio::test]
    async fn test_stale_snapshot_discarded() {
        let source = StubSource::new(&[r#"{"microtimestamp":"50","bids":[["1","1"]],"asks":[]}"#]);
        let engine = shared_engine();
        engine
            .write()
            .await
            .apply_update(60, &[], &[], BatchKind::Diff);

        let refresher = SnapshotRefresher::new("btcusd", source, engine.clone());
        let outcome = refresher.refresh(10).await.unwrap();

        assert_eq!(outcome, ApplyOutcome::Stale);
        assert!(engine.read().await.book().is_empty());
        assert_eq!(engine.read().await.last_update_id(), 60);
    }

    #[tokio::test]
    async fn test_fetch_error_propagates_from_bootstrap() {
        let source = StubSource::new(&[]);
        let refresher = SnapshotRefresher::new("btcusd", source, shared_engine());
        assert!(refresher.bootstrap().await.is_err());
    }

    #[tokio::test]
    async fn test_run_refreshes_on_interval() {
        let source = StubSource::new(&[
            r#"{"microtimestamp":"1","bids":[["100","1"]],"asks":[]}"#,
            r#"{"microtimestamp":"2","bids":[["101","1"]],"asks":[]}"#,
        ]);
        let engine = shared_engine();
        let refresher = SnapshotRefresher::new("btcusd", source, engine.clone())
            .interval(Duration::from_millis(20));

        let handle = refresher.spawn();
        tokio::time::sleep(Duration::from_millis(150)).await;
        handle.abort();

        let engine = engine.read().await;
        assert_eq!(engine.last_update_id(), 2);
        assert_eq!(engine.book().best(Side::Buy), Some(dec!(101)));
    }
}
