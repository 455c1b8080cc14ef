//! REST client for order book snapshots

use super::SnapshotSource;
use crate::feed::DepthUpdate;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Configuration for the REST client
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Base URL, e.g. `https://www.bitstamp.net`
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl RestConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Fetches `api/v2/order_book/{market}` snapshots
pub struct BitstampRestClient {
    config: RestConfig,
    client: Client,
}

impl BitstampRestClient {
    /// Create a new client
    pub fn new(config: RestConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Snapshot URL for a market
    pub fn order_book_url(&self, market: &str) -> String {
        format!(
            "{}/api/v2/order_book/{}",
            self.config.base_url.trim_end_matches('/'),
            market.to_lowercase()
        )
    }
}

#[async_trait]
impl SnapshotSource for BitstampRestClient {
    async fn fetch_snapshot(&self, market: &str) -> anyhow::Result<DepthUpdate> {
        let url = self.order_book_url(market);

        tracing::debug!(url = %url, "Fetching order book snapshot");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Snapshot request failed: {} - {}", status, body);
        }

        let body = response.text().await?;
        let snapshot: DepthUpdate = serde_json::from_str(&body)?;

        Ok(snapshot)
    }
}
