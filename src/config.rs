//! Configuration types for depth-mirror

use crate::orderbook::BookConfig;
use crate::telemetry::LogFormat;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

/// Environment variable overriding `credentials.api_key`
pub const API_KEY_ENV: &str = "DEPTH_MIRROR_API_KEY";
/// Environment variable overriding `credentials.api_secret`
pub const API_SECRET_ENV: &str = "DEPTH_MIRROR_API_SECRET";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub market: MarketConfig,
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub book: BookSettings,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Traded market
#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    /// Market symbol, e.g. "BTCUSD"
    pub symbol: String,
}

/// Exchange endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    /// Streaming endpoint for the diff feed
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// REST base URL for order book snapshots
    #[serde(default = "default_snapshot_url")]
    pub snapshot_url: String,
    /// REST base URL for order placement
    #[serde(default = "default_order_url")]
    pub order_url: String,
}

fn default_ws_url() -> String {
    "wss://ws.bitstamp.net".to_string()
}
fn default_snapshot_url() -> String {
    "https://www.bitstamp.net".to_string()
}
fn default_order_url() -> String {
    "https://api.binance.com".to_string()
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            snapshot_url: default_snapshot_url(),
            order_url: default_order_url(),
        }
    }
}

/// API credentials for order placement
#[derive(Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field("api_secret", &self.api_secret.as_ref().map(|_| "<set>"))
            .finish()
    }
}

impl CredentialsConfig {
    /// Apply environment overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            self.api_key = Some(key);
        }
        if let Ok(secret) = std::env::var(API_SECRET_ENV) {
            self.api_secret = Some(secret);
        }
        self
    }
}

/// Local book shape
#[derive(Debug, Clone, Deserialize)]
pub struct BookSettings {
    /// Snapshot levels taken per side at startup
    #[serde(default = "default_depth")]
    pub depth: usize,

    /// Snapshot levels taken per side on periodic refreshes
    #[serde(default = "default_refresh_depth")]
    pub refresh_depth: usize,

    /// Per-level amount ceiling (0 = unlimited)
    #[serde(default)]
    pub max_amount_per_order: Decimal,

    /// Band around the best price kept after a snapshot
    #[serde(default = "default_spread")]
    pub spread: Decimal,

    /// Maximum levels held per side
    #[serde(default = "default_max_levels")]
    pub max_levels: usize,
}

fn default_depth() -> usize {
    30
}
fn default_refresh_depth() -> usize {
    10
}
fn default_spread() -> Decimal {
    Decimal::new(5, 2) // 0.05 = 5%
}
fn default_max_levels() -> usize {
    100
}

impl Default for BookSettings {
    fn default() -> Self {
        Self {
            depth: default_depth(),
            refresh_depth: default_refresh_depth(),
            max_amount_per_order: Decimal::ZERO,
            spread: default_spread(),
            max_levels: default_max_levels(),
        }
    }
}

impl BookSettings {
    /// Engine parameters derived from these settings
    pub fn book_config(&self) -> BookConfig {
        BookConfig {
            max_amount_per_order: self.max_amount_per_order,
            spread: self.spread,
            max_levels: self.max_levels,
        }
    }
}

/// Timing for the snapshot refresher, stream, and order requests
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_snapshot_interval_secs")]
    pub snapshot_interval_secs: u64,

    #[serde(default = "default_reconnect_initial_delay_ms")]
    pub reconnect_initial_delay_ms: u64,

    #[serde(default = "default_reconnect_max_delay_secs")]
    pub reconnect_max_delay_secs: u64,

    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,

    #[serde(default = "default_recv_window_ms")]
    pub recv_window_ms: u64,
}

fn default_snapshot_interval_secs() -> u64 {
    60
}
fn default_reconnect_initial_delay_ms() -> u64 {
    500
}
fn default_reconnect_max_delay_secs() -> u64 {
    30
}
fn default_ping_interval_secs() -> u64 {
    30
}
fn default_recv_window_ms() -> u64 {
    5000
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            snapshot_interval_secs: default_snapshot_interval_secs(),
            reconnect_initial_delay_ms: default_reconnect_initial_delay_ms(),
            reconnect_max_delay_secs: default_reconnect_max_delay_secs(),
            ping_interval_secs: default_ping_interval_secs(),
            recv_window_ms: default_recv_window_ms(),
        }
    }
}

impl SyncConfig {
    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_secs(self.snapshot_interval_secs)
    }

    pub fn reconnect_initial_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_initial_delay_ms)
    }

    pub fn reconnect_max_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_max_delay_secs)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Prometheus scrape port; metrics are disabled when unset
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
