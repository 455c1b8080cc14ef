//! Signed order submission over REST

use super::signing::{canonical_query, HmacSigner};
use super::types::{ExecutionError, Order, OrderResponse};
use super::OrderGateway;
use crate::config::CredentialsConfig;
use crate::telemetry;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

/// Order endpoint path
pub const ORDER_PATH: &str = "/api/v3/order";
/// API key header
pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Configuration for the order submitter
#[derive(Clone)]
pub struct SubmitterConfig {
    /// Base URL of the order API
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
    /// `recvWindow` sent with every order, in milliseconds
    pub recv_window_ms: u64,
    /// Request timeout
    pub timeout: Duration,
}

impl SubmitterConfig {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            recv_window_ms: 5000,
            timeout: Duration::from_secs(10),
        }
    }

    /// Build from configured credentials
    pub fn from_credentials(
        base_url: impl Into<String>,
        credentials: &CredentialsConfig,
    ) -> Result<Self, ExecutionError> {
        match (&credentials.api_key, &credentials.api_secret) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Ok(Self::new(base_url, key.clone(), secret.clone()))
            }
            _ => Err(ExecutionError::MissingCredentials),
        }
    }

    pub fn recv_window(mut self, ms: u64) -> Self {
        self.recv_window_ms = ms;
        self
    }
}

type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Builds, signs, and posts GTC limit orders
///
/// No retries: a failed request is reported once and returned to the caller.
pub struct OrderSubmitter {
    config: SubmitterConfig,
    client: Client,
    signer: HmacSigner,
    clock: Clock,
}

impl OrderSubmitter {
    /// Create a new submitter
    pub fn new(config: SubmitterConfig) -> Result<Self, ExecutionError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let signer = HmacSigner::new(config.api_secret.clone());
        Ok(Self {
            config,
            client,
            signer,
            clock: Arc::new(|| Utc::now().timestamp_millis()),
        })
    }

    /// Replace the millisecond clock used for `timestamp`
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Request fields in signing order, without the signature
    pub fn order_params(&self, order: &Order, timestamp: i64) -> Vec<(&'static str, String)> {
        vec![
            ("symbol", order.market.to_uppercase()),
            ("side", order.side.as_order_str().to_string()),
            ("type", "LIMIT".to_string()),
            ("timeInForce", "GTC".to_string()),
            ("quantity", order.amount.normalize().to_string()),
            ("price", order.price.normalize().to_string()),
            ("recvWindow", self.config.recv_window_ms.to_string()),
            ("timestamp", timestamp.to_string()),
        ]
    }

    /// Full request body with `signature` appended
    pub fn signed_body(&self, order: &Order) -> Vec<(&'static str, String)> {
        let mut params = self.order_params(order, (self.clock)());
        let signature = self.signer.sign(&canonical_query(&params));
        params.push(("signature", signature));
        params
    }

    fn validate(order: &Order) -> Result<(), ExecutionError> {
        if order.price <= Decimal::ZERO {
            return Err(ExecutionError::InvalidOrder(format!(
                "price must be positive, got {}",
                order.price
            )));
        }
        if order.amount <= Decimal::ZERO {
            return Err(ExecutionError::InvalidOrder(format!(
                "amount must be positive, got {}",
                order.amount
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderGateway for OrderSubmitter {
    async fn create_order(&self, order: &Order) -> Result<OrderResponse, ExecutionError> {
        Self::validate(order)?;

        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), ORDER_PATH);
        let body = self.signed_body(order);

        tracing::info!(
            market = %order.market,
            side = order.side.as_str(),
            price = %order.price,
            amount = %order.amount,
            "Submitting order"
        );

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .form(&body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let response = OrderResponse {
            status: status.as_u16(),
            body,
        };

        telemetry::record_order_result(response.is_success());

        if response.is_success() {
            tracing::info!(market = %order.market, status = response.status, "Order accepted");
        } else {
            tracing::error!(
                severity = "fatal",
                market = %order.market,
                status = response.status,
                body = %response.body,
                "Order placement failed"
            );
        }

        Ok(response)
    }
}
