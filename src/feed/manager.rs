//! Stream lifecycle and routing of diffs into the engine

use super::types::{DepthUpdate, FeedEvent, SubscribeMessage};
use crate::orderbook::{ApplyOutcome, BatchKind, SharedEngine};
use crate::telemetry;
use crate::ws::{WsClient, WsCommand, WsMessage};
use std::ops::ControlFlow;
use tokio::sync::mpsc;

/// Stream connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Subscribed,
}

/// Keeps the diff subscription alive and feeds it into the engine
pub struct FeedConnectionManager {
    market: String,
    engine: SharedEngine,
    state: ConnectionState,
}

impl FeedConnectionManager {
    /// Create a manager for `market` writing into `engine`
    pub fn new(market: impl Into<String>, engine: SharedEngine) -> Self {
        Self {
            market: market.into(),
            engine,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Connect through `client` and process the stream until it shuts down
    pub async fn run(mut self, client: WsClient) {
        tracing::info!(market = %self.market, url = client.url(), "Starting diff feed");
        let (ws_rx, cmd_tx) = client.connect();
        self.run_message_loop(ws_rx, cmd_tx).await;
    }

    /// Process transport events one at a time until the transport gives up
    pub async fn run_message_loop(
        &mut self,
        mut ws_rx: mpsc::Receiver<WsMessage>,
        cmd_tx: mpsc::Sender<WsCommand>,
    ) {
        self.state = ConnectionState::Connecting;

        while let Some(msg) = ws_rx.recv().await {
            if self.handle_message(msg, &cmd_tx).await.is_break() {
                break;
            }
        }

        self.state = ConnectionState::Disconnected;
        tracing::info!(market = %self.market, "Diff feed stopped");
    }

    async fn handle_message(
        &mut self,
        msg: WsMessage,
        cmd_tx: &mpsc::Sender<WsCommand>,
    ) -> ControlFlow<()> {
        match msg {
            WsMessage::Connected => {
                self.state = ConnectionState::Connecting;
                let subscribe = SubscribeMessage::diff_order_book(&self.market);
                let json = match serde_json::to_string(&subscribe) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to encode subscription");
                        return ControlFlow::Break(());
                    }
                };

                if cmd_tx.send(WsCommand::Send(json)).await.is_err() {
                    tracing::error!("Failed to send subscription message");
                    return ControlFlow::Break(());
                }

                self.state = ConnectionState::Subscribed;
                tracing::info!(market = %self.market, "Subscribed to diff order book");
            }
            WsMessage::Text(text) => {
                if self.state != ConnectionState::Subscribed {
                    tracing::debug!("Ignoring message received before subscription");
                    return ControlFlow::Continue(());
                }
                return self.handle_text(&text, cmd_tx).await;
            }
            WsMessage::Reconnecting { attempt } => {
                self.state = ConnectionState::Connecting;
                // Requested reconnects were already counted
                if attempt > 0 {
                    telemetry::record_reconnect();
                }
                tracing::info!(market = %self.market, attempt, "Diff feed reconnecting");
            }
            WsMessage::Disconnected => {
                tracing::warn!(market = %self.market, "Diff feed disconnected");
                return ControlFlow::Break(());
            }
            WsMessage::Binary(_) => {
                // The feed only sends text frames
            }
        }

        ControlFlow::Continue(())
    }

    async fn handle_text(&mut self, text: &str, cmd_tx: &mpsc::Sender<WsCommand>) -> ControlFlow<()> {
        let event = match FeedEvent::parse(text) {
            Ok(event) => event,
            Err(e) => {
                telemetry::record_decode_error();
                tracing::warn!(
                    error = %e,
                    msg_preview = %text.chars().take(100).collect::<String>(),
                    "Failed to decode feed message"
                );
                return ControlFlow::Continue(());
            }
        };

        match event {
            FeedEvent::Data(update) => {
                self.apply(update).await;
            }
            FeedEvent::ReconnectRequest => {
                tracing::info!(market = %self.market, "Server requested reconnect");
                self.state = ConnectionState::Connecting;
                telemetry::record_reconnect();
                if cmd_tx.send(WsCommand::Reconnect).await.is_err() {
                    return ControlFlow::Break(());
                }
            }
            FeedEvent::Subscribed => {
                tracing::debug!(market = %self.market, "Subscription acknowledged");
            }
            FeedEvent::ServerError(message) => {
                tracing::warn!(market = %self.market, %message, "Feed reported an error");
            }
            FeedEvent::Other(event) => {
                tracing::trace!(%event, "Ignoring feed event");
            }
        }

        ControlFlow::Continue(())
    }

    async fn apply(&self, update: DepthUpdate) -> ApplyOutcome {
        let mut engine = self.engine.write().await;
        let outcome = engine.apply_update(
            update.microtimestamp,
            &update.bids,
            &update.asks,
            BatchKind::Diff,
        );

        tracing::trace!(
            market = %self.market,
            marker = update.microtimestamp,
            bids = update.bids.len(),
            asks = update.asks.len(),
            ?outcome,
            "Processed diff"
        );

        outcome
    }
}
