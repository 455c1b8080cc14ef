//! Integration tests for snapshot + stream synchronization

use depth_mirror::feed::FeedConnectionManager;
use depth_mirror::orderbook::{BookConfig, ReconciliationEngine, SharedEngine, Side};
use depth_mirror::snapshot::{BitstampRestClient, RestConfig, SnapshotRefresher};
use depth_mirror::ws::{WsClient, WsConfig, WsMessage};
use futures_util::{SinkExt, StreamExt};
use httpmock::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{accept_async, tungstenite::Message};

fn shared_engine() -> SharedEngine {
    ReconciliationEngine::new("btcusd", BookConfig::default()).into_shared()
}

fn data_frame(marker: u64, bids: &str, asks: &str) -> String {
    format!(
        r#"{{"event":"data","channel":"diff_order_book_btcusd","data":{{"microtimestamp":"{marker}","bids":{bids},"asks":{asks}}}}}"#
    )
}

async fn wait_for_marker(engine: &SharedEngine, marker: u64) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if engine.read().await.last_update_id() >= marker {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timed out waiting for marker");
}

#[tokio::test]
async fn test_bootstrap_then_diffs() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/order_book/btcusd");
            then.status(200).body(
                r#"{"microtimestamp":"1000",
                    "bids":[["100","1"],["99","1"],["90","1"]],
                    "asks":[["101","1"],["102","1"],["120","1"]]}"#,
            );
        })
        .await;

    let engine = shared_engine();
    let source = Arc::new(BitstampRestClient::new(RestConfig::new(server.base_url())).unwrap());
    let refresher = SnapshotRefresher::new("btcusd", source, engine.clone());
    refresher.bootstrap().await.unwrap();

    {
        let engine = engine.read().await;
        // 90 and 120 fall outside the 5% band
        assert_eq!(engine.book().len(Side::Buy), 2);
        assert_eq!(engine.book().len(Side::Sell), 2);
        assert_eq!(engine.last_update_id(), 1000);
    }

    let mut manager = FeedConnectionManager::new("btcusd", engine.clone());
    let (ws_tx, ws_rx) = mpsc::channel(16);
    let (cmd_tx, _cmd_rx) = mpsc::channel(16);

    ws_tx.send(WsMessage::Connected).await.unwrap();
    // Older than the snapshot, dropped
    ws_tx
        .send(WsMessage::Text(data_frame(999, r#"[["100.5","3"]]"#, "[]")))
        .await
        .unwrap();
    ws_tx
        .send(WsMessage::Text(data_frame(
            1001,
            r#"[["100","0"],["99.5","2"]]"#,
            r#"[["101","4"]]"#,
        )))
        .await
        .unwrap();
    ws_tx.send(WsMessage::Disconnected).await.unwrap();

    manager.run_message_loop(ws_rx, cmd_tx).await;

    let view = engine.read().await.view();
    assert_eq!(view.last_update_id, 1001);
    assert_eq!(view.best_bid(), Some(dec!(99.5)));
    assert_eq!(view.best_ask(), Some(dec!(101)));
    assert_eq!(view.asks[0].amount, dec!(4));
    assert!(view.bids.iter().all(|l| l.price != dec!(100.5)));
}

#[tokio::test]
async fn test_depth_cap_on_diff() {
    let engine = shared_engine();
    let mut manager = FeedConnectionManager::new("btcusd", engine.clone());
    let (ws_tx, ws_rx) = mpsc::channel(16);
    let (cmd_tx, _cmd_rx) = mpsc::channel(16);

    let asks = (0..101)
        .map(|i| format!(r#"["{}","1"]"#, 1000 + i))
        .collect::<Vec<_>>()
        .join(",");

    ws_tx.send(WsMessage::Connected).await.unwrap();
    ws_tx
        .send(WsMessage::Text(data_frame(1, "[]", &format!("[{asks}]"))))
        .await
        .unwrap();
    ws_tx.send(WsMessage::Disconnected).await.unwrap();

    manager.run_message_loop(ws_rx, cmd_tx).await;

    let engine = engine.read().await;
    assert_eq!(engine.book().len(Side::Sell), 100);
    assert_eq!(engine.book().get(Side::Sell, Decimal::from(1100)), None);
    assert_eq!(engine.book().best(Side::Sell), Some(dec!(1000)));
}

#[tokio::test]
async fn test_stream_reconnects_on_server_request() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (done_tx, done_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let mut subscriptions = Vec::new();

        // First session: one diff, then ask the client to reconnect
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        if let Some(Ok(Message::Text(text))) = ws.next().await {
            subscriptions.push(text);
        }
        ws.send(Message::Text(data_frame(10, r#"[["50","1"]]"#, "[]")))
            .await
            .unwrap();
        ws.send(Message::Text(
            r#"{"event":"bts:request_reconnect","channel":"","data":""}"#.to_string(),
        ))
        .await
        .unwrap();

        // Second session: a fresh diff, a stale one, then a sentinel
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        if let Some(Ok(Message::Text(text))) = ws.next().await {
            subscriptions.push(text);
        }
        for frame in [
            data_frame(11, r#"[["51","1"]]"#, "[]"),
            data_frame(9, r#"[["49","1"]]"#, "[]"),
            data_frame(12, "[]", r#"[["60","1"]]"#),
        ] {
            ws.send(Message::Text(frame)).await.unwrap();
        }

        let _ = done_rx.await;
        subscriptions
    });

    let engine = shared_engine();
    let manager = FeedConnectionManager::new("BTCUSD", engine.clone());
    let client = WsClient::new(
        WsConfig::new(format!("ws://{addr}")).initial_delay(Duration::from_millis(10)),
    );
    let feed = tokio::spawn(manager.run(client));

    wait_for_marker(&engine, 12).await;

    {
        let engine = engine.read().await;
        assert_eq!(engine.book().best(Side::Buy), Some(dec!(51)));
        assert_eq!(engine.book().get(Side::Buy, dec!(50)), Some(dec!(1)));
        assert_eq!(engine.book().get(Side::Buy, dec!(49)), None);
        assert_eq!(engine.book().best(Side::Sell), Some(dec!(60)));
    }

    feed.abort();
    done_tx.send(()).unwrap();
    let subscriptions = server.await.unwrap();
    assert_eq!(subscriptions.len(), 2);
    assert!(subscriptions
        .iter()
        .all(|s| s.contains("diff_order_book_btcusd")));
}

#[tokio::test]
async fn test_reconnect_request_followed_by_close_opens_one_session() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let sessions = Arc::new(AtomicUsize::new(0));
    let later_subscriptions = Arc::new(AtomicUsize::new(0));

    let server = {
        let sessions = sessions.clone();
        let later_subscriptions = later_subscriptions.clone();
        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let session = sessions.fetch_add(1, Ordering::SeqCst) + 1;
                let mut ws = accept_async(stream).await.unwrap();

                if session == 1 {
                    // Ask for a reconnect, then close before the client can act on it
                    if let Some(Ok(Message::Text(_))) = ws.next().await {
                        ws.send(Message::Text(
                            r#"{"event":"bts:request_reconnect","channel":"","data":""}"#
                                .to_string(),
                        ))
                        .await
                        .unwrap();
                        let _ = ws.close(None).await;
                    }
                    continue;
                }

                let later_subscriptions = later_subscriptions.clone();
                tokio::spawn(async move {
                    while let Some(Ok(msg)) = ws.next().await {
                        if let Message::Text(text) = msg {
                            if text.contains("bts:subscribe") {
                                later_subscriptions.fetch_add(1, Ordering::SeqCst);
                            }
                        }
                    }
                });
            }
        })
    };

    let manager = FeedConnectionManager::new("btcusd", shared_engine());
    let client = WsClient::new(
        WsConfig::new(format!("ws://{addr}")).initial_delay(Duration::from_millis(10)),
    );
    let feed = tokio::spawn(manager.run(client));

    tokio::time::sleep(Duration::from_millis(800)).await;

    assert_eq!(sessions.load(Ordering::SeqCst), 2);
    assert_eq!(later_subscriptions.load(Ordering::SeqCst), 1);

    feed.abort();
    server.abort();
}
