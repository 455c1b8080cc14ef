//! Integration tests for signed order submission

use depth_mirror::config::CredentialsConfig;
use depth_mirror::execution::{
    ExecutionError, Order, OrderGateway, OrderSubmitter, SubmitterConfig,
};
use depth_mirror::orderbook::Side;
use httpmock::prelude::*;
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_order_via_gateway_trait() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v3/order")
                .header("X-MBX-APIKEY", "key")
                .body_contains("symbol=ETHUSD&side=BUY&type=LIMIT&timeInForce=GTC")
                .body_contains("recvWindow=10000")
                .body_contains("signature=");
            then.status(200).body(r#"{"orderId":1}"#);
        })
        .await;

    let creds = CredentialsConfig {
        api_key: Some("key".into()),
        api_secret: Some("secret".into()),
    };
    let config = SubmitterConfig::from_credentials(server.base_url(), &creds)
        .unwrap()
        .recv_window(10_000);
    let gateway: Box<dyn OrderGateway> = Box::new(OrderSubmitter::new(config).unwrap());

    let order = Order::new("ethusd", Side::Buy, dec!(2500.25), dec!(1.5));
    let response = gateway.create_order(&order).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_missing_credentials() {
    let result = SubmitterConfig::from_credentials("http://localhost", &CredentialsConfig::default());
    assert!(matches!(result, Err(ExecutionError::MissingCredentials)));
}
