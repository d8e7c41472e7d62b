use std::sync::Arc;

use rust_decimal_macros::dec;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use exchange_stream_client::auth::{NonceProvider, StaticCredentials, sign_request};
use exchange_stream_client::auth::Credentials;
use exchange_stream_client::rest::RestClient;
use exchange_stream_client::types::{OrderStatus, Side};
use exchange_stream_client::ClientError;

struct FixedNonce(u64);

impl NonceProvider for FixedNonce {
    fn next_nonce(&self) -> u64 {
        self.0
    }
}

fn public_client(server: &MockServer) -> RestClient {
    RestClient::builder()
        .base_url(server.uri())
        .max_retries(0)
        .build()
}

fn private_client(server: &MockServer) -> RestClient {
    RestClient::builder()
        .base_url(server.uri())
        .credentials(Arc::new(StaticCredentials::new("test_key", "test_secret")))
        .nonce_provider(Arc::new(FixedNonce(1_700_000_000_000)))
        .max_retries(0)
        .build()
}

#[tokio::test]
async fn test_get_symbol() {
    let server = MockServer::start().await;
    let response = serde_json::json!({
        "id": "ETHBTC",
        "baseCurrency": "ETH",
        "quoteCurrency": "BTC",
        "quantityIncrement": "0.001",
        "tickSize": "0.000001",
        "takeLiquidityRate": "0.001",
        "provideLiquidityRate": "-0.0001",
        "feeCurrency": "BTC"
    });

    Mock::given(method("GET"))
        .and(path("/api/2/public/symbol/ETHBTC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(&server)
        .await;

    let symbol = public_client(&server).get_symbol("ETHBTC").await.unwrap();
    assert_eq!(symbol.base_currency, "ETH");
    assert_eq!(symbol.tick_size, dec!(0.000001));
    assert_eq!(symbol.provide_liquidity_rate, Some(dec!(-0.0001)));
}

#[tokio::test]
async fn test_get_symbols() {
    let server = MockServer::start().await;
    let response = serde_json::json!([
        {"id": "ETHBTC", "baseCurrency": "ETH", "quoteCurrency": "BTC",
         "quantityIncrement": "0.001", "tickSize": "0.000001"},
        {"id": "BTCUSD", "baseCurrency": "BTC", "quoteCurrency": "USD",
         "quantityIncrement": "0.00001", "tickSize": "0.01"}
    ]);

    Mock::given(method("GET"))
        .and(path("/api/2/public/symbol"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(&server)
        .await;

    let symbols = public_client(&server).get_symbols().await.unwrap();
    assert_eq!(symbols.len(), 2);
    assert_eq!(symbols[1].id, "BTCUSD");
}

#[tokio::test]
async fn test_get_ticker() {
    let server = MockServer::start().await;
    let response = serde_json::json!({
        "symbol": "ETHBTC",
        "ask": "0.054464",
        "bid": "0.054463",
        "last": "0.054463",
        "open": "0.057133",
        "low": "0.053615",
        "high": "0.057559",
        "volume": "33068.346",
        "volumeQuote": "1832.687530809",
        "timestamp": "2024-03-01T10:00:00.000Z"
    });

    Mock::given(method("GET"))
        .and(path("/api/2/public/ticker/ETHBTC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(&server)
        .await;

    let ticker = public_client(&server).get_ticker("ETHBTC").await.unwrap();
    assert_eq!(ticker.last, Some(dec!(0.054463)));
    assert_eq!(ticker.volume, dec!(33068.346));
}

#[tokio::test]
async fn test_get_order_book_with_limit() {
    let server = MockServer::start().await;
    let response = serde_json::json!({
        "ask": [{"price": "9777.51", "size": "4.50579"}, {"price": "9777.52", "size": "5.79832"}],
        "bid": [{"price": "9776.04", "size": "0.00100"}],
        "timestamp": "2024-03-01T10:00:00.000Z"
    });

    Mock::given(method("GET"))
        .and(path("/api/2/public/orderbook/BTCUSD"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(&server)
        .await;

    let book = public_client(&server)
        .get_order_book("BTCUSD", Some(2))
        .await
        .unwrap();
    assert_eq!(book.symbol, "BTCUSD");
    assert_eq!(book.ask.len(), 2);
    assert_eq!(book.best_bid().unwrap().price, dec!(9776.04));
    assert_eq!(book.spread(), Some(dec!(1.47)));
}

#[tokio::test]
async fn test_get_trading_balance_is_signed() {
    let server = MockServer::start().await;
    let nonce = 1_700_000_000_000u64;
    let expected_signature = sign_request(
        &Credentials::new("test_key", "test_secret"),
        "GET",
        "/api/2/trading/balance",
        nonce,
        "",
    )
    .unwrap();

    let response = serde_json::json!([
        {"currency": "ETH", "available": "10.000000000", "reserved": "0.560000000"},
        {"currency": "BTC", "available": "0.010205869", "reserved": "0"}
    ]);

    Mock::given(method("GET"))
        .and(path("/api/2/trading/balance"))
        .and(header("X-API-Key", "test_key"))
        .and(header("X-API-Nonce", nonce.to_string().as_str()))
        .and(header("X-API-Signature", expected_signature.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(&server)
        .await;

    let balances = private_client(&server).get_trading_balance().await.unwrap();
    assert_eq!(balances.len(), 2);
    assert_eq!(balances[0].total(), dec!(10.56));
}

#[tokio::test]
async fn test_get_active_orders_for_symbol() {
    let server = MockServer::start().await;
    let response = serde_json::json!([{
        "id": 840450210,
        "clientOrderId": "c1837634ef81472a9cd13c81e7b91401",
        "symbol": "ETHBTC",
        "side": "buy",
        "status": "partiallyFilled",
        "type": "limit",
        "timeInForce": "GTC",
        "quantity": "0.020",
        "price": "0.046001",
        "cumQuantity": "0.005",
        "createdAt": "2024-03-01T10:00:00.000Z",
        "updatedAt": "2024-03-01T10:00:05.000Z"
    }]);

    Mock::given(method("GET"))
        .and(path("/api/2/order"))
        .and(query_param("symbol", "ETHBTC"))
        .and(header_exists("X-API-Signature"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(&server)
        .await;

    let orders = private_client(&server)
        .get_active_orders(Some("ETHBTC"))
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].side, Side::Buy);
    assert_eq!(orders[0].status, OrderStatus::PartiallyFilled);
    assert_eq!(orders[0].remaining_quantity(), dec!(0.015));
}

#[tokio::test]
async fn test_error_body_maps_to_api_error() {
    let server = MockServer::start().await;
    let response = serde_json::json!({
        "error": {"code": 2001, "message": "Symbol not found", "description": "Try get /api/2/public/symbol"}
    });

    Mock::given(method("GET"))
        .and(path("/api/2/public/symbol/NOPE"))
        .respond_with(ResponseTemplate::new(400).set_body_json(response))
        .mount(&server)
        .await;

    match public_client(&server).get_symbol("NOPE").await {
        Err(ClientError::Api(error)) => {
            assert!(error.is_symbol_not_found());
            assert_eq!(error.description.as_deref(), Some("Try get /api/2/public/symbol"));
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_too_many_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/2/public/ticker/ETHBTC"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "2")
                .set_body_json(serde_json::json!({"error": {"code": 429, "message": "Too many requests"}})),
        )
        .mount(&server)
        .await;

    match public_client(&server).get_ticker("ETHBTC").await {
        Err(ClientError::RateLimitExceeded { retry_after_ms }) => {
            assert_eq!(retry_after_ms, Some(2000));
        }
        other => panic!("expected rate limit error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unparseable_error_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/2/public/symbol"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    assert!(matches!(
        public_client(&server).get_symbols().await,
        Err(ClientError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn test_huge_retry_after_saturates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/2/public/ticker/ETHBTC"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "18446744073709551615"))
        .mount(&server)
        .await;

    match public_client(&server).get_ticker("ETHBTC").await {
        Err(ClientError::RateLimitExceeded { retry_after_ms }) => {
            assert_eq!(retry_after_ms, Some(u64::MAX));
        }
        other => panic!("expected rate limit error, got {other:?}"),
    }
}
