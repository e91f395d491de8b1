//! Market client integration tests.
//!
//! Runs `MarketClient` against a wiremock server:
//! - Ranking -> symbol construction and ordering
//! - Kline -> ratio, 400 skip, insufficient data
//! - Error mapping for malformed bodies and unreachable hosts

use serde_json::json;
use volspike_core::Symbol;
use volspike_market::{MarketClient, MarketEndpoints, MarketError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn kline_row(volume: &str) -> serde_json::Value {
    json!([
        1700000000000u64,
        "1.0",
        "1.1",
        "0.9",
        "1.05",
        volume,
        1700003599999u64,
        "0",
        10,
        "0",
        "0",
        "0"
    ])
}

fn client_for(server: &MockServer) -> MarketClient {
    MarketClient::new(MarketEndpoints {
        ranking_url: server.uri(),
        kline_url: server.uri(),
    })
    .unwrap()
}

async fn mount_klines(server: &MockServer, symbol: &str, status: u16, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/klines"))
        .and(query_param("symbol", symbol))
        .and(query_param("interval", "1h"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_top_symbols_preserves_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/coins/markets"))
        .and(query_param("vs_currency", "usd"))
        .and(query_param("order", "market_cap_desc"))
        .and(query_param("per_page", "100"))
        .and(query_param("page", "1"))
        .and(query_param("sparkline", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "bitcoin", "symbol": "btc"},
            {"id": "ethereum", "symbol": "eth"},
            {"id": "unknown", "symbol": ""},
            {"id": "tether", "symbol": "usdt"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let symbols = client_for(&server).fetch_top_symbols().await.unwrap();
    let names: Vec<&str> = symbols.iter().map(Symbol::as_str).collect();
    assert_eq!(names, vec!["BTCUSDT", "ETHUSDT", "USDTUSDT"]);
}

#[tokio::test]
async fn test_fetch_top_symbols_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/coins/markets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "oops"})))
        .mount(&server)
        .await;

    let err = client_for(&server).fetch_top_symbols().await.unwrap_err();
    assert!(matches!(err, MarketError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn test_fetch_top_symbols_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/coins/markets"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({"status": {"error_code": 429}})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).fetch_top_symbols().await.unwrap_err();
    assert!(matches!(err, MarketError::HttpStatus { status: 429, .. }));
}

#[tokio::test]
async fn test_fetch_volume_signal_ratio() {
    let server = MockServer::start().await;
    mount_klines(
        &server,
        "ETHUSDT",
        200,
        json!([kline_row("100.0"), kline_row("600.0")]),
    )
    .await;

    let sample = client_for(&server)
        .fetch_volume_signal(&Symbol::from_base_asset("eth"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(sample.prev_volume, 100.0);
    assert_eq!(sample.curr_volume, 600.0);
    assert_eq!(sample.ratio, 6.0);
    assert!(sample.exceeds_threshold());
}

#[tokio::test]
async fn test_fetch_volume_signal_invalid_symbol_is_no_signal() {
    let server = MockServer::start().await;
    mount_klines(
        &server,
        "STETHUSDT",
        400,
        json!({"code": -1121, "msg": "Invalid symbol."}),
    )
    .await;

    let result = client_for(&server)
        .fetch_volume_signal(&Symbol::from_base_asset("steth"))
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_fetch_volume_signal_single_candle() {
    let server = MockServer::start().await;
    mount_klines(&server, "NEWUSDT", 200, json!([kline_row("100.0")])).await;

    let err = client_for(&server)
        .fetch_volume_signal(&Symbol::from_base_asset("new"))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::InsufficientData { count: 1, .. }));
}

#[tokio::test]
async fn test_fetch_volume_signal_zero_prev_volume() {
    let server = MockServer::start().await;
    mount_klines(
        &server,
        "ZROUSDT",
        200,
        json!([kline_row("0.00000000"), kline_row("600.0")]),
    )
    .await;

    let result = client_for(&server)
        .fetch_volume_signal(&Symbol::from_base_asset("zro"))
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_fetch_volume_signal_server_error() {
    let server = MockServer::start().await;
    mount_klines(&server, "BTCUSDT", 500, json!({})).await;

    let err = client_for(&server)
        .fetch_volume_signal(&Symbol::from_base_asset("btc"))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::HttpStatus { status: 500, .. }));
    assert!(!err.is_transport());
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = MarketClient::new(MarketEndpoints {
        ranking_url: format!("http://{addr}"),
        kline_url: format!("http://{addr}"),
    })
    .unwrap();

    let err = client.fetch_top_symbols().await.unwrap_err();
    assert!(err.is_transport(), "got {err:?}");
}
