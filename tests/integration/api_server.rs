//! Integration tests for the HTTP API
//!
//! Tests health, metrics, signal queries and on-demand generation.

use serde_json::{json, Value};
use trendcast::models::timeframe::Timeframe;

use crate::fixtures::{buy, high_buy, minutes_after_t0, sell, t0};
use crate::test_utils::{eventually, TestApp};
use trendcast::db::SignalStore;

#[tokio::test]
async fn health_endpoint_reports_healthy_status() {
    let app = TestApp::new().await;
    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["uptime_seconds"].as_u64().is_some());
    assert_eq!(body["service"], "trendcast");
    assert_eq!(body["subscribers"], 0);
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_metrics() {
    let app = TestApp::new().await;
    app.server.get("/health").await;
    let response = app.server.get("/metrics").await;
    assert_eq!(response.status_code(), 200);

    let body = response.text();
    assert!(body.contains("http_requests_total"));
    assert!(body.contains("http_request_duration_seconds"));
    assert!(body.contains("scheduler_tick_duration_seconds"));
}

#[tokio::test]
async fn timeframes_endpoint_lists_supported_values() {
    let app = TestApp::new().await;
    let body: Value = app.server.get("/api/timeframes").await.json();
    assert_eq!(body["timeframes"], json!(["1m", "5m", "15m", "30m", "1h", "4h", "1d"]));
    assert_eq!(body["defaults"], json!(["5m", "15m", "30m", "1h"]));
}

#[tokio::test]
async fn generate_rejects_unknown_timeframe() {
    let app = TestApp::new().await;
    let response = app
        .server
        .post("/api/signals/generate")
        .json(&json!({ "instrument": "BTCUSDT", "timeframe": "7m" }))
        .expect_failure()
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("7m"));
}

#[tokio::test]
async fn generate_returns_signal_then_null() {
    let app = TestApp::new().await;
    let request = json!({ "instrument": "btcusdt", "timeframe": "5m" });

    let body: Value = app.server.post("/api/signals/generate").json(&request).await.json();
    assert_eq!(body["signal"]["instrument"], "BTCUSDT");
    assert_eq!(body["signal"]["direction"], "BUY");
    assert_eq!(body["signal"]["timeframe"], "5m");
    assert!(body["signal"]["reasoning"].as_array().is_some_and(|r| !r.is_empty()));

    let store = app.store.clone();
    assert!(eventually(|| {
        let store = store.clone();
        async move { store.signal_count().await == 1 }
    })
    .await);

    let body: Value = app.server.post("/api/signals/generate").json(&request).await.json();
    assert!(body["signal"].is_null());

    let body: Value = app
        .server
        .post("/api/signals/generate")
        .json(&json!({ "instrument": "FLATUSDT", "timeframe": "1h" }))
        .await
        .json();
    assert!(body["signal"].is_null());
}

#[tokio::test]
async fn signal_queries_filter_and_summarize() {
    let app = TestApp::new().await;
    app.store.append_signal(&buy("BTCUSDT", Timeframe::M5, t0())).await.unwrap();
    app.store
        .append_signal(&sell("BTCUSDT", Timeframe::M5, minutes_after_t0(20)))
        .await
        .unwrap();
    app.store
        .append_signal(&high_buy("ETHUSDT", Timeframe::H1, minutes_after_t0(5)))
        .await
        .unwrap();

    let body: Value = app.server.get("/api/signals").await.json();
    assert_eq!(body["count"], 3);
    assert_eq!(body["signals"][0]["direction"], "SELL");

    let body: Value = app
        .server
        .get("/api/signals")
        .add_query_param("instrument", "BTCUSDT")
        .add_query_param("timeframe", "5m,1h")
        .add_query_param("limit", "1")
        .await
        .json();
    assert_eq!(body["count"], 1);
    assert_eq!(body["signals"][0]["instrument"], "BTCUSDT");

    let response = app
        .server
        .get("/api/signals")
        .add_query_param("timeframe", "2h")
        .expect_failure()
        .await;
    assert_eq!(response.status_code(), 400);

    let body: Value = app.server.get("/api/signals/latest").await.json();
    assert_eq!(body["count"], 2);

    let body: Value = app.server.get("/api/signals/stats").await.json();
    assert_eq!(body["total"], 3);
    assert_eq!(body["by_direction"]["BUY"], 2);
    assert_eq!(body["by_direction"]["SELL"], 1);
    assert_eq!(body["high_confidence"], 1);
}

#[tokio::test]
async fn alerts_endpoint_lists_stored_alerts() {
    let app = TestApp::new().await;
    app.pipeline.persist(&high_buy("ETHUSDT", Timeframe::H1, t0()));
    app.pipeline.persist(&buy("BTCUSDT", Timeframe::M5, t0()));

    let store = app.store.clone();
    assert!(eventually(|| {
        let store = store.clone();
        async move { store.signal_count().await == 2 && store.alert_count().await == 1 }
    })
    .await);

    let body: Value = app.server.get("/api/alerts").await.json();
    assert_eq!(body["count"], 1);
    assert_eq!(body["alerts"][0]["instrument"], "ETHUSDT");
    assert_eq!(body["alerts"][0]["confidence"], "High");
}

#[tokio::test]
async fn market_data_endpoint_serves_window() {
    let app = TestApp::new().await;
    let body: Value = app.server.get("/api/market-data/btcusdt/5m").await.json();
    assert_eq!(body["instrument"], "BTCUSDT");
    assert_eq!(body["timeframe"], "5m");
    assert_eq!(body["market"], "crypto");
    assert_eq!(body["count"], 60);

    let response = app
        .server
        .get("/api/market-data/BTCUSDT/9m")
        .expect_failure()
        .await;
    assert_eq!(response.status_code(), 400);
}
