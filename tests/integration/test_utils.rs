//! Shared harness for the integration suites
#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use serde_json::{json, Value};
use trendcast::core::http::{create_router, AppState};
use trendcast::core::pipeline::SignalPipeline;
use trendcast::db::{MemoryStore, SignalQuery, SignalStore};
use trendcast::error::PipelineError;
use trendcast::metrics::Metrics;
use trendcast::models::indicators::Candle;
use trendcast::models::signal::{Alert, Signal};
use trendcast::models::timeframe::Timeframe;
use trendcast::services::broadcaster::Broadcaster;
use trendcast::services::market_data::MarketDataProvider;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::fixtures::{bullish_window, flat_window, strong_bullish_window};

/// Instrument whose fetch panics inside the provider
pub const PANIC_INSTRUMENT: &str = "PANICUSDT";

/// Provider serving fixed windows keyed by instrument, regardless of limit
pub struct StubProvider {
    windows: HashMap<String, Vec<Candle>>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self {
            windows: HashMap::new(),
        }
    }

    /// BTCUSDT and ETHUSDT score Low BUYs, FLATUSDT HOLD and SHORTUSDT has
    /// too little history
    pub fn standard() -> Self {
        Self::new()
            .with_window("BTCUSDT", bullish_window())
            .with_window("ETHUSDT", strong_bullish_window())
            .with_window("FLATUSDT", flat_window(60))
            .with_window("SHORTUSDT", flat_window(10))
    }

    pub fn with_window(mut self, instrument: &str, candles: Vec<Candle>) -> Self {
        self.windows.insert(instrument.to_string(), candles);
        self
    }
}

#[async_trait]
impl MarketDataProvider for StubProvider {
    async fn fetch(&self, instrument: &str, _timeframe: Timeframe, _limit: usize) -> Vec<Candle> {
        if instrument == PANIC_INSTRUMENT {
            panic!("provider blew up for {instrument}");
        }
        self.windows.get(instrument).cloned().unwrap_or_default()
    }
}

/// Store whose every operation fails
pub struct FailingStore;

fn unavailable() -> PipelineError {
    PipelineError::Persistence("store unavailable".to_string())
}

#[async_trait]
impl SignalStore for FailingStore {
    async fn upsert_market_data(&self, _: &str, _: Timeframe, _: &[Candle]) -> Result<(), PipelineError> {
        Err(unavailable())
    }

    async fn append_signal(&self, _: &Signal) -> Result<(), PipelineError> {
        Err(unavailable())
    }

    async fn append_alert(&self, _: &Alert) -> Result<(), PipelineError> {
        Err(unavailable())
    }

    async fn signals(&self, _: &SignalQuery) -> Result<Vec<Signal>, PipelineError> {
        Err(unavailable())
    }

    async fn latest_signals(&self) -> Result<Vec<Signal>, PipelineError> {
        Err(unavailable())
    }

    async fn alerts(&self, _: usize) -> Result<Vec<Alert>, PipelineError> {
        Err(unavailable())
    }
}

/// Poll `check` until it holds or two seconds pass
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

/// Pipeline over the standard stub provider and a fresh memory store
pub fn stub_pipeline() -> (Arc<SignalPipeline>, Arc<MemoryStore>) {
    pipeline_with(StubProvider::standard())
}

pub fn pipeline_with(provider: StubProvider) -> (Arc<SignalPipeline>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let metrics = Arc::new(Metrics::new().expect("metrics initialization"));
    let broadcaster = Arc::new(Broadcaster::new(16).with_metrics(metrics.clone()));
    let pipeline = SignalPipeline::new(Arc::new(provider), store.clone(), broadcaster, metrics);
    (Arc::new(pipeline), store)
}

/// HTTP server over a stub-backed pipeline
pub struct TestApp {
    pub server: TestServer,
    pub pipeline: Arc<SignalPipeline>,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub async fn new() -> Self {
        let (pipeline, store) = stub_pipeline();
        let router = create_router(AppState::new(pipeline.clone()));
        let server = TestServer::new(router).expect("start test server");
        Self {
            server,
            pipeline,
            store,
        }
    }

    /// Same app bound to a real port, which websocket upgrades need
    pub async fn with_http_transport() -> Self {
        let (pipeline, store) = stub_pipeline();
        let router = create_router(AppState::new(pipeline.clone()));
        let server = TestServer::builder()
            .http_transport()
            .build(router)
            .expect("start test server");
        Self {
            server,
            pipeline,
            store,
        }
    }
}

/// Klines response body in the exchange's row format
pub fn klines_body(candles: &[Candle]) -> Value {
    Value::Array(
        candles
            .iter()
            .map(|c| {
                json!([
                    c.timestamp,
                    c.open.to_string(),
                    c.high.to_string(),
                    c.low.to_string(),
                    c.close.to_string(),
                    c.volume.to_string(),
                    c.timestamp + 299_999,
                    "0",
                    1,
                    "0",
                    "0",
                    "0"
                ])
            })
            .collect(),
    )
}

pub async fn mock_klines(server: &MockServer, symbol: &str, candles: &[Candle]) {
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .and(query_param("symbol", symbol))
        .respond_with(ResponseTemplate::new(200).set_body_json(klines_body(candles)))
        .mount(server)
        .await;
}
