//! Candle window acquisition with caching and synthetic fallback.

use crate::db::SignalStore;
use crate::metrics::Metrics;
use crate::models::indicators::Candle;
use crate::models::market::MarketKind;
use crate::models::timeframe::Timeframe;
use crate::services::binance::BinanceRestClient;
use crate::services::synthetic::SyntheticCandleGenerator;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Ordered candle window for an instrument. Recoverable upstream
    /// failures are absorbed; the caller always gets a window.
    async fn fetch(&self, instrument: &str, timeframe: Timeframe, limit: usize) -> Vec<Candle>;
}

struct CacheEntry {
    stored_at: Instant,
    candles: Arc<Vec<Candle>>,
}

/// Exchange-backed provider.
///
/// Crypto instruments are fetched from the klines endpoint; forex and
/// commodity instruments, and any failed fetch, are served synthetically.
/// Only exchange data is persisted, and fallback windows are never cached.
pub struct ExchangeMarketDataProvider {
    client: BinanceRestClient,
    synthetic: SyntheticCandleGenerator,
    cache: RwLock<HashMap<(String, Timeframe), CacheEntry>>,
    ttl: Duration,
    store: Option<Arc<dyn SignalStore>>,
    metrics: Option<Arc<Metrics>>,
}

impl ExchangeMarketDataProvider {
    pub fn new(client: BinanceRestClient) -> Self {
        Self {
            client,
            synthetic: SyntheticCandleGenerator::new(),
            cache: RwLock::new(HashMap::new()),
            ttl: DEFAULT_CACHE_TTL,
            store: None,
            metrics: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_synthetic(mut self, synthetic: SyntheticCandleGenerator) -> Self {
        self.synthetic = synthetic;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn SignalStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    async fn cached(&self, key: &(String, Timeframe), limit: usize) -> Option<Vec<Candle>> {
        let cache = self.cache.read().await;
        let entry = cache.get(key)?;
        if entry.stored_at.elapsed() >= self.ttl || entry.candles.len() < limit {
            return None;
        }
        let start = entry.candles.len() - limit;
        Some(entry.candles[start..].to_vec())
    }

    async fn remember(&self, key: (String, Timeframe), candles: &[Candle]) {
        let mut cache = self.cache.write().await;
        cache.insert(
            key,
            CacheEntry {
                stored_at: Instant::now(),
                candles: Arc::new(candles.to_vec()),
            },
        );
    }

    /// Fire-and-forget upsert; failures are logged only
    fn persist(&self, instrument: &str, timeframe: Timeframe, candles: &[Candle]) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let instrument = instrument.to_string();
        let candles = candles.to_vec();
        tokio::spawn(async move {
            if let Err(e) = store.upsert_market_data(&instrument, timeframe, &candles).await {
                warn!(
                    instrument = %instrument,
                    timeframe = %timeframe,
                    error = %e,
                    "failed to persist market data"
                );
            }
        });
    }

    fn synthetic_window(&self, instrument: &str, timeframe: Timeframe, limit: usize) -> Vec<Candle> {
        self.synthetic.generate(instrument, timeframe, limit, Utc::now())
    }
}

#[async_trait]
impl MarketDataProvider for ExchangeMarketDataProvider {
    async fn fetch(&self, instrument: &str, timeframe: Timeframe, limit: usize) -> Vec<Candle> {
        let key = (instrument.to_string(), timeframe);
        if let Some(candles) = self.cached(&key, limit).await {
            debug!(instrument, timeframe = %timeframe, "market data cache hit");
            if let Some(metrics) = &self.metrics {
                metrics.market_data_cache_hits_total.inc();
            }
            return candles;
        }

        if !MarketKind::classify(instrument).has_exchange_feed() {
            let candles = self.synthetic_window(instrument, timeframe, limit);
            self.remember(key, &candles).await;
            return candles;
        }

        match self.client.klines(instrument, timeframe, limit).await {
            Ok(candles) => {
                self.remember(key, &candles).await;
                self.persist(instrument, timeframe, &candles);
                candles
            }
            Err(e) => {
                warn!(
                    instrument,
                    timeframe = %timeframe,
                    error = %e,
                    "upstream candle fetch failed, using synthetic data"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.market_data_fallbacks_total.inc();
                }
                self.synthetic_window(instrument, timeframe, limit)
            }
        }
    }
}
