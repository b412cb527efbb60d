//! In-process store used when no database is configured, and in tests

use super::{SignalQuery, SignalStore};
use crate::error::PipelineError;
use crate::models::indicators::Candle;
use crate::models::signal::{Alert, Signal};
use crate::models::timeframe::Timeframe;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Upper bound on retained signals and alerts; the oldest are evicted first
const RETENTION: usize = 10_000;

#[derive(Default)]
pub struct MemoryStore {
    market_data: RwLock<HashMap<(String, Timeframe), Vec<Candle>>>,
    signals: RwLock<Vec<Signal>>,
    alerts: RwLock<Vec<Alert>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn market_data(&self, instrument: &str, timeframe: Timeframe) -> Option<Vec<Candle>> {
        let data = self.market_data.read().await;
        data.get(&(instrument.to_string(), timeframe)).cloned()
    }

    pub async fn signal_count(&self) -> usize {
        self.signals.read().await.len()
    }

    pub async fn alert_count(&self) -> usize {
        self.alerts.read().await.len()
    }
}

fn push_bounded<T>(items: &mut Vec<T>, item: T) {
    items.push(item);
    if items.len() > RETENTION {
        let excess = items.len() - RETENTION;
        items.drain(..excess);
    }
}

#[async_trait]
impl SignalStore for MemoryStore {
    async fn upsert_market_data(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        candles: &[Candle],
    ) -> Result<(), PipelineError> {
        // only the latest fetched window is kept per tuple
        let mut data = self.market_data.write().await;
        data.insert((instrument.to_string(), timeframe), candles.to_vec());
        Ok(())
    }

    async fn append_signal(&self, signal: &Signal) -> Result<(), PipelineError> {
        let mut signals = self.signals.write().await;
        push_bounded(&mut signals, signal.clone());
        Ok(())
    }

    async fn append_alert(&self, alert: &Alert) -> Result<(), PipelineError> {
        let mut alerts = self.alerts.write().await;
        push_bounded(&mut alerts, alert.clone());
        Ok(())
    }

    async fn signals(&self, query: &SignalQuery) -> Result<Vec<Signal>, PipelineError> {
        let signals = self.signals.read().await;
        let mut matched: Vec<Signal> = signals.iter().filter(|s| query.matches(s)).cloned().collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matched.truncate(query.limit);
        Ok(matched)
    }

    async fn latest_signals(&self) -> Result<Vec<Signal>, PipelineError> {
        let signals = self.signals.read().await;
        let mut latest: HashMap<(String, Timeframe), &Signal> = HashMap::new();
        for signal in signals.iter() {
            let key = (signal.instrument.clone(), signal.timeframe);
            match latest.get(&key) {
                Some(existing) if existing.timestamp > signal.timestamp => {}
                _ => {
                    latest.insert(key, signal);
                }
            }
        }
        let mut out: Vec<Signal> = latest.into_values().cloned().collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(out)
    }

    async fn alerts(&self, limit: usize) -> Result<Vec<Alert>, PipelineError> {
        let alerts = self.alerts.read().await;
        Ok(alerts.iter().rev().take(limit).cloned().collect())
    }
}
