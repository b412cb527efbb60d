//! Durable storage for candle windows, signals and alerts

pub mod memory;
pub mod questdb;

pub use memory::MemoryStore;
pub use questdb::QuestDatabase;

use crate::error::PipelineError;
use crate::models::indicators::Candle;
use crate::models::signal::{Alert, Confidence, Signal, SignalDirection};
use crate::models::timeframe::Timeframe;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_QUERY_LIMIT: usize = 50;

/// Range query over stored signals, newest first
#[derive(Debug, Clone, PartialEq)]
pub struct SignalQuery {
    pub instrument: Option<String>,
    /// Empty matches every timeframe
    pub timeframes: Vec<Timeframe>,
    pub direction: Option<SignalDirection>,
    pub since: Option<DateTime<Utc>>,
    pub limit: usize,
}

impl Default for SignalQuery {
    fn default() -> Self {
        Self {
            instrument: None,
            timeframes: Vec::new(),
            direction: None,
            since: None,
            limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

impl SignalQuery {
    pub fn for_instrument(instrument: impl Into<String>) -> Self {
        Self {
            instrument: Some(instrument.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, signal: &Signal) -> bool {
        self.instrument
            .as_ref()
            .map_or(true, |i| i.eq_ignore_ascii_case(&signal.instrument))
            && (self.timeframes.is_empty() || self.timeframes.contains(&signal.timeframe))
            && self.direction.map_or(true, |d| d == signal.direction)
            && self.since.map_or(true, |t| signal.timestamp >= t)
    }
}

#[async_trait]
pub trait SignalStore: Send + Sync {
    /// Replace the stored window for (instrument, timeframe) candle by candle
    async fn upsert_market_data(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        candles: &[Candle],
    ) -> Result<(), PipelineError>;

    async fn append_signal(&self, signal: &Signal) -> Result<(), PipelineError>;

    async fn append_alert(&self, alert: &Alert) -> Result<(), PipelineError>;

    async fn signals(&self, query: &SignalQuery) -> Result<Vec<Signal>, PipelineError>;

    /// Newest signal per (instrument, timeframe)
    async fn latest_signals(&self) -> Result<Vec<Signal>, PipelineError>;

    async fn alerts(&self, limit: usize) -> Result<Vec<Alert>, PipelineError>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignalStats {
    pub total: usize,
    pub by_direction: BTreeMap<String, usize>,
    pub by_confidence: BTreeMap<String, usize>,
    pub high_confidence: usize,
}

impl SignalStats {
    pub fn from_signals(signals: &[Signal]) -> Self {
        let mut stats = SignalStats {
            total: signals.len(),
            ..Default::default()
        };
        for signal in signals {
            *stats
                .by_direction
                .entry(signal.direction.to_string())
                .or_default() += 1;
            if let Some(confidence) = signal.confidence {
                *stats
                    .by_confidence
                    .entry(confidence.to_string())
                    .or_default() += 1;
                if confidence == Confidence::High {
                    stats.high_confidence += 1;
                }
            }
        }
        stats
    }
}
