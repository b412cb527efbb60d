//! One explicitly constructed pipeline instance owning the cache, the dedup
//! map and the subscriber registry. Whatever drives ticks holds an `Arc` to it.

use crate::db::SignalStore;
use crate::error::PipelineError;
use crate::metrics::Metrics;
use crate::models::signal::{Alert, Signal};
use crate::models::timeframe::Timeframe;
use crate::services::broadcaster::Broadcaster;
use crate::services::market_data::MarketDataProvider;
use crate::signals::dedup::{Admission, DeduplicationGate, SuppressReason};
use crate::signals::engine::SignalEngine;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const DEFAULT_CANDLE_LIMIT: usize = 250;

/// What happened to one (instrument, timeframe) evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum TupleOutcome {
    Emitted(Box<Signal>),
    Suppressed(SuppressReason),
    Skipped(String),
}

pub struct SignalPipeline {
    provider: Arc<dyn MarketDataProvider>,
    store: Arc<dyn SignalStore>,
    broadcaster: Arc<Broadcaster>,
    gate: DeduplicationGate,
    metrics: Arc<Metrics>,
    candle_limit: usize,
}

impl SignalPipeline {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        store: Arc<dyn SignalStore>,
        broadcaster: Arc<Broadcaster>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            provider,
            store,
            broadcaster,
            gate: DeduplicationGate::default(),
            metrics,
            candle_limit: DEFAULT_CANDLE_LIMIT,
        }
    }

    pub fn with_gate(mut self, gate: DeduplicationGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_candle_limit(mut self, limit: usize) -> Self {
        self.candle_limit = limit;
        self
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    pub fn store(&self) -> &Arc<dyn SignalStore> {
        &self.store
    }

    pub fn provider(&self) -> &Arc<dyn MarketDataProvider> {
        &self.provider
    }

    pub fn gate(&self) -> &DeduplicationGate {
        &self.gate
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn candle_limit(&self) -> usize {
        self.candle_limit
    }

    /// Fetch and score without touching dedup state
    pub async fn evaluate(&self, instrument: &str, timeframe: Timeframe) -> Result<Signal, PipelineError> {
        let candles = self.provider.fetch(instrument, timeframe, self.candle_limit).await;
        SignalEngine::evaluate(instrument, timeframe, &candles)
    }

    async fn run_chain(&self, instrument: &str, timeframe: Timeframe) -> Result<TupleOutcome, PipelineError> {
        let candidate = self.evaluate(instrument, timeframe).await?;

        match self.gate.admit(&candidate).await {
            Admission::Accepted => {
                self.metrics
                    .signals_generated_total
                    .with_label_values(&[
                        candidate.direction.as_str(),
                        candidate.confidence.map_or("None", |c| c.as_str()),
                    ])
                    .inc();
                info!(
                    instrument,
                    timeframe = %timeframe,
                    direction = %candidate.direction,
                    confidence = ?candidate.confidence,
                    score = candidate.composite_score,
                    "signal admitted"
                );
                Ok(TupleOutcome::Emitted(Box::new(candidate)))
            }
            Admission::Suppressed(reason) => {
                self.metrics
                    .signals_suppressed_total
                    .with_label_values(&[reason.as_str()])
                    .inc();
                debug!(
                    instrument,
                    timeframe = %timeframe,
                    direction = %candidate.direction,
                    reason = reason.as_str(),
                    "signal suppressed"
                );
                Ok(TupleOutcome::Suppressed(reason))
            }
        }
    }

    fn record_failure(&self, instrument: &str, timeframe: Timeframe, err: &PipelineError) {
        self.metrics.pipeline_failures_total.inc();
        match err {
            PipelineError::InsufficientHistory { .. } => {
                warn!(instrument, timeframe = %timeframe, error = %err, "no signal: insufficient history")
            }
            _ => error!(instrument, timeframe = %timeframe, error = %err, "signal evaluation failed"),
        }
    }

    /// Run fetch, indicators, scoring, risk and dedup once.
    ///
    /// Returns the admitted BUY/SELL signal, or `None` for HOLD, suppression
    /// or any fault. Causes are only visible in the logs.
    pub async fn generate_signal(&self, instrument: &str, timeframe: Timeframe) -> Option<Signal> {
        match self.run_chain(instrument, timeframe).await {
            Ok(TupleOutcome::Emitted(signal)) => Some(*signal),
            Ok(_) => None,
            Err(e) => {
                self.record_failure(instrument, timeframe, &e);
                None
            }
        }
    }

    /// Scheduled evaluation: generate, then persist and broadcast what was admitted
    pub async fn run_tuple(&self, instrument: &str, timeframe: Timeframe) -> TupleOutcome {
        match self.run_chain(instrument, timeframe).await {
            Ok(TupleOutcome::Emitted(signal)) => {
                self.dispatch(&signal).await;
                TupleOutcome::Emitted(signal)
            }
            Ok(outcome) => outcome,
            Err(e) => {
                self.record_failure(instrument, timeframe, &e);
                TupleOutcome::Skipped(e.to_string())
            }
        }
    }

    /// Persist, publish to matching subscribers and raise an alert for High confidence
    pub async fn dispatch(&self, signal: &Signal) {
        self.persist(signal);
        let delivered = self.broadcaster.publish(signal).await;
        debug!(
            instrument = %signal.instrument,
            timeframe = %signal.timeframe,
            delivered,
            "signal published"
        );
        if signal.is_high_confidence() {
            self.metrics.alerts_total.inc();
            self.broadcaster.publish_alert(signal).await;
        }
    }

    /// Append the signal and its alert, if any, without waiting for the store
    pub fn persist(&self, signal: &Signal) {
        let store = self.store.clone();
        let signal = signal.clone();
        tokio::spawn(async move {
            if let Err(e) = store.append_signal(&signal).await {
                warn!(instrument = %signal.instrument, error = %e, "failed to persist signal");
            }
            if let Some(alert) = Alert::from_signal(&signal) {
                if let Err(e) = store.append_alert(&alert).await {
                    warn!(instrument = %signal.instrument, error = %e, "failed to persist alert");
                }
            }
        });
    }
}
