//! Pure chain from a candle window to a signal candidate.

use crate::error::PipelineError;
use crate::indicators::IndicatorEngine;
use crate::models::indicators::{is_strictly_increasing, Candle};
use crate::models::market::MarketKind;
use crate::models::signal::Signal;
use crate::models::timeframe::Timeframe;
use crate::signals::risk::RiskCalculator;
use crate::signals::scoring::ScoringEngine;
use chrono::{DateTime, Utc};

/// Shortest window eligible for a signal
pub const MIN_CANDLES: usize = 50;

pub struct SignalEngine;

impl SignalEngine {
    /// Score `candles` and stamp the candidate with the current time
    pub fn evaluate(
        instrument: &str,
        timeframe: Timeframe,
        candles: &[Candle],
    ) -> Result<Signal, PipelineError> {
        Self::evaluate_at(instrument, timeframe, candles, Utc::now())
    }

    /// Indicators, scoring and risk levels for one window. HOLD candidates
    /// are returned too; admission is decided downstream.
    pub fn evaluate_at(
        instrument: &str,
        timeframe: Timeframe,
        candles: &[Candle],
        timestamp: DateTime<Utc>,
    ) -> Result<Signal, PipelineError> {
        if candles.len() < MIN_CANDLES {
            return Err(PipelineError::InsufficientHistory {
                available: candles.len(),
                required: MIN_CANDLES,
            });
        }
        if !is_strictly_increasing(candles) {
            return Err(PipelineError::IndicatorComputation(
                "candle timestamps are not strictly increasing".to_string(),
            ));
        }

        let snapshot = IndicatorEngine::compute(candles)?;
        let evaluation = ScoringEngine::evaluate(&snapshot);
        let risk = RiskCalculator::annotate(evaluation.direction, snapshot.price, snapshot.atr.get());

        Ok(Signal {
            instrument: instrument.to_string(),
            timeframe,
            market: MarketKind::classify(instrument),
            direction: evaluation.direction,
            confidence: evaluation.confidence,
            price: snapshot.price,
            target_price: risk.map(|r| r.target_price),
            stop_loss: risk.map(|r| r.stop_loss),
            composite_score: evaluation.composite_score,
            trend_strength: evaluation.trend_strength,
            reasoning: evaluation.reasoning,
            timestamp,
            indicators: snapshot,
        })
    }
}
