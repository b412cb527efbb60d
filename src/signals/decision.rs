//! Composite score to direction and confidence
//!
//! Rules are checked top-down and the first match wins. The ranges overlap,
//! so the order of `THRESHOLD_RULES` is part of the contract.

use crate::models::signal::{Confidence, SignalDirection};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdRule {
    pub direction: SignalDirection,
    pub confidence: Confidence,
    /// Inclusive bound on the score: `>=` for BUY, `<=` for SELL
    pub score: f64,
    /// Exclusive lower bound on trend strength
    pub min_trend_strength: Option<f64>,
}

impl ThresholdRule {
    pub fn matches(&self, score: f64, trend_strength: f64) -> bool {
        let score_ok = match self.direction {
            SignalDirection::Buy => score >= self.score,
            SignalDirection::Sell => score <= self.score,
            SignalDirection::Hold => false,
        };
        score_ok && self.min_trend_strength.map_or(true, |min| trend_strength > min)
    }
}

const fn rule(
    direction: SignalDirection,
    confidence: Confidence,
    score: f64,
    min_trend_strength: Option<f64>,
) -> ThresholdRule {
    ThresholdRule {
        direction,
        confidence,
        score,
        min_trend_strength,
    }
}

pub const THRESHOLD_RULES: [ThresholdRule; 6] = [
    rule(SignalDirection::Buy, Confidence::High, 6.0, Some(0.6)),
    rule(SignalDirection::Buy, Confidence::Medium, 3.0, Some(0.4)),
    rule(SignalDirection::Buy, Confidence::Low, 1.5, None),
    rule(SignalDirection::Sell, Confidence::High, -6.0, Some(0.6)),
    rule(SignalDirection::Sell, Confidence::Medium, -3.0, Some(0.4)),
    rule(SignalDirection::Sell, Confidence::Low, -1.5, None),
];

/// Map a clamped composite score and trend strength to a decision.
/// Confidence is `None` exactly when the direction is HOLD.
pub fn decide(score: f64, trend_strength: f64) -> (SignalDirection, Option<Confidence>) {
    THRESHOLD_RULES
        .iter()
        .find(|r| r.matches(score, trend_strength))
        .map(|r| (r.direction, Some(r.confidence)))
        .unwrap_or((SignalDirection::Hold, None))
}
