use crate::models::indicators::IndicatorSnapshot;
use crate::models::market::MarketKind;
use crate::models::timeframe::Timeframe;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalDirection {
    Buy,
    Sell,
    Hold,
}

impl SignalDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalDirection::Buy => "BUY",
            SignalDirection::Sell => "SELL",
            SignalDirection::Hold => "HOLD",
        }
    }

    pub fn is_actionable(&self) -> bool {
        !matches!(self, SignalDirection::Hold)
    }
}

impl fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered Low < Medium < High
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "Low",
            Confidence::Medium => "Medium",
            Confidence::High => "High",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scored evaluation of one candle window. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub instrument: String,
    pub timeframe: Timeframe,
    pub market: MarketKind,
    pub direction: SignalDirection,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub confidence: Option<Confidence>,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stop_loss: Option<f64>,
    pub composite_score: f64,
    pub trend_strength: f64,
    pub reasoning: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub indicators: IndicatorSnapshot,
}

impl Signal {
    pub fn is_high_confidence(&self) -> bool {
        self.direction.is_actionable() && self.confidence == Some(Confidence::High)
    }
}

/// High-confidence notification sent to every subscriber
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub instrument: String,
    pub timeframe: Timeframe,
    pub direction: SignalDirection,
    pub confidence: Confidence,
    pub price: f64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    /// Only high-confidence BUY/SELL signals produce an alert
    pub fn from_signal(signal: &Signal) -> Option<Self> {
        if !signal.is_high_confidence() {
            return None;
        }
        Some(Self {
            instrument: signal.instrument.clone(),
            timeframe: signal.timeframe,
            direction: signal.direction,
            confidence: Confidence::High,
            price: signal.price,
            message: format!(
                "High confidence {} signal for {} at {}",
                signal.direction, signal.instrument, signal.price
            ),
            timestamp: signal.timestamp,
        })
    }
}
