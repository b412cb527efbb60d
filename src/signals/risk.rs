//! Volatility-scaled target and stop levels

use crate::common::math::round_significant;
use crate::indicators::volatility::atr_percent;
use crate::models::signal::SignalDirection;
use serde::{Deserialize, Serialize};

const TARGET_STEP: f64 = 0.02;
const STOP_STEP: f64 = 0.015;
const PRICE_DECIMALS: u32 = 8;
const PRICE_SIGNIFICANT: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLevels {
    pub target_price: f64,
    pub stop_loss: f64,
    pub volatility_multiplier: f64,
}

pub struct RiskCalculator;

impl RiskCalculator {
    /// Band the ATR as a percent of price: >5% 2.0, >3% 1.5, >1% 1.0, else 0.7
    pub fn volatility_multiplier(atr: f64, price: f64) -> f64 {
        let pct = atr_percent(atr, price);
        if pct > 5.0 {
            2.0
        } else if pct > 3.0 {
            1.5
        } else if pct > 1.0 {
            1.0
        } else {
            0.7
        }
    }

    /// Target and stop for a tradable direction; HOLD yields nothing
    pub fn annotate(direction: SignalDirection, price: f64, atr: f64) -> Option<RiskLevels> {
        let multiplier = Self::volatility_multiplier(atr, price);
        let (target, stop) = match direction {
            SignalDirection::Buy => (
                price * (1.0 + TARGET_STEP * multiplier),
                price * (1.0 - STOP_STEP * multiplier),
            ),
            SignalDirection::Sell => (
                price * (1.0 - TARGET_STEP * multiplier),
                price * (1.0 + STOP_STEP * multiplier),
            ),
            SignalDirection::Hold => return None,
        };

        Some(RiskLevels {
            target_price: round_significant(target, PRICE_DECIMALS, PRICE_SIGNIFICANT),
            stop_loss: round_significant(stop, PRICE_DECIMALS, PRICE_SIGNIFICANT),
            volatility_multiplier: multiplier,
        })
    }
}
