//! Stochastic oscillator

use crate::common::math;
use crate::models::indicators::{Candle, Stochastic};

/// Calculate %K and %D
///
/// %K = 100 * (close - lowest low) / (highest high - lowest low)
/// %D = SMA(signal_period) of %K
pub fn calculate_stochastic(
    candles: &[Candle],
    period: usize,
    signal_period: usize,
) -> Option<Stochastic> {
    if period == 0 || signal_period == 0 || candles.len() < period + signal_period - 1 {
        return None;
    }

    let k_values: Vec<f64> = candles
        .windows(period)
        .map(|window| {
            let highs: Vec<f64> = window.iter().map(|c| c.high).collect();
            let lows: Vec<f64> = window.iter().map(|c| c.low).collect();
            let highest = math::highest(&highs).unwrap_or(0.0);
            let lowest = math::lowest(&lows).unwrap_or(0.0);
            let close = window[window.len() - 1].close;
            let range = highest - lowest;
            if range <= 0.0 {
                50.0
            } else {
                100.0 * (close - lowest) / range
            }
        })
        .collect();

    let k = *k_values.last()?;
    let d = math::sma(&k_values, signal_period)?;
    Some(Stochastic { k, d })
}

/// Calculate stochastic with default parameters (14, 3)
pub fn calculate_stochastic_default(candles: &[Candle]) -> Option<Stochastic> {
    calculate_stochastic(candles, 14, 3)
}
