//! MACD (Moving Average Convergence Divergence) indicator

use crate::common::math;
use crate::models::indicators::{Candle, MacdIndicator};

/// Calculate MACD indicator
///
/// MACD = EMA(fast) - EMA(slow)
/// Signal = EMA(signal) of the MACD series
/// Histogram = MACD - Signal
pub fn calculate_macd(
    candles: &[Candle],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> Option<MacdIndicator> {
    if fast_period == 0 || fast_period >= slow_period || signal_period == 0 {
        return None;
    }
    if candles.len() < slow_period + signal_period - 1 {
        return None;
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let fast = math::ema_series(&closes, fast_period);
    let slow = math::ema_series(&closes, slow_period);

    // fast[0] lines up with closes[fast - 1], slow[0] with closes[slow - 1]
    let offset = slow_period - fast_period;
    let macd_values: Vec<f64> = slow
        .iter()
        .enumerate()
        .map(|(i, slow_value)| fast[i + offset] - slow_value)
        .collect();

    let macd_line = *macd_values.last()?;
    let signal_line = math::ema(&macd_values, signal_period)?;

    Some(MacdIndicator {
        macd: macd_line,
        signal: signal_line,
        histogram: macd_line - signal_line,
    })
}

/// Calculate MACD with default periods (12, 26, 9)
pub fn calculate_macd_default(candles: &[Candle]) -> Option<MacdIndicator> {
    calculate_macd(candles, 12, 26, 9)
}
