//! ATR (Average True Range) indicator

use crate::common::math;
use crate::models::indicators::Candle;

/// Calculate ATR (Average True Range) with Wilder smoothing
///
/// ATR measures market volatility by averaging true range over a period
pub fn calculate_atr(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period + 1 {
        return None;
    }

    let tr_values: Vec<f64> = candles
        .windows(2)
        .map(|w| math::true_range(w[1].high, w[1].low, w[0].close))
        .collect();

    math::wilder_series(&tr_values, period).last().copied()
}

/// Calculate ATR with default period (14)
pub fn calculate_atr_default(candles: &[Candle]) -> Option<f64> {
    calculate_atr(candles, 14)
}

/// ATR expressed as a percentage of `price`
pub fn atr_percent(atr: f64, price: f64) -> f64 {
    if price == 0.0 {
        return 0.0;
    }
    atr / price * 100.0
}
