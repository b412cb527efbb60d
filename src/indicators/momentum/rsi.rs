//! RSI (Relative Strength Index) indicator

use crate::common::math;
use crate::models::indicators::Candle;

pub const RSI_PERIOD: usize = 14;

/// Calculate RSI with Wilder smoothing
///
/// RSI = 100 - (100 / (1 + RS))
/// RS = Average Gain / Average Loss
pub fn calculate_rsi(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period + 1 {
        return None;
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = candles
        .windows(2)
        .map(|w| {
            let change = w[1].close - w[0].close;
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip();

    let avg_gain = *math::wilder_series(&gains, period).last()?;
    let avg_loss = *math::wilder_series(&losses, period).last()?;

    if avg_loss == 0.0 {
        // Flat window reads neutral, pure gains read fully overbought
        return Some(if avg_gain == 0.0 { 50.0 } else { 100.0 });
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}

/// Calculate RSI with default period (14)
pub fn calculate_rsi_default(candles: &[Candle]) -> Option<f64> {
    calculate_rsi(candles, RSI_PERIOD)
}
