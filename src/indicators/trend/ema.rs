//! EMA and SMA moving averages

use crate::common::math;
use crate::models::indicators::{Candle, MovingAverages};

fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Calculate EMA for a specific period
pub fn calculate_ema(candles: &[Candle], period: usize) -> Option<f64> {
    math::ema(&closes(candles), period)
}

/// Calculate SMA for a specific period
pub fn calculate_sma(candles: &[Candle], period: usize) -> Option<f64> {
    math::sma(&closes(candles), period)
}

/// EMAs at every tracked period; periods longer than the window read the last close
pub fn calculate_emas(candles: &[Candle]) -> MovingAverages {
    let closes = closes(candles);
    let last = closes.last().copied().unwrap_or(0.0);
    MovingAverages::from_fn(last, |period| math::ema(&closes, period))
}

/// SMAs at every tracked period; periods longer than the window read the last close
pub fn calculate_smas(candles: &[Candle]) -> MovingAverages {
    let closes = closes(candles);
    let last = closes.last().copied().unwrap_or(0.0);
    MovingAverages::from_fn(last, |period| math::sma(&closes, period))
}
