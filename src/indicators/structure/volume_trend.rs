//! Volume participation relative to its recent mean

use crate::models::indicators::{Candle, VolumeDirection, VolumeTrend};

pub const VOLUME_LOOKBACK: usize = 20;

/// Compare the latest volume with the mean of the last `lookback` candles
pub fn classify_volume_trend(candles: &[Candle], lookback: usize) -> VolumeTrend {
    let start = candles.len().saturating_sub(lookback.max(1));
    let window = &candles[start..];

    let mean = if window.is_empty() {
        0.0
    } else {
        window.iter().map(|c| c.volume).sum::<f64>() / window.len() as f64
    };
    let ratio = match window.last() {
        Some(last) if mean > 0.0 => last.volume / mean,
        _ => 1.0,
    };

    let (trend, strength) = if ratio > 1.5 {
        (VolumeDirection::Increasing, 0.8)
    } else if ratio < 0.7 {
        (VolumeDirection::Decreasing, 0.6)
    } else {
        (VolumeDirection::Stable, 0.5)
    };

    VolumeTrend { trend, strength, ratio }
}

pub fn classify_volume_trend_default(candles: &[Candle]) -> VolumeTrend {
    classify_volume_trend(candles, VOLUME_LOOKBACK)
}
