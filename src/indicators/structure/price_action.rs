//! Three-candle price action classification

use crate::models::indicators::{Candle, PriceActionPattern, PricePattern};

/// Classify the last three candles.
///
/// Uptrend: higher highs and higher lows (0.8). Downtrend: lower highs and
/// lower lows (0.8). Consolidation: higher lows with lower highs (0.6).
/// Anything else, including fewer than three candles, is neutral (0.4).
pub fn classify_price_action(candles: &[Candle]) -> PriceActionPattern {
    let neutral = PriceActionPattern {
        pattern: PricePattern::Neutral,
        strength: 0.4,
    };
    if candles.len() < 3 {
        return neutral;
    }

    let last3 = &candles[candles.len() - 3..];
    let (h0, h1, h2) = (last3[0].high, last3[1].high, last3[2].high);
    let (l0, l1, l2) = (last3[0].low, last3[1].low, last3[2].low);

    let higher_highs = h2 > h1 && h1 > h0;
    let higher_lows = l2 > l1 && l1 > l0;
    let lower_highs = h2 < h1 && h1 < h0;
    let lower_lows = l2 < l1 && l1 < l0;

    if higher_highs && higher_lows {
        PriceActionPattern { pattern: PricePattern::Uptrend, strength: 0.8 }
    } else if lower_highs && lower_lows {
        PriceActionPattern { pattern: PricePattern::Downtrend, strength: 0.8 }
    } else if higher_lows && lower_highs {
        PriceActionPattern { pattern: PricePattern::Consolidation, strength: 0.6 }
    } else {
        neutral
    }
}
