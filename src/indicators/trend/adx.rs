//! ADX (Average Directional Index) indicator

use crate::common::math;
use crate::models::indicators::{AdxIndicator, Candle};

/// Calculate ADX with Wilder smoothing
///
/// ADX measures trend strength regardless of direction. The directional
/// components +DI/-DI say which side is in control.
pub fn calculate_adx(candles: &[Candle], period: usize) -> Option<AdxIndicator> {
    // period movements to seed the DI, then period DX values to seed the ADX
    if period == 0 || candles.len() < 2 * period {
        return None;
    }

    let mut tr_values = Vec::with_capacity(candles.len() - 1);
    let mut plus_dm_values = Vec::with_capacity(candles.len() - 1);
    let mut minus_dm_values = Vec::with_capacity(candles.len() - 1);

    for w in candles.windows(2) {
        let (prev, cur) = (&w[0], &w[1]);
        tr_values.push(math::true_range(cur.high, cur.low, prev.close));

        let up_move = cur.high - prev.high;
        let down_move = prev.low - cur.low;
        plus_dm_values.push(if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 });
        minus_dm_values.push(if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 });
    }

    let atr = math::wilder_series(&tr_values, period);
    let plus_dm = math::wilder_series(&plus_dm_values, period);
    let minus_dm = math::wilder_series(&minus_dm_values, period);

    let mut dx_values = Vec::with_capacity(atr.len());
    let mut last_di = (0.0, 0.0);
    for ((tr, pdm), mdm) in atr.iter().zip(&plus_dm).zip(&minus_dm) {
        let (plus_di, minus_di) = if *tr > 0.0 {
            (100.0 * pdm / tr, 100.0 * mdm / tr)
        } else {
            (0.0, 0.0)
        };
        let di_sum = plus_di + minus_di;
        dx_values.push(if di_sum > 0.0 {
            100.0 * (plus_di - minus_di).abs() / di_sum
        } else {
            0.0
        });
        last_di = (plus_di, minus_di);
    }

    let adx = *math::wilder_series(&dx_values, period).last()?;

    Some(AdxIndicator {
        adx,
        plus_di: last_di.0,
        minus_di: last_di.1,
    })
}

/// Calculate ADX with default period (14)
pub fn calculate_adx_default(candles: &[Candle]) -> Option<AdxIndicator> {
    calculate_adx(candles, 14)
}
