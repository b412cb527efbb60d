//! Kline payload decoding

use crate::error::UpstreamError;
use crate::models::indicators::{is_strictly_increasing, Candle};
use serde_json::Value;

/// Decode a klines response body.
///
/// Each row is `[open_time, open, high, low, close, volume, ...]` with the
/// prices sent as decimal strings. An empty, out-of-order or non-finite
/// window is rejected as a whole.
pub fn parse_klines(body: &str) -> Result<Vec<Candle>, UpstreamError> {
    let rows: Vec<Vec<Value>> =
        serde_json::from_str(body).map_err(|e| UpstreamError::Malformed(e.to_string()))?;
    if rows.is_empty() {
        return Err(UpstreamError::Malformed("empty kline array".to_string()));
    }

    let candles = rows
        .iter()
        .enumerate()
        .map(|(i, row)| parse_row(row).ok_or_else(|| UpstreamError::Malformed(format!("bad kline row {i}"))))
        .collect::<Result<Vec<_>, _>>()?;

    if !is_strictly_increasing(&candles) {
        return Err(UpstreamError::Malformed(
            "kline timestamps are not strictly increasing".to_string(),
        ));
    }
    Ok(candles)
}

fn parse_row(row: &[Value]) -> Option<Candle> {
    if row.len() < 6 {
        return None;
    }
    let candle = Candle {
        timestamp: row[0].as_i64()?,
        open: decimal(&row[1])?,
        high: decimal(&row[2])?,
        low: decimal(&row[3])?,
        close: decimal(&row[4])?,
        volume: decimal(&row[5])?,
    };
    candle.is_finite().then_some(candle)
}

fn decimal(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}
