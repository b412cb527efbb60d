//! Candle window to indicator snapshot

use crate::error::PipelineError;
use crate::indicators::momentum::{calculate_macd_default, calculate_rsi_default, calculate_stochastic_default};
use crate::indicators::structure::{classify_price_action, classify_volume_trend_default};
use crate::indicators::trend::{calculate_adx_default, calculate_emas, calculate_smas};
use crate::indicators::volatility::{calculate_atr_default, calculate_bollinger_bands_default};
use crate::models::indicators::{
    AdxIndicator, BollingerBands, Candle, IndicatorSnapshot, MacdIndicator, Reading, Stochastic,
};

/// Fallback ATR as a fraction of the last close
const FALLBACK_ATR_RATIO: f64 = 0.02;

/// Stateless indicator computation. Output depends on the window alone.
pub struct IndicatorEngine;

impl IndicatorEngine {
    /// Compute every indicator over `candles`.
    ///
    /// Indicators whose lookback exceeds the window fall back to neutral
    /// values tagged as `Reading::Fallback`. Only an empty window or a
    /// non-finite input is an error.
    pub fn compute(candles: &[Candle]) -> Result<IndicatorSnapshot, PipelineError> {
        let last = candles.last().ok_or(PipelineError::InsufficientHistory {
            available: 0,
            required: 1,
        })?;
        if let Some(bad) = candles.iter().find(|c| !c.is_finite()) {
            return Err(PipelineError::IndicatorComputation(format!(
                "non-finite candle at {}",
                bad.timestamp
            )));
        }

        let price = last.close;
        let previous_price = candles
            .len()
            .checked_sub(2)
            .map(|i| candles[i].close)
            .unwrap_or(price);

        let snapshot = IndicatorSnapshot {
            price,
            previous_price,
            volume: last.volume,
            rsi: Reading::from_option(calculate_rsi_default(candles), 50.0),
            macd: Reading::from_option(calculate_macd_default(candles), MacdIndicator::NEUTRAL),
            ema: calculate_emas(candles),
            sma: calculate_smas(candles),
            bollinger: Reading::from_option(
                calculate_bollinger_bands_default(candles),
                BollingerBands {
                    upper: price,
                    middle: price,
                    lower: price,
                },
            ),
            stochastic: Reading::from_option(calculate_stochastic_default(candles), Stochastic::NEUTRAL),
            atr: Reading::from_option(calculate_atr_default(candles), price * FALLBACK_ATR_RATIO),
            adx: Reading::from_option(calculate_adx_default(candles), AdxIndicator::NEUTRAL),
            price_action: classify_price_action(candles),
            volume_trend: classify_volume_trend_default(candles),
        };

        Self::ensure_finite(&snapshot)?;
        Ok(snapshot)
    }

    fn ensure_finite(snapshot: &IndicatorSnapshot) -> Result<(), PipelineError> {
        let macd = snapshot.macd.get();
        let bands = snapshot.bollinger.get();
        let stoch = snapshot.stochastic.get();
        let adx = snapshot.adx.get();
        let ma = |m: &crate::models::MovingAverages| {
            [m.ma9, m.ma12, m.ma20, m.ma26, m.ma50, m.ma200].map(|r| r.get())
        };

        let mut values = vec![
            ("rsi", snapshot.rsi.get()),
            ("macd", macd.macd),
            ("macd_signal", macd.signal),
            ("bollinger_upper", bands.upper),
            ("bollinger_lower", bands.lower),
            ("stochastic_k", stoch.k),
            ("stochastic_d", stoch.d),
            ("atr", snapshot.atr.get()),
            ("adx", adx.adx),
            ("volume_ratio", snapshot.volume_trend.ratio),
        ];
        values.extend(ma(&snapshot.ema).into_iter().map(|v| ("ema", v)));
        values.extend(ma(&snapshot.sma).into_iter().map(|v| ("sma", v)));

        match values.into_iter().find(|(_, v)| !v.is_finite()) {
            Some((name, value)) => Err(PipelineError::IndicatorComputation(format!(
                "{name} evaluated to {value}"
            ))),
            None => Ok(()),
        }
    }
}
