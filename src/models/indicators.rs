use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV sample. `timestamp` is the bucket open time in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }

    pub fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Whether a window is strictly ordered by timestamp
pub fn is_strictly_increasing(candles: &[Candle]) -> bool {
    candles.windows(2).all(|w| w[0].timestamp < w[1].timestamp)
}

/// An indicator value tagged with how it was obtained.
///
/// `Fallback` marks a neutral stand-in used when the lookback exceeded
/// the available history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", content = "value", rename_all = "lowercase")]
pub enum Reading<T> {
    Computed(T),
    Fallback(T),
}

impl<T> Reading<T> {
    pub fn value(&self) -> &T {
        match self {
            Reading::Computed(v) | Reading::Fallback(v) => v,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Reading::Computed(v) | Reading::Fallback(v) => v,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Reading::Fallback(_))
    }

    /// Use the computed value when present, otherwise the supplied default
    pub fn from_option(value: Option<T>, fallback: T) -> Self {
        match value {
            Some(v) => Reading::Computed(v),
            None => Reading::Fallback(fallback),
        }
    }
}

impl<T: Copy> Reading<T> {
    pub fn get(&self) -> T {
        *self.value()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdIndicator {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

impl MacdIndicator {
    pub const NEUTRAL: MacdIndicator = MacdIndicator {
        macd: 0.0,
        signal: 0.0,
        histogram: 0.0,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBands {
    /// Position of `price` inside the band, 0 at the lower band and 1 at the upper.
    /// A collapsed band reports the midpoint.
    pub fn position(&self, price: f64) -> f64 {
        let width = self.upper - self.lower;
        if width <= 0.0 {
            return 0.5;
        }
        (price - self.lower) / width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stochastic {
    pub k: f64,
    pub d: f64,
}

impl Stochastic {
    pub const NEUTRAL: Stochastic = Stochastic { k: 50.0, d: 50.0 };
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdxIndicator {
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
}

impl AdxIndicator {
    pub const NEUTRAL: AdxIndicator = AdxIndicator {
        adx: 25.0,
        plus_di: 25.0,
        minus_di: 25.0,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricePattern {
    Uptrend,
    Downtrend,
    Consolidation,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceActionPattern {
    pub pattern: PricePattern,
    pub strength: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeDirection {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeTrend {
    pub trend: VolumeDirection,
    pub strength: f64,
    pub ratio: f64,
}

/// Averages at the fixed periods the scorer reads
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovingAverages {
    pub ma9: Reading<f64>,
    pub ma12: Reading<f64>,
    pub ma20: Reading<f64>,
    pub ma26: Reading<f64>,
    pub ma50: Reading<f64>,
    pub ma200: Reading<f64>,
}

impl MovingAverages {
    pub const PERIODS: [usize; 6] = [9, 12, 20, 26, 50, 200];

    /// Build from a per-period calculator, falling back to `fallback` where it yields nothing
    pub fn from_fn(fallback: f64, mut calc: impl FnMut(usize) -> Option<f64>) -> Self {
        let mut read = |period| Reading::from_option(calc(period), fallback);
        Self {
            ma9: read(9),
            ma12: read(12),
            ma20: read(20),
            ma26: read(26),
            ma50: read(50),
            ma200: read(200),
        }
    }
}

/// Every measure derived from one candle window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub price: f64,
    pub previous_price: f64,
    pub volume: f64,
    pub rsi: Reading<f64>,
    pub macd: Reading<MacdIndicator>,
    pub ema: MovingAverages,
    pub sma: MovingAverages,
    pub bollinger: Reading<BollingerBands>,
    pub stochastic: Reading<Stochastic>,
    pub atr: Reading<f64>,
    pub adx: Reading<AdxIndicator>,
    pub price_action: PriceActionPattern,
    pub volume_trend: VolumeTrend,
}

impl IndicatorSnapshot {
    pub fn price_change(&self) -> f64 {
        self.price - self.previous_price
    }

    pub fn fallback_count(&self) -> usize {
        let ma = |m: &MovingAverages| {
            [m.ma9, m.ma12, m.ma20, m.ma26, m.ma50, m.ma200]
                .iter()
                .filter(|r| r.is_fallback())
                .count()
        };
        [
            self.rsi.is_fallback(),
            self.macd.is_fallback(),
            self.bollinger.is_fallback(),
            self.stochastic.is_fallback(),
            self.atr.is_fallback(),
            self.adx.is_fallback(),
        ]
        .iter()
        .filter(|f| **f)
        .count()
            + ma(&self.ema)
            + ma(&self.sma)
    }
}
