//! Shared data models spanning the engine layers.

pub mod indicators;
pub mod market;
pub mod signal;
pub mod timeframe;

pub use indicators::{
    AdxIndicator, BollingerBands, Candle, IndicatorSnapshot, MacdIndicator, MovingAverages,
    PriceActionPattern, PricePattern, Reading, Stochastic, VolumeDirection, VolumeTrend,
};
pub use market::MarketKind;
pub use signal::{Alert, Confidence, Signal, SignalDirection};
pub use timeframe::Timeframe;
