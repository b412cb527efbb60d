//! Trend indicators: EMA/SMA, ADX

pub mod adx;
pub mod ema;

pub use adx::*;
pub use ema::*;
