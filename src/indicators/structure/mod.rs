//! Market structure: candle pattern and participation

pub mod price_action;
pub mod volume_trend;

pub use price_action::*;
pub use volume_trend::*;
