//! Technical indicators grouped by what they measure

pub mod engine;
pub mod momentum;
pub mod structure;
pub mod trend;
pub mod volatility;

pub use engine::IndicatorEngine;
