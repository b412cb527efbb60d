//! Trendcast signal engine
//!
//! Periodically pulls candle windows for a matrix of instruments and
//! timeframes, scores them with a multi-indicator heuristic and fans the
//! resulting BUY/SELL signals out to subscribers.

pub mod common;
pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod indicators;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod signals;

pub use error::{PipelineError, UpstreamError};
