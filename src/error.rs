//! Error taxonomy for the signal pipeline

use thiserror::Error;

/// Faults raised while producing a signal for one (instrument, timeframe) tuple.
///
/// None of these cross the on-demand entry point: callers only ever see
/// `None` and the cause is recorded in the logs.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("insufficient history: {available} candles available, {required} required")]
    InsufficientHistory { available: usize, required: usize },

    #[error("indicator computation failed: {0}")]
    IndicatorComputation(String),

    #[error("persistence failed: {0}")]
    Persistence(String),

    #[error("unknown timeframe '{0}'")]
    UnknownTimeframe(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Failures talking to the exchange candle endpoint.
///
/// Always recovered inside the market data provider via synthetic fallback.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("non-success status {0}")]
    Status(u16),

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
}

impl UpstreamError {
    /// Malformed payloads and client errors will not get better on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            UpstreamError::Http(_) => true,
            UpstreamError::Status(code) => *code >= 500 || *code == 429,
            UpstreamError::Malformed(_) | UpstreamError::Url(_) => false,
        }
    }
}

impl From<tokio_postgres::Error> for PipelineError {
    fn from(e: tokio_postgres::Error) -> Self {
        PipelineError::Persistence(e.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(e: serde_json::Error) -> Self {
        PipelineError::Persistence(e.to_string())
    }
}
