//! REST client for the exchange klines endpoint

use super::messages::parse_klines;
use crate::error::UpstreamError;
use crate::models::indicators::Candle;
use crate::models::timeframe::Timeframe;
use backon::{ExponentialBuilder, Retryable};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const KLINES_PATH: &str = "/api/v3/klines";

#[derive(Clone)]
pub struct BinanceRestClient {
    base_url: String,
    http: reqwest::Client,
    retries: usize,
}

impl BinanceRestClient {
    /// Client with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration, retries: usize) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, http).with_retries(retries))
    }

    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            retries: 0,
        }
    }

    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn klines_url(&self, instrument: &str, timeframe: Timeframe, limit: usize) -> Result<Url, UpstreamError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, KLINES_PATH))?;
        url.query_pairs_mut()
            .append_pair("symbol", instrument)
            .append_pair("interval", timeframe.exchange_interval())
            .append_pair("limit", &limit.to_string());
        Ok(url)
    }

    /// Fetch a candle window, retrying transport failures and 5xx/429 with backoff
    pub async fn klines(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, UpstreamError> {
        let url = self.klines_url(instrument, timeframe, limit)?;
        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_secs(1))
            .with_max_times(self.retries);

        (|| self.fetch_once(url.clone()))
            .retry(backoff)
            .when(UpstreamError::is_retryable)
            .notify(|err: &UpstreamError, delay: Duration| {
                warn!(
                    instrument,
                    timeframe = %timeframe,
                    error = %err,
                    retry_in_ms = delay.as_millis() as u64,
                    "klines request failed, retrying"
                );
            })
            .await
    }

    async fn fetch_once(&self, url: Url) -> Result<Vec<Candle>, UpstreamError> {
        debug!(url = %url, "requesting klines");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        parse_klines(&body)
    }
}
