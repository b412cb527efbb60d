//! Environment-driven configuration
//!
//! Every knob has a default so a bare `cargo run` starts a working server.
//! Values that are present but unparsable are rejected instead of ignored.

use crate::error::PipelineError;
use crate::models::timeframe::Timeframe;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_INSTRUMENTS: [&str; 5] = ["BTCUSDT", "ETHUSDT", "ADAUSDT", "DOTUSDT", "LINKUSDT"];
pub const DEFAULT_EXCHANGE_BASE_URL: &str = "https://api.binance.com";

/// Deployment environment name (`APP_ENV`), defaulting to `sandbox`
pub fn get_environment() -> String {
    env::var("APP_ENV").unwrap_or_else(|_| "sandbox".to_string())
}

pub fn is_production(environment: &str) -> bool {
    matches!(environment, "production" | "prod")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub environment: String,
    pub port: u16,
    /// 0 disables the scheduler
    pub eval_interval_seconds: u64,
    pub instruments: Vec<String>,
    pub timeframes: Vec<Timeframe>,
    pub exchange_base_url: String,
    pub fetch_timeout: Duration,
    pub fetch_retries: usize,
    pub candle_limit: usize,
    pub cache_ttl: Duration,
    pub dedup_cooldown: Duration,
    pub worker_concurrency: usize,
    pub subscriber_buffer: usize,
    pub questdb_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "sandbox".to_string(),
            port: 8080,
            eval_interval_seconds: 30,
            instruments: DEFAULT_INSTRUMENTS.iter().map(|s| s.to_string()).collect(),
            timeframes: Timeframe::DEFAULTS.to_vec(),
            exchange_base_url: DEFAULT_EXCHANGE_BASE_URL.to_string(),
            fetch_timeout: Duration::from_millis(5000),
            fetch_retries: 2,
            candle_limit: 250,
            cache_ttl: Duration::from_secs(60),
            dedup_cooldown: Duration::from_secs(15 * 60),
            worker_concurrency: 4,
            subscriber_buffer: 64,
            questdb_url: None,
        }
    }
}

impl Config {
    /// Load `.env` (if any) and read the process environment
    pub fn from_env() -> Result<Self, PipelineError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let instruments = match get("INSTRUMENTS") {
            Some(raw) => parse_list(&raw, |s| Ok(s.to_ascii_uppercase()))?,
            None => defaults.instruments,
        };
        let timeframes = match get("TIMEFRAMES") {
            Some(raw) => parse_list(&raw, |s| {
                Timeframe::from_str(s).map_err(|e| PipelineError::Config(e.to_string()))
            })?,
            None => defaults.timeframes,
        };
        if instruments.is_empty() || timeframes.is_empty() {
            return Err(PipelineError::Config(
                "INSTRUMENTS and TIMEFRAMES must not be empty".to_string(),
            ));
        }

        let config = Self {
            environment: get("APP_ENV").unwrap_or(defaults.environment),
            port: parse_or(get("PORT"), "PORT", defaults.port)?,
            eval_interval_seconds: parse_or(
                get("EVAL_INTERVAL_SECONDS"),
                "EVAL_INTERVAL_SECONDS",
                defaults.eval_interval_seconds,
            )?,
            instruments,
            timeframes,
            exchange_base_url: get("EXCHANGE_BASE_URL").unwrap_or(defaults.exchange_base_url),
            fetch_timeout: Duration::from_millis(parse_or(
                get("FETCH_TIMEOUT_MS"),
                "FETCH_TIMEOUT_MS",
                5000,
            )?),
            fetch_retries: parse_or(get("FETCH_RETRIES"), "FETCH_RETRIES", defaults.fetch_retries)?,
            candle_limit: parse_or(get("CANDLE_LIMIT"), "CANDLE_LIMIT", defaults.candle_limit)?,
            cache_ttl: Duration::from_secs(parse_or(
                get("CACHE_TTL_SECONDS"),
                "CACHE_TTL_SECONDS",
                60,
            )?),
            dedup_cooldown: Duration::from_secs(parse_or(
                get("DEDUP_COOLDOWN_SECONDS"),
                "DEDUP_COOLDOWN_SECONDS",
                900,
            )?),
            worker_concurrency: parse_or(
                get("WORKER_CONCURRENCY"),
                "WORKER_CONCURRENCY",
                defaults.worker_concurrency,
            )?
            .max(1),
            subscriber_buffer: parse_or(
                get("SUBSCRIBER_BUFFER"),
                "SUBSCRIBER_BUFFER",
                defaults.subscriber_buffer,
            )?
            .max(1),
            questdb_url: get("QUESTDB_URL"),
        };
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        is_production(&self.environment)
    }

    /// Every scheduled (instrument, timeframe) tuple
    pub fn tuples(&self) -> Vec<(String, Timeframe)> {
        self.instruments
            .iter()
            .flat_map(|i| self.timeframes.iter().map(move |tf| (i.clone(), *tf)))
            .collect()
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T, PipelineError> {
    match raw {
        Some(value) => value
            .parse()
            .map_err(|_| PipelineError::Config(format!("{key} has invalid value '{value}'"))),
        None => Ok(default),
    }
}

fn parse_list<T>(
    raw: &str,
    parse: impl Fn(&str) -> Result<T, PipelineError>,
) -> Result<Vec<T>, PipelineError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse)
        .collect()
}
