//! Prometheus metrics for the HTTP layer and the signal pipeline

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Metrics registered on a private registry, so several instances can coexist in tests
pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounter,
    pub http_requests_in_flight: IntGauge,
    pub http_request_duration_seconds: Histogram,
    pub signals_generated_total: IntCounterVec,
    pub signals_suppressed_total: IntCounterVec,
    pub alerts_total: IntCounter,
    pub market_data_cache_hits_total: IntCounter,
    pub market_data_fallbacks_total: IntCounter,
    pub pipeline_failures_total: IntCounter,
    pub scheduler_tick_duration_seconds: Histogram,
    pub broadcast_subscribers: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total =
            IntCounter::new("http_requests_total", "Total number of HTTP requests")?;
        let http_requests_in_flight =
            IntGauge::new("http_requests_in_flight", "HTTP requests currently being served")?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))?;
        let signals_generated_total = IntCounterVec::new(
            Opts::new("signals_generated_total", "Signals admitted by the pipeline"),
            &["direction", "confidence"],
        )?;
        let signals_suppressed_total = IntCounterVec::new(
            Opts::new("signals_suppressed_total", "Candidate signals rejected by the gate"),
            &["reason"],
        )?;
        let alerts_total = IntCounter::new("alerts_total", "High confidence alerts published")?;
        let market_data_cache_hits_total = IntCounter::new(
            "market_data_cache_hits_total",
            "Candle windows served from cache",
        )?;
        let market_data_fallbacks_total = IntCounter::new(
            "market_data_fallbacks_total",
            "Candle windows served from the synthetic generator",
        )?;
        let pipeline_failures_total = IntCounter::new(
            "pipeline_failures_total",
            "Instrument/timeframe evaluations skipped because of a fault",
        )?;
        let scheduler_tick_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("scheduler_tick_duration_seconds", "Wall time of one scheduler tick")
                .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )?;
        let broadcast_subscribers =
            IntGauge::new("broadcast_subscribers", "Currently registered subscribers")?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(signals_generated_total.clone()))?;
        registry.register(Box::new(signals_suppressed_total.clone()))?;
        registry.register(Box::new(alerts_total.clone()))?;
        registry.register(Box::new(market_data_cache_hits_total.clone()))?;
        registry.register(Box::new(market_data_fallbacks_total.clone()))?;
        registry.register(Box::new(pipeline_failures_total.clone()))?;
        registry.register(Box::new(scheduler_tick_duration_seconds.clone()))?;
        registry.register(Box::new(broadcast_subscribers.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_requests_in_flight,
            http_request_duration_seconds,
            signals_generated_total,
            signals_suppressed_total,
            alerts_total,
            market_data_cache_hits_total,
            market_data_fallbacks_total,
            pipeline_failures_total,
            scheduler_tick_duration_seconds,
            broadcast_subscribers,
        })
    }

    /// Render in the Prometheus text exposition format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
