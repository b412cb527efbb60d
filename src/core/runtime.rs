//! Process bootstrap: wire the pipeline from `Config` and run until ctrl-c

use crate::config::Config;
use crate::core::http::{serve, AppState};
use crate::core::pipeline::SignalPipeline;
use crate::core::scheduler::Scheduler;
use crate::db::{MemoryStore, QuestDatabase, SignalStore};
use crate::error::PipelineError;
use crate::metrics::Metrics;
use crate::services::binance::BinanceRestClient;
use crate::services::broadcaster::Broadcaster;
use crate::services::market_data::ExchangeMarketDataProvider;
use crate::signals::dedup::DeduplicationGate;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Durable store for the configuration: QuestDB when a URL is set, memory otherwise.
/// An unreachable QuestDB degrades to memory rather than preventing startup.
pub async fn build_store(config: &Config) -> Arc<dyn SignalStore> {
    match config.questdb_url.as_deref() {
        Some(url) => match QuestDatabase::connect(url).await {
            Ok(db) => {
                info!("using QuestDB store");
                Arc::new(db)
            }
            Err(e) => {
                warn!(error = %e, "QuestDB unavailable, falling back to in-memory store");
                Arc::new(MemoryStore::new())
            }
        },
        None => {
            info!("QUESTDB_URL not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    }
}

/// Assemble the pipeline and its collaborators
pub fn build_pipeline(
    config: &Config,
    store: Arc<dyn SignalStore>,
    metrics: Arc<Metrics>,
) -> Result<SignalPipeline, PipelineError> {
    let client = BinanceRestClient::new(
        config.exchange_base_url.clone(),
        config.fetch_timeout,
        config.fetch_retries,
    )
    .map_err(|e| PipelineError::Config(format!("invalid exchange client settings: {e}")))?;

    let provider = ExchangeMarketDataProvider::new(client)
        .with_ttl(config.cache_ttl)
        .with_store(store.clone())
        .with_metrics(metrics.clone());

    let broadcaster =
        Broadcaster::new(config.subscriber_buffer).with_metrics(metrics.clone());

    Ok(
        SignalPipeline::new(Arc::new(provider), store, Arc::new(broadcaster), metrics)
            .with_gate(DeduplicationGate::new(config.dedup_cooldown))
            .with_candle_limit(config.candle_limit),
    )
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let metrics = Arc::new(Metrics::new()?);
    let store = build_store(&config).await;
    let pipeline = Arc::new(build_pipeline(&config, store, metrics)?);

    let scheduler = if config.eval_interval_seconds > 0 {
        let scheduler = Scheduler::new(
            pipeline.clone(),
            config.tuples(),
            config.eval_interval_seconds,
        )?
        .with_concurrency(config.worker_concurrency);
        scheduler.start().await;
        Some(scheduler)
    } else {
        info!("EVAL_INTERVAL_SECONDS is 0, scheduler disabled");
        None
    };

    info!(
        environment = %config.environment,
        port = config.port,
        instruments = ?config.instruments,
        timeframes = ?config.timeframes,
        "trendcast started"
    );

    let state = AppState::new(pipeline);
    let port = config.port;
    let server = tokio::spawn(async move { serve(port, state).await });

    tokio::select! {
        result = server => {
            match result {
                Ok(Err(e)) => error!(error = %e, "HTTP server failed"),
                Err(e) => error!(error = %e, "HTTP server task aborted"),
                Ok(Ok(())) => {}
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    if let Some(scheduler) = scheduler {
        scheduler.stop().await;
    }
    Ok(())
}
