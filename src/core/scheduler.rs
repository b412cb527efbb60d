//! Cron-based scheduler driving one pipeline tick per interval

use crate::core::pipeline::{SignalPipeline, TupleOutcome};
use crate::error::PipelineError;
use crate::models::timeframe::Timeframe;
use cron::Schedule;
use futures_util::stream::{self, StreamExt};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

pub const DEFAULT_CONCURRENCY: usize = 4;

/// Tally of one tick's tuple outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub emitted: usize,
    pub suppressed: usize,
    pub skipped: usize,
    /// Tuples whose task panicked
    pub failed: usize,
}

impl TickReport {
    pub fn total(&self) -> usize {
        self.emitted + self.suppressed + self.skipped + self.failed
    }
}

/// Cron expression firing exactly every `interval_seconds`.
///
/// Cron steps restart at each minute, hour and day boundary, so only
/// intervals that divide the enclosing unit evenly keep a fixed spacing.
/// Everything else is rejected.
pub fn cron_expression(interval_seconds: u64) -> Result<String, PipelineError> {
    let expr = match interval_seconds {
        s if s > 0 && s < 60 && 60 % s == 0 => format!("*/{s} * * * * *"),
        s if (60..3600).contains(&s) && s % 60 == 0 && 3600 % s == 0 => {
            format!("0 */{} * * * *", s / 60)
        }
        s if (3600..86_400).contains(&s) && s % 3600 == 0 && 86_400 % s == 0 => {
            format!("0 0 */{} * * *", s / 3600)
        }
        86_400 => "0 0 0 * * *".to_string(),
        s => {
            return Err(PipelineError::Config(format!(
                "interval of {s}s does not divide a minute, hour or day evenly"
            )))
        }
    };
    Ok(expr)
}

/// Evaluate every tuple once with at most `concurrency` in flight.
///
/// Each tuple runs in its own task so a panic in one is caught at the join
/// and counted as failed while the rest of the batch completes.
pub async fn run_tick(
    pipeline: &Arc<SignalPipeline>,
    tuples: &[(String, Timeframe)],
    concurrency: usize,
) -> TickReport {
    let started = Instant::now();

    let results: Vec<_> = stream::iter(tuples.iter().cloned())
        .map(|(instrument, timeframe)| {
            let pipeline = pipeline.clone();
            async move {
                let task_instrument = instrument.clone();
                let joined = tokio::spawn(async move {
                    pipeline.run_tuple(&task_instrument, timeframe).await
                })
                .await;
                (instrument, timeframe, joined)
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut report = TickReport::default();
    for (instrument, timeframe, joined) in results {
        match joined {
            Ok(TupleOutcome::Emitted(_)) => report.emitted += 1,
            Ok(TupleOutcome::Suppressed(_)) => report.suppressed += 1,
            Ok(TupleOutcome::Skipped(_)) => report.skipped += 1,
            Err(e) => {
                report.failed += 1;
                pipeline.metrics().pipeline_failures_total.inc();
                error!(instrument = %instrument, timeframe = %timeframe, error = %e, "tuple task aborted");
            }
        }
    }

    pipeline
        .metrics()
        .scheduler_tick_duration_seconds
        .observe(started.elapsed().as_secs_f64());
    report
}

pub struct Scheduler {
    pipeline: Arc<SignalPipeline>,
    tuples: Vec<(String, Timeframe)>,
    schedule: Schedule,
    concurrency: usize,
    handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl Scheduler {
    /// Create a scheduler over the cross product of instruments and timeframes.
    /// An interval of 0 means the scheduler is disabled and is rejected here.
    pub fn new(
        pipeline: Arc<SignalPipeline>,
        tuples: Vec<(String, Timeframe)>,
        interval_seconds: u64,
    ) -> Result<Self, PipelineError> {
        if interval_seconds == 0 {
            return Err(PipelineError::Config(
                "scheduler disabled: interval is 0".to_string(),
            ));
        }

        let cron_expr = cron_expression(interval_seconds)?;
        let schedule = Schedule::from_str(&cron_expr).map_err(|e| {
            PipelineError::Config(format!("invalid cron expression '{cron_expr}': {e}"))
        })?;

        info!(
            interval = interval_seconds,
            cron = %cron_expr,
            tuples = tuples.len(),
            "scheduler created"
        );

        Ok(Self {
            pipeline,
            tuples,
            schedule,
            concurrency: DEFAULT_CONCURRENCY,
            handle: Arc::new(RwLock::new(None)),
        })
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn tuples(&self) -> &[(String, Timeframe)] {
        &self.tuples
    }

    /// Run a single tick immediately
    pub async fn tick(&self) -> TickReport {
        run_tick(&self.pipeline, &self.tuples, self.concurrency).await
    }

    /// Spawn the tick loop. Ticks are awaited in sequence, so a slow tick
    /// delays the next one and missed slots are skipped rather than stacked.
    pub async fn start(&self) {
        let mut guard = self.handle.write().await;
        if guard.is_some() {
            debug!("scheduler already running");
            return;
        }

        let pipeline = self.pipeline.clone();
        let tuples = self.tuples.clone();
        let schedule = self.schedule.clone();
        let concurrency = self.concurrency;

        let handle = tokio::spawn(async move {
            info!("scheduler started, waiting for cron schedule");
            loop {
                let Some(next_tick) = schedule.upcoming(chrono::Utc).next() else {
                    tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
                    continue;
                };
                let now = chrono::Utc::now();
                if next_tick > now {
                    let wait = (next_tick - now).to_std().unwrap_or_default();
                    tokio::time::sleep(wait).await;
                }

                let report = run_tick(&pipeline, &tuples, concurrency).await;
                info!(
                    emitted = report.emitted,
                    suppressed = report.suppressed,
                    skipped = report.skipped,
                    failed = report.failed,
                    "scheduler tick complete"
                );
            }
        });

        *guard = Some(handle);
    }

    pub async fn stop(&self) {
        let mut handle = self.handle.write().await;
        if let Some(h) = handle.take() {
            h.abort();
            info!("scheduler stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.handle.read().await.is_some()
    }
}
