//! Integration tests for scheduled ticks

use std::time::Duration;

use trendcast::core::scheduler::{run_tick, Scheduler};
use trendcast::models::timeframe::Timeframe;

use crate::test_utils::{eventually, stub_pipeline, PANIC_INSTRUMENT};

fn tuples(instruments: &[&str], timeframes: &[Timeframe]) -> Vec<(String, Timeframe)> {
    instruments
        .iter()
        .flat_map(|i| timeframes.iter().map(move |tf| (i.to_string(), *tf)))
        .collect()
}

#[tokio::test]
async fn tick_covers_every_tuple() {
    let (pipeline, _) = stub_pipeline();
    let tuples = tuples(&["BTCUSDT", "FLATUSDT", "SHORTUSDT"], &[Timeframe::M5, Timeframe::H1]);

    let report = run_tick(&pipeline, &tuples, 2).await;
    assert_eq!(report.total(), 6);
    assert_eq!(report.emitted, 2);
    assert_eq!(report.suppressed, 2);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.failed, 0);

    // the next tick is inside the cooldown
    let report = run_tick(&pipeline, &tuples, 2).await;
    assert_eq!(report.emitted, 0);
    assert_eq!(report.suppressed, 4);
}

#[tokio::test]
async fn panicking_tuple_does_not_abort_the_tick() {
    let (pipeline, store) = stub_pipeline();
    let tuples = tuples(&["BTCUSDT", PANIC_INSTRUMENT, "ETHUSDT"], &[Timeframe::M15]);

    let report = run_tick(&pipeline, &tuples, 1).await;
    assert_eq!(report.failed, 1);
    assert_eq!(report.emitted, 2);
    assert_eq!(pipeline.metrics().pipeline_failures_total.get(), 1);

    assert!(
        eventually(|| {
            let store = store.clone();
            async move { store.signal_count().await == 2 }
        })
        .await
    );
}

#[tokio::test]
async fn start_and_stop() {
    let (pipeline, store) = stub_pipeline();
    let scheduler = Scheduler::new(pipeline, tuples(&["BTCUSDT"], &[Timeframe::M5]), 1).unwrap();

    scheduler.start().await;
    scheduler.start().await;
    assert!(scheduler.is_running().await);

    assert!(
        eventually(|| {
            let store = store.clone();
            async move { store.signal_count().await == 1 }
        })
        .await
    );

    scheduler.stop().await;
    assert!(!scheduler.is_running().await);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.signal_count().await, 1);
}

#[tokio::test]
async fn manual_tick_uses_configured_tuples() {
    let (pipeline, _) = stub_pipeline();
    let scheduler = Scheduler::new(
        pipeline,
        tuples(&["BTCUSDT", "ETHUSDT"], &[Timeframe::M5]),
        30,
    )
    .unwrap()
    .with_concurrency(8);

    let report = scheduler.tick().await;
    assert_eq!(report.emitted, 2);
    assert!(!scheduler.is_running().await);
}
