//! Unit tests for the per-key cooldown gate

use crate::fixtures::{buy, minutes_after_t0, sell, signal_with, t0};
use std::time::Duration;
use trendcast::models::signal::SignalDirection;
use trendcast::models::timeframe::Timeframe;
use trendcast::signals::dedup::{Admission, DeduplicationGate, SuppressReason};

#[tokio::test]
async fn test_same_direction_within_cooldown_is_suppressed() {
    let gate = DeduplicationGate::default();
    assert_eq!(gate.admit(&buy("BTCUSDT", Timeframe::M5, t0())).await, Admission::Accepted);
    assert_eq!(
        gate.admit(&buy("BTCUSDT", Timeframe::M5, minutes_after_t0(5))).await,
        Admission::Suppressed(SuppressReason::Cooldown)
    );
    assert_eq!(
        gate.admit(&buy("BTCUSDT", Timeframe::M5, minutes_after_t0(16))).await,
        Admission::Accepted
    );
    let last = gate.last_admitted("BTCUSDT", Timeframe::M5).await.unwrap();
    assert_eq!(last.timestamp, minutes_after_t0(16));
}

#[tokio::test]
async fn test_suppressed_candidate_does_not_reset_cooldown() {
    let gate = DeduplicationGate::default();
    gate.admit(&buy("BTCUSDT", Timeframe::M5, t0())).await;
    gate.admit(&buy("BTCUSDT", Timeframe::M5, minutes_after_t0(10))).await;
    // 15 minutes after the admitted signal, not after the suppressed one
    assert!(gate
        .admit(&buy("BTCUSDT", Timeframe::M5, minutes_after_t0(15)))
        .await
        .is_accepted());
}

#[tokio::test]
async fn test_direction_change_is_admitted() {
    let gate = DeduplicationGate::default();
    assert!(gate.admit(&buy("ETHUSDT", Timeframe::M15, t0())).await.is_accepted());
    assert!(gate
        .admit(&sell("ETHUSDT", Timeframe::M15, minutes_after_t0(1)))
        .await
        .is_accepted());
    let last = gate.last_admitted("ETHUSDT", Timeframe::M15).await.unwrap();
    assert_eq!(last.direction, SignalDirection::Sell);
}

#[tokio::test]
async fn test_hold_never_admitted_and_leaves_state() {
    let gate = DeduplicationGate::default();
    let hold = signal_with("BTCUSDT", Timeframe::M5, SignalDirection::Hold, None, t0());
    assert_eq!(gate.admit(&hold).await, Admission::Suppressed(SuppressReason::Hold));
    assert!(gate.is_empty().await);
}

#[tokio::test]
async fn test_keys_are_independent() {
    let gate = DeduplicationGate::default();
    assert!(gate.admit(&buy("BTCUSDT", Timeframe::M5, t0())).await.is_accepted());
    assert!(gate.admit(&buy("BTCUSDT", Timeframe::M15, t0())).await.is_accepted());
    assert!(gate.admit(&buy("ETHUSDT", Timeframe::M5, t0())).await.is_accepted());
    assert_eq!(gate.len().await, 3);
}

#[tokio::test]
async fn test_older_candidate_is_stale() {
    let gate = DeduplicationGate::default();
    gate.admit(&buy("BTCUSDT", Timeframe::M5, minutes_after_t0(10))).await;
    assert_eq!(
        gate.admit(&sell("BTCUSDT", Timeframe::M5, minutes_after_t0(5))).await,
        Admission::Suppressed(SuppressReason::Stale)
    );
}

#[tokio::test]
async fn test_custom_cooldown() {
    let gate = DeduplicationGate::new(Duration::from_secs(60));
    gate.admit(&buy("BTCUSDT", Timeframe::M1, t0())).await;
    assert!(gate
        .admit(&buy("BTCUSDT", Timeframe::M1, minutes_after_t0(2)))
        .await
        .is_accepted());
}

#[tokio::test]
async fn test_concurrent_admissions_admit_once() {
    let gate = std::sync::Arc::new(DeduplicationGate::default());
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let gate = gate.clone();
            tokio::spawn(async move { gate.admit(&buy("BTCUSDT", Timeframe::M5, t0())).await })
        })
        .collect();
    let mut accepted = 0;
    for handle in handles {
        if handle.await.unwrap().is_accepted() {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 1);
}

#[test]
fn test_cooldown_boundary_is_admitted() {
    let gate = DeduplicationGate::new(Duration::from_secs(60));
    tokio_test::block_on(async {
        assert!(gate.admit(&buy("BTCUSDT", Timeframe::H1, t0())).await.is_accepted());
        assert!(!gate
            .admit(&buy("BTCUSDT", Timeframe::H1, t0() + chrono::Duration::seconds(59)))
            .await
            .is_accepted());
        assert!(gate
            .admit(&buy("BTCUSDT", Timeframe::H1, minutes_after_t0(1)))
            .await
            .is_accepted());
        assert_eq!(gate.len().await, 1);
    });
}
