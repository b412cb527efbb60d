//! Unit tests for the in-process store

use crate::fixtures::{bullish_window, buy, minutes_after_t0, sell, t0};
use trendcast::db::{MemoryStore, SignalQuery, SignalStore};
use trendcast::models::timeframe::Timeframe;

#[tokio::test]
async fn test_upsert_keeps_only_latest_window() {
    let store = MemoryStore::new();
    let window = bullish_window();

    store
        .upsert_market_data("BTCUSDT", Timeframe::M5, &window[..50])
        .await
        .unwrap();
    store
        .upsert_market_data("BTCUSDT", Timeframe::M5, &window[10..])
        .await
        .unwrap();

    let stored = store.market_data("BTCUSDT", Timeframe::M5).await.unwrap();
    assert_eq!(stored.len(), 50);
    assert_eq!(stored, window[10..].to_vec());
    assert_eq!(stored[0].timestamp, window[10].timestamp);

    // other tuples are untouched
    assert!(store.market_data("BTCUSDT", Timeframe::H1).await.is_none());
}

#[tokio::test]
async fn test_latest_signal_per_tuple() {
    let store = MemoryStore::new();
    store.append_signal(&buy("BTCUSDT", Timeframe::M5, t0())).await.unwrap();
    store
        .append_signal(&sell("BTCUSDT", Timeframe::M5, minutes_after_t0(30)))
        .await
        .unwrap();
    store
        .append_signal(&buy("BTCUSDT", Timeframe::H1, minutes_after_t0(10)))
        .await
        .unwrap();

    let latest = store.latest_signals().await.unwrap();
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[0].timeframe, Timeframe::M5);
    assert_eq!(latest[0].timestamp, minutes_after_t0(30));

    let all = store.signals(&SignalQuery::for_instrument("BTCUSDT")).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
}
