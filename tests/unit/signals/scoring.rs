//! Unit tests for category scoring and the composite score

use crate::fixtures::{bearish_window, bullish_window, flat_window, strong_bullish_window};
use trendcast::indicators::IndicatorEngine;
use trendcast::models::indicators::{
    AdxIndicator, BollingerBands, IndicatorSnapshot, MacdIndicator, MovingAverages,
    PriceActionPattern, PricePattern, Reading, Stochastic, VolumeDirection, VolumeTrend,
};
use trendcast::models::signal::{Confidence, SignalDirection};
use trendcast::signals::categories::{Category, CategoryWeights};
use trendcast::signals::scoring::{
    analyze_mean_reversion, analyze_momentum, analyze_price_action, analyze_trend, analyze_volume,
    ScoringEngine,
};

/// Snapshot where no rule fires
fn neutral_snapshot() -> IndicatorSnapshot {
    let mut snapshot = IndicatorEngine::compute(&flat_window(60)).unwrap();
    snapshot.ema = MovingAverages::from_fn(100.0, |_| Some(100.0));
    snapshot.sma = MovingAverages::from_fn(100.0, |_| Some(100.0));
    snapshot.macd = Reading::Computed(MacdIndicator::NEUTRAL);
    snapshot.adx = Reading::Computed(AdxIndicator { adx: 10.0, plus_di: 10.0, minus_di: 10.0 });
    snapshot
}

fn averages(values: [f64; 6]) -> MovingAverages {
    MovingAverages {
        ma9: Reading::Computed(values[0]),
        ma12: Reading::Computed(values[1]),
        ma20: Reading::Computed(values[2]),
        ma26: Reading::Computed(values[3]),
        ma50: Reading::Computed(values[4]),
        ma200: Reading::Computed(values[5]),
    }
}

/// Every bullish rule at its maximum
fn max_bullish_snapshot() -> IndicatorSnapshot {
    let mut s = neutral_snapshot();
    s.price = 90.5;
    s.previous_price = 90.0;
    s.ema = averages([110.0, 108.0, 105.0, 104.0, 100.0, 90.0]);
    s.adx = Reading::Computed(AdxIndicator { adx: 30.0, plus_di: 30.0, minus_di: 10.0 });
    s.price_action = PriceActionPattern { pattern: PricePattern::Uptrend, strength: 0.8 };
    s.rsi = Reading::Computed(30.0);
    s.macd = Reading::Computed(MacdIndicator { macd: 1.0, signal: 0.5, histogram: 0.5 });
    s.stochastic = Reading::Computed(Stochastic { k: 60.0, d: 50.0 });
    s.bollinger = Reading::Computed(BollingerBands { upper: 110.0, middle: 100.0, lower: 90.0 });
    s.volume_trend = VolumeTrend { trend: VolumeDirection::Increasing, strength: 0.8, ratio: 2.0 };
    s
}

#[test]
fn test_neutral_snapshot_holds() {
    let evaluation = ScoringEngine::evaluate(&neutral_snapshot());
    assert_eq!(evaluation.composite_score, 0.0);
    assert_eq!(evaluation.direction, SignalDirection::Hold);
    assert_eq!(evaluation.confidence, None);
    assert!(evaluation.reasoning.is_empty());
}

#[test]
fn test_trend_strong_alignment() {
    let snapshot = max_bullish_snapshot();
    let (score, strength) = analyze_trend(&snapshot);
    assert_eq!(score.points, 5.0);
    assert!((score.weighted() - 1.5).abs() < 1e-12);
    assert_eq!(strength, 1.0);
    assert_eq!(score.reasons[0], "Strong bullish EMA alignment");

    let mut bearish = neutral_snapshot();
    bearish.ema = averages([90.0, 92.0, 95.0, 96.0, 100.0, 110.0]);
    let (score, strength) = analyze_trend(&bearish);
    assert_eq!(score.points, -3.0);
    assert!((strength - 0.8).abs() < 1e-12);
}

#[test]
fn test_trend_short_term_only() {
    let mut s = neutral_snapshot();
    s.ema = averages([105.0, 104.0, 103.0, 102.0, 101.0, 120.0]);
    let (score, strength) = analyze_trend(&s);
    assert_eq!(score.points, 2.0);
    assert_eq!(score.reasons, vec!["Bullish short-term trend"]);
    assert!((strength - 0.6).abs() < 1e-12);
}

#[test]
fn test_momentum_rules() {
    let score = analyze_momentum(&max_bullish_snapshot());
    // oversold RSI 30 is a +0.5 opportunity, not bullish momentum
    assert_eq!(score.points, 3.5);

    let mut s = neutral_snapshot();
    s.rsi = Reading::Computed(65.0);
    s.macd = Reading::Computed(MacdIndicator { macd: 1.0, signal: 0.5, histogram: 0.5 });
    s.stochastic = Reading::Computed(Stochastic { k: 60.0, d: 50.0 });
    assert_eq!(analyze_momentum(&s).points, 4.0);

    s.rsi = Reading::Computed(75.0);
    let score = analyze_momentum(&s);
    assert_eq!(score.points, 2.5);
    assert!(score.reasons.iter().any(|r| r == "RSI overbought warning"));
}

#[test]
fn test_macd_histogram_without_crossover() {
    let mut s = neutral_snapshot();
    s.macd = Reading::Computed(MacdIndicator { macd: -1.0, signal: -0.5, histogram: 0.2 });
    assert_eq!(analyze_momentum(&s).reasons, vec!["MACD histogram positive"]);
}

#[test]
fn test_mean_reversion_rules() {
    let score = analyze_mean_reversion(&max_bullish_snapshot());
    assert_eq!(score.points, 2.5);
    assert_eq!(score.reasons[0], "Strong oversold mean reversion setup");
    assert_eq!(score.reasons[1], "Price significantly below SMA20");

    let mut s = neutral_snapshot();
    s.price = 108.0;
    s.bollinger = Reading::Computed(BollingerBands { upper: 110.0, middle: 100.0, lower: 90.0 });
    let score = analyze_mean_reversion(&s);
    assert_eq!(score.points, -1.5);
}

#[test]
fn test_volume_and_price_action() {
    let mut s = max_bullish_snapshot();
    assert_eq!(analyze_volume(&s).points, 1.0);
    assert_eq!(analyze_price_action(&s).points, 1.0);

    s.previous_price = 91.0;
    assert_eq!(analyze_price_action(&s).points, 0.0);

    s.volume_trend = VolumeTrend { trend: VolumeDirection::Decreasing, strength: 0.6, ratio: 0.5 };
    assert_eq!(analyze_volume(&s).points, -0.5);
}

#[test]
fn test_composite_is_raw_weighted_sum() {
    let evaluation = ScoringEngine::evaluate(&max_bullish_snapshot());
    let expected: f64 = evaluation
        .breakdown
        .iter()
        .map(|c| c.points * c.category.weight())
        .sum();
    // 5 * 0.30 + 3.5 * 0.25 + 2.5 * 0.20 + 1 * 0.15 + 1 * 0.10
    assert!((expected - 3.125).abs() < 1e-12);
    assert!((evaluation.composite_score - expected).abs() < 1e-12);
    assert_eq!(evaluation.direction, SignalDirection::Buy);
    assert_eq!(evaluation.confidence, Some(Confidence::Medium));
}

#[test]
fn test_weak_setup_holds() {
    let mut s = neutral_snapshot();
    s.ema = averages([105.0, 104.0, 103.0, 102.0, 101.0, 120.0]);
    s.rsi = Reading::Computed(55.0);
    let evaluation = ScoringEngine::evaluate(&s);
    // 2 * 0.30 + 1 * 0.25
    assert!((evaluation.composite_score - 0.85).abs() < 1e-12);
    assert_eq!(evaluation.direction, SignalDirection::Hold);
    assert_eq!(evaluation.confidence, None);
    assert_eq!(
        evaluation.reasoning,
        vec!["Bullish short-term trend", "RSI showing bullish momentum"]
    );
}

#[test]
fn test_max_bearish_composite() {
    let mut s = neutral_snapshot();
    s.price = 110.0;
    s.previous_price = 111.0;
    s.ema = averages([90.0, 92.0, 95.0, 96.0, 100.0, 110.0]);
    s.adx = Reading::Computed(AdxIndicator { adx: 30.0, plus_di: 10.0, minus_di: 30.0 });
    s.price_action = PriceActionPattern { pattern: PricePattern::Downtrend, strength: 0.8 };
    s.rsi = Reading::Computed(45.0);
    s.macd = Reading::Computed(MacdIndicator { macd: -1.0, signal: -0.5, histogram: -0.5 });
    s.stochastic = Reading::Computed(Stochastic { k: 40.0, d: 50.0 });
    s.bollinger = Reading::Computed(BollingerBands { upper: 110.0, middle: 100.0, lower: 90.0 });
    s.volume_trend = VolumeTrend { trend: VolumeDirection::Decreasing, strength: 0.6, ratio: 0.5 };
    let evaluation = ScoringEngine::evaluate(&s);
    // trend -5, momentum -4, mean reversion -1.5, volume -0.5, price action -1
    assert!((evaluation.composite_score + 2.975).abs() < 1e-12);
    assert_eq!(evaluation.direction, SignalDirection::Sell);
    assert_eq!(evaluation.confidence, Some(Confidence::Low));
}

#[test]
fn test_breakdown_follows_category_order() {
    let evaluation = ScoringEngine::evaluate(&IndicatorEngine::compute(&bullish_window()).unwrap());
    let order: Vec<Category> = evaluation.breakdown.iter().map(|c| c.category).collect();
    assert_eq!(order, Category::ORDER.to_vec());
    assert!(CategoryWeights::verify());
}

#[test]
fn test_window_scores() {
    let bullish = ScoringEngine::evaluate(&IndicatorEngine::compute(&bullish_window()).unwrap());
    assert!((bullish.composite_score - 1.9).abs() < 1e-9);
    assert_eq!(bullish.direction, SignalDirection::Buy);
    assert_eq!(bullish.confidence, Some(Confidence::Low));

    let strong = ScoringEngine::evaluate(&IndicatorEngine::compute(&strong_bullish_window()).unwrap());
    assert!((strong.composite_score - 2.25).abs() < 1e-9);
    assert_eq!(strong.confidence, Some(Confidence::Low));

    let bearish = ScoringEngine::evaluate(&IndicatorEngine::compute(&bearish_window()).unwrap());
    assert!((bearish.composite_score + 1.75).abs() < 1e-9);
    assert_eq!(bearish.direction, SignalDirection::Sell);
    assert_eq!(bearish.confidence, Some(Confidence::Low));
}
