//! Unit tests for the first-match threshold table

use trendcast::models::signal::{Confidence, SignalDirection};
use trendcast::signals::decision::{decide, THRESHOLD_RULES};

const EPS: f64 = 1e-9;

#[test]
fn test_high_boundary_is_inclusive_on_score() {
    assert_eq!(
        decide(6.0, 0.6 + EPS),
        (SignalDirection::Buy, Some(Confidence::High))
    );
    assert_eq!(
        decide(-6.0, 0.6 + EPS),
        (SignalDirection::Sell, Some(Confidence::High))
    );
}

#[test]
fn test_trend_strength_bound_is_exclusive() {
    assert_eq!(decide(6.0, 0.6), (SignalDirection::Buy, Some(Confidence::Medium)));
    assert_eq!(decide(3.0, 0.4), (SignalDirection::Buy, Some(Confidence::Low)));
    assert_eq!(decide(-3.0, 0.4), (SignalDirection::Sell, Some(Confidence::Low)));
}

#[test]
fn test_first_match_wins() {
    // qualifies for High, Medium and Low; the first row decides
    assert_eq!(decide(9.0, 1.0), (SignalDirection::Buy, Some(Confidence::High)));
    assert_eq!(decide(5.99, 1.0), (SignalDirection::Buy, Some(Confidence::Medium)));
    assert_eq!(decide(-3.5, 0.5), (SignalDirection::Sell, Some(Confidence::Medium)));
    assert_eq!(THRESHOLD_RULES[0].confidence, Confidence::High);
    assert_eq!(THRESHOLD_RULES[0].direction, SignalDirection::Buy);
    assert_eq!(THRESHOLD_RULES[5].direction, SignalDirection::Sell);
}

#[test]
fn test_low_tier_ignores_trend_strength() {
    assert_eq!(decide(1.5, 0.0), (SignalDirection::Buy, Some(Confidence::Low)));
    assert_eq!(decide(-1.5, 0.0), (SignalDirection::Sell, Some(Confidence::Low)));
}

#[test]
fn test_dead_zone_holds() {
    assert_eq!(decide(1.49, 1.0), (SignalDirection::Hold, None));
    assert_eq!(decide(-1.49, 1.0), (SignalDirection::Hold, None));
    assert_eq!(decide(0.0, 0.0), (SignalDirection::Hold, None));
}
