//! Weighted multi-category scoring of an indicator snapshot

use crate::models::indicators::{IndicatorSnapshot, PricePattern, VolumeDirection};
use crate::models::signal::{Confidence, SignalDirection};
use crate::signals::categories::{Category, CategoryScore};
use crate::signals::decision::decide;
use serde::{Deserialize, Serialize};

pub const COMPOSITE_LIMIT: f64 = 10.0;

/// Outcome of scoring one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub direction: SignalDirection,
    pub confidence: Option<Confidence>,
    pub composite_score: f64,
    pub trend_strength: f64,
    pub reasoning: Vec<String>,
    pub breakdown: Vec<CategoryScore>,
}

pub struct ScoringEngine;

impl ScoringEngine {
    pub fn evaluate(snapshot: &IndicatorSnapshot) -> Evaluation {
        let (trend, trend_strength) = analyze_trend(snapshot);
        let breakdown = vec![
            trend,
            analyze_momentum(snapshot),
            analyze_mean_reversion(snapshot),
            analyze_volume(snapshot),
            analyze_price_action(snapshot),
        ];

        let raw: f64 = breakdown.iter().map(CategoryScore::weighted).sum();
        let composite_score = raw.clamp(-COMPOSITE_LIMIT, COMPOSITE_LIMIT);
        let (direction, confidence) = decide(composite_score, trend_strength);
        let reasoning = breakdown
            .iter()
            .flat_map(|c| c.reasons.iter().cloned())
            .collect();

        Evaluation {
            direction,
            confidence,
            composite_score,
            trend_strength,
            reasoning,
            breakdown,
        }
    }
}

/// Average stacking, ADX strength and the candle pattern.
/// Returns the category score and the trend strength gate in [0, 1].
pub fn analyze_trend(s: &IndicatorSnapshot) -> (CategoryScore, f64) {
    let mut score = CategoryScore::new(Category::Trend);
    let mut strength = 0.0;
    let (e9, e20, e50, e200) = (s.ema.ma9.get(), s.ema.ma20.get(), s.ema.ma50.get(), s.ema.ma200.get());

    if e9 > e20 && e20 > e50 && e50 > e200 {
        score.add(3.0, "Strong bullish EMA alignment");
        strength += 0.8;
    } else if e9 < e20 && e20 < e50 && e50 < e200 {
        score.add(-3.0, "Strong bearish EMA alignment");
        strength += 0.8;
    } else if e9 > e20 && e20 > e50 {
        score.add(2.0, "Bullish short-term trend");
        strength += 0.6;
    } else if e9 < e20 && e20 < e50 {
        score.add(-2.0, "Bearish short-term trend");
        strength += 0.6;
    }

    let adx = s.adx.get();
    if adx.adx > 25.0 {
        strength += 0.3;
        if adx.plus_di > adx.minus_di {
            score.add(1.0, "Strong uptrend (ADX > 25)");
        } else {
            score.add(-1.0, "Strong downtrend (ADX > 25)");
        }
    }

    match s.price_action.pattern {
        PricePattern::Uptrend => {
            score.add(1.0, "Bullish price action pattern");
            strength += s.price_action.strength * 0.2;
        }
        PricePattern::Downtrend => {
            score.add(-1.0, "Bearish price action pattern");
            strength += s.price_action.strength * 0.2;
        }
        PricePattern::Consolidation | PricePattern::Neutral => {}
    }

    (score, f64::min(1.0, strength))
}

/// RSI zone, MACD crossover/histogram and stochastic crossover
pub fn analyze_momentum(s: &IndicatorSnapshot) -> CategoryScore {
    let mut score = CategoryScore::new(Category::Momentum);

    let rsi = s.rsi.get();
    if rsi > 50.0 && rsi < 70.0 {
        score.add(1.0, "RSI showing bullish momentum");
    } else if rsi < 50.0 && rsi > 30.0 {
        score.add(-1.0, "RSI showing bearish momentum");
    } else if rsi >= 70.0 {
        score.add(-0.5, "RSI overbought warning");
    } else if rsi <= 30.0 {
        score.add(0.5, "RSI oversold opportunity");
    }

    let macd = s.macd.get();
    if macd.macd > macd.signal && macd.histogram > 0.0 {
        score.add(2.0, "MACD bullish crossover");
    } else if macd.macd < macd.signal && macd.histogram < 0.0 {
        score.add(-2.0, "MACD bearish crossover");
    } else if macd.histogram > 0.0 {
        score.add(1.0, "MACD histogram positive");
    } else if macd.histogram < 0.0 {
        score.add(-1.0, "MACD histogram negative");
    }

    let stoch = s.stochastic.get();
    if stoch.k > stoch.d && stoch.k < 80.0 {
        score.add(1.0, "Stochastic bullish crossover");
    } else if stoch.k < stoch.d && stoch.k > 20.0 {
        score.add(-1.0, "Stochastic bearish crossover");
    }

    score
}

/// Band position and stretch away from the 20-period SMA
pub fn analyze_mean_reversion(s: &IndicatorSnapshot) -> CategoryScore {
    let mut score = CategoryScore::new(Category::MeanReversion);
    let rsi = s.rsi.get();
    let position = s.bollinger.get().position(s.price);

    if position <= 0.1 && rsi < 35.0 {
        score.add(2.0, "Strong oversold mean reversion setup");
    } else if position >= 0.9 && rsi > 65.0 {
        score.add(-2.0, "Strong overbought mean reversion setup");
    } else if position <= 0.2 {
        score.add(1.0, "Oversold near lower BB");
    } else if position >= 0.8 {
        score.add(-1.0, "Overbought near upper BB");
    }

    let sma20 = s.sma.ma20.get();
    if sma20 != 0.0 {
        let distance = (s.price - sma20) / sma20;
        if distance.abs() > 0.03 {
            if distance < 0.0 {
                score.add(0.5, "Price significantly below SMA20");
            } else {
                score.add(-0.5, "Price significantly above SMA20");
            }
        }
    }

    score
}

pub fn analyze_volume(s: &IndicatorSnapshot) -> CategoryScore {
    let mut score = CategoryScore::new(Category::Volume);
    match s.volume_trend.trend {
        VolumeDirection::Increasing if s.volume_trend.strength > 0.7 => {
            score.add(1.0, "Strong volume confirmation")
        }
        VolumeDirection::Decreasing => score.add(-0.5, "Weak volume confirmation"),
        _ => {}
    }
    score
}

/// Whether the latest candle-to-candle move agrees with the pattern
pub fn analyze_price_action(s: &IndicatorSnapshot) -> CategoryScore {
    let mut score = CategoryScore::new(Category::PriceAction);
    let change = s.price_change();
    match s.price_action.pattern {
        PricePattern::Uptrend if change > 0.0 => {
            score.add(1.0, "Price action confirms upward momentum")
        }
        PricePattern::Downtrend if change < 0.0 => {
            score.add(-1.0, "Price action confirms downward momentum")
        }
        _ => {}
    }
    score
}
