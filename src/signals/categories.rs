//! Score categories and their weights

use serde::{Deserialize, Serialize};

/// Category weights, applied in this order
pub struct CategoryWeights;

impl CategoryWeights {
    pub const TREND: f64 = 0.30;
    pub const MOMENTUM: f64 = 0.25;
    pub const MEAN_REVERSION: f64 = 0.20;
    pub const VOLUME: f64 = 0.15;
    pub const PRICE_ACTION: f64 = 0.10;

    /// Verify weights sum to 1.0
    pub fn verify() -> bool {
        (Self::TREND + Self::MOMENTUM + Self::MEAN_REVERSION + Self::VOLUME + Self::PRICE_ACTION
            - 1.0)
            .abs()
            < 0.001
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Trend,
    Momentum,
    MeanReversion,
    Volume,
    PriceAction,
}

impl Category {
    /// Fixed evaluation order; reasoning fragments follow it
    pub const ORDER: [Category; 5] = [
        Category::Trend,
        Category::Momentum,
        Category::MeanReversion,
        Category::Volume,
        Category::PriceAction,
    ];

    pub fn weight(&self) -> f64 {
        match self {
            Category::Trend => CategoryWeights::TREND,
            Category::Momentum => CategoryWeights::MOMENTUM,
            Category::MeanReversion => CategoryWeights::MEAN_REVERSION,
            Category::Volume => CategoryWeights::VOLUME,
            Category::PriceAction => CategoryWeights::PRICE_ACTION,
        }
    }
}

/// Rule points awarded within one category plus the rule descriptions that fired
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: Category,
    pub points: f64,
    pub reasons: Vec<String>,
}

impl CategoryScore {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            points: 0.0,
            reasons: Vec::new(),
        }
    }

    pub fn add(&mut self, points: f64, reason: &str) {
        self.points += points;
        self.reasons.push(reason.to_string());
    }

    /// Contribution to the composite score: raw points times the category weight
    pub fn weighted(&self) -> f64 {
        self.points * self.category.weight()
    }
}
