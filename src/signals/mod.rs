//! Scoring, decision, risk and admission of trading signals

pub mod categories;
pub mod decision;
pub mod dedup;
pub mod engine;
pub mod risk;
pub mod scoring;

pub use categories::{Category, CategoryScore, CategoryWeights};
pub use decision::{decide, ThresholdRule, THRESHOLD_RULES};
pub use dedup::{Admission, DedupEntry, DeduplicationGate, SuppressReason};
pub use engine::{SignalEngine, MIN_CANDLES};
pub use risk::{RiskCalculator, RiskLevels};
pub use scoring::{Evaluation, ScoringEngine};
