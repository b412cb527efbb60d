//! Per-(instrument, timeframe) cooldown on repeated signals

use crate::models::signal::{Signal, SignalDirection};
use crate::models::timeframe::Timeframe;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupEntry {
    pub direction: SignalDirection,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// HOLD is never emitted
    Hold,
    /// Same direction already admitted within the cooldown
    Cooldown,
    /// Older than the last admission for the key
    Stale,
}

impl SuppressReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuppressReason::Hold => "hold",
            SuppressReason::Cooldown => "cooldown",
            SuppressReason::Stale => "stale",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    Suppressed(SuppressReason),
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Admission::Accepted)
    }
}

type DedupKey = (String, Timeframe);

/// Owns the last admitted direction per key; check-and-update happens under one lock
pub struct DeduplicationGate {
    cooldown: chrono::Duration,
    entries: Mutex<HashMap<DedupKey, DedupEntry>>,
}

impl DeduplicationGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown: chrono::Duration::from_std(cooldown)
                .unwrap_or_else(|_| chrono::Duration::days(365 * 100)),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn admit(&self, signal: &Signal) -> Admission {
        if !signal.direction.is_actionable() {
            return Admission::Suppressed(SuppressReason::Hold);
        }

        let key = (signal.instrument.clone(), signal.timeframe);
        let mut entries = self.entries.lock().await;

        if let Some(last) = entries.get(&key) {
            let elapsed = signal.timestamp - last.timestamp;
            if elapsed < chrono::Duration::zero() {
                debug!(
                    instrument = %signal.instrument,
                    timeframe = %signal.timeframe,
                    "dedup: candidate older than last admission"
                );
                return Admission::Suppressed(SuppressReason::Stale);
            }
            if last.direction == signal.direction && elapsed < self.cooldown {
                debug!(
                    instrument = %signal.instrument,
                    timeframe = %signal.timeframe,
                    direction = %signal.direction,
                    elapsed_secs = elapsed.num_seconds(),
                    "dedup: suppressed within cooldown"
                );
                return Admission::Suppressed(SuppressReason::Cooldown);
            }
        }

        entries.insert(
            key,
            DedupEntry {
                direction: signal.direction,
                timestamp: signal.timestamp,
            },
        );
        Admission::Accepted
    }

    pub async fn last_admitted(&self, instrument: &str, timeframe: Timeframe) -> Option<DedupEntry> {
        let entries = self.entries.lock().await;
        entries.get(&(instrument.to_string(), timeframe)).copied()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for DeduplicationGate {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}
