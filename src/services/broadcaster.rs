//! Fan-out of admitted signals and alerts to subscribers
//!
//! Each subscriber owns a bounded queue. Delivery uses `try_send`, so a slow
//! or gone subscriber never holds up the others; it is dropped from the
//! registry instead of being retried.

use crate::metrics::Metrics;
use crate::models::signal::{Alert, Signal};
use crate::models::timeframe::Timeframe;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;
use tracing::{debug, info};

pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;

pub type SubscriberId = u64;

/// Messages pushed to subscribers, tagged `{"type": ..., "data": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum BroadcastMessage {
    #[serde(rename = "newSignal")]
    NewSignal(Box<Signal>),
    #[serde(rename = "alert")]
    Alert(Alert),
    /// Backlog sent right after a (re)subscription
    #[serde(rename = "signals")]
    Signals(Vec<Signal>),
}

/// Instrument plus an optional set of timeframes; an empty set accepts all
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionFilter {
    pub instrument: String,
    #[serde(default)]
    pub timeframes: HashSet<Timeframe>,
}

impl SubscriptionFilter {
    pub fn new(instrument: impl Into<String>, timeframes: impl IntoIterator<Item = Timeframe>) -> Self {
        Self {
            instrument: instrument.into().to_ascii_uppercase(),
            timeframes: timeframes.into_iter().collect(),
        }
    }

    pub fn matches(&self, signal: &Signal) -> bool {
        self.instrument.eq_ignore_ascii_case(&signal.instrument)
            && (self.timeframes.is_empty() || self.timeframes.contains(&signal.timeframe))
    }
}

struct Subscriber {
    filter: Option<SubscriptionFilter>,
    sender: mpsc::Sender<BroadcastMessage>,
}

/// Receiving end handed to a new subscriber
pub struct Subscription {
    pub id: SubscriberId,
    pub receiver: mpsc::Receiver<BroadcastMessage>,
}

pub struct Broadcaster {
    next_id: AtomicU64,
    buffer: usize,
    subscribers: RwLock<HashMap<SubscriberId, Subscriber>>,
    metrics: Option<Arc<Metrics>>,
}

impl Broadcaster {
    pub fn new(buffer: usize) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
            subscribers: RwLock::new(HashMap::new()),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Register a subscriber; `None` receives every signal
    pub async fn subscribe(&self, filter: Option<SubscriptionFilter>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.buffer);
        let mut subscribers = self.subscribers.write().await;
        subscribers.insert(id, Subscriber { filter, sender });
        self.record_count(subscribers.len());
        debug!(subscriber = id, "subscriber registered");
        Subscription { id, receiver }
    }

    /// Replace a subscriber's filter. Returns false if it is no longer registered.
    pub async fn resubscribe(&self, id: SubscriberId, filter: Option<SubscriptionFilter>) -> bool {
        let mut subscribers = self.subscribers.write().await;
        match subscribers.get_mut(&id) {
            Some(sub) => {
                sub.filter = filter;
                true
            }
            None => false,
        }
    }

    pub async fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.write().await;
        let removed = subscribers.remove(&id).is_some();
        self.record_count(subscribers.len());
        removed
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Deliver to subscribers whose filter matches the signal. Returns the delivery count.
    pub async fn publish(&self, signal: &Signal) -> usize {
        let message = BroadcastMessage::NewSignal(Box::new(signal.clone()));
        self.deliver(message, |sub| sub.filter.as_ref().map_or(true, |f| f.matches(signal)))
            .await
    }

    /// Deliver a high-confidence alert to every subscriber regardless of filter.
    /// Signals below High confidence are ignored.
    pub async fn publish_alert(&self, signal: &Signal) -> usize {
        let Some(alert) = Alert::from_signal(signal) else {
            return 0;
        };
        self.deliver(BroadcastMessage::Alert(alert), |_| true).await
    }

    /// Direct message to one subscriber, such as its backlog after subscribing
    pub async fn send_to(&self, id: SubscriberId, message: BroadcastMessage) -> bool {
        let delivered = {
            let subscribers = self.subscribers.read().await;
            match subscribers.get(&id) {
                Some(sub) => sub.sender.try_send(message).is_ok(),
                None => return false,
            }
        };
        if !delivered {
            self.prune(&[id]).await;
        }
        delivered
    }

    async fn deliver<F>(&self, message: BroadcastMessage, wants: F) -> usize
    where
        F: Fn(&Subscriber) -> bool,
    {
        let mut delivered = 0;
        let mut dead = Vec::new();
        {
            let subscribers = self.subscribers.read().await;
            for (id, sub) in subscribers.iter().filter(|(_, s)| wants(s)) {
                match sub.sender.try_send(message.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => dead.push(*id),
                }
            }
        }
        if !dead.is_empty() {
            self.prune(&dead).await;
        }
        delivered
    }

    async fn prune(&self, ids: &[SubscriberId]) {
        let mut subscribers = self.subscribers.write().await;
        for id in ids {
            if subscribers.remove(id).is_some() {
                info!(subscriber = id, "pruned unresponsive subscriber");
            }
        }
        self.record_count(subscribers.len());
    }

    fn record_count(&self, count: usize) {
        if let Some(metrics) = &self.metrics {
            metrics.broadcast_subscribers.set(count as i64);
        }
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_BUFFER)
    }
}
