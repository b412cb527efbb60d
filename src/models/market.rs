//! Instrument classification

use serde::{Deserialize, Serialize};

const FOREX_MARKERS: [&str; 7] = ["XAU", "EUR", "GBP", "JPY", "CHF", "AUD", "CAD"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    Crypto,
    Forex,
    Commodity,
}

impl MarketKind {
    /// Classify an instrument symbol such as `BTCUSDT` or `XAUUSD`
    pub fn classify(instrument: &str) -> Self {
        let upper = instrument.to_ascii_uppercase();
        if upper.contains("XAU") {
            MarketKind::Commodity
        } else if FOREX_MARKERS.iter().any(|m| upper.contains(m)) {
            MarketKind::Forex
        } else {
            MarketKind::Crypto
        }
    }

    /// Whether candles for this market come from the crypto exchange endpoint
    pub fn has_exchange_feed(&self) -> bool {
        matches!(self, MarketKind::Crypto)
    }
}
