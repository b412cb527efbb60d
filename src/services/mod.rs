//! External data sources and outbound fan-out

pub mod binance;
pub mod broadcaster;
pub mod market_data;
pub mod synthetic;

pub use broadcaster::{BroadcastMessage, Broadcaster, Subscription, SubscriptionFilter};
pub use market_data::{ExchangeMarketDataProvider, MarketDataProvider};
pub use synthetic::SyntheticCandleGenerator;
