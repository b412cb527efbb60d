//! Exchange historical candle source

pub mod client;
pub mod messages;

pub use client::BinanceRestClient;
pub use messages::parse_klines;
