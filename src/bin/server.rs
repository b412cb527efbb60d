//! Trendcast signal server
//!
//! Starts the HTTP/WebSocket server and, unless `EVAL_INTERVAL_SECONDS=0`,
//! the periodic signal evaluation.

use trendcast::config::Config;
use trendcast::core::runtime;
use trendcast::logging::init_logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::from_env()?;
    init_logging(&config.environment);
    runtime::run(config).await
}
