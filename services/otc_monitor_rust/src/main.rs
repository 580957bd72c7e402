use anyhow::Result;
use dotenv::dotenv;
use otc_monitor_rust::{MonitorConfig, OtcMonitor};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    info!("Starting CLOAK OTC monitor...");

    let config = MonitorConfig::from_env()?;
    let monitor = OtcMonitor::new(config)?;

    monitor.run().await
}
