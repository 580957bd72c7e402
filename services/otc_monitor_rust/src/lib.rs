//! otc_monitor_rust - Headless CLOAK OTC market and auction monitor

pub mod config;
pub mod monitor;
pub mod report;

pub use config::MonitorConfig;
pub use monitor::OtcMonitor;
