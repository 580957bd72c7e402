//! Configuration for otc_monitor_rust

use anyhow::{anyhow, Result};
use cloak_otc_core::constants::{
    AUCTION_POLL_INTERVAL, LISTINGS_POLL_INTERVAL, OTC_CONTRACT, TELOS_RPC,
};
use cloak_otc_core::market::ListingSort;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    // Chain
    pub otc_contract: String,
    pub rpc_url: String,
    pub rpc_timeout_secs: u64,

    // Polling
    pub listings_poll_secs: u64,
    pub auction_poll_secs: u64,
    pub report_interval_secs: u64,

    // Report
    pub seller: Option<String>,
    pub sort: ListingSort,
}

impl MonitorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable source; `lookup` returns `None` for unset names
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listings_poll_secs = parse_u64(&lookup, "LISTINGS_POLL_SECS", LISTINGS_POLL_INTERVAL.as_secs())?;
        let auction_poll_secs = parse_u64(&lookup, "AUCTION_POLL_SECS", AUCTION_POLL_INTERVAL.as_secs())?;
        let report_interval_secs = parse_u64(&lookup, "REPORT_INTERVAL_SECS", 60)?;
        let rpc_timeout_secs = parse_u64(&lookup, "RPC_TIMEOUT_SECS", 10)?;

        for (name, value) in [
            ("LISTINGS_POLL_SECS", listings_poll_secs),
            ("AUCTION_POLL_SECS", auction_poll_secs),
            ("REPORT_INTERVAL_SECS", report_interval_secs),
            ("RPC_TIMEOUT_SECS", rpc_timeout_secs),
        ] {
            if value == 0 {
                return Err(anyhow!("{} must be > 0", name));
            }
        }

        let sort = match lookup("LISTING_SORT") {
            Some(raw) => raw
                .parse::<ListingSort>()
                .map_err(|e| anyhow!("LISTING_SORT: {}", e))?,
            None => ListingSort::default(),
        };

        Ok(Self {
            otc_contract: lookup("OTC_CONTRACT").unwrap_or_else(|| OTC_CONTRACT.to_string()),
            rpc_url: lookup("TELOS_RPC").unwrap_or_else(|| TELOS_RPC.to_string()),
            rpc_timeout_secs,
            listings_poll_secs,
            auction_poll_secs,
            report_interval_secs,
            seller: lookup("MONITOR_SELLER")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            sort,
        })
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    pub fn listings_interval(&self) -> Duration {
        Duration::from_secs(self.listings_poll_secs)
    }

    pub fn auction_interval(&self) -> Duration {
        Duration::from_secs(self.auction_poll_secs)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }
}

/// Parse variable as u64 with default fallback
fn parse_u64<F>(lookup: &F, var_name: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var_name) {
        Some(val) => val
            .trim()
            .parse()
            .map_err(|_| anyhow!("{} must be a valid u64", var_name)),
        None => Ok(default),
    }
}
