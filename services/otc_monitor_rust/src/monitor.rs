//! Monitor runtime: pollers plus a periodic report until Ctrl+C

use crate::config::MonitorConfig;
use crate::report::build_report;
use anyhow::{Context, Result};
use cloak_otc_core::constants::{COUNTDOWN_TICK, TELOS_CHAIN_ID};
use cloak_otc_core::polling::{AuctionPoller, ListingsPoller};
use cloak_otc_core::{ChainRpcClient, MarketReader};
use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

pub struct OtcMonitor {
    config: MonitorConfig,
    /// Set when talking to a real node; used for the startup chain check
    client: Option<Arc<ChainRpcClient>>,
    listings: ListingsPoller,
    auction: AuctionPoller,
}

impl OtcMonitor {
    pub fn new(config: MonitorConfig) -> Result<Self> {
        let client = ChainRpcClient::new(&config.rpc_url, config.rpc_timeout())
            .context("Failed to build RPC client")?;
        let client = Arc::new(client);
        let reader = MarketReader::new(client.clone(), &config.otc_contract);
        Ok(Self {
            client: Some(client),
            ..Self::with_reader(config, reader)
        })
    }

    pub fn with_reader(config: MonitorConfig, reader: MarketReader) -> Self {
        Self {
            listings: ListingsPoller::new(reader.clone()),
            auction: AuctionPoller::new(reader),
            client: None,
            config,
        }
    }

    /// Log which chain the node serves; a foreign chain id is only a warning
    async fn check_chain(&self) {
        let Some(client) = &self.client else {
            return;
        };
        match client.get_info().await {
            Ok(info) if info.chain_id != TELOS_CHAIN_ID => warn!(
                "Node {} serves chain {}, expected Telos mainnet",
                client.base_url(),
                info.chain_id
            ),
            Ok(info) => info!(
                "Connected to Telos mainnet at block {} ({})",
                info.head_block_num, info.head_block_time
            ),
            Err(e) => warn!("Chain info unavailable from {}: {}", client.base_url(), e),
        }
    }

    /// Current report lines from the latest snapshots
    pub async fn report(&self) -> Vec<String> {
        let listings = self.listings.snapshot().await;
        let auction = self.auction.snapshot().await;
        build_report(
            &listings,
            &auction,
            self.config.sort,
            self.config.seller.as_deref(),
        )
    }

    pub async fn run(&self) -> Result<()> {
        info!(
            "Monitoring {} via {} (listings: {}s, auction: {}s)",
            self.config.otc_contract,
            self.config.rpc_url,
            self.config.listings_poll_secs,
            self.config.auction_poll_secs
        );

        self.check_chain().await;

        // Handles abort their tasks when dropped at the end of this scope
        let _listings = self.listings.spawn(self.config.listings_interval());
        let _auction = self.auction.spawn(self.config.auction_interval());
        let _countdown = self.auction.spawn_countdown(COUNTDOWN_TICK);

        let mut ticker = interval(self.config.report_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First report after one period so the pollers have data
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    for line in self.report().await {
                        info!("{}", line);
                    }
                }
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => info!("Received shutdown signal"),
                        Err(err) => error!("Unable to listen for shutdown signal: {}", err),
                    }
                    break;
                }
            }
        }

        info!("Monitor stopped");
        Ok(())
    }
}
