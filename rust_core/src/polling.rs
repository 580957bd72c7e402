//! Periodic refresh of marketplace and auction state.
//!
//! - listings + config: every 15s, both reads concurrently, swapped in one write
//! - auction: every 30s, round clock resynchronized from chain time
//! - countdown: every 1s, local decrement of the time to the next round
//!
//! Each loop runs as a tokio task owned by a [`PollHandle`]; dropping or
//! cancelling the handle aborts the task, including a cycle in flight.
//! A failed cycle records its error and the next tick simply tries again.

use crate::clients::market_reader::MarketReader;
use crate::error::{OtcError, Result};
use crate::pricing::{
    compute_current_round_at, compute_reference_price, compute_time_to_next_round_at,
    reference_price_raw, settled_round_at,
};
use crate::types::{AuctionConfig, ContractConfig, Listing};
use crate::utils::asset::{Asset, Symbol};
use chrono::{DateTime, Utc};
use futures_util::future::try_join;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Owner of a background polling task; aborts the task when dropped
#[must_use = "dropping a PollHandle stops its poller"]
pub struct PollHandle {
    name: &'static str,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the poller now
    pub fn cancel(self) {}
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if !self.task.is_finished() {
            debug!("Stopping {} poller", self.name);
        }
        self.task.abort();
    }
}

/// Run `cycle` immediately and then every `period`
pub fn spawn_periodic<F, Fut>(name: &'static str, period: Duration, cycle: F) -> PollHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    spawn_at(name, Instant::now(), period, cycle)
}

/// Run `cycle` every `period`, first after one full period
pub fn spawn_periodic_delayed<F, Fut>(name: &'static str, period: Duration, cycle: F) -> PollHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    spawn_at(name, Instant::now() + period, period, cycle)
}

fn spawn_at<F, Fut>(name: &'static str, start: Instant, period: Duration, mut cycle: F) -> PollHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    // interval() panics on a zero period
    let period = period.max(Duration::from_millis(1));
    info!("Starting {} poller (interval: {:?})", name, period);

    let task = tokio::spawn(async move {
        let mut ticker = interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            cycle().await;
        }
    });

    PollHandle { name, task }
}

// ============================================================================
// Listings + config
// ============================================================================

/// Latest listings snapshot
#[derive(Debug, Clone)]
pub struct ListingsState {
    pub listings: Vec<Listing>,
    pub config: Option<ContractConfig>,
    /// True until the first cycle finishes
    pub loading: bool,
    pub error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for ListingsState {
    fn default() -> Self {
        Self {
            listings: Vec::new(),
            config: None,
            loading: true,
            error: None,
            updated_at: None,
        }
    }
}

/// Polls the listings table and marketplace config
#[derive(Clone)]
pub struct ListingsPoller {
    reader: MarketReader,
    state: Arc<RwLock<ListingsState>>,
}

impl ListingsPoller {
    pub fn new(reader: MarketReader) -> Self {
        Self {
            reader,
            state: Arc::new(RwLock::new(ListingsState::default())),
        }
    }

    pub fn state(&self) -> Arc<RwLock<ListingsState>> {
        self.state.clone()
    }

    pub async fn snapshot(&self) -> ListingsState {
        self.state.read().await.clone()
    }

    /// One refresh cycle; also used on demand after a transaction
    pub async fn refresh(&self) {
        let result = try_join(self.reader.get_listings(), self.reader.get_config()).await;

        let mut state = self.state.write().await;
        match result {
            Ok((listings, config)) => {
                debug!("Loaded {} listings", listings.len());
                state.listings = listings;
                state.config = config;
                state.error = None;
                state.updated_at = Some(Utc::now());
            }
            Err(e) => {
                warn!("Failed to load listings: {}", e);
                state.error = Some(e.to_string());
            }
        }
        state.loading = false;
    }

    pub fn spawn(&self, period: Duration) -> PollHandle {
        let poller = self.clone();
        spawn_periodic("listings", period, move || {
            let poller = poller.clone();
            async move { poller.refresh().await }
        })
    }
}

// ============================================================================
// Auction
// ============================================================================

/// Latest auction snapshot and the round clock derived from it
#[derive(Debug, Clone)]
pub struct AuctionState {
    /// Reference price (TLOS per CLOAK) of the settled round
    pub auction_price: f64,
    /// Same price with contract rounding, for quotes
    pub auction_price_raw: Asset,
    /// `-1` before the auction starts
    pub current_round: i64,
    pub last_completed_round: Option<u32>,
    /// Seconds, decremented locally between polls
    pub time_to_next_round: i64,
    /// TLOS across all rounds
    pub total_contributed: f64,
    /// TLOS in the settled round
    pub round_contributed: f64,
    /// CLOAK per round
    pub tokens_per_round: f64,
    pub config: Option<AuctionConfig>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for AuctionState {
    fn default() -> Self {
        Self {
            auction_price: 0.0,
            auction_price_raw: Asset::zero(Symbol::tlos()),
            current_round: -1,
            last_completed_round: None,
            time_to_next_round: 0,
            total_contributed: 0.0,
            round_contributed: 0.0,
            tokens_per_round: 0.0,
            config: None,
            loading: true,
            error: None,
        }
    }
}

/// Polls the auction tables and keeps the round countdown
#[derive(Clone)]
pub struct AuctionPoller {
    reader: MarketReader,
    state: Arc<RwLock<AuctionState>>,
}

impl AuctionPoller {
    pub fn new(reader: MarketReader) -> Self {
        Self {
            reader,
            state: Arc::new(RwLock::new(AuctionState::default())),
        }
    }

    pub fn state(&self) -> Arc<RwLock<AuctionState>> {
        self.state.clone()
    }

    pub async fn snapshot(&self) -> AuctionState {
        self.state.read().await.clone()
    }

    /// Chain head time, or the local clock if the node can't say
    async fn now(&self) -> i64 {
        match self.reader.chain_time().await {
            Ok(now) => now,
            Err(e) => {
                debug!("Chain time unavailable, using local clock: {}", e);
                Utc::now().timestamp()
            }
        }
    }

    /// Build a fresh auction state from the chain
    pub async fn fetch(&self) -> Result<AuctionState> {
        let config = self
            .reader
            .get_auction_config()
            .await?
            .ok_or(OtcError::Missing("auction config"))?;

        let now = self.now().await;
        let start = config.start_block_time as i64;
        let duration = config.round_duration_sec as i64;
        let current_round = compute_current_round_at(now, start, duration);
        let time_to_next_round = compute_time_to_next_round_at(now, start, duration);
        let settled_round = settled_round_at(now, &config);

        let rows = async {
            match settled_round {
                Some(round) => self.reader.get_auction_round(round).await,
                None => Ok(Vec::new()),
            }
        };
        let (rows, stat) = try_join(rows, self.reader.get_auction_stat()).await?;

        let tlos_scale = Symbol::tlos().scale() as f64;
        let round_raw: i64 = rows.iter().map(|r| r.amount).sum();
        let round_contributed = round_raw as f64 / tlos_scale;
        let tokens_per_round = config.tokens_per_round.as_f64();

        let (auction_price, auction_price_raw) = if settled_round.is_some() {
            (
                compute_reference_price(round_contributed, tokens_per_round),
                reference_price_raw(round_raw, config.tokens_per_round.amount()),
            )
        } else {
            (0.0, Asset::tlos(0))
        };

        let total_contributed = stat
            .map(|s| s.amount_contributed as f64 / tlos_scale)
            .unwrap_or(0.0);

        Ok(AuctionState {
            auction_price,
            auction_price_raw,
            current_round,
            last_completed_round: settled_round,
            time_to_next_round,
            total_contributed,
            round_contributed,
            tokens_per_round,
            config: Some(config),
            loading: false,
            error: None,
        })
    }

    /// One refresh cycle; on failure the previous snapshot is kept
    pub async fn refresh(&self) {
        match self.fetch().await {
            Ok(fresh) => {
                debug!(
                    "Auction round {} price {:.4} (next round in {}s)",
                    fresh.current_round, fresh.auction_price, fresh.time_to_next_round
                );
                *self.state.write().await = fresh;
            }
            Err(e) => {
                warn!("Failed to load auction data: {}", e);
                let mut state = self.state.write().await;
                state.error = Some(e.to_string());
                state.loading = false;
            }
        }
    }

    pub fn spawn(&self, period: Duration) -> PollHandle {
        let poller = self.clone();
        spawn_periodic("auction", period, move || {
            let poller = poller.clone();
            async move { poller.refresh().await }
        })
    }

    /// Count the time to the next round down locally, one `tick` at a time.
    ///
    /// Elapsed time is carried in milliseconds so ticks that are not whole
    /// seconds still track real time.
    pub fn spawn_countdown(&self, tick: Duration) -> PollHandle {
        let state = self.state.clone();
        let tick_ms = tick.as_millis().max(1);
        let mut carry_ms: u128 = 0;
        spawn_periodic_delayed("countdown", tick, move || {
            carry_ms += tick_ms;
            let step = i64::try_from(carry_ms / 1_000).unwrap_or(i64::MAX);
            carry_ms %= 1_000;
            let state = state.clone();
            async move {
                if step == 0 {
                    return;
                }
                let mut s = state.write().await;
                s.time_to_next_round = s.time_to_next_round.saturating_sub(step).max(0);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTables;
    use serde_json::{json, Value};

    fn listing_row(id: u64) -> Value {
        json!({
            "id": id,
            "seller": "alice",
            "quantity": "100.0000 CLOAK",
            "min_price": "0.0500 TLOS",
            "premium_pct": 10,
            "created_at": "2025-01-01T00:00:00"
        })
    }

    fn seed_listings(tables: &FakeTables, count: u64) {
        tables.set(
            "otccloak111",
            "listings",
            "otccloak111",
            (1..=count).map(listing_row).collect(),
        );
        tables.set(
            "otccloak111",
            "config",
            "otccloak111",
            vec![json!({ "fee_pct": 50, "paused": false })],
        );
    }

    fn seed_auction(tables: &FakeTables) {
        tables.set(
            "thezeosalias",
            "auctioncfg",
            "thezeosalias",
            vec![json!({
                "start_block_time": 1_000,
                "round_duration_sec": 100,
                "number_of_rounds": 60,
                "tokens_per_round": "10000.0000 CLOAK",
                "token_contract": "thezeostoken",
                "min_contribution": { "quantity": "1.0000 TLOS", "contract": "eosio.token" },
                "stake_rate": 0
            })],
        );
        // Round 1: 600 + 400 TLOS
        tables.set(
            "thezeosalias",
            "auction",
            "1",
            vec![
                json!({ "user": ["name", "bob"], "amount": 6_000_000, "claimed": false }),
                json!({ "user": ["name", "carol"], "amount": "4000000", "claimed": true }),
            ],
        );
        tables.set(
            "thezeosalias",
            "auctionstat",
            "thezeosalias",
            vec![json!({ "amount_contributed": "50000000", "amount_staked": 0 })],
        );
    }

    fn reader(tables: &FakeTables) -> MarketReader {
        MarketReader::with_defaults(Arc::new(tables.clone()))
    }

    #[tokio::test]
    async fn test_listings_refresh_and_error_keeps_rows() {
        let tables = FakeTables::new();
        seed_listings(&tables, 2);
        let poller = ListingsPoller::new(reader(&tables));
        assert!(poller.snapshot().await.loading);

        poller.refresh().await;
        // One read for listings, one for config
        assert_eq!(tables.query_count(), 2);
        let state = poller.snapshot().await;
        assert!(!state.loading);
        assert_eq!(state.listings.len(), 2);
        assert_eq!(state.config.unwrap().fee_pct, 50);
        assert!(state.error.is_none());

        tables.fail_with(Some("node down"));
        poller.refresh().await;
        let state = poller.snapshot().await;
        assert_eq!(state.listings.len(), 2);
        assert!(state.error.unwrap().contains("node down"));

        tables.fail_with(None);
        let before = tables.query_count();
        poller.refresh().await;
        assert!(poller.snapshot().await.error.is_none());
        assert_eq!(tables.query_count() - before, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listings_poller_ticks_and_cancels() {
        let tables = FakeTables::new();
        seed_listings(&tables, 1);
        let poller = ListingsPoller::new(reader(&tables));

        let handle = poller.spawn(Duration::from_secs(15));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(poller.snapshot().await.listings.len(), 1);

        seed_listings(&tables, 2);
        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(poller.snapshot().await.listings.len(), 2);

        handle.cancel();
        seed_listings(&tables, 3);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(poller.snapshot().await.listings.len(), 2);
    }

    #[tokio::test]
    async fn test_auction_fetch_from_chain_clock() {
        let tables = FakeTables::new();
        seed_auction(&tables);
        tables.set_chain_time(Some(1_250));
        let poller = AuctionPoller::new(reader(&tables));

        poller.refresh().await;
        let state = poller.snapshot().await;
        assert_eq!(state.current_round, 2);
        assert_eq!(state.last_completed_round, Some(1));
        assert_eq!(state.time_to_next_round, 50);
        assert!((state.round_contributed - 1_000.0).abs() < 1e-9);
        assert!((state.tokens_per_round - 10_000.0).abs() < 1e-9);
        assert!((state.auction_price - 0.1).abs() < 1e-12);
        assert_eq!(state.auction_price_raw, Asset::tlos(1_000));
        assert!((state.total_contributed - 5_000.0).abs() < 1e-9);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_auction_before_first_settled_round() {
        let tables = FakeTables::new();
        seed_auction(&tables);
        tables.set_chain_time(Some(900));
        let poller = AuctionPoller::new(reader(&tables));

        poller.refresh().await;
        let state = poller.snapshot().await;
        assert_eq!(state.current_round, -1);
        assert_eq!(state.time_to_next_round, 100);
        assert_eq!(state.last_completed_round, None);
        assert_eq!(state.auction_price, 0.0);
    }

    #[tokio::test]
    async fn test_auction_missing_config() {
        let tables = FakeTables::new();
        let poller = AuctionPoller::new(reader(&tables));
        poller.refresh().await;
        let state = poller.snapshot().await;
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("no auction config found"));
        assert_eq!(state.auction_price_raw, Asset::tlos(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_decrements_and_resyncs() {
        let tables = FakeTables::new();
        seed_auction(&tables);
        tables.set_chain_time(Some(1_297));
        let poller = AuctionPoller::new(reader(&tables));
        poller.refresh().await;
        assert_eq!(poller.snapshot().await.time_to_next_round, 3);

        let countdown = poller.spawn_countdown(Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(poller.snapshot().await.time_to_next_round, 2);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(poller.snapshot().await.time_to_next_round, 0);

        // Next poll puts the authoritative value back
        tables.set_chain_time(Some(1_310));
        poller.refresh().await;
        assert_eq!(poller.snapshot().await.time_to_next_round, 90);
        drop(countdown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_sub_second_tick_tracks_real_time() {
        let tables = FakeTables::new();
        seed_auction(&tables);
        tables.set_chain_time(Some(1_200));
        let poller = AuctionPoller::new(reader(&tables));
        poller.refresh().await;
        assert_eq!(poller.snapshot().await.time_to_next_round, 100);

        let countdown = poller.spawn_countdown(Duration::from_millis(500));
        tokio::time::sleep(Duration::from_millis(10_100)).await;
        assert_eq!(poller.snapshot().await.time_to_next_round, 90);

        // 1.5s ticks: 1, 2, 1, 2 ... whole seconds per tick
        drop(countdown);
        let countdown = poller.spawn_countdown(Duration::from_millis(1_500));
        tokio::time::sleep(Duration::from_millis(6_100)).await;
        assert_eq!(poller.snapshot().await.time_to_next_round, 84);
        countdown.cancel();
    }
}
