//! Chain accounts, token symbols and default cadences.

use std::time::Duration;

/// Default marketplace contract account
pub const OTC_CONTRACT: &str = "otccloak111";
/// CLOAK token contract
pub const CLOAK_CONTRACT: &str = "thezeostoken";
/// Auction contract holding `auctioncfg`, `auctionstat` and per-round `auction` tables
pub const AUCTION_CONTRACT: &str = "thezeosalias";
/// TLOS system token contract
pub const TLOS_CONTRACT: &str = "eosio.token";

pub const TELOS_RPC: &str = "https://mainnet.telos.net";
pub const TELOS_CHAIN_ID: &str =
    "4667b205c6838ef70ff7988f6e8257e8be0e1284a2f59699054a018f743b1d11";

pub const CLOAK_SYMBOL: &str = "CLOAK";
pub const TLOS_SYMBOL: &str = "TLOS";
/// Both CLOAK and TLOS carry 4 decimals on chain
pub const TOKEN_PRECISION: u8 = 4;
/// 10^TOKEN_PRECISION
pub const PRICE_SCALE: i64 = 10_000;

/// 23 hours
pub const ROUND_DURATION_SEC: i64 = 82_800;
/// 1,638,001.6380 CLOAK in raw units
pub const TOKENS_PER_ROUND: i64 = 16_380_016_380;
pub const NUMBER_OF_ROUNDS: u16 = 60;

/// Upper bound the contract accepts for a listing premium
pub const MAX_PREMIUM_PCT: u16 = 10_000;
/// Fee basis: `fee_pct` of 10000 is 100%
pub const FEE_BASIS: i64 = 10_000;

/// Row limits used for table reads
pub const LISTINGS_ROW_LIMIT: u32 = 100;
pub const ROUND_ROW_LIMIT: u32 = 1_000;

pub const LISTINGS_POLL_INTERVAL: Duration = Duration::from_secs(15);
pub const AUCTION_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);
