//! CLOAK OTC Core - pricing engine and chain plumbing for the CLOAK OTC marketplace.
//!
//! This crate provides:
//! - Reference/OTC price derivation from the CLOAK auction (float and contract-exact)
//! - Auction round clock (current round, time to next round)
//! - Typed reads of the marketplace and auction tables over Antelope RPC
//! - Listing enrichment, sorting and market statistics
//! - Purchase quotes mirroring on-chain settlement
//! - Transfer memos and action builders for list / buy / cancel
//! - Wallet session seams and background pollers

pub mod actions;
pub mod clients;
pub mod constants;
pub mod error;
pub mod market;
pub mod polling;
pub mod pricing;
pub mod quote;
pub mod types;
pub mod utils;
pub mod wallet;

#[cfg(test)]
mod testing;

pub use clients::{ChainRpcClient, MarketReader, TableQuery, TableSource};
pub use error::{OtcError, Result};
pub use market::{ListingSort, ListingView, MarketStats, SortField};
pub use polling::{AuctionPoller, AuctionState, ListingsPoller, ListingsState, PollHandle};
pub use pricing::{
    compute_current_round, compute_otc_price, compute_reference_price,
    compute_time_to_next_round, is_listing_active,
};
pub use quote::{quote_for_receive, quote_for_spend, PurchaseQuote};
pub use types::{AuctionConfig, ContractConfig, Listing};
pub use utils::asset::{Asset, Symbol};
pub use wallet::{Session, SessionKit, SessionKitHolder, WalletContext};
