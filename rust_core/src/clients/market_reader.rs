//! Typed reads of the marketplace and auction tables.

use crate::clients::chain_rpc::{TableQuery, TableSource};
use crate::constants::{AUCTION_CONTRACT, LISTINGS_ROW_LIMIT, OTC_CONTRACT, ROUND_ROW_LIMIT};
use crate::error::{OtcError, Result};
use crate::types::{AuctionConfig, AuctionRow, AuctionStat, ContractConfig, Listing};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Reads marketplace and auction state from a [`TableSource`]
#[derive(Clone)]
pub struct MarketReader {
    source: Arc<dyn TableSource>,
    otc_contract: String,
    auction_contract: String,
}

impl MarketReader {
    pub fn new(source: Arc<dyn TableSource>, otc_contract: &str) -> Self {
        Self {
            source,
            otc_contract: otc_contract.to_string(),
            auction_contract: AUCTION_CONTRACT.to_string(),
        }
    }

    /// Reader against the default marketplace contract
    pub fn with_defaults(source: Arc<dyn TableSource>) -> Self {
        Self::new(source, OTC_CONTRACT)
    }

    pub fn otc_contract(&self) -> &str {
        &self.otc_contract
    }

    pub fn source_name(&self) -> &str {
        self.source.source_name()
    }

    /// All open listings
    pub async fn get_listings(&self) -> Result<Vec<Listing>> {
        let query = TableQuery::new(
            &self.otc_contract,
            "listings",
            &self.otc_contract,
            LISTINGS_ROW_LIMIT,
        );
        self.rows(&query).await
    }

    /// Marketplace config singleton, if it has been set
    pub async fn get_config(&self) -> Result<Option<ContractConfig>> {
        let query = TableQuery::new(&self.otc_contract, "config", &self.otc_contract, 1);
        self.first_row(&query).await
    }

    pub async fn get_auction_config(&self) -> Result<Option<AuctionConfig>> {
        let query = TableQuery::new(
            &self.auction_contract,
            "auctioncfg",
            &self.auction_contract,
            1,
        );
        self.first_row(&query).await
    }

    pub async fn get_auction_stat(&self) -> Result<Option<AuctionStat>> {
        let query = TableQuery::new(
            &self.auction_contract,
            "auctionstat",
            &self.auction_contract,
            1,
        );
        self.first_row(&query).await
    }

    /// Contribution rows of one round (the table is scoped by round index)
    pub async fn get_auction_round(&self, round: u32) -> Result<Vec<AuctionRow>> {
        let query = TableQuery::new(
            &self.auction_contract,
            "auction",
            &round.to_string(),
            ROUND_ROW_LIMIT,
        );
        self.rows(&query).await
    }

    /// Head block time in epoch seconds
    pub async fn chain_time(&self) -> Result<i64> {
        self.source.chain_time().await
    }

    async fn rows<T: DeserializeOwned>(&self, query: &TableQuery) -> Result<Vec<T>> {
        let raw = self.source.table_rows(query).await?;
        decode_rows(raw, &query.table)
    }

    async fn first_row<T: DeserializeOwned>(&self, query: &TableQuery) -> Result<Option<T>> {
        Ok(self.rows(query).await?.into_iter().next())
    }
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>, table: &str) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|source| OtcError::Decode {
                what: format!("{} row", table),
                source,
            })
        })
        .collect()
}
