//! Row types for the marketplace and auction tables.
//!
//! Field names and shapes follow the on-chain ABI as returned by
//! `get_table_rows` with `json: true`.

use crate::error::{OtcError, Result};
use crate::utils::asset::Asset;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A seller's listing (`otccloak::listings`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(deserialize_with = "de_u64_lenient")]
    pub id: u64,
    pub seller: String,
    /// Remaining CLOAK, e.g. `"1000.0000 CLOAK"`
    pub quantity: Asset,
    /// Floor price in TLOS per CLOAK, e.g. `"0.0500 TLOS"`
    pub min_price: Asset,
    /// Premium over the auction price, whole percent
    pub premium_pct: u16,
    /// `time_point_sec` rendered as `"2025-01-01T00:00:00"`
    pub created_at: String,
}

impl Listing {
    /// Creation time, if the chain rendered it in a parseable form
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_chain_time(&self.created_at).ok()
    }
}

/// Marketplace config singleton (`otccloak::config`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContractConfig {
    /// Fee in basis points of the traded CLOAK (10000 = 100%)
    pub fee_pct: u16,
    #[serde(deserialize_with = "de_bool_lenient")]
    pub paused: bool,
}

/// Token amount bound to its issuing contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtendedAsset {
    pub quantity: Asset,
    pub contract: String,
}

/// Auction configuration (`thezeosalias::auctioncfg`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionConfig {
    /// Unix epoch seconds
    pub start_block_time: u32,
    /// Seconds per round (82800 = 23h)
    pub round_duration_sec: u32,
    pub number_of_rounds: u16,
    /// CLOAK distributed per round
    pub tokens_per_round: Asset,
    pub token_contract: String,
    pub min_contribution: ExtendedAsset,
    /// Percent of contributions staked
    pub stake_rate: u8,
}

/// Aggregate auction totals (`thezeosalias::auctionstat`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuctionStat {
    /// Raw TLOS units (4 decimals)
    #[serde(deserialize_with = "de_i64_lenient")]
    pub amount_contributed: i64,
    #[serde(deserialize_with = "de_i64_lenient")]
    pub amount_staked: i64,
}

/// One participant's contribution to a round (`thezeosalias::auction`, scope = round)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionRow {
    /// Variant pair: `["name", "alice"]` or `["bytes", "<hex>"]`
    pub user: (String, String),
    /// Raw TLOS units (4 decimals)
    #[serde(deserialize_with = "de_i64_lenient")]
    pub amount: i64,
    #[serde(deserialize_with = "de_bool_lenient")]
    pub claimed: bool,
}

/// Subset of `/v1/chain/get_info` we care about
#[derive(Debug, Clone, Deserialize)]
pub struct ChainInfo {
    pub chain_id: String,
    pub head_block_num: u64,
    pub head_block_time: String,
}

impl ChainInfo {
    pub fn head_block_epoch(&self) -> Result<i64> {
        parse_chain_time(&self.head_block_time).map(|t| t.timestamp())
    }
}

/// Parse chain timestamps (`"2025-01-01T00:00:00"` or with `.500` millis), which are UTC
pub fn parse_chain_time(raw: &str) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim().trim_end_matches('Z');
    trimmed
        .parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(|e| OtcError::Decode {
            what: format!("chain timestamp '{}'", raw),
            source: serde::de::Error::custom(e),
        })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrString {
    Num(i64),
    Str(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolOrNum {
    Bool(bool),
    Num(u8),
}

/// 64-bit integers may arrive as JSON numbers or strings depending on node version
fn de_i64_lenient<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumOrString::deserialize(deserializer)? {
        NumOrString::Num(n) => Ok(n),
        NumOrString::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn de_u64_lenient<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = de_i64_lenient(deserializer)?;
    u64::try_from(value).map_err(serde::de::Error::custom)
}

fn de_bool_lenient<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match BoolOrNum::deserialize(deserializer)? {
        BoolOrNum::Bool(b) => Ok(b),
        BoolOrNum::Num(n) => Ok(n != 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listing_row() {
        let row = json!({
            "id": 7,
            "seller": "alice",
            "quantity": "1000.0000 CLOAK",
            "min_price": "0.0500 TLOS",
            "premium_pct": 10,
            "created_at": "2025-03-01T12:00:00"
        });
        let listing: Listing = serde_json::from_value(row).unwrap();
        assert_eq!(listing.id, 7);
        assert_eq!(listing.quantity, Asset::cloak(10_000_000));
        assert_eq!(listing.min_price, Asset::tlos(500));
        assert_eq!(
            listing.created_at_utc().unwrap().to_rfc3339(),
            "2025-03-01T12:00:00+00:00"
        );
    }

    #[test]
    fn test_auction_rows_lenient_numbers() {
        let stat: AuctionStat = serde_json::from_value(json!({
            "amount_contributed": "123450000",
            "amount_staked": 0
        }))
        .unwrap();
        assert_eq!(stat.amount_contributed, 123_450_000);

        let row: AuctionRow = serde_json::from_value(json!({
            "user": ["name", "bob"],
            "amount": "50000",
            "claimed": 0
        }))
        .unwrap();
        assert_eq!(row.user.1, "bob");
        assert_eq!(row.amount, 50_000);
        assert!(!row.claimed);
    }

    #[test]
    fn test_auction_config_row() {
        let cfg: AuctionConfig = serde_json::from_value(json!({
            "start_block_time": 1_700_000_000u32,
            "round_duration_sec": 82800,
            "number_of_rounds": 60,
            "tokens_per_round": "1638001.6380 CLOAK",
            "token_contract": "thezeostoken",
            "min_contribution": { "quantity": "1.0000 TLOS", "contract": "eosio.token" },
            "stake_rate": 50
        }))
        .unwrap();
        assert_eq!(cfg.tokens_per_round.amount(), 16_380_016_380);
        assert_eq!(cfg.min_contribution.quantity, Asset::tlos(10_000));
    }

    #[test]
    fn test_chain_time() {
        let info = ChainInfo {
            chain_id: "x".into(),
            head_block_num: 1,
            head_block_time: "2023-11-14T22:13:20.500".into(),
        };
        assert_eq!(info.head_block_epoch().unwrap(), 1_700_000_000);
        assert!(parse_chain_time("yesterday").is_err());
    }
}
