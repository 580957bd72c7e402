//! Marketplace actions and transfer memos.
//!
//! Listing, buying and cancelling are all plain chain actions:
//! - list: CLOAK transfer to the marketplace with memo `list:<floor>:<premium_pct>`
//! - buy: TLOS transfer to the marketplace with memo `buy:<listing_id>`
//! - cancel: `cancellisting(seller, listing_id)` on the marketplace contract
//!
//! Memos are validated here with the same rules the contract applies, so a
//! malformed listing is rejected before it ever reaches a wallet.

use crate::constants::{CLOAK_CONTRACT, MAX_PREMIUM_PCT, TLOS_CONTRACT};
use crate::error::{OtcError, Result};
use crate::utils::asset::{Asset, Symbol};
use serde::Serialize;

const LIST_PREFIX: &str = "list:";
const BUY_PREFIX: &str = "buy:";

/// Actor/permission pair authorizing an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionLevel {
    pub actor: String,
    pub permission: String,
}

impl PermissionLevel {
    pub fn active(actor: &str) -> Self {
        Self {
            actor: actor.to_string(),
            permission: "active".to_string(),
        }
    }
}

/// Token transfer payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferData {
    pub from: String,
    pub to: String,
    pub quantity: Asset,
    pub memo: String,
}

/// `cancellisting` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelListingData {
    pub seller: String,
    pub listing_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ActionData {
    Transfer(TransferData),
    CancelListing(CancelListingData),
}

/// A chain action ready to hand to a wallet session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    pub account: String,
    pub name: String,
    pub authorization: Vec<PermissionLevel>,
    pub data: ActionData,
}

/// Parsed `list:<floor>:<premium_pct>` memo
#[derive(Debug, Clone, PartialEq)]
pub struct ListMemo {
    /// Floor price in TLOS
    pub min_price: Asset,
    pub premium_pct: u16,
}

impl ListMemo {
    pub fn new(min_price: Asset, premium_pct: u16) -> Result<Self> {
        if min_price.symbol() != &Symbol::tlos() {
            return Err(OtcError::InvalidMemo(format!(
                "min_price must be TLOS, got {}",
                min_price
            )));
        }
        if !min_price.is_positive() {
            return Err(OtcError::InvalidMemo("min_price must be positive".to_string()));
        }
        if premium_pct > MAX_PREMIUM_PCT {
            return Err(OtcError::InvalidMemo(format!(
                "premium_pct cannot exceed {}",
                MAX_PREMIUM_PCT
            )));
        }
        Ok(Self {
            min_price,
            premium_pct,
        })
    }

    /// Parse and validate a listing memo
    pub fn parse(memo: &str) -> Result<Self> {
        let rest = memo.strip_prefix(LIST_PREFIX).ok_or_else(|| {
            OtcError::InvalidMemo(
                "invalid memo format, expected list:<min_price>:<premium_pct>".to_string(),
            )
        })?;

        let (price_str, pct_str) = rest.split_once(':').ok_or_else(|| {
            OtcError::InvalidMemo("invalid memo format, missing premium_pct separator".to_string())
        })?;

        if pct_str.is_empty() {
            return Err(OtcError::InvalidMemo("premium_pct is missing".to_string()));
        }
        if !pct_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(OtcError::InvalidMemo("premium_pct must be a number".to_string()));
        }
        if price_str.is_empty() {
            return Err(OtcError::InvalidMemo("min_price is empty".to_string()));
        }
        if !price_str.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return Err(OtcError::InvalidMemo(
                "min_price contains invalid characters".to_string(),
            ));
        }

        let min_price = Asset::from_decimal_str(price_str, Symbol::tlos())
            .map_err(|e| OtcError::InvalidMemo(format!("min_price: {}", e)))?;

        let premium_pct: u64 = pct_str
            .parse()
            .map_err(|_| OtcError::InvalidMemo("premium_pct out of range".to_string()))?;
        let premium_pct = u16::try_from(premium_pct)
            .map_err(|_| OtcError::InvalidMemo("premium_pct cannot exceed 10000".to_string()))?;

        Self::new(min_price, premium_pct)
    }

    pub fn to_memo(&self) -> String {
        format!(
            "{}{}:{}",
            LIST_PREFIX,
            self.min_price.amount_string(),
            self.premium_pct
        )
    }
}

/// Listing id from a `buy:<id>` memo
pub fn parse_buy_memo(memo: &str) -> Result<u64> {
    let id = memo.strip_prefix(BUY_PREFIX).ok_or_else(|| {
        OtcError::InvalidMemo("invalid memo format, expected buy:<listing_id>".to_string())
    })?;
    id.parse()
        .map_err(|_| OtcError::InvalidMemo(format!("invalid listing id '{}'", id)))
}

pub fn buy_memo(listing_id: u64) -> String {
    format!("{}{}", BUY_PREFIX, listing_id)
}

/// TLOS transfer buying from `listing_id`
pub fn buy_action(actor: &str, otc_contract: &str, listing_id: u64, spend: &Asset) -> Result<Action> {
    if spend.symbol() != &Symbol::tlos() || !spend.is_positive() {
        return Err(OtcError::InvalidArgument(format!(
            "buy requires a positive TLOS amount, got {}",
            spend
        )));
    }
    Ok(transfer(
        TLOS_CONTRACT,
        actor,
        otc_contract,
        spend.clone(),
        buy_memo(listing_id),
    ))
}

/// CLOAK transfer opening a listing
pub fn list_action(
    actor: &str,
    otc_contract: &str,
    quantity: &Asset,
    memo: &ListMemo,
) -> Result<Action> {
    if quantity.symbol() != &Symbol::cloak() || !quantity.is_positive() {
        return Err(OtcError::InvalidArgument(format!(
            "listing requires a positive CLOAK amount, got {}",
            quantity
        )));
    }
    Ok(transfer(
        CLOAK_CONTRACT,
        actor,
        otc_contract,
        quantity.clone(),
        memo.to_memo(),
    ))
}

/// `cancellisting` returning the remaining CLOAK to the seller
pub fn cancel_action(actor: &str, otc_contract: &str, listing_id: u64) -> Action {
    Action {
        account: otc_contract.to_string(),
        name: "cancellisting".to_string(),
        authorization: vec![PermissionLevel::active(actor)],
        data: ActionData::CancelListing(CancelListingData {
            seller: actor.to_string(),
            listing_id,
        }),
    }
}

fn transfer(token_contract: &str, from: &str, to: &str, quantity: Asset, memo: String) -> Action {
    Action {
        account: token_contract.to_string(),
        name: "transfer".to_string(),
        authorization: vec![PermissionLevel::active(from)],
        data: ActionData::Transfer(TransferData {
            from: from.to_string(),
            to: to.to_string(),
            quantity,
            memo,
        }),
    }
}
