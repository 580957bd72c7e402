//! Purchase quotes.
//!
//! Mirrors the marketplace contract's settlement of a `buy:<id>` transfer so
//! a buyer can see exactly what a given TLOS amount buys before signing:
//!
//! - tokens = spend * 10^4 / otc_price (truncating), capped at what is listed
//! - if capped, the unspent TLOS is refunded
//! - fee = tokens * fee_pct / 10000, burned; buyer receives tokens - fee
//! - seller receives tokens * otc_price / 10^4
//!
//! Two entry points cover both ways a buyer can express an order: by the TLOS
//! they want to spend, or by the CLOAK they want to receive.

use crate::constants::{FEE_BASIS, PRICE_SCALE};
use crate::error::{OtcError, Result};
use crate::pricing::is_listing_active_raw;
use crate::types::Listing;
use crate::utils::asset::{Asset, Symbol};
use serde::Serialize;

/// Outcome of buying from one listing at one OTC price
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseQuote {
    pub listing_id: u64,
    /// TLOS per CLOAK the trade settles at
    pub otc_price: Asset,
    /// TLOS the buyer transfers
    pub spend: Asset,
    /// CLOAK taken from the listing (before fee)
    pub tokens: Asset,
    /// CLOAK burned as fee
    pub fee: Asset,
    /// CLOAK delivered to the buyer
    pub net_tokens: Asset,
    /// TLOS paid to the seller
    pub seller_proceeds: Asset,
    /// TLOS sent back when the order exceeds the listing
    pub refund: Asset,
    /// Order was capped at the listing's remaining quantity
    pub fills_listing: bool,
}

/// Quote a purchase for a fixed TLOS spend.
///
/// `otc_price` is the raw contract price (see [`crate::pricing::otc_price_raw`]).
pub fn quote_for_spend(
    listing: &Listing,
    otc_price: &Asset,
    spend: &Asset,
    fee_pct: u16,
) -> Result<PurchaseQuote> {
    if spend.symbol() != &Symbol::tlos() {
        return Err(OtcError::InvalidArgument(format!(
            "spend must be TLOS, got {}",
            spend
        )));
    }
    if !spend.is_positive() {
        return Err(OtcError::AmountTooSmall("must send positive amount"));
    }
    ensure_tradeable(listing, otc_price)?;

    let price = otc_price.amount() as i128;
    let available = listing.quantity.amount() as i128;

    let mut tokens = spend.amount() as i128 * PRICE_SCALE as i128 / price;
    let mut refund = 0_i128;
    let fills_listing = tokens >= available;
    if tokens > available {
        tokens = available;
        let cost = tokens * price / PRICE_SCALE as i128;
        refund = spend.amount() as i128 - cost;
    }

    if tokens <= 0 {
        return Err(OtcError::AmountTooSmall("TLOS amount too small to buy any CLOAK"));
    }

    let fee = if fee_pct > 0 {
        tokens * fee_pct as i128 / FEE_BASIS as i128
    } else {
        0
    };
    let net = tokens - fee;
    if net <= 0 {
        return Err(OtcError::AmountTooSmall("trade amount too small after fee"));
    }

    let seller_proceeds = tokens * price / PRICE_SCALE as i128;

    Ok(PurchaseQuote {
        listing_id: listing.id,
        otc_price: otc_price.clone(),
        spend: spend.clone(),
        tokens: listing.quantity.with_amount(tokens as i64),
        fee: listing.quantity.with_amount(fee as i64),
        net_tokens: listing.quantity.with_amount(net as i64),
        seller_proceeds: otc_price.with_amount(seller_proceeds as i64),
        refund: spend.with_amount(refund as i64),
        fills_listing,
    })
}

/// Quote a purchase for a wanted CLOAK amount.
///
/// The wanted amount is capped at the listing's remaining quantity and the
/// TLOS to send is rounded up to the next raw unit so truncation on chain
/// never delivers less than asked.
pub fn quote_for_receive(
    listing: &Listing,
    otc_price: &Asset,
    wanted: &Asset,
    fee_pct: u16,
) -> Result<PurchaseQuote> {
    if wanted.symbol() != listing.quantity.symbol() {
        return Err(OtcError::InvalidArgument(format!(
            "wanted amount must be {}, got {}",
            listing.quantity.symbol().code(),
            wanted
        )));
    }
    if !wanted.is_positive() {
        return Err(OtcError::AmountTooSmall("must request a positive amount"));
    }
    // A zero price would round the spend to nothing; report the listing state instead
    ensure_tradeable(listing, otc_price)?;

    let capped = wanted.amount().min(listing.quantity.amount()) as i128;
    let price = otc_price.amount() as i128;
    let spend = (capped * price + PRICE_SCALE as i128 - 1) / PRICE_SCALE as i128;

    quote_for_spend(listing, otc_price, &Asset::tlos(spend as i64), fee_pct)
}

/// Frozen when below the floor, otherwise unpriced when the OTC price is zero
fn ensure_tradeable(listing: &Listing, otc_price: &Asset) -> Result<()> {
    if is_listing_active_raw(otc_price, &listing.min_price) {
        return Ok(());
    }
    if otc_price.amount() < listing.min_price.amount() {
        return Err(OtcError::ListingFrozen(listing.id));
    }
    Err(OtcError::ZeroPrice)
}

/// CLOAK amount for a percentage of the listing (25/50/75/100 presets)
pub fn fraction_of_listing(listing: &Listing, percent: u8) -> Asset {
    let percent = percent.min(100) as i128;
    let amount = listing.quantity.amount() as i128 * percent / 100;
    listing.quantity.with_amount(amount as i64)
}
