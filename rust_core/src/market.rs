//! Marketplace views: priced listings, sorting, seller filter and statistics.
//!
//! Views are rebuilt from the latest listings snapshot and reference price on
//! every call; nothing here holds state between polls.

use crate::error::OtcError;
use crate::pricing::{compute_otc_price, is_listing_active};
use crate::types::{ContractConfig, Listing};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::str::FromStr;

/// A listing priced against the current reference price
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingView {
    pub listing: Listing,
    /// TLOS per CLOAK
    pub otc_price: f64,
    /// Seller floor, TLOS per CLOAK
    pub floor_price: f64,
    /// Remaining CLOAK
    pub available: f64,
    pub active: bool,
}

impl ListingView {
    pub fn new(listing: &Listing, reference_price: f64) -> Self {
        let otc_price = compute_otc_price(reference_price, listing.premium_pct);
        let floor_price = listing.min_price.as_f64();
        Self {
            listing: listing.clone(),
            otc_price,
            floor_price,
            available: listing.quantity.as_f64(),
            active: is_listing_active(otc_price, floor_price),
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.active {
            "Active"
        } else {
            "Frozen"
        }
    }
}

/// Price every listing against `reference_price`
pub fn enrich(listings: &[Listing], reference_price: f64) -> Vec<ListingView> {
    listings
        .iter()
        .map(|l| ListingView::new(l, reference_price))
        .collect()
}

/// Listings owned by `seller`
pub fn by_seller<'a>(views: &'a [ListingView], seller: &str) -> Vec<&'a ListingView> {
    views.iter().filter(|v| v.listing.seller == seller).collect()
}

/// Sortable listing column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Price,
    Amount,
    Premium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingSort {
    pub field: SortField,
    pub ascending: bool,
}

impl Default for ListingSort {
    fn default() -> Self {
        Self {
            field: SortField::Price,
            ascending: true,
        }
    }
}

impl ListingSort {
    pub fn new(field: SortField, ascending: bool) -> Self {
        Self { field, ascending }
    }

    /// Clicking the active column flips direction; a new column starts ascending
    pub fn toggle(self, field: SortField) -> Self {
        if self.field == field {
            Self {
                field,
                ascending: !self.ascending,
            }
        } else {
            Self {
                field,
                ascending: true,
            }
        }
    }

    pub fn apply(&self, views: &mut [ListingView]) {
        views.sort_by(|a, b| {
            let ord = match self.field {
                SortField::Price => a.otc_price.total_cmp(&b.otc_price),
                SortField::Amount => a.available.total_cmp(&b.available),
                SortField::Premium => a.listing.premium_pct.cmp(&b.listing.premium_pct),
            };
            if self.ascending {
                ord
            } else {
                ord.reverse()
            }
        });
    }
}

impl FromStr for ListingSort {
    type Err = OtcError;

    /// `price`, `amount`, `premium`, optionally suffixed `:asc` / `:desc`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let (field, direction) = match lowered.split_once(':') {
            Some((f, d)) => (f, d),
            None => (lowered.as_str(), "asc"),
        };
        let field = match field {
            "price" => SortField::Price,
            "amount" => SortField::Amount,
            "premium" => SortField::Premium,
            other => {
                return Err(OtcError::InvalidArgument(format!(
                    "unknown sort field '{}' (expected price|amount|premium)",
                    other
                )))
            }
        };
        let ascending = match direction {
            "asc" => true,
            "desc" => false,
            other => {
                return Err(OtcError::InvalidArgument(format!(
                    "unknown sort direction '{}' (expected asc|desc)",
                    other
                )))
            }
        };
        Ok(Self { field, ascending })
    }
}

/// Aggregate marketplace figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketStats {
    pub total_listings: usize,
    pub active_listings: usize,
    pub frozen_listings: usize,
    /// CLOAK across all listings, frozen included
    pub total_available: f64,
    pub unique_sellers: usize,
    /// Cheapest active OTC price; `None` when nothing is tradeable
    pub min_otc_price: Option<f64>,
    pub max_otc_price: Option<f64>,
    /// Fee as a percentage (`fee_pct / 100`), if config is known
    pub fee_rate_pct: Option<f64>,
}

impl MarketStats {
    pub fn compute(views: &[ListingView], config: Option<&ContractConfig>) -> Self {
        let total_listings = views.len();
        let active_listings = views.iter().filter(|v| v.active).count();
        let total_available = views.iter().map(|v| v.available).sum();
        let unique_sellers = views
            .iter()
            .map(|v| v.listing.seller.as_str())
            .collect::<FxHashSet<_>>()
            .len();

        let active_prices = views.iter().filter(|v| v.active).map(|v| v.otc_price);
        let min_otc_price = active_prices.clone().min_by(|a, b| a.total_cmp(b));
        let max_otc_price = active_prices.max_by(|a, b| a.total_cmp(b));

        Self {
            total_listings,
            active_listings,
            frozen_listings: total_listings - active_listings,
            total_available,
            unique_sellers,
            min_otc_price,
            max_otc_price,
            fee_rate_pct: config.map(|c| c.fee_pct as f64 / 100.0),
        }
    }
}
