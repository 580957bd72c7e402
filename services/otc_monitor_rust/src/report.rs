//! Plain-text market report built from the latest poller snapshots

use cloak_otc_core::market::{by_seller, enrich, ListingSort, ListingView, MarketStats};
use cloak_otc_core::polling::{AuctionState, ListingsState};
use cloak_otc_core::utils::format::{
    format_countdown, format_fee_rate, format_price, format_round, format_thousands,
};

pub fn auction_line(auction: &AuctionState) -> String {
    if auction.loading {
        return "Auction: loading".to_string();
    }
    let rounds = auction
        .config
        .as_ref()
        .map(|c| c.number_of_rounds)
        .unwrap_or(0);
    let mut line = format!(
        "Auction round {} | reference {} TLOS | next round in {} | last round {} TLOS for {} CLOAK | total {} TLOS",
        format_round(auction.current_round, rounds),
        format_price(auction.auction_price),
        format_countdown(auction.time_to_next_round),
        format_thousands(auction.round_contributed),
        format_thousands(auction.tokens_per_round),
        format_thousands(auction.total_contributed),
    );
    if let Some(err) = &auction.error {
        line.push_str(&format!(" (stale: {})", err));
    }
    line
}

/// Price range covers active listings only; `N/A` when none are tradeable
pub fn stats_line(stats: &MarketStats) -> String {
    let range = match (stats.min_otc_price, stats.max_otc_price) {
        (Some(min), Some(max)) => format!("{} - {} TLOS", format_price(min), format_price(max)),
        _ => "N/A".to_string(),
    };
    let fee = stats
        .fee_rate_pct
        .map(format_fee_rate)
        .unwrap_or_else(|| "-".to_string());
    format!(
        "Listings {} ({} active, {} frozen) | {} CLOAK available | {} sellers | price {} | fee {}",
        stats.total_listings,
        stats.active_listings,
        stats.frozen_listings,
        format_thousands(stats.total_available),
        stats.unique_sellers,
        range,
        fee,
    )
}

pub fn listing_line(view: &ListingView) -> String {
    format!(
        "#{} {} {} CLOAK @ {} TLOS (floor {}, +{}%) {}",
        view.listing.id,
        view.listing.seller,
        format_thousands(view.available),
        format_price(view.otc_price),
        format_price(view.floor_price),
        view.listing.premium_pct,
        view.status_label(),
    )
}

/// Full report: auction, stats, then listings in `sort` order.
///
/// With `seller` set only that account's listings are shown, stats still
/// cover the whole market.
pub fn build_report(
    listings: &ListingsState,
    auction: &AuctionState,
    sort: ListingSort,
    seller: Option<&str>,
) -> Vec<String> {
    let mut lines = vec![auction_line(auction)];

    if listings.loading {
        lines.push("Listings: loading".to_string());
        return lines;
    }

    let mut views = enrich(&listings.listings, auction.auction_price);
    sort.apply(&mut views);

    let stats = MarketStats::compute(&views, listings.config.as_ref());
    lines.push(stats_line(&stats));

    if listings.config.map(|c| c.paused).unwrap_or(false) {
        lines.push("Marketplace is paused".to_string());
    }
    if let Some(err) = &listings.error {
        lines.push(format!("Listings stale: {}", err));
    }

    match seller {
        Some(seller) => {
            let own = by_seller(&views, seller);
            lines.push(format!("Listings by {}: {}", seller, own.len()));
            lines.extend(own.into_iter().map(listing_line));
        }
        None => lines.extend(views.iter().map(listing_line)),
    }

    lines
}
