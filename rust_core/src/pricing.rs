//! Pricing engine: auction reference price, OTC price, activity and round clock.
//!
//! Every value here is a pure function of the latest chain snapshot. Nothing
//! is cached: callers recompute on each read so a listing's active/frozen
//! state can never go stale relative to the auction data it was derived from.
//!
//! Two projections are provided:
//! - float (`compute_*`): what the marketplace displays
//! - raw (`*_raw`): integer arithmetic matching what the contract settles at

use crate::constants::PRICE_SCALE;
use crate::types::AuctionConfig;
use crate::utils::asset::Asset;
use chrono::Utc;

/// Reference price of the last completed round: `contributed / tokens_per_round`.
///
/// Zero allocation yields a price of zero, which surfaces downstream as
/// frozen listings rather than an error.
#[inline]
pub fn compute_reference_price(total_contributed: f64, tokens_per_round: f64) -> f64 {
    if tokens_per_round == 0.0 {
        return 0.0;
    }
    total_contributed / tokens_per_round
}

/// Seller's OTC price: reference price plus `premium_pct` percent
#[inline]
pub fn compute_otc_price(reference_price: f64, premium_pct: u16) -> f64 {
    reference_price * (100.0 + premium_pct as f64) / 100.0
}

/// A listing is tradeable iff its OTC price is positive and at or above the floor.
///
/// `(0, 0)` is inactive: the positivity guard keeps listings frozen until
/// auction data exists.
#[inline]
pub fn is_listing_active(otc_price: f64, floor_price: f64) -> bool {
    otc_price >= floor_price && otc_price > 0.0
}

/// Zero-based round index at `now`, or `-1` before the auction starts.
pub fn compute_current_round_at(now: i64, start_time: i64, round_duration_sec: i64) -> i64 {
    if now < start_time {
        return -1;
    }
    if round_duration_sec <= 0 {
        return 0;
    }
    (now - start_time) / round_duration_sec
}

/// Seconds until the next round boundary at `now`.
///
/// Before the start this is the time until round 0 opens.
pub fn compute_time_to_next_round_at(now: i64, start_time: i64, round_duration_sec: i64) -> i64 {
    if now < start_time {
        return start_time - now;
    }
    if round_duration_sec <= 0 {
        return 0;
    }
    let into_round = (now - start_time) % round_duration_sec;
    round_duration_sec - into_round
}

/// [`compute_current_round_at`] against the local wall clock
pub fn compute_current_round(start_time: i64, round_duration_sec: i64) -> i64 {
    compute_current_round_at(Utc::now().timestamp(), start_time, round_duration_sec)
}

/// [`compute_time_to_next_round_at`] against the local wall clock
pub fn compute_time_to_next_round(start_time: i64, round_duration_sec: i64) -> i64 {
    compute_time_to_next_round_at(Utc::now().timestamp(), start_time, round_duration_sec)
}

/// Round whose contributions price the market: the one before `current_round`
pub fn last_completed_round(current_round: i64) -> Option<u32> {
    if current_round > 0 {
        u32::try_from(current_round - 1).ok()
    } else {
        None
    }
}

/// Round the contract settles against at `now`.
///
/// Same as [`last_completed_round`] but clamped to the final round once the
/// auction schedule has run out.
pub fn settled_round_at(now: i64, config: &AuctionConfig) -> Option<u32> {
    let current = compute_current_round_at(
        now,
        config.start_block_time as i64,
        config.round_duration_sec as i64,
    );
    let last = last_completed_round(current)?;
    if config.number_of_rounds == 0 {
        return None;
    }
    Some(last.min(config.number_of_rounds as u32 - 1))
}

/// Contract-exact reference price in raw TLOS: `total * 10^4 / tokens`.
///
/// Zero contributions or a zero allocation give a zero price.
pub fn reference_price_raw(total_contributed_raw: i64, tokens_per_round_raw: i64) -> Asset {
    if total_contributed_raw <= 0 || tokens_per_round_raw <= 0 {
        return Asset::tlos(0);
    }
    let price = total_contributed_raw as i128 * PRICE_SCALE as i128 / tokens_per_round_raw as i128;
    Asset::tlos(clamp_i128(price))
}

/// Contract-exact OTC price in raw TLOS (truncating division)
pub fn otc_price_raw(reference_price: &Asset, premium_pct: u16) -> Asset {
    if reference_price.is_zero() {
        return reference_price.with_amount(0);
    }
    let price = reference_price.amount() as i128 * (100 + premium_pct as i128) / 100;
    reference_price.with_amount(clamp_i128(price))
}

/// Contract-exact activity check on raw prices
pub fn is_listing_active_raw(otc_price: &Asset, floor_price: &Asset) -> bool {
    otc_price.amount() >= floor_price.amount() && otc_price.is_positive()
}

fn clamp_i128(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExtendedAsset;

    const EPS: f64 = 1e-12;

    fn auction_config(start: u32, duration: u32, rounds: u16) -> AuctionConfig {
        AuctionConfig {
            start_block_time: start,
            round_duration_sec: duration,
            number_of_rounds: rounds,
            tokens_per_round: Asset::cloak(10_000 * 10_000),
            token_contract: "thezeostoken".to_string(),
            min_contribution: ExtendedAsset {
                quantity: Asset::tlos(10_000),
                contract: "eosio.token".to_string(),
            },
            stake_rate: 0,
        }
    }

    #[test]
    fn test_reference_price() {
        assert!((compute_reference_price(1000.0, 10_000.0) - 0.1).abs() < EPS);
        assert_eq!(compute_reference_price(1000.0, 0.0), 0.0);
        assert_eq!(compute_reference_price(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_otc_price() {
        assert!((compute_otc_price(0.05, 10) - 0.055).abs() < EPS);
        assert_eq!(compute_otc_price(0.1, 0), 0.1);
        assert_eq!(compute_otc_price(0.0, 500), 0.0);
        assert!((compute_otc_price(0.02, 10_000) - 2.02).abs() < EPS);
    }

    #[test]
    fn test_activity() {
        assert!(!is_listing_active(0.0, 0.0));
        assert!(!is_listing_active(0.055, 0.06));
        assert!(is_listing_active(0.06, 0.06));
        assert!(is_listing_active(0.07, 0.0));
    }

    #[test]
    fn test_round_clock() {
        let start = 1_000;
        assert_eq!(compute_current_round_at(999, start, 100), -1);
        assert_eq!(compute_time_to_next_round_at(990, start, 100), 10);
        assert_eq!(compute_current_round_at(1_000, start, 100), 0);
        assert_eq!(compute_time_to_next_round_at(1_000, start, 100), 100);
        assert_eq!(compute_current_round_at(1_250, start, 100), 2);
        assert_eq!(compute_time_to_next_round_at(1_250, start, 100), 50);
        assert_eq!(compute_current_round_at(1_299, start, 100), 2);
        assert_eq!(compute_time_to_next_round_at(1_299, start, 100), 1);
    }

    #[test]
    fn test_zero_duration_guard() {
        assert_eq!(compute_current_round_at(5_000, 1_000, 0), 0);
        assert_eq!(compute_time_to_next_round_at(5_000, 1_000, 0), 0);
    }

    #[test]
    fn test_wall_clock_round() {
        let duration = 3_600;
        let start = Utc::now().timestamp() - 10 * duration - 5;
        let round = compute_current_round(start, duration);
        assert!(round >= 10);
        let ttn = compute_time_to_next_round(start, duration);
        assert!((0..=duration).contains(&ttn));

        // A start in the future counts down to round 0
        let future = Utc::now().timestamp() + 600;
        assert_eq!(compute_current_round(future, duration), -1);
        assert!(compute_time_to_next_round(future, duration) > 0);
    }

    #[test]
    fn test_last_completed_round() {
        assert_eq!(last_completed_round(-1), None);
        assert_eq!(last_completed_round(0), None);
        assert_eq!(last_completed_round(1), Some(0));
        assert_eq!(last_completed_round(7), Some(6));
    }

    #[test]
    fn test_settled_round_clamps_to_schedule() {
        let cfg = auction_config(1_000, 100, 3);
        assert_eq!(settled_round_at(500, &cfg), None);
        assert_eq!(settled_round_at(1_050, &cfg), None);
        assert_eq!(settled_round_at(1_150, &cfg), Some(0));
        assert_eq!(settled_round_at(1_350, &cfg), Some(2));
        // Round 9 would be "last completed" but only 3 rounds exist
        assert_eq!(settled_round_at(2_000, &cfg), Some(2));
    }

    #[test]
    fn test_mainnet_schedule() {
        use crate::constants::{NUMBER_OF_ROUNDS, ROUND_DURATION_SEC, TOKENS_PER_ROUND};

        let start = 1_700_000_000;
        let now = start + 3 * ROUND_DURATION_SEC + 3_600;
        assert_eq!(compute_current_round_at(now, start, ROUND_DURATION_SEC), 3);
        assert_eq!(
            compute_time_to_next_round_at(now, start, ROUND_DURATION_SEC),
            ROUND_DURATION_SEC - 3_600
        );

        // 81,900.0819 TLOS into a full round prices CLOAK at 0.0500
        assert_eq!(reference_price_raw(819_000_819, TOKENS_PER_ROUND), Asset::tlos(500));

        let cfg = auction_config(start as u32, ROUND_DURATION_SEC as u32, NUMBER_OF_ROUNDS);
        let after_end = start + 100 * ROUND_DURATION_SEC;
        assert_eq!(settled_round_at(after_end, &cfg), Some(NUMBER_OF_ROUNDS as u32 - 1));
    }

    #[test]
    fn test_raw_prices_match_contract() {
        // 1000 TLOS over 10000 CLOAK -> 0.1000 TLOS
        let reference = reference_price_raw(1_000 * 10_000, 10_000 * 10_000);
        assert_eq!(reference, Asset::tlos(1_000));

        // 0.0500 @ 10% -> 0.0550
        assert_eq!(otc_price_raw(&Asset::tlos(500), 10), Asset::tlos(550));
        // truncation: 0.0333 @ 10% = 0.03663 -> 0.0366
        assert_eq!(otc_price_raw(&Asset::tlos(333), 10), Asset::tlos(366));

        assert_eq!(reference_price_raw(1_000, 0), Asset::tlos(0));
        assert_eq!(reference_price_raw(0, 1_000), Asset::tlos(0));
        assert_eq!(otc_price_raw(&Asset::tlos(0), 50), Asset::tlos(0));

        assert!(!is_listing_active_raw(&Asset::tlos(0), &Asset::tlos(0)));
        assert!(!is_listing_active_raw(&Asset::tlos(550), &Asset::tlos(600)));
        assert!(is_listing_active_raw(&Asset::tlos(600), &Asset::tlos(600)));
    }
}
