//! Fixed-precision token amounts.
//!
//! Chain tables render token amounts as `"1000.0000 CLOAK"`: an integer raw
//! amount scaled by `10^precision` plus a symbol code. All settlement math
//! (quotes, memos) runs on the raw integer; conversion to `f64` happens only
//! for display and for the pricing engine's float projection.
//!
//! # Usage
//!
//! ```rust
//! use cloak_otc_core::utils::asset::Asset;
//!
//! let qty: Asset = "1000.5000 CLOAK".parse().unwrap();
//! assert_eq!(qty.amount(), 10_005_000);
//! assert_eq!(qty.to_string(), "1000.5000 CLOAK");
//! assert_eq!(qty.amount_string(), "1000.5000");
//! ```

use crate::constants::{CLOAK_SYMBOL, TLOS_SYMBOL, TOKEN_PRECISION};
use crate::error::{OtcError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Longest symbol code the chain accepts
const MAX_SYMBOL_LEN: usize = 7;
/// Highest precision we accept (10^18 still fits in i64)
const MAX_PRECISION: u8 = 18;

/// Token symbol: code plus decimal precision
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    code: String,
    precision: u8,
}

impl Symbol {
    pub fn new(code: &str, precision: u8) -> Result<Self> {
        if code.is_empty() || code.len() > MAX_SYMBOL_LEN {
            return Err(OtcError::invalid_asset(code, "symbol must be 1-7 characters"));
        }
        if !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(OtcError::invalid_asset(code, "symbol must be uppercase A-Z"));
        }
        if precision > MAX_PRECISION {
            return Err(OtcError::invalid_asset(code, "precision too large"));
        }
        Ok(Self {
            code: code.to_string(),
            precision,
        })
    }

    pub fn cloak() -> Self {
        Self {
            code: CLOAK_SYMBOL.to_string(),
            precision: TOKEN_PRECISION,
        }
    }

    pub fn tlos() -> Self {
        Self {
            code: TLOS_SYMBOL.to_string(),
            precision: TOKEN_PRECISION,
        }
    }

    #[inline]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[inline]
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// 10^precision
    #[inline]
    pub fn scale(&self) -> i64 {
        10_i64.pow(self.precision as u32)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision, self.code)
    }
}

/// Token amount stored as a raw integer for precision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Asset {
    /// Raw amount in 10^-precision units
    amount: i64,
    symbol: Symbol,
}

impl Asset {
    #[inline]
    pub fn new(amount: i64, symbol: Symbol) -> Self {
        Self { amount, symbol }
    }

    #[inline]
    pub fn zero(symbol: Symbol) -> Self {
        Self { amount: 0, symbol }
    }

    /// TLOS from raw units
    #[inline]
    pub fn tlos(amount: i64) -> Self {
        Self::new(amount, Symbol::tlos())
    }

    /// CLOAK from raw units
    #[inline]
    pub fn cloak(amount: i64) -> Self {
        Self::new(amount, Symbol::cloak())
    }

    /// Create from a float value (rounds to nearest raw unit)
    pub fn from_f64(value: f64, symbol: Symbol) -> Self {
        let amount = (value * symbol.scale() as f64).round() as i64;
        Self { amount, symbol }
    }

    /// Create from a float value, rounding up to the next raw unit
    pub fn from_f64_ceil(value: f64, symbol: Symbol) -> Self {
        let amount = (value * symbol.scale() as f64).ceil() as i64;
        Self { amount, symbol }
    }

    /// Parse a bare decimal (`"0.0500"`) into an asset of the given symbol.
    ///
    /// Fails if the input carries more decimals than the symbol allows.
    pub fn from_decimal_str(input: &str, symbol: Symbol) -> Result<Self> {
        let amount = parse_decimal_raw(input, symbol.precision)?;
        Ok(Self { amount, symbol })
    }

    #[inline]
    pub const fn amount(&self) -> i64 {
        self.amount
    }

    #[inline]
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.amount == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.amount > 0
    }

    /// Value as float (for display and float pricing)
    #[inline]
    pub fn as_f64(&self) -> f64 {
        self.amount as f64 / self.symbol.scale() as f64
    }

    /// Same symbol, different raw amount
    #[inline]
    pub fn with_amount(&self, amount: i64) -> Self {
        Self {
            amount,
            symbol: self.symbol.clone(),
        }
    }

    /// Amount without the symbol, padded to full precision (`"0.0500"`)
    pub fn amount_string(&self) -> String {
        let precision = self.symbol.precision as usize;
        let scale = self.symbol.scale().unsigned_abs();
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        if precision == 0 {
            return format!("{}{}", sign, abs);
        }
        format!(
            "{}{}.{:0width$}",
            sign,
            abs / scale,
            abs % scale,
            width = precision
        )
    }
}

impl PartialOrd for Asset {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.symbol != other.symbol {
            return None;
        }
        Some(self.amount.cmp(&other.amount))
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount_string(), self.symbol.code)
    }
}

impl FromStr for Asset {
    type Err = OtcError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let (amount_str, code) = trimmed
            .split_once(' ')
            .ok_or_else(|| OtcError::invalid_asset(s, "expected '<amount> <SYMBOL>'"))?;
        let amount_str = amount_str.trim();

        // Precision is encoded by the number of decimals in the rendered amount
        let precision = match amount_str.split_once('.') {
            Some((_, frac)) => frac.len(),
            None => 0,
        };
        if precision > MAX_PRECISION as usize {
            return Err(OtcError::invalid_asset(s, "precision too large"));
        }

        let symbol = Symbol::new(code.trim(), precision as u8)?;
        let amount = parse_decimal_raw(amount_str, symbol.precision)?;
        Ok(Self { amount, symbol })
    }
}

impl TryFrom<String> for Asset {
    type Error = OtcError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Asset> for String {
    fn from(asset: Asset) -> Self {
        asset.to_string()
    }
}

/// Parse a decimal string into raw units at `precision`.
///
/// Accepts `"12"`, `"12.5"`, `".5"` and `"12."`; rejects more than
/// `precision` decimals, stray characters and overflow.
pub fn parse_decimal_raw(input: &str, precision: u8) -> Result<i64> {
    let (negative, body) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    if body.is_empty() || body == "." {
        return Err(OtcError::invalid_asset(input, "amount is empty"));
    }
    if !body.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(OtcError::invalid_asset(input, "amount contains invalid characters"));
    }

    let (int_str, frac_str) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body, ""),
    };
    if frac_str.contains('.') {
        return Err(OtcError::invalid_asset(input, "amount has more than one '.'"));
    }
    if frac_str.len() > precision as usize {
        return Err(OtcError::invalid_asset(
            input,
            format!("precision exceeds {} decimals", precision),
        ));
    }

    let overflow = || OtcError::invalid_asset(input, "amount out of range");
    let int_part: i64 = if int_str.is_empty() {
        0
    } else {
        int_str.parse().map_err(|_| overflow())?
    };
    let frac_part: i64 = if frac_str.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac_str, width = precision as usize);
        padded.parse().map_err(|_| overflow())?
    };

    let scale = 10_i64.pow(precision as u32);
    let raw = int_part
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_part))
        .ok_or_else(overflow)?;

    Ok(if negative { -raw } else { raw })
}
