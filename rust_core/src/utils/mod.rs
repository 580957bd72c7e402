//! Utility modules

pub mod asset;
pub mod format;

pub use asset::{parse_decimal_raw, Asset, Symbol};
