//! Error type shared by the chain reader, quotes, memos and wallet plumbing.

use thiserror::Error;

/// Errors surfaced by the OTC client library
#[derive(Debug, Error)]
pub enum OtcError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC error {status}: {body}")]
    Rpc { status: u16, body: String },

    #[error("failed to decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no {0} found")]
    Missing(&'static str),

    #[error("invalid asset '{input}': {reason}")]
    InvalidAsset { input: String, reason: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid memo: {0}")]
    InvalidMemo(String),

    #[error("listing {0} is frozen: otc price is below seller minimum")]
    ListingFrozen(u64),

    #[error("otc price is zero, cannot trade")]
    ZeroPrice,

    #[error("{0}")]
    AmountTooSmall(&'static str),

    #[error("wallet not connected")]
    NotConnected,

    #[error("transaction failed: {0}")]
    Transaction(String),

    #[error("wallet error: {0}")]
    Wallet(String),
}

impl OtcError {
    pub(crate) fn invalid_asset(input: &str, reason: impl Into<String>) -> Self {
        OtcError::InvalidAsset {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OtcError>;
