//! Chain RPC table reader
//!
//! Reads marketplace and auction tables through the node's
//! `/v1/chain/get_table_rows` endpoint and the head block time through
//! `/v1/chain/get_info`.

use crate::error::{OtcError, Result};
use crate::types::ChainInfo;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// A single `get_table_rows` query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TableQuery {
    pub code: String,
    pub table: String,
    pub scope: String,
    pub limit: u32,
}

impl TableQuery {
    pub fn new(code: &str, table: &str, scope: &str, limit: u32) -> Self {
        Self {
            code: code.to_string(),
            table: table.to_string(),
            scope: scope.to_string(),
            limit,
        }
    }
}

/// Source of raw table rows and chain time.
///
/// Rows come back as JSON values and are decoded by the caller so the trait
/// stays object safe.
#[async_trait]
pub trait TableSource: Send + Sync {
    /// Human-readable source name for logs
    fn source_name(&self) -> &str;

    /// Fetch rows for a table query, in table order
    async fn table_rows(&self, query: &TableQuery) -> Result<Vec<Value>>;

    /// Head block time as Unix epoch seconds
    async fn chain_time(&self) -> Result<i64>;
}

#[derive(Serialize)]
struct GetTableRowsRequest<'a> {
    code: &'a str,
    table: &'a str,
    scope: &'a str,
    json: bool,
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct GetTableRowsResponse {
    #[serde(default)]
    rows: Vec<Value>,
}

/// HTTP client for an Antelope-style chain node
pub struct ChainRpcClient {
    client: Client,
    base_url: String,
}

impl ChainRpcClient {
    /// Create a client against `base_url` (e.g. `https://mainnet.telos.net`)
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("cloak-otc/0.1")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);

        let response = self.client.post(&url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OtcError::Rpc { status, body });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| OtcError::Decode {
            what: format!("response from {}", path),
            source,
        })
    }

    /// Fetch `/v1/chain/get_info`
    pub async fn get_info(&self) -> Result<ChainInfo> {
        let value = self
            .post_json("/v1/chain/get_info", &serde_json::json!({}))
            .await?;
        serde_json::from_value(value).map_err(|source| OtcError::Decode {
            what: "chain info".to_string(),
            source,
        })
    }
}

#[async_trait]
impl TableSource for ChainRpcClient {
    fn source_name(&self) -> &str {
        &self.base_url
    }

    async fn table_rows(&self, query: &TableQuery) -> Result<Vec<Value>> {
        debug!(
            "get_table_rows code={} table={} scope={} limit={}",
            query.code, query.table, query.scope, query.limit
        );

        let request = GetTableRowsRequest {
            code: &query.code,
            table: &query.table,
            scope: &query.scope,
            json: true,
            limit: query.limit,
        };

        let value = self.post_json("/v1/chain/get_table_rows", &request).await?;
        let response: GetTableRowsResponse =
            serde_json::from_value(value).map_err(|source| OtcError::Decode {
                what: format!("{} rows", query.table),
                source,
            })?;

        Ok(response.rows)
    }

    async fn chain_time(&self) -> Result<i64> {
        self.get_info().await?.head_block_epoch()
    }
}
