//! In-memory table source for unit tests.

use crate::clients::chain_rpc::{TableQuery, TableSource};
use crate::error::{OtcError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct Inner {
    tables: HashMap<(String, String, String), Vec<Value>>,
    chain_time: Option<i64>,
    failure: Option<String>,
    queries: Vec<TableQuery>,
}

/// Table source backed by a map of `(code, table, scope)` to rows
#[derive(Clone, Default)]
pub(crate) struct FakeTables {
    inner: Arc<Mutex<Inner>>,
}

impl FakeTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, code: &str, table: &str, scope: &str, rows: Vec<Value>) {
        self.inner.lock().tables.insert(
            (code.to_string(), table.to_string(), scope.to_string()),
            rows,
        );
    }

    pub fn set_chain_time(&self, now: Option<i64>) {
        self.inner.lock().chain_time = now;
    }

    /// Make every read fail with an RPC error until cleared
    pub fn fail_with(&self, message: Option<&str>) {
        self.inner.lock().failure = message.map(str::to_string);
    }

    pub fn last_query(&self) -> Option<TableQuery> {
        self.inner.lock().queries.last().cloned()
    }

    pub fn query_count(&self) -> usize {
        self.inner.lock().queries.len()
    }
}

#[async_trait]
impl TableSource for FakeTables {
    fn source_name(&self) -> &str {
        "fake"
    }

    async fn table_rows(&self, query: &TableQuery) -> Result<Vec<Value>> {
        let mut inner = self.inner.lock();
        inner.queries.push(query.clone());
        if let Some(message) = &inner.failure {
            return Err(OtcError::Rpc {
                status: 500,
                body: message.clone(),
            });
        }
        let key = (query.code.clone(), query.table.clone(), query.scope.clone());
        let rows = inner.tables.get(&key).cloned().unwrap_or_default();
        Ok(rows.into_iter().take(query.limit as usize).collect())
    }

    async fn chain_time(&self) -> Result<i64> {
        let inner = self.inner.lock();
        inner.chain_time.ok_or(OtcError::Rpc {
            status: 503,
            body: "get_info unavailable".to_string(),
        })
    }
}
