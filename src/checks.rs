//! The health check pipeline.
//!
//! A check run is a bounded, strictly ordered sequence: liveness ping, then
//! table-existence lookups, then custom scalar queries. The first failure
//! aborts the run; partial query results are discarded, never reported.
//!
//! Database access goes through the [`Database`] trait so the pipeline can be
//! exercised against a test double without a live server.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::ChecksConfig;
use crate::error::{CheckError, DbError};

/// Minimal database surface the pipeline needs.
#[async_trait]
pub trait Database: Send + Sync {
    /// Lightweight round-trip confirming the connection is reachable.
    async fn ping(&self) -> Result<(), DbError>;

    /// Number of rows in the schema catalog matching `table` by name.
    async fn table_count(&self, table: &str) -> Result<i64, DbError>;

    /// Execute `query` and decode the first column of the first row.
    async fn fetch_scalar(&self, query: &str) -> Result<ScalarValue, DbError>;
}

/// A scalar cell decoded at the driver boundary.
///
/// Covers the JSON-representable kinds; serializes untagged so the response
/// carries the bare value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Runs the configured check sequence against a database.
#[derive(Clone)]
pub struct HealthChecker {
    db: Arc<dyn Database>,
    tables: Vec<String>,
    queries: Vec<String>,
}

impl HealthChecker {
    pub fn new(db: Arc<dyn Database>, checks: &ChecksConfig) -> Self {
        Self {
            db,
            tables: checks.tables.clone(),
            queries: checks.queries.clone(),
        }
    }

    /// Run the full pipeline, returning collected query results in configured
    /// order, or the first failure.
    pub async fn run(&self) -> Result<Vec<ScalarValue>, CheckError> {
        self.db.ping().await.map_err(CheckError::Ping)?;

        for table in &self.tables {
            let count = self
                .db
                .table_count(table)
                .await
                .map_err(CheckError::TableLookup)?;
            if count == 0 {
                return Err(CheckError::TableNotFound(table.clone()));
            }
        }

        let mut results = Vec::with_capacity(self.queries.len());
        for query in &self.queries {
            let query = query.trim();
            if query.is_empty() {
                return Err(CheckError::EmptyQuery);
            }
            let value = self
                .db
                .fetch_scalar(query)
                .await
                .map_err(CheckError::Query)?;
            results.push(value);
        }

        Ok(results)
    }
}
