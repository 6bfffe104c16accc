//! Request-scoped error taxonomy for the health check pipeline.
//!
//! Every failure category maps to HTTP 503 with a human-readable message in
//! the JSON body. Failures are logged server-side at the response boundary
//! and never retried; the external poller retries at its own cadence.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::routes::health::HealthResponse;

/// Error surfaced by a backing database operation.
///
/// A plain message wrapper so test doubles can fabricate failures without
/// depending on driver internals.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct DbError(String);

impl DbError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        Self(err.to_string())
    }
}

/// A failed health check, tagged by pipeline stage.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// Liveness ping failed; the database is unreachable.
    #[error("{0}")]
    Ping(DbError),

    /// The schema catalog lookup for a table could not be executed.
    #[error("table check failed: {0}")]
    TableLookup(DbError),

    /// The schema catalog reported zero rows for a configured table.
    #[error("table '{0}' not found")]
    TableNotFound(String),

    /// A configured query was empty after trimming.
    #[error("empty query")]
    EmptyQuery,

    /// A configured query failed to execute or its first cell to decode.
    #[error("query failed: {0}")]
    Query(DbError),
}

impl CheckError {
    /// Pipeline stage that produced the failure, for log correlation.
    pub fn stage(&self) -> &'static str {
        match self {
            CheckError::Ping(_) => "ping",
            CheckError::TableLookup(_) | CheckError::TableNotFound(_) => "table",
            CheckError::EmptyQuery | CheckError::Query(_) => "query",
        }
    }
}

impl IntoResponse for CheckError {
    fn into_response(self) -> Response {
        tracing::warn!(stage = self.stage(), error = %self, "Health check failed");

        let body = HealthResponse::unhealthy(self.to_string());
        (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
    }
}
