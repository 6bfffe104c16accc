//! Health check endpoint for container orchestration.
//!
//! `GET /healthz` runs the configured check pipeline against the database and
//! reports the aggregate verdict: 200 with `{"status":"ok"}` when every check
//! passes, 503 with `{"status":"unhealthy","error":...}` on the first failure.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::instrument;

use crate::checks::ScalarValue;
use crate::error::CheckError;
use crate::state::AppState;

/// Result envelope for a single health check run.
///
/// `error` and `results` are omitted from the JSON entirely when absent.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<ScalarValue>>,
}

impl HealthResponse {
    pub fn ok(results: Option<Vec<ScalarValue>>) -> Self {
        Self {
            status: "ok",
            error: None,
            results,
        }
    }

    pub fn unhealthy(error: String) -> Self {
        Self {
            status: "unhealthy",
            error: Some(error),
            results: None,
        }
    }
}

/// Health check handler.
///
/// Failures map to 503 through [`CheckError`]. Query results are collected
/// either way but serialized only when the expose flag is set, so the default
/// response discloses no query output.
#[instrument(name = "health::healthz", skip(state))]
pub async fn healthz(State(state): State<AppState>) -> Result<Json<HealthResponse>, CheckError> {
    let results = state.checker.run().await?;
    tracing::info!("Health check OK");

    let results = state.config.checks.expose_results.then_some(results);
    Ok(Json(HealthResponse::ok(results)))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::checks::{Database, HealthChecker, ScalarValue};
    use crate::config::{AppConfig, ChecksConfig};
    use crate::error::DbError;
    use crate::routes::create_router;
    use crate::state::AppState;

    /// Database double scripted per test.
    #[derive(Default)]
    struct ScriptedDb {
        ping_error: Option<String>,
        existing_tables: Vec<String>,
        scalars: HashMap<String, ScalarValue>,
    }

    #[async_trait]
    impl Database for ScriptedDb {
        async fn ping(&self) -> Result<(), DbError> {
            match &self.ping_error {
                Some(message) => Err(DbError::new(message.clone())),
                None => Ok(()),
            }
        }

        async fn table_count(&self, table: &str) -> Result<i64, DbError> {
            Ok(i64::from(self.existing_tables.iter().any(|t| t == table)))
        }

        async fn fetch_scalar(&self, query: &str) -> Result<ScalarValue, DbError> {
            self.scalars
                .get(query)
                .cloned()
                .ok_or_else(|| DbError::new(format!("unexpected query: {query}")))
        }
    }

    fn app(db: ScriptedDb, checks: ChecksConfig) -> axum::Router {
        let mut config = AppConfig::from_lookup(|_| None).unwrap();
        config.checks = checks.clone();
        let checker = HealthChecker::new(Arc::new(db), &checks);
        create_router(AppState::new(config, checker))
    }

    async fn probe(app: axum::Router) -> (StatusCode, String) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/healthz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn reachable_database_with_no_checks_is_ok() {
        let (status, body) = probe(app(ScriptedDb::default(), ChecksConfig::default())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            serde_json::from_str::<Value>(&body).unwrap(),
            json!({"status": "ok"})
        );
    }

    #[tokio::test]
    async fn unreachable_database_is_unhealthy() {
        let db = ScriptedDb {
            ping_error: Some("connection refused".into()),
            ..ScriptedDb::default()
        };
        let (status, body) = probe(app(db, ChecksConfig::default())).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            serde_json::from_str::<Value>(&body).unwrap(),
            json!({"status": "unhealthy", "error": "connection refused"})
        );
    }

    #[tokio::test]
    async fn existing_table_is_ok() {
        let db = ScriptedDb {
            existing_tables: vec!["users".into()],
            ..ScriptedDb::default()
        };
        let checks = ChecksConfig {
            tables: vec!["users".into()],
            ..ChecksConfig::default()
        };
        let (status, body) = probe(app(db, checks)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            serde_json::from_str::<Value>(&body).unwrap(),
            json!({"status": "ok"})
        );
    }

    #[tokio::test]
    async fn missing_table_is_unhealthy() {
        let checks = ChecksConfig {
            tables: vec!["ghost".into()],
            ..ChecksConfig::default()
        };
        let (status, body) = probe(app(ScriptedDb::default(), checks)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            serde_json::from_str::<Value>(&body).unwrap(),
            json!({"status": "unhealthy", "error": "table 'ghost' not found"})
        );
    }

    #[tokio::test]
    async fn exposed_results_round_trip_in_configured_order() {
        let db = ScriptedDb {
            scalars: HashMap::from([
                ("SELECT 1".to_string(), ScalarValue::Int(1)),
                (
                    "SELECT version()".to_string(),
                    ScalarValue::Text("PostgreSQL 16.2".into()),
                ),
            ]),
            ..ScriptedDb::default()
        };
        let checks = ChecksConfig {
            queries: vec!["SELECT 1".into(), "SELECT version()".into()],
            expose_results: true,
            ..ChecksConfig::default()
        };
        let (status, body) = probe(app(db, checks)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            serde_json::from_str::<Value>(&body).unwrap(),
            json!({"status": "ok", "results": [1, "PostgreSQL 16.2"]})
        );
    }

    #[tokio::test]
    async fn results_never_serialize_when_flag_is_off() {
        let db = ScriptedDb {
            scalars: HashMap::from([(
                "SELECT secret".to_string(),
                ScalarValue::Text("sentinel-8f2c".into()),
            )]),
            ..ScriptedDb::default()
        };
        let checks = ChecksConfig {
            queries: vec!["SELECT secret".into()],
            expose_results: false,
            ..ChecksConfig::default()
        };
        let (status, body) = probe(app(db, checks)).await;

        assert_eq!(status, StatusCode::OK);
        let lowered = body.to_lowercase();
        assert!(!lowered.contains("results"), "body: {body}");
        assert!(!lowered.contains("sentinel"), "body: {body}");
    }

    #[tokio::test]
    async fn empty_query_is_reported_not_skipped() {
        let checks = ChecksConfig {
            queries: vec!["  ".into()],
            ..ChecksConfig::default()
        };
        let (status, body) = probe(app(ScriptedDb::default(), checks)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            serde_json::from_str::<Value>(&body).unwrap(),
            json!({"status": "unhealthy", "error": "empty query"})
        );
    }
}
