//! HTTP route handlers for the probe service.
//!
//! The probe surface is a single route. Responses carry `Cache-Control:
//! no-store` so intermediaries never replay a stale verdict to a poller, and
//! request tracing is enabled via middleware that assigns a unique request ID
//! to each incoming request.

pub mod health;

use axum::{middleware, routing::get, Router};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::middleware::request_id_layer;
use crate::state::AppState;

/// Cache-Control for probe responses.
const CACHE_CONTROL_HEALTH: &str = "no-store";

/// Creates the Axum router with all routes and response headers.
pub fn create_router(state: AppState) -> Router {
    // Health probe - never cached, pollers must always see a fresh verdict
    let health_routes = Router::new()
        .route("/healthz", get(health::healthz))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_HEALTH),
        ));

    Router::new()
        .merge(health_routes)
        .with_state(state)
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
