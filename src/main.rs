//! pg-healthy: a PostgreSQL liveness/readiness probe service.
//!
//! This is the application entry point. It loads configuration from the
//! environment, initializes tracing, constructs the lazy connection pool,
//! sets up the Axum router, and starts the HTTP server. A configuration or
//! bind failure exits non-zero; there is no degraded mode for a probe that
//! cannot reach its own database or port.

mod checks;
mod config;
mod db;
mod error;
mod http;
mod middleware;
mod routes;
mod state;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checks::HealthChecker;
use config::{AppConfig, DEFAULT_LOG_FILTER};
use db::PgDatabase;
use routes::create_router;
use state::AppState;

/// pg-healthy: a liveness/readiness probe for PostgreSQL
#[derive(Parser, Debug)]
#[command(name = "pg-healthy", version, about)]
struct Args {
    /// Log level filter (e.g., "pg_healthy=debug")
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration from the environment
    let config = AppConfig::from_env()?;

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(
        host = %config.database.host,
        port = %config.database.port,
        database = %config.database.database,
        "Loaded configuration"
    );
    tracing::info!(
        tables = config.checks.tables.len(),
        queries = config.checks.queries.len(),
        "Health checks configured"
    );
    if config.checks.expose_results {
        tracing::info!("Query results exposed in the response body");
    }

    // Build the connection pool; connections are dialed on first use
    let pool = db::connect(&config.database)?;
    let checker = HealthChecker::new(Arc::new(PgDatabase::new(pool)), &config.checks);

    // Create application state and router
    let state = AppState::new(config.clone(), checker);
    let app = create_router(state);

    // Start server
    http::serve(app, &config.http).await?;

    Ok(())
}
