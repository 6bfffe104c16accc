//! Shared application state for request handlers.

use std::sync::Arc;

use crate::checks::HealthChecker;
use crate::config::AppConfig;

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// Contains the application configuration and the health checker driving the
/// per-request check pipeline.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub checker: Arc<HealthChecker>,
}

impl AppState {
    /// Creates a new application state from the given configuration and checker.
    pub fn new(config: AppConfig, checker: HealthChecker) -> Self {
        Self {
            config: Arc::new(config),
            checker: Arc::new(checker),
        }
    }
}
