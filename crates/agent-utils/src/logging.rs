//! Logging and tracing utilities

use crate::AppConfig;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing from an [`AppConfig`]
///
/// Falls back to `info` when the configured filter does not parse. Calling
/// this twice in one process is a no-op for the second call.
pub fn init_tracing_with(config: &AppConfig) {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };

    if result.is_ok() {
        tracing::debug!(app = %config.app_name, environment = %config.environment, "Tracing initialized");
    }
}
