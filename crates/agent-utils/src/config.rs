//! Process-level configuration

use serde::{Deserialize, Serialize};

/// Environment variable selecting the deployment environment
pub const ENV_ENVIRONMENT: &str = "TRADING_ENV";
/// Environment variable holding the tracing filter directive
pub const ENV_LOG_FILTER: &str = "RUST_LOG";
/// Environment variable switching log output to JSON
pub const ENV_LOG_JSON: &str = "TRADING_LOG_JSON";

/// Application configuration shared by binaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name
    pub app_name: String,
    /// Environment (development, production, ...)
    pub environment: String,
    /// `EnvFilter` directive, e.g. `info` or `agent_trading=debug`
    pub log_filter: String,
    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "trading-agents".to_string(),
            environment: "development".to_string(),
            log_filter: "info".to_string(),
            log_json: false,
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `TRADING_ENV`, `RUST_LOG` and `TRADING_LOG_JSON`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(environment) = lookup(ENV_ENVIRONMENT) {
            config.environment = environment;
        }
        if let Some(filter) = lookup(ENV_LOG_FILTER) {
            config.log_filter = filter;
        }
        if let Some(json) = lookup(ENV_LOG_JSON) {
            config.log_json = matches!(json.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        config
    }

    /// Whether this is a production deployment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.log_filter, "info");
        assert!(!config.log_json);
        assert!(!config.is_production());
    }

    #[test]
    fn test_lookup_overrides() {
        let config = AppConfig::from_lookup(|key| match key {
            ENV_ENVIRONMENT => Some("Production".to_string()),
            ENV_LOG_FILTER => Some("agent_trading=debug".to_string()),
            ENV_LOG_JSON => Some("TRUE".to_string()),
            _ => None,
        });

        assert!(config.is_production());
        assert_eq!(config.log_filter, "agent_trading=debug");
        assert!(config.log_json);
    }

    #[test]
    fn test_serialization() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
