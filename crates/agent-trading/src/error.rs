//! Error types for trading analysis operations
//!
//! These never cross a stage boundary on their own: collectors report them
//! as placeholders, and only configuration or template problems are turned
//! into [`agent_core::Error`] to abort a run.

use thiserror::Error;

/// Collector, configuration and template errors
#[derive(Debug, Error)]
pub enum TradingError {
    /// API request failed
    #[error("API error: {0}")]
    ApiError(String),

    /// Data not available for the requested symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable {
        /// Ticker symbol
        symbol: String,
        /// Why nothing came back
        reason: String,
    },

    /// Rate limit exceeded for API
    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded {
        /// Data provider name
        provider: String,
    },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// Alpha Vantage API error
    #[error("Alpha Vantage error: {0}")]
    AlphaVantageError(String),

    /// Technical indicator calculation error
    #[error("Technical indicator error: {0}")]
    IndicatorError(String),

    /// Prompt template error
    #[error("Template error: {0}")]
    TemplateError(#[from] minijinja::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline assembly error
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] agent_core::Error),
}

/// Result type alias for trading operations
pub type Result<T> = std::result::Result<T, TradingError>;

/// Convert TradingError to agent_core::Error
impl From<TradingError> for agent_core::Error {
    fn from(err: TradingError) -> Self {
        match err {
            TradingError::ConfigError(reason) => agent_core::Error::InvalidInput(reason),
            TradingError::Pipeline(inner) => inner,
            other => agent_core::Error::Generic(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TradingError::RateLimitExceeded {
            provider: "Finnhub".to_string(),
        };
        assert_eq!(err.to_string(), "Rate limit exceeded for Finnhub");

        let err = TradingError::DataUnavailable {
            symbol: "AAPL".to_string(),
            reason: "No data found".to_string(),
        };
        assert_eq!(err.to_string(), "Data not available for AAPL: No data found");
    }

    #[test]
    fn test_error_conversion() {
        let err: agent_core::Error = TradingError::ConfigError("bad threshold".to_string()).into();
        assert!(matches!(err, agent_core::Error::InvalidInput(msg) if msg == "bad threshold"));

        let err: agent_core::Error = TradingError::ApiError("Test error".to_string()).into();
        match err {
            agent_core::Error::Generic(msg) => assert!(msg.contains("API error")),
            other => panic!("Expected Generic variant, got {other:?}"),
        }
    }

    #[test]
    fn test_pipeline_error_round_trips() {
        let err: TradingError = agent_core::Error::stage_failed("synthesis", "boom").into();
        assert!(err.to_string().starts_with("Pipeline error:"));

        let back: agent_core::Error = err.into();
        assert!(matches!(back, agent_core::Error::StageFailed { .. }));
    }
}
