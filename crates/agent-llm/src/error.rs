//! Transport errors
//!
//! These stop at the structured extractor, which turns every one of them
//! into a fallback record. Nothing here aborts a pipeline run.

use thiserror::Error;

/// Result type for model transport calls
pub type Result<T> = std::result::Result<T, LLMError>;

/// Why a model call produced no usable response
#[derive(Error, Debug)]
pub enum LLMError {
    /// The provider answered with an unexpected status
    #[error("model request failed: {0}")]
    RequestFailed(String),

    /// Credentials rejected
    #[error("model provider rejected the API key")]
    AuthenticationFailed,

    /// Too many requests
    #[error("model provider rate limit hit: {0}")]
    RateLimitExceeded(String),

    /// The provider refused the request body
    #[error("invalid model request: {0}")]
    InvalidRequest(String),

    /// Unknown model identifier
    #[error("unknown model: {0}")]
    ModelNotFound(String),

    /// Response body is not the provider's documented shape
    #[error("malformed model response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    /// Connection, timeout or body read failure
    #[cfg(feature = "reqwest")]
    #[error("model transport error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Any other provider-side failure
    #[error("model provider error: {0}")]
    ProviderError(String),

    /// Provider could not be configured
    #[error("model provider misconfigured: {0}")]
    ConfigurationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_body_converts() {
        let err: LLMError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, LLMError::MalformedResponse(_)));
        assert!(err.to_string().starts_with("malformed model response"));
    }
}
