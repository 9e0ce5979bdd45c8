//! LLM provider trait definition

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// Trait for LLM providers
///
/// Implementations of this trait provide access to different LLM services.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion from the LLM
    ///
    /// When the request carries a [`crate::ResponseSchema`] and the provider
    /// supports structured output, the conforming value is returned in
    /// [`CompletionResponse::structured`].
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the provider name (e.g., "anthropic")
    fn name(&self) -> &str;

    /// Whether the provider can constrain generation to a JSON schema
    fn supports_structured_output(&self) -> bool {
        false
    }
}
