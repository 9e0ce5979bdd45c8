//! Anthropic Claude provider implementation
//!
//! Schema-constrained requests are served through forced tool use: the
//! [`crate::ResponseSchema`] becomes the only tool and `tool_choice` names it,
//! so the tool input is the structured record.
//! See: https://docs.anthropic.com/en/api/messages

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, Message,
    MessageContent, Result, Role, StopReason, TokenUsage, ToolChoice, ToolDefinition,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Anthropic Claude provider
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_timeout(api_key, DEFAULT_TIMEOUT)
    }

    /// Create a provider with a custom HTTP timeout
    pub fn with_timeout(api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            base_url: ANTHROPIC_API_BASE.to_string(),
        })
    }

    /// Point the provider at a different API base (proxies, gateways)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Create a provider from environment variable
    ///
    /// Reads the API key from the `ANTHROPIC_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            LLMError::ConfigurationError(
                "ANTHROPIC_API_KEY environment variable not set".to_string(),
            )
        })?;
        Self::new(api_key)
    }
}

impl AnthropicRequest {
    fn from_completion(request: CompletionRequest) -> Self {
        let mut tools = request.tools;
        let mut tool_choice = None;
        if let Some(schema) = &request.response_schema {
            tools.get_or_insert_with(Vec::new).push(schema.as_tool());
            tool_choice = Some(ToolChoice::Tool {
                name: schema.name.clone(),
            });
        }

        Self {
            model: request.model,
            messages: request
                .messages
                .into_iter()
                .filter(|m| m.role != Role::System)
                .collect(),
            system: request.system,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools,
            tool_choice,
            stop_sequences: request.stop_sequences,
        }
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to Anthropic API");

        let schema_name = request.response_schema.as_ref().map(|s| s.name.clone());
        let anthropic_request = AnthropicRequest::from_completion(request);

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&anthropic_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;

            return Err(match status.as_u16() {
                401 => LLMError::AuthenticationFailed,
                429 => LLMError::RateLimitExceeded(error_text),
                400 => LLMError::InvalidRequest(error_text),
                404 => LLMError::ModelNotFound(anthropic_request.model),
                _ => LLMError::RequestFailed(format!("HTTP {status}: {error_text}")),
            });
        }

        let body = response.text().await?;
        let anthropic_response = AnthropicResponse::parse(&body)?;

        debug!(
            "Received response - stop_reason: {}, tokens: {}/{}",
            anthropic_response.stop_reason,
            anthropic_response.usage.input_tokens,
            anthropic_response.usage.output_tokens
        );

        Ok(anthropic_response.into_completion(schema_name.as_deref()))
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn supports_structured_output(&self) -> bool {
        true
    }
}

// Anthropic-specific request/response types

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    stop_reason: String,
    usage: UsageResponse,
}

#[derive(Debug, Deserialize)]
struct UsageResponse {
    input_tokens: usize,
    output_tokens: usize,
}

impl AnthropicResponse {
    fn parse(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    fn into_completion(self, schema_name: Option<&str>) -> CompletionResponse {
        let message = Message {
            role: Role::Assistant,
            content: Some(MessageContent::Blocks(self.content)),
        };
        let structured = schema_name.and_then(|name| message.tool_input(name).cloned());

        CompletionResponse {
            message,
            structured,
            stop_reason: match self.stop_reason.as_str() {
                "end_turn" => StopReason::EndTurn,
                "max_tokens" => StopReason::MaxTokens,
                "stop_sequence" => StopReason::StopSequence,
                "tool_use" => StopReason::ToolUse,
                _ => {
                    debug!("Unknown stop reason: {}", self.stop_reason);
                    StopReason::EndTurn
                }
            },
            usage: TokenUsage {
                input_tokens: self.usage.input_tokens,
                output_tokens: self.usage.output_tokens,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResponseSchema;
    use serde_json::json;

    #[test]
    fn test_provider_creation() {
        let provider = AnthropicProvider::new("test-key".to_string());
        assert!(provider.is_ok());
        let provider = provider.unwrap();
        assert_eq!(provider.name(), "anthropic");
        assert!(provider.supports_structured_output());
    }

    #[test]
    fn test_schema_becomes_forced_tool() {
        let request = CompletionRequest::builder("claude-sonnet-4-5-20250929")
            .add_message(Message::system("ignored here"))
            .add_message(Message::user("Analyze NVDA"))
            .response_schema(ResponseSchema::new(
                "market_analysis",
                "Technical analysis record",
                json!({"type": "object"}),
            ))
            .build();

        let body = serde_json::to_value(AnthropicRequest::from_completion(request)).unwrap();
        assert_eq!(body["messages"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["tools"][0]["name"], "market_analysis");
        assert_eq!(
            body["tool_choice"],
            json!({"type": "tool", "name": "market_analysis"})
        );
    }

    #[test]
    fn test_tool_input_surfaces_as_structured() {
        let raw = json!({
            "content": [
                {"type": "tool_use", "id": "toolu_1", "name": "market_analysis",
                 "input": {"confidence_score": 0.6}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        });
        let response: AnthropicResponse = serde_json::from_value(raw).unwrap();
        let completion = response.into_completion(Some("market_analysis"));

        assert_eq!(completion.structured, Some(json!({"confidence_score": 0.6})));
        assert_eq!(completion.stop_reason, StopReason::ToolUse);
        assert_eq!(completion.usage.total(), 15);
    }

    #[test]
    fn test_unparsable_body_is_malformed() {
        let err = AnthropicResponse::parse(r#"{"content": "oops"}"#).unwrap_err();
        assert!(matches!(err, LLMError::MalformedResponse(_)));
    }

    #[test]
    fn test_from_env_without_key() {
        // SAFETY: test-only mutation of the process environment
        unsafe {
            std::env::remove_var("ANTHROPIC_API_KEY");
        }
        let result = AnthropicProvider::from_env();
        assert!(result.is_err());
    }
}
