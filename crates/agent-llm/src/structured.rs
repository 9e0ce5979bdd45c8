//! Structured-output extraction with graceful degradation
//!
//! [`StructuredExtractor::extract`] turns a single model call into a record of
//! a [`StructuredOutput`] type. It walks three tiers and always returns a
//! conforming record:
//!
//! 1. **Structured**: the provider constrains generation to the record's JSON
//!    schema. Used whenever [`LLMProvider::supports_structured_output`] is true.
//! 2. **Parsed**: the prompt embeds a field-by-field shape description; the raw
//!    text is stripped of one optional code fence, parsed and validated.
//! 3. **Fallback**: a static record built by the caller-supplied closure.
//!
//! Any failure in tier 1 or 2 (transport error, deadline, malformed JSON, an
//! unknown enum label, an out-of-bounds number) lands in tier 3. Nothing is
//! ever returned as an error.

use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, ResponseSchema,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Instruction appended to tier-2 prompts ahead of the shape description
pub const RAW_OUTPUT_INSTRUCTION: &str =
    "Respond ONLY with valid JSON matching this exact structure (no markdown, no extra text):";

/// A record type the extractor can produce
pub trait StructuredOutput: Serialize + DeserializeOwned + Send + Sized {
    /// Schema name; doubles as the forced tool name on tool-based providers
    const NAME: &'static str;

    /// What the record represents
    const DESCRIPTION: &'static str;

    /// JSON Schema used by the structured tier
    fn json_schema() -> Value;

    /// Field-by-field shape description embedded in tier-2 prompts
    fn shape_hint() -> &'static str;

    /// Check numeric bounds and any cross-field constraints
    ///
    /// Enumerated labels are already enforced by deserialization.
    fn validate(&self) -> Result<(), ValidationError>;

    /// [`ResponseSchema`] for this record
    fn response_schema() -> ResponseSchema {
        ResponseSchema::new(Self::NAME, Self::DESCRIPTION, Self::json_schema())
    }
}

/// A record field outside its declared domain
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field
    pub field: String,
    /// What is wrong with it
    pub message: String,
}

impl ValidationError {
    /// Create a validation error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Require `value` to lie in `[min, max]`
    pub fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), Self> {
        if value.is_finite() && (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(Self::new(
                field,
                format!("{value} is outside [{min}, {max}]"),
            ))
        }
    }

    /// Require `value` to lie in `[0, 1]`
    pub fn check_unit(field: &str, value: f64) -> Result<(), Self> {
        Self::check_range(field, value, 0.0, 1.0)
    }
}

/// Which tier produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionTier {
    /// Schema-enforced call
    Structured,
    /// Raw text parsed and validated
    Parsed,
    /// Static fallback record
    Fallback,
}

/// Why tiers 1 and 2 did not produce a record
#[derive(Debug, Error)]
pub enum ExtractionFailure {
    /// The transport raised
    #[error("model call failed: {0}")]
    Transport(#[from] LLMError),

    /// The caller-imposed deadline expired
    #[error("model call exceeded deadline of {0:?}")]
    DeadlineExceeded(Duration),

    /// A structured call came back without a structured payload
    #[error("response carried no structured output")]
    MissingStructuredOutput,

    /// A raw call came back without text
    #[error("response carried no text")]
    EmptyResponse,

    /// The payload does not have the record's shape
    #[error("response is not a valid record: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The payload has the right shape but a field is out of its domain
    #[error("record failed validation: {0}")]
    Invalid(#[from] ValidationError),
}

/// Result of one extraction
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<T> {
    /// Produced by a schema-enforced call
    Structured(T),
    /// Produced by parsing raw text
    Parsed(T),
    /// Produced by the static fallback
    Degraded {
        /// Fallback record
        record: T,
        /// Why the earlier tiers failed
        reason: String,
    },
}

impl<T> Extraction<T> {
    /// Tier that produced the record
    pub fn tier(&self) -> ExtractionTier {
        match self {
            Self::Structured(_) => ExtractionTier::Structured,
            Self::Parsed(_) => ExtractionTier::Parsed,
            Self::Degraded { .. } => ExtractionTier::Fallback,
        }
    }

    /// Whether the static fallback was used
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Borrow the record
    pub fn record(&self) -> &T {
        match self {
            Self::Structured(record) | Self::Parsed(record) | Self::Degraded { record, .. } => {
                record
            }
        }
    }

    /// Take the record
    pub fn into_record(self) -> T {
        match self {
            Self::Structured(record) | Self::Parsed(record) | Self::Degraded { record, .. } => {
                record
            }
        }
    }

    /// Degradation reason, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Degraded { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Model settings for one extractor
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Model identifier
    pub model: String,
    /// Maximum tokens to generate
    pub max_tokens: usize,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// System prompt sent with every call
    pub system: Option<String>,
    /// Deadline for the model call; expiry degrades to the fallback tier
    pub deadline: Option<Duration>,
}

impl ExtractorConfig {
    /// Create a config for the given model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_tokens: 4096,
            temperature: None,
            system: None,
            deadline: None,
        }
    }

    /// Set the maximum tokens
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set a deadline for the model call
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Wraps one model call per invocation in the three-tier contract
#[derive(Clone)]
pub struct StructuredExtractor {
    provider: Arc<dyn LLMProvider>,
    config: ExtractorConfig,
}

impl std::fmt::Debug for StructuredExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuredExtractor")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .finish()
    }
}

impl StructuredExtractor {
    /// Create an extractor over a provider
    pub fn new(provider: Arc<dyn LLMProvider>, config: ExtractorConfig) -> Self {
        Self { provider, config }
    }

    /// Model settings
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Produce a `T` from `prompt`
    ///
    /// `fallback` receives the failure description and must build a static
    /// record; it is only called when tiers 1 and 2 fail.
    pub async fn extract<T, F>(&self, prompt: &str, fallback: F) -> Extraction<T>
    where
        T: StructuredOutput,
        F: FnOnce(&str) -> T + Send,
    {
        let attempt = if self.provider.supports_structured_output() {
            debug!(schema = T::NAME, "Extracting with schema-enforced call");
            self.extract_structured::<T>(prompt)
                .await
                .map(Extraction::Structured)
        } else {
            debug!(schema = T::NAME, "Extracting by parsing raw text");
            self.extract_parsed::<T>(prompt)
                .await
                .map(Extraction::Parsed)
        };

        match attempt {
            Ok(extraction) => extraction,
            Err(failure) => {
                let reason = failure.to_string();
                warn!(schema = T::NAME, %reason, "Extraction degraded to static fallback");
                Extraction::Degraded {
                    record: fallback(&reason),
                    reason,
                }
            }
        }
    }

    async fn extract_structured<T: StructuredOutput>(
        &self,
        prompt: &str,
    ) -> Result<T, ExtractionFailure> {
        let request = self
            .request(Message::user(prompt))
            .response_schema(T::response_schema())
            .build();
        let response = self.call(request).await?;
        let value = response
            .structured
            .ok_or(ExtractionFailure::MissingStructuredOutput)?;
        let record: T = serde_json::from_value(value)?;
        record.validate()?;
        Ok(record)
    }

    async fn extract_parsed<T: StructuredOutput>(
        &self,
        prompt: &str,
    ) -> Result<T, ExtractionFailure> {
        let prompt = format!("{prompt}\n\n{RAW_OUTPUT_INSTRUCTION}\n{}", T::shape_hint());
        let request = self.request(Message::user(prompt)).build();
        let response = self.call(request).await?;
        let text = response
            .message
            .text()
            .ok_or(ExtractionFailure::EmptyResponse)?;
        parse_record(text)
    }

    fn request(&self, message: Message) -> crate::completion::CompletionRequestBuilder {
        let mut builder = CompletionRequest::builder(&self.config.model)
            .add_message(message)
            .max_tokens(self.config.max_tokens);
        if let Some(temperature) = self.config.temperature {
            builder = builder.temperature(temperature);
        }
        if let Some(system) = &self.config.system {
            builder = builder.system(system);
        }
        builder
    }

    async fn call(&self, request: CompletionRequest) -> Result<CompletionResponse, ExtractionFailure> {
        match self.config.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.provider.complete(request))
                .await
                .map_err(|_| ExtractionFailure::DeadlineExceeded(deadline))?
                .map_err(ExtractionFailure::from),
            None => Ok(self.provider.complete(request).await?),
        }
    }
}

/// Strip one optional opening code fence (with optional language tag) and one
/// optional closing fence
pub fn strip_code_fence(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        let tag_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+')))
            .unwrap_or(rest.len());
        body = &rest[tag_len..];
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

/// Parse and validate a record from raw model text
pub fn parse_record<T: StructuredOutput>(text: &str) -> Result<T, ExtractionFailure> {
    let record: T = serde_json::from_str(strip_code_fence(text))?;
    record.validate()?;
    Ok(record)
}
