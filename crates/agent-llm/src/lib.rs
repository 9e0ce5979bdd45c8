//! LLM provider abstraction layer and structured-output extraction
//!
//! This crate provides provider-agnostic abstractions for interacting with
//! Large Language Models (LLMs). It includes:
//!
//! - Message types for LLM communication
//! - Completion request/response types, including schema-constrained requests
//! - Tool definitions and JSON schema builders
//! - Provider trait for LLM implementations
//! - [`StructuredExtractor`], which turns one model call into a validated record
//!   through a schema-enforced, raw-text or static-fallback tier
//! - Concrete provider implementations (behind feature flags)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod structured;
pub mod tools;

// Re-export main types
pub use completion::{
    CompletionRequest, CompletionResponse, ResponseSchema, StopReason, TokenUsage,
};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, MessageContent, Role};
pub use provider::LLMProvider;
pub use structured::{
    Extraction, ExtractionFailure, ExtractionTier, ExtractorConfig, StructuredExtractor,
    StructuredOutput, ValidationError,
};
pub use tools::{ToolChoice, ToolDefinition};

// Provider implementations (feature-gated)
#[cfg(feature = "anthropic")]
pub mod providers;
