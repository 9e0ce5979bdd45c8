//! Stage orchestration for agent pipelines
//!
//! A [`Pipeline`] runs a fixed, ordered list of stages over one shared work
//! state. Each stage sees the cumulative state; its update is merged before
//! the next stage starts.

pub mod pipeline;

// Re-export for convenience
pub use pipeline::{Pipeline, PipelineBuilder, RunLog, StageReport};
