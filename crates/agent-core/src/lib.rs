//! Core abstractions for staged analysis pipelines
//!
//! This crate defines the contract every pipeline stage implements, the per-stage
//! phase state machine, and the error taxonomy that separates recoverable
//! degradation (handled inside a stage) from stage-fatal failures.

pub mod error;
pub mod phase;
pub mod stage;

pub use error::{Error, Result};
pub use phase::{PhaseTracker, StagePhase};
pub use stage::{Stage, StageOutcome, StageOutput, WorkState};
