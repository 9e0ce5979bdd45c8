//! Error types for agent-core

use crate::phase::StagePhase;
use thiserror::Error;

/// Result type alias for agent-core
pub type Result<T> = std::result::Result<T, Error>;

/// Stage-fatal errors
///
/// Anything a stage can model as degraded data or degraded extraction never
/// becomes one of these. Reaching the pipeline with an `Error` aborts the run.
#[derive(Error, Debug)]
pub enum Error {
    /// Generic error message
    #[error("{0}")]
    Generic(String),

    /// A precondition on the stage input was violated
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The stage itself is broken
    #[error("Stage '{stage}' failed: {reason}")]
    StageFailed {
        /// Stage name
        stage: String,
        /// Failure description
        reason: String,
    },

    /// Illegal phase transition inside a stage
    #[error("Stage '{stage}' cannot move from {from} to {to}")]
    InvalidTransition {
        /// Stage name
        stage: String,
        /// Current phase
        from: StagePhase,
        /// Requested phase
        to: StagePhase,
    },

    /// A record could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Build a [`Error::StageFailed`] for the named stage
    pub fn stage_failed(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StageFailed {
            stage: stage.into(),
            reason: reason.into(),
        }
    }
}
