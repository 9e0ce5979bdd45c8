//! Stage trait definition

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Shared state threaded through a pipeline
///
/// Stages never mutate the state directly. They return an update which the
/// pipeline merges with [`WorkState::apply`], one stage at a time.
pub trait WorkState: Send + Sync {
    /// Partial update produced by one stage
    type Update: Send;

    /// Merge a stage's update into the state
    fn apply(&mut self, update: Self::Update);
}

/// How a stage arrived at its record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    /// The model produced a valid record
    Extracted,
    /// A static fallback record was substituted
    Degraded,
}

/// Update plus terminal outcome returned by a stage
#[derive(Debug, Clone)]
pub struct StageOutput<U> {
    /// Partial update to merge into the work state
    pub update: U,
    /// Quality of the produced record
    pub outcome: StageOutcome,
}

impl<U> StageOutput<U> {
    /// Wrap an update with its outcome
    pub fn new(update: U, outcome: StageOutcome) -> Self {
        Self { update, outcome }
    }
}

/// One step of a pipeline
///
/// A stage reads the cumulative state and returns a partial update. Returning
/// `Err` is reserved for stage-fatal conditions and aborts the whole run;
/// degraded data or degraded model output must be expressed as a
/// [`StageOutcome::Degraded`] output instead.
#[async_trait]
pub trait Stage<S: WorkState>: Send + Sync {
    /// Run the stage against the current state
    async fn run(&self, state: &S) -> Result<StageOutput<S::Update>>;

    /// Get the stage's name
    fn name(&self) -> &str;
}
