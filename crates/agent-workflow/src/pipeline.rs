//! Pipeline definition and execution

use agent_core::{Error, Result, Stage, StageOutcome, WorkState};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};

/// What happened in one stage of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    /// Stage name
    pub stage: String,
    /// Whether the stage extracted or degraded
    pub outcome: StageOutcome,
    /// Wall-clock time spent in the stage
    pub elapsed: Duration,
}

/// Append-only record of a completed run, kept outside the work state
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunLog {
    reports: Vec<StageReport>,
}

impl RunLog {
    fn push(&mut self, report: StageReport) {
        self.reports.push(report);
    }

    /// Reports in execution order
    pub fn reports(&self) -> &[StageReport] {
        &self.reports
    }

    /// Names of stages that returned a degraded record
    pub fn degraded_stages(&self) -> Vec<&str> {
        self.reports
            .iter()
            .filter(|r| r.outcome == StageOutcome::Degraded)
            .map(|r| r.stage.as_str())
            .collect()
    }

    /// Total time across all stages
    pub fn total_elapsed(&self) -> Duration {
        self.reports.iter().map(|r| r.elapsed).sum()
    }
}

/// A linear sequence of stages over a shared work state
///
/// Stages run strictly one at a time in insertion order. A stage returning
/// `Err` aborts the run and the partially updated state is dropped.
///
/// # Example
///
/// ```ignore
/// let pipeline = Pipeline::builder()
///     .add_stage(Arc::new(technical))
///     .add_stage(Arc::new(synthesis))
///     .build()?;
///
/// let (state, log) = pipeline.run_with_log(initial_state).await?;
/// ```
pub struct Pipeline<S: WorkState> {
    stages: Vec<Arc<dyn Stage<S>>>,
}

impl<S: WorkState> Pipeline<S> {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder<S> {
        PipelineBuilder::new()
    }

    /// Stage names in execution order
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the pipeline has no stages
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Render the execution graph, e.g. `START -> technical -> synthesis -> END`
    pub fn describe(&self) -> String {
        std::iter::once("START")
            .chain(self.stage_names())
            .chain(std::iter::once("END"))
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Run every stage and return the final state
    pub async fn run(&self, state: S) -> Result<S> {
        self.run_with_log(state).await.map(|(state, _)| state)
    }

    /// Run every stage and return the final state together with its run log
    #[instrument(skip_all, fields(stages = self.stages.len()))]
    pub async fn run_with_log(&self, mut state: S) -> Result<(S, RunLog)> {
        let mut log = RunLog::default();

        for stage in &self.stages {
            let started = Instant::now();
            info!(stage = stage.name(), "Stage started");

            let output = stage.run(&state).await.inspect_err(|e| {
                error!(stage = stage.name(), error = %e, "Stage failed, aborting run");
            })?;
            state.apply(output.update);

            let report = StageReport {
                stage: stage.name().to_string(),
                outcome: output.outcome,
                elapsed: started.elapsed(),
            };
            match report.outcome {
                StageOutcome::Extracted => {
                    info!(stage = %report.stage, elapsed_ms = report.elapsed.as_millis(), "Stage finished");
                }
                StageOutcome::Degraded => {
                    warn!(stage = %report.stage, elapsed_ms = report.elapsed.as_millis(), "Stage finished with degraded record");
                }
            }
            log.push(report);
        }

        Ok((state, log))
    }
}

/// Builder for constructing pipelines
pub struct PipelineBuilder<S: WorkState> {
    stages: Vec<Arc<dyn Stage<S>>>,
}

impl<S: WorkState> Default for PipelineBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: WorkState> PipelineBuilder<S> {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage
    pub fn add_stage(mut self, stage: Arc<dyn Stage<S>>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Build the pipeline
    ///
    /// Fails when no stage was added or two stages share a name.
    pub fn build(self) -> Result<Pipeline<S>> {
        if self.stages.is_empty() {
            return Err(Error::InvalidInput(
                "a pipeline needs at least one stage".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for stage in &self.stages {
            if !seen.insert(stage.name()) {
                return Err(Error::InvalidInput(format!(
                    "duplicate stage name '{}'",
                    stage.name()
                )));
            }
        }

        Ok(Pipeline {
            stages: self.stages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::StageOutput;
    use async_trait::async_trait;

    #[derive(Default)]
    struct Trail {
        visited: Vec<String>,
    }

    impl WorkState for Trail {
        type Update = String;

        fn apply(&mut self, update: String) {
            self.visited.push(update);
        }
    }

    struct Step {
        name: &'static str,
        outcome: StageOutcome,
    }

    #[async_trait]
    impl Stage<Trail> for Step {
        async fn run(&self, state: &Trail) -> Result<StageOutput<String>> {
            Ok(StageOutput::new(
                format!("{}@{}", self.name, state.visited.len()),
                self.outcome,
            ))
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    struct Broken;

    #[async_trait]
    impl Stage<Trail> for Broken {
        async fn run(&self, _state: &Trail) -> Result<StageOutput<String>> {
            Err(Error::stage_failed("broken", "precondition violated"))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    fn step(name: &'static str, outcome: StageOutcome) -> Arc<dyn Stage<Trail>> {
        Arc::new(Step { name, outcome })
    }

    #[tokio::test]
    async fn test_stages_run_in_order_over_cumulative_state() {
        let pipeline = Pipeline::builder()
            .add_stage(step("a", StageOutcome::Extracted))
            .add_stage(step("b", StageOutcome::Degraded))
            .add_stage(step("c", StageOutcome::Extracted))
            .build()
            .unwrap();

        let (state, log) = pipeline.run_with_log(Trail::default()).await.unwrap();
        assert_eq!(state.visited, vec!["a@0", "b@1", "c@2"]);
        assert_eq!(log.reports().len(), 3);
        assert_eq!(log.degraded_stages(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_stage_error_aborts_run() {
        let pipeline = Pipeline::builder()
            .add_stage(step("a", StageOutcome::Extracted))
            .add_stage(Arc::new(Broken))
            .add_stage(step("c", StageOutcome::Extracted))
            .build()
            .unwrap();

        let result = pipeline.run(Trail::default()).await;
        assert!(matches!(result, Err(Error::StageFailed { .. })));
    }

    #[test]
    fn test_builder_validation() {
        assert!(Pipeline::<Trail>::builder().build().is_err());

        let duplicate = Pipeline::builder()
            .add_stage(step("a", StageOutcome::Extracted))
            .add_stage(step("a", StageOutcome::Extracted))
            .build();
        assert!(duplicate.is_err());
    }

    #[test]
    fn test_describe() {
        let pipeline = Pipeline::builder()
            .add_stage(step("technical", StageOutcome::Extracted))
            .add_stage(step("synthesis", StageOutcome::Extracted))
            .build()
            .unwrap();

        assert_eq!(pipeline.describe(), "START -> technical -> synthesis -> END");
        assert_eq!(pipeline.stage_names(), vec!["technical", "synthesis"]);
        assert_eq!(pipeline.len(), 2);
    }
}
