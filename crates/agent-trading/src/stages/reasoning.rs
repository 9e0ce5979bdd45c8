//! Stages that reason over upstream records only

use super::{StageContext, complete, require_ticker};
use crate::prompts::{self, NO_BEAR, NO_BULL, NO_FUNDAMENTALS, NO_MARKET, NO_NEWS};
use crate::records::{BearCase, BullCase, SynthesisDecision};
use crate::state::{Analysis, RecordSlot, WorkItem, WorkItemUpdate};
use agent_core::{PhaseTracker, Result, Stage, StageOutput, StagePhase};
use async_trait::async_trait;
use minijinja::context;
use std::marker::PhantomData;

/// Builds its prompt from the serialized records already on the work item
///
/// Missing upstream records are replaced by a fixed placeholder, so these
/// stages always reach the model.
pub struct ReasoningStage<T> {
    name: &'static str,
    task: &'static str,
    context: StageContext,
    _record: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for ReasoningStage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasoningStage")
            .field("name", &self.name)
            .finish()
    }
}

impl ReasoningStage<BullCase> {
    /// Strongest case for buying
    pub fn bull(context: StageContext) -> Self {
        Self::new(prompts::BULL, "Build the bull case", context)
    }
}

impl ReasoningStage<BearCase> {
    /// Strongest case for selling, rebutting the bull case
    pub fn bear(context: StageContext) -> Self {
        Self::new(prompts::BEAR, "Build the bear case", context)
    }
}

impl ReasoningStage<SynthesisDecision> {
    /// Final risk-tiered decision
    pub fn synthesis(context: StageContext) -> Self {
        Self::new(prompts::SYNTHESIS, "Make the final investment decision", context)
    }
}

impl<T> ReasoningStage<T> {
    fn new(name: &'static str, task: &'static str, context: StageContext) -> Self {
        Self {
            name,
            task,
            context,
            _record: PhantomData,
        }
    }
}

fn serialized<'a, R>(analysis: &'a Option<Analysis<R>>, placeholder: &'a str) -> &'a str {
    analysis
        .as_ref()
        .map_or(placeholder, |a| a.serialized.as_str())
}

#[async_trait]
impl<T: RecordSlot> Stage<WorkItem> for ReasoningStage<T> {
    async fn run(&self, item: &WorkItem) -> Result<StageOutput<WorkItemUpdate>> {
        require_ticker(self.name, item)?;

        let mut tracker = PhaseTracker::new(self.name);
        let request = format!("{} for {} as of {}", self.task, item.ticker, item.as_of);

        let upstream = context! {
            ticker => &item.ticker,
            date => item.as_of.to_string(),
            news => serialized(&item.news, NO_NEWS),
            market => serialized(&item.technical, NO_MARKET),
            fundamentals => serialized(&item.fundamentals, NO_FUNDAMENTALS),
            bull => serialized(&item.bull, NO_BULL),
            bear => serialized(&item.bear, NO_BEAR),
        };
        tracker.advance(StagePhase::DataGathered)?;

        let prompt = self.context.render(self.name, self.name, upstream)?;
        let record = self.context.extract::<T>(&prompt, &item.ticker).await;

        complete(tracker, record, request, &item.ticker)
    }

    fn name(&self) -> &str {
        self.name
    }
}
