//! Stages that gather market data through collectors before prompting

use super::{StageContext, complete, require_ticker};
use crate::collectors::{CollectRequest, Collector, Gathered};
use crate::prompts;
use crate::records::{FundamentalAnalysis, TechnicalAnalysis};
use crate::state::{RecordSlot, WorkItem, WorkItemUpdate};
use agent_core::{PhaseTracker, Result, Stage, StageOutput, StagePhase};
use async_trait::async_trait;
use minijinja::context;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

/// Runs its collectors concurrently and extracts a `T` from what came back
///
/// When every collector fails the model is never called: the stage goes
/// straight to a degraded `T::unavailable` record.
pub struct DataStage<T> {
    name: &'static str,
    task: &'static str,
    collectors: Vec<Arc<dyn Collector>>,
    context: StageContext,
    _record: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for DataStage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let collectors: Vec<&str> = self.collectors.iter().map(|c| c.name()).collect();
        f.debug_struct("DataStage")
            .field("name", &self.name)
            .field("collectors", &collectors)
            .finish()
    }
}

impl DataStage<TechnicalAnalysis> {
    /// Price history and indicators into a [`TechnicalAnalysis`]
    pub fn technical(collectors: Vec<Arc<dyn Collector>>, context: StageContext) -> Self {
        Self::new(prompts::TECHNICAL, "Analyze market conditions", collectors, context)
    }
}

impl DataStage<FundamentalAnalysis> {
    /// Company financials into a [`FundamentalAnalysis`]
    pub fn fundamentals(collectors: Vec<Arc<dyn Collector>>, context: StageContext) -> Self {
        Self::new(prompts::FUNDAMENTALS, "Analyze fundamentals", collectors, context)
    }
}

impl<T> DataStage<T> {
    fn new(
        name: &'static str,
        task: &'static str,
        collectors: Vec<Arc<dyn Collector>>,
        context: StageContext,
    ) -> Self {
        Self {
            name,
            task,
            collectors,
            context,
            _record: PhantomData,
        }
    }
}

#[async_trait]
impl<T: RecordSlot> Stage<WorkItem> for DataStage<T> {
    async fn run(&self, item: &WorkItem) -> Result<StageOutput<WorkItemUpdate>> {
        require_ticker(self.name, item)?;

        let mut tracker = PhaseTracker::new(self.name);
        let request = format!("{} for {} as of {}", self.task, item.ticker, item.as_of);
        let gathered = Gathered::collect(
            &self.collectors,
            &CollectRequest::new(&item.ticker, item.as_of),
        )
        .await;

        let record = if gathered.all_failed() {
            let reason = gathered.failure_summary();
            warn!(stage = self.name, ticker = %item.ticker, %reason, "No evidence gathered, skipping the model");
            T::unavailable(&item.ticker, &reason)
        } else {
            tracker.advance(StagePhase::DataGathered)?;
            let prompt = self.context.render(
                self.name,
                self.name,
                context! {
                    ticker => &item.ticker,
                    date => item.as_of.to_string(),
                    evidence => gathered.render(),
                },
            )?;
            self.context.extract::<T>(&prompt, &item.ticker).await
        };

        complete(tracker, record, request, &item.ticker)
    }

    fn name(&self) -> &str {
        self.name
    }
}
