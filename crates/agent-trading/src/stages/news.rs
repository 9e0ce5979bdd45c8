//! Company news stage

use super::{StageContext, complete, require_ticker};
use crate::collectors::NewsSource;
use crate::evidence::EvidenceSelector;
use crate::prompts;
use crate::records::NewsAnalysis;
use crate::state::{WorkItem, WorkItemUpdate};
use agent_core::{PhaseTracker, Result, Stage, StageOutput, StagePhase};
use async_trait::async_trait;
use chrono::Days;
use minijinja::context;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Selects company-relevant news and extracts a [`NewsAnalysis`]
///
/// Both feeds are fetched concurrently and a failing feed counts as empty.
/// An empty selection yields the degraded no-coverage record without calling
/// the model.
pub struct NewsStage {
    source: Arc<dyn NewsSource>,
    selector: Arc<EvidenceSelector>,
    context: StageContext,
}

impl std::fmt::Debug for NewsStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsStage")
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

impl NewsStage {
    /// Create the stage
    pub fn new(
        source: Arc<dyn NewsSource>,
        selector: Arc<EvidenceSelector>,
        context: StageContext,
    ) -> Self {
        Self {
            source,
            selector,
            context,
        }
    }
}

fn or_empty(feed: &str, ticker: &str, result: crate::Result<Vec<Value>>) -> Vec<Value> {
    result.unwrap_or_else(|e| {
        warn!(feed, ticker, error = %e, "News feed failed, treating it as empty");
        Vec::new()
    })
}

#[async_trait]
impl Stage<WorkItem> for NewsStage {
    async fn run(&self, item: &WorkItem) -> Result<StageOutput<WorkItemUpdate>> {
        require_ticker(prompts::NEWS, item)?;
        item.options.validate()?;

        let options = item.options;
        let lookback = options.lookback_days;
        let mut tracker = PhaseTracker::new(prompts::NEWS);
        let request = format!(
            "Analyze last {lookback} days of company-relevant news for {} as of {}",
            item.ticker, item.as_of
        );

        let to = item.as_of;
        let from = to - Days::new(u64::from(lookback));
        let (company, market) = tokio::join!(
            self.source
                .company_news(&item.ticker, from, to, options.max_company_articles),
            self.source.market_news(from, to, options.max_macro_articles),
        );
        let company = or_empty("company", &item.ticker, company);
        let market = or_empty("market", &item.ticker, market);

        let selection = self
            .selector
            .select(&item.ticker, &company, &market, &options.selection());

        let record = if selection.is_empty() {
            warn!(
                ticker = %item.ticker,
                raw_articles = selection.raw_total,
                "No company-relevant news kept, skipping the model"
            );
            NewsAnalysis::no_coverage(&item.ticker, lookback, selection.raw_total)
        } else {
            tracker.advance(StagePhase::DataGathered)?;
            let prompt = self.context.render(
                prompts::NEWS,
                prompts::NEWS,
                context! {
                    ticker => &item.ticker,
                    date => item.as_of.to_string(),
                    lookback_days => lookback,
                    coverage => selection.coverage(),
                    articles => &selection.kept,
                },
            )?;
            self.context
                .extract::<NewsAnalysis>(&prompt, &item.ticker)
                .await
                .with_coverage(&selection, lookback)
        };

        complete(tracker, record, request, &item.ticker)
    }

    fn name(&self) -> &str {
        prompts::NEWS
    }
}
