//! The concrete analysis stages
//!
//! Every stage follows the same shape: check its input, gather evidence
//! (collectors or upstream records), render a prompt, run the extractor and
//! hand back exactly one record plus a two-message transcript. Degraded data
//! or degraded model output produce a degraded record; only a missing ticker,
//! invalid run options or a broken template abort the run.

mod data;
mod news;
mod reasoning;

pub use data::DataStage;
pub use news::NewsStage;
pub use reasoning::ReasoningStage;

use crate::prompts::PromptLibrary;
use crate::records::AnalysisRecord;
use crate::state::{Analysis, Exchange, RecordSlot, WorkItem, WorkItemUpdate};
use agent_core::{Error, PhaseTracker, Result, StageOutput, StagePhase};
use agent_llm::StructuredExtractor;
use std::sync::Arc;

/// Extractor and templates shared by the stages of one profile
#[derive(Debug, Clone)]
pub struct StageContext {
    extractor: Arc<StructuredExtractor>,
    prompts: Arc<PromptLibrary>,
}

impl StageContext {
    /// Bundle an extractor with the prompt library
    pub fn new(extractor: Arc<StructuredExtractor>, prompts: Arc<PromptLibrary>) -> Self {
        Self { extractor, prompts }
    }

    /// The extractor's model settings
    pub fn extractor(&self) -> &StructuredExtractor {
        &self.extractor
    }

    fn render(&self, stage: &str, template: &str, context: minijinja::Value) -> Result<String> {
        self.prompts
            .render(template, context)
            .map_err(|e| Error::stage_failed(stage, e.to_string()))
    }

    /// Run the extractor and stamp the record with the tier it came from
    async fn extract<T: AnalysisRecord>(&self, prompt: &str, ticker: &str) -> T {
        let extraction = self
            .extractor
            .extract::<T, _>(prompt, |reason| T::fallback(ticker, reason))
            .await;
        let tier = extraction.tier();
        let mut record = extraction.into_record();
        record.set_quality(tier.into());
        record
    }
}

fn require_ticker(stage: &str, item: &WorkItem) -> Result<()> {
    if item.ticker.is_empty() {
        return Err(Error::InvalidInput(format!(
            "stage '{stage}' requires a ticker"
        )));
    }
    Ok(())
}

/// Close the phase machine and wrap `record` into the stage's update
fn complete<T: RecordSlot>(
    mut tracker: PhaseTracker,
    record: T,
    request: String,
    ticker: &str,
) -> Result<StageOutput<WorkItemUpdate>> {
    let terminal = if record.quality().is_degraded() {
        StagePhase::Degraded
    } else {
        StagePhase::Extracted
    };
    tracker.advance(terminal)?;
    let outcome = tracker.finish()?;

    let analysis = Analysis::new(record)?;
    let response = format!("{} for {ticker}:\n\n{}", T::TITLE, analysis.serialized);

    Ok(StageOutput::new(
        WorkItemUpdate {
            record: T::into_stage_record(analysis),
            transcript: Exchange::new(request, response),
        },
        outcome,
    ))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::TechnicalAnalysis;
    use crate::state::StageRecord;
    use agent_core::StageOutcome;
    use chrono::NaiveDate;

    #[test]
    fn test_require_ticker() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert!(require_ticker("technical", &WorkItem::new("AMD", date)).is_ok());
        let err = require_ticker("technical", &WorkItem::new("  ", date)).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_complete_degraded_from_pending() {
        let tracker = PhaseTracker::new("technical");
        let record = TechnicalAnalysis::unavailable("AMD", "all collectors failed");
        let output = complete(tracker, record, "Analyze AMD".to_string(), "AMD").unwrap();

        assert_eq!(output.outcome, StageOutcome::Degraded);
        assert!(matches!(output.update.record, StageRecord::Technical(_)));
        let response = output.update.transcript.response.text().unwrap().to_string();
        assert!(response.starts_with("Market Analysis for AMD:\n\n{"));
    }

    #[test]
    fn test_complete_requires_gathered_data_for_extraction() {
        let tracker = PhaseTracker::new("technical");
        let mut record = TechnicalAnalysis::fallback("AMD", "x");
        record.set_quality(crate::records::Quality::Structured);
        let err = complete(tracker, record, String::new(), "AMD").unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
    }
}
