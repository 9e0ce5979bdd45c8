//! The work item threaded through the analysis pipeline

use crate::config::RunOptions;
use crate::records::{
    AnalysisRecord, BearCase, BullCase, ConsensusDirection, FundamentalAnalysis, NewsAnalysis,
    Quality, SynthesisDecision, TechnicalAnalysis,
};
use agent_core::WorkState;
use agent_llm::Message;
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// A validated record together with its serialized form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis<T> {
    /// Structured value
    pub record: T,
    /// Pretty-printed JSON, embedded verbatim in downstream prompts
    pub serialized: String,
}

impl<T: AnalysisRecord> Analysis<T> {
    /// Serialize `record`
    pub fn new(record: T) -> agent_core::Result<Self> {
        let serialized = serde_json::to_string_pretty(&record)?;
        Ok(Self { record, serialized })
    }

    /// Parse a serialized record back
    pub fn parse(serialized: &str) -> agent_core::Result<Self> {
        let record = serde_json::from_str(serialized)?;
        Ok(Self {
            record,
            serialized: serialized.to_string(),
        })
    }

    /// How the record was obtained
    pub fn quality(&self) -> Quality {
        self.record.quality()
    }
}

/// The last request/response pair, replaced by every stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exchange {
    /// What the stage was asked to do
    pub request: Message,
    /// What it produced
    pub response: Message,
}

impl Exchange {
    /// Build a user/assistant pair
    pub fn new(request: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            request: Message::user(request),
            response: Message::assistant(response),
        }
    }
}

/// The record one stage produced
#[derive(Debug, Clone)]
pub enum StageRecord {
    News(Analysis<NewsAnalysis>),
    Technical(Analysis<TechnicalAnalysis>),
    Fundamentals(Analysis<FundamentalAnalysis>),
    Bull(Analysis<BullCase>),
    Bear(Analysis<BearCase>),
    Synthesis(Analysis<SynthesisDecision>),
}

/// Records that own a slot on the [`WorkItem`]
pub trait RecordSlot: AnalysisRecord {
    /// Wrap an analysis for [`WorkItem::apply`]
    fn into_stage_record(analysis: Analysis<Self>) -> StageRecord;
}

macro_rules! record_slot {
    ($record:ty => $variant:ident) => {
        impl RecordSlot for $record {
            fn into_stage_record(analysis: Analysis<Self>) -> StageRecord {
                StageRecord::$variant(analysis)
            }
        }
    };
}

record_slot!(NewsAnalysis => News);
record_slot!(TechnicalAnalysis => Technical);
record_slot!(FundamentalAnalysis => Fundamentals);
record_slot!(BullCase => Bull);
record_slot!(BearCase => Bear);
record_slot!(SynthesisDecision => Synthesis);

/// Partial update returned by a stage
#[derive(Debug, Clone)]
pub struct WorkItemUpdate {
    /// The new record
    pub record: StageRecord,
    /// Replaces the work item's transcript
    pub transcript: Exchange,
}

/// Shared state of one pipeline run
///
/// Created with only the ticker and date set. Every stage fills exactly one
/// record slot and replaces the transcript.
#[derive(Debug, Clone, Serialize)]
pub struct WorkItem {
    /// Identifies this run in logs
    pub run_id: Uuid,
    /// Upper-cased ticker symbol
    pub ticker: String,
    /// Analysis date
    pub as_of: NaiveDate,
    /// Per-run tunables
    pub options: RunOptions,
    pub news: Option<Analysis<NewsAnalysis>>,
    pub technical: Option<Analysis<TechnicalAnalysis>>,
    pub fundamentals: Option<Analysis<FundamentalAnalysis>>,
    pub bull: Option<Analysis<BullCase>>,
    pub bear: Option<Analysis<BearCase>>,
    pub synthesis: Option<Analysis<SynthesisDecision>>,
    /// Last stage's exchange
    pub transcript: Option<Exchange>,
}

impl WorkItem {
    /// Create a work item for `ticker` on `as_of`
    pub fn new(ticker: &str, as_of: NaiveDate) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            ticker: ticker.trim().to_uppercase(),
            as_of,
            options: RunOptions::default(),
            news: None,
            technical: None,
            fundamentals: None,
            bull: None,
            bear: None,
            synthesis: None,
            transcript: None,
        }
    }

    /// Replace the per-run tunables
    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Final consensus direction
    pub fn decision(&self) -> Option<ConsensusDirection> {
        self.synthesis
            .as_ref()
            .map(|s| s.record.consensus_direction)
    }

    /// Final confidence in `[0, 1]`
    pub fn confidence(&self) -> Option<f64> {
        self.synthesis.as_ref().map(|s| s.record.final_confidence)
    }

    /// Executive summary of the decision
    pub fn rationale(&self) -> Option<&str> {
        self.synthesis
            .as_ref()
            .map(|s| s.record.executive_summary.as_str())
    }

    /// Serialized records present, in stage order
    pub fn serialized_records(&self) -> Vec<(&'static str, &str)> {
        [
            ("news", self.news.as_ref().map(|a| a.serialized.as_str())),
            ("technical", self.technical.as_ref().map(|a| a.serialized.as_str())),
            ("fundamentals", self.fundamentals.as_ref().map(|a| a.serialized.as_str())),
            ("bull", self.bull.as_ref().map(|a| a.serialized.as_str())),
            ("bear", self.bear.as_ref().map(|a| a.serialized.as_str())),
            ("synthesis", self.synthesis.as_ref().map(|a| a.serialized.as_str())),
        ]
        .into_iter()
        .filter_map(|(name, serialized)| serialized.map(|s| (name, s)))
        .collect()
    }

    /// Quality of each record present, in stage order
    pub fn qualities(&self) -> Vec<(&'static str, Quality)> {
        [
            ("news", self.news.as_ref().map(Analysis::quality)),
            ("technical", self.technical.as_ref().map(Analysis::quality)),
            ("fundamentals", self.fundamentals.as_ref().map(Analysis::quality)),
            ("bull", self.bull.as_ref().map(Analysis::quality)),
            ("bear", self.bear.as_ref().map(Analysis::quality)),
            ("synthesis", self.synthesis.as_ref().map(Analysis::quality)),
        ]
        .into_iter()
        .filter_map(|(name, quality)| quality.map(|q| (name, q)))
        .collect()
    }
}

impl WorkState for WorkItem {
    type Update = WorkItemUpdate;

    fn apply(&mut self, update: WorkItemUpdate) {
        match update.record {
            StageRecord::News(analysis) => self.news = Some(analysis),
            StageRecord::Technical(analysis) => self.technical = Some(analysis),
            StageRecord::Fundamentals(analysis) => self.fundamentals = Some(analysis),
            StageRecord::Bull(analysis) => self.bull = Some(analysis),
            StageRecord::Bear(analysis) => self.bear = Some(analysis),
            StageRecord::Synthesis(analysis) => self.synthesis = Some(analysis),
        }
        self.transcript = Some(update.transcript);
    }
}
