//! Analysis records produced by the stages
//!
//! Every record is a [`StructuredOutput`]: it carries its JSON schema for the
//! structured tier, a shape description for the parsed tier, and numeric
//! validation. Enumerated fields are Rust enums, so an unknown label fails
//! deserialization. Each record also knows how to build its static fallback.

mod advocacy;
mod fundamentals;
mod news;
mod synthesis;
mod technical;

pub use advocacy::{
    BearAction, BearCase, BullAction, BullCase, Catalysts, CounterArguments, DownsideDirection,
    DownsideRisks, RiskAcknowledgment, SignalEvidence, TimeHorizon, UpsideDirection,
};
pub use fundamentals::{
    FinancialHealth, FundamentalAnalysis, Growth, GrowthTrend, HealthGrade, Rating,
    Sustainability, Valuation, ValuationVerdict,
};
pub use news::{
    CompanyImpact, CostPressure, DemandOutlook, HighlightedArticle, MacroTheme, NewsAnalysis,
    RegulatoryRisk, ThemeDirection, ValuationImpact,
};
pub use synthesis::{
    ConsensusDirection, PositionSize, RecommendationTier, SynthesisDecision, TierAction,
};
pub use technical::{IndicatorReading, TechnicalAnalysis};

use agent_llm::{ExtractionTier, StructuredOutput, ValidationError};
use agent_llm::tools::schema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a record was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    /// Schema-enforced model output
    #[default]
    Structured,
    /// Parsed from raw model text
    Parsed,
    /// Static fallback
    Degraded,
}

impl Quality {
    /// Whether the record is a static fallback
    pub fn is_degraded(self) -> bool {
        self == Self::Degraded
    }
}

impl From<ExtractionTier> for Quality {
    fn from(tier: ExtractionTier) -> Self {
        match tier {
            ExtractionTier::Structured => Self::Structured,
            ExtractionTier::Parsed => Self::Parsed,
            ExtractionTier::Fallback => Self::Degraded,
        }
    }
}

/// Directional label shared by several records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Points up
    Bullish,
    /// Points down
    Bearish,
    /// No direction
    #[default]
    Neutral,
}

impl Signal {
    /// Serialized labels
    pub const LABELS: &'static [&'static str] = &["bullish", "bearish", "neutral"];
}

/// Direction over three horizons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HorizonOutlook {
    /// Days to weeks
    pub short_term: Signal,
    /// Weeks to months
    pub medium_term: Signal,
    /// Months to years
    pub long_term: Signal,
}

impl HorizonOutlook {
    pub(crate) fn json_schema() -> Value {
        schema::object(
            serde_json::json!({
                "short_term": schema::string_enum("Days to weeks outlook", Signal::LABELS),
                "medium_term": schema::string_enum("Weeks to months outlook", Signal::LABELS),
                "long_term": schema::string_enum("Months to years outlook", Signal::LABELS),
            }),
            &["short_term", "medium_term", "long_term"],
        )
    }
}

/// A record a stage writes to the work item
pub trait AnalysisRecord: StructuredOutput + Clone + PartialEq + std::fmt::Debug + Sync {
    /// Heading used in the stage transcript, e.g. `Market Analysis`
    const TITLE: &'static str;

    /// How the record was obtained
    fn quality(&self) -> Quality;

    /// Stamp the extraction outcome
    fn set_quality(&mut self, quality: Quality);

    /// Static record used when extraction fails
    fn fallback(ticker: &str, reason: &str) -> Self;

    /// Static record used when a stage has no evidence at all
    fn unavailable(ticker: &str, reason: &str) -> Self {
        Self::fallback(ticker, reason)
    }
}

pub(crate) fn check_scores(fields: &[(&str, f64)], max: f64) -> Result<(), ValidationError> {
    fields
        .iter()
        .try_for_each(|(field, value)| ValidationError::check_range(field, *value, 0.0, max))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::AnalysisRecord;

    /// Every record kind must survive a serialize/parse cycle and validate
    pub fn assert_round_trip<T: AnalysisRecord>(record: &T) {
        record.validate().unwrap();
        let text = serde_json::to_string_pretty(record).unwrap();
        let parsed: T = agent_llm::structured::parse_record(&text).unwrap();
        assert_eq!(&parsed, record);
    }

    /// Every schema is an object listing its required fields
    pub fn assert_schema_shape<T: AnalysisRecord>() {
        let schema = T::json_schema();
        assert_eq!(schema["type"], "object");
        let required = schema["required"].as_array().unwrap();
        assert!(!required.is_empty());
        for field in required {
            let field = field.as_str().unwrap();
            assert!(schema["properties"].get(field).is_some(), "{field}");
        }
        assert!(schema["properties"].get("quality").is_none());
    }
}
