//! Technical analysis record

use super::{AnalysisRecord, HorizonOutlook, Quality, Signal};
use agent_llm::tools::schema;
use agent_llm::{StructuredOutput, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// One indicator the analyst chose to report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReading {
    /// Indicator name, e.g. `RSI`
    pub name: String,
    /// Current value
    pub value: f64,
    /// What the value means right now
    pub interpretation: String,
    /// Direction it points to
    pub signal: Signal,
}

/// Output of the technical stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalAnalysis {
    /// Two to three sentence summary of market conditions
    pub analysis_summary: String,
    /// The most relevant indicators
    pub selected_indicators: Vec<IndicatorReading>,
    /// Trend over three horizons
    pub trend_analysis: HorizonOutlook,
    /// Actionable insights
    pub key_insights: Vec<String>,
    /// Risks read from the technical picture
    pub risk_factors: Vec<String>,
    /// Overall sentiment
    pub market_sentiment: Signal,
    /// Confidence in `[0, 1]`
    pub confidence_score: f64,
    /// How the record was obtained
    #[serde(default)]
    pub quality: Quality,
}

impl TechnicalAnalysis {
    fn degraded(summary: String, insight: String, risk: &str, confidence: f64) -> Self {
        Self {
            analysis_summary: summary,
            selected_indicators: Vec::new(),
            trend_analysis: HorizonOutlook::default(),
            key_insights: vec![insight],
            risk_factors: vec![risk.to_string()],
            market_sentiment: Signal::Neutral,
            confidence_score: confidence,
            quality: Quality::Degraded,
        }
    }
}

const SHAPE: &str = r#"{
  "analysis_summary": "2-3 sentence summary of current market conditions",
  "selected_indicators": [
    {"name": "string", "value": number, "interpretation": "string", "signal": "bullish|bearish|neutral"}
  ],
  "trend_analysis": {"short_term": "bullish|bearish|neutral", "medium_term": "bullish|bearish|neutral", "long_term": "bullish|bearish|neutral"},
  "key_insights": ["string"],
  "risk_factors": ["string"],
  "market_sentiment": "bullish|bearish|neutral",
  "confidence_score": number between 0 and 1
}"#;

impl StructuredOutput for TechnicalAnalysis {
    const NAME: &'static str = "technical_analysis";
    const DESCRIPTION: &'static str =
        "Technical analysis of price action and indicators for one security";

    fn json_schema() -> Value {
        let indicator = schema::object(
            json!({
                "name": schema::string("Indicator name (e.g. RSI, MACD, SMA_50)"),
                "value": schema::number("Current indicator value"),
                "interpretation": schema::string("What this indicator shows right now"),
                "signal": schema::string_enum("Signal from this indicator", Signal::LABELS),
            }),
            &["name", "value", "interpretation", "signal"],
        );

        schema::object(
            json!({
                "analysis_summary": schema::string("2-3 sentence summary of current market conditions"),
                "selected_indicators": schema::array("Up to 8 most relevant indicators", indicator),
                "trend_analysis": HorizonOutlook::json_schema(),
                "key_insights": schema::string_list("3-5 key actionable insights"),
                "risk_factors": schema::string_list("2-3 technical risk factors"),
                "market_sentiment": schema::string_enum("Overall market sentiment", Signal::LABELS),
                "confidence_score": schema::bounded_number("Confidence in the analysis", 0.0, 1.0),
            }),
            &[
                "analysis_summary",
                "selected_indicators",
                "trend_analysis",
                "key_insights",
                "risk_factors",
                "market_sentiment",
                "confidence_score",
            ],
        )
    }

    fn shape_hint() -> &'static str {
        SHAPE
    }

    fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_unit("confidence_score", self.confidence_score)?;
        for indicator in &self.selected_indicators {
            if !indicator.value.is_finite() {
                return Err(ValidationError::new(
                    "selected_indicators.value",
                    format!("{} is not a finite number", indicator.name),
                ));
            }
        }
        Ok(())
    }
}

impl AnalysisRecord for TechnicalAnalysis {
    const TITLE: &'static str = "Market Analysis";

    fn quality(&self) -> Quality {
        self.quality
    }

    fn set_quality(&mut self, quality: Quality) {
        self.quality = quality;
    }

    fn fallback(ticker: &str, reason: &str) -> Self {
        Self::degraded(
            format!("Technical analysis for {ticker} could not be structured: {reason}."),
            format!("Extraction failed: {reason}"),
            "Analysis unavailable; treat technical signals with caution",
            0.3,
        )
    }

    fn unavailable(ticker: &str, reason: &str) -> Self {
        Self::degraded(
            format!("Unable to analyze {ticker} due to data fetching error."),
            format!("Data error: {reason}"),
            "Unable to fetch market data",
            0.0,
        )
    }
}
