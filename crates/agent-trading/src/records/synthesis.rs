//! Final investment decision record

use super::{AnalysisRecord, HorizonOutlook, Quality, check_scores};
use agent_llm::tools::schema;
use agent_llm::{StructuredOutput, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Which side the evidence favours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusDirection {
    Bullish,
    Bearish,
    Neutral,
    Mixed,
}

impl ConsensusDirection {
    /// Serialized labels
    pub const LABELS: &'static [&'static str] = &["bullish", "bearish", "neutral", "mixed"];

    /// Serialized label
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
            Self::Neutral => "neutral",
            Self::Mixed => "mixed",
        }
    }
}

impl std::fmt::Display for ConsensusDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action for one risk profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierAction {
    StrongBuy,
    Buy,
    Accumulate,
    Hold,
    Reduce,
    Sell,
    StrongSell,
}

impl TierAction {
    /// Serialized labels
    pub const LABELS: &'static [&'static str] = &[
        "strong_buy",
        "buy",
        "accumulate",
        "hold",
        "reduce",
        "sell",
        "strong_sell",
    ];
}

/// Position sizing relative to a full allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSize {
    Full,
    Half,
    Quarter,
    Minimal,
    Zero,
}

impl PositionSize {
    /// Serialized labels
    pub const LABELS: &'static [&'static str] = &["full", "half", "quarter", "minimal", "zero"];
}

/// Recommendation for one risk profile
///
/// The three tiers are chosen independently and need not agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationTier {
    pub action: TierAction,
    pub position_size: PositionSize,
    /// How to enter or exit, e.g. `Scale in over 3 days`
    pub entry_strategy: String,
    /// Stop level or condition, if any
    #[serde(default)]
    pub stop_loss: Option<String>,
    pub rationale: String,
}

impl RecommendationTier {
    fn hold(position_size: PositionSize, rationale: &str) -> Self {
        Self {
            action: TierAction::Hold,
            position_size,
            entry_strategy: "Wait for a complete analysis before acting".to_string(),
            stop_loss: None,
            rationale: rationale.to_string(),
        }
    }

    fn json_schema(profile: &str) -> Value {
        schema::object(
            json!({
                "action": schema::string_enum("Recommended action", TierAction::LABELS),
                "position_size": schema::string_enum("Position size", PositionSize::LABELS),
                "entry_strategy": schema::string("How to enter or exit the position"),
                "stop_loss": schema::nullable(schema::string("Stop-loss level or condition, if applicable")),
                "rationale": schema::string(&format!("2-3 sentences explaining the {profile} recommendation")),
            }),
            &["action", "position_size", "entry_strategy", "rationale"],
        )
    }
}

/// Output of the synthesis stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisDecision {
    pub executive_summary: String,
    pub market_thesis: String,
    pub fundamental_thesis: String,
    /// Strength of the bullish arguments in `[0, 10]`
    pub bull_case_strength: f64,
    /// Strength of the bearish arguments in `[0, 10]`
    pub bear_case_strength: f64,
    pub consensus_direction: ConsensusDirection,
    pub low_risk_recommendation: RecommendationTier,
    pub medium_risk_recommendation: RecommendationTier,
    pub high_risk_recommendation: RecommendationTier,
    pub time_horizon_outlook: HorizonOutlook,
    pub key_decision_factors: Vec<String>,
    pub monitoring_points: Vec<String>,
    /// Confidence in `[0, 1]`
    pub final_confidence: f64,
    /// How the record was obtained
    #[serde(default)]
    pub quality: Quality,
}

const SHAPE: &str = r#"{
  "executive_summary": "4-5 sentence synthesis of all analysis",
  "market_thesis": "2-3 sentences on the technical view",
  "fundamental_thesis": "2-3 sentences on the fundamental view",
  "bull_case_strength": number 0-10,
  "bear_case_strength": number 0-10,
  "consensus_direction": "bullish|bearish|neutral|mixed",
  "low_risk_recommendation": {"action": "strong_buy|buy|accumulate|hold|reduce|sell|strong_sell", "position_size": "full|half|quarter|minimal|zero", "entry_strategy": "string", "stop_loss": "string or null", "rationale": "string"},
  "medium_risk_recommendation": {same structure},
  "high_risk_recommendation": {same structure},
  "time_horizon_outlook": {"short_term": "bullish|bearish|neutral", "medium_term": "bullish|bearish|neutral", "long_term": "bullish|bearish|neutral"},
  "key_decision_factors": ["string"],
  "monitoring_points": ["string"],
  "final_confidence": number between 0 and 1
}"#;

impl StructuredOutput for SynthesisDecision {
    const NAME: &'static str = "investment_decision";
    const DESCRIPTION: &'static str =
        "Final risk-tiered investment decision weighing every upstream analysis";

    fn json_schema() -> Value {
        schema::object(
            json!({
                "executive_summary": schema::string("4-5 sentence synthesis of all analysis"),
                "market_thesis": schema::string("2-3 sentences on the overall technical view"),
                "fundamental_thesis": schema::string("2-3 sentences on the overall fundamental view"),
                "bull_case_strength": schema::bounded_number("Strength of bullish arguments", 0.0, 10.0),
                "bear_case_strength": schema::bounded_number("Strength of bearish arguments", 0.0, 10.0),
                "consensus_direction": schema::string_enum("Which side the evidence favours", ConsensusDirection::LABELS),
                "low_risk_recommendation": RecommendationTier::json_schema("conservative"),
                "medium_risk_recommendation": RecommendationTier::json_schema("moderate"),
                "high_risk_recommendation": RecommendationTier::json_schema("aggressive"),
                "time_horizon_outlook": HorizonOutlook::json_schema(),
                "key_decision_factors": schema::string_list("3-5 factors that drove the decision"),
                "monitoring_points": schema::string_list("3-5 things to watch that would change the view"),
                "final_confidence": schema::bounded_number("Overall confidence", 0.0, 1.0),
            }),
            &[
                "executive_summary",
                "market_thesis",
                "fundamental_thesis",
                "bull_case_strength",
                "bear_case_strength",
                "consensus_direction",
                "low_risk_recommendation",
                "medium_risk_recommendation",
                "high_risk_recommendation",
                "time_horizon_outlook",
                "key_decision_factors",
                "monitoring_points",
                "final_confidence",
            ],
        )
    }

    fn shape_hint() -> &'static str {
        SHAPE
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_scores(
            &[
                ("bull_case_strength", self.bull_case_strength),
                ("bear_case_strength", self.bear_case_strength),
            ],
            10.0,
        )?;
        ValidationError::check_unit("final_confidence", self.final_confidence)
    }
}

impl AnalysisRecord for SynthesisDecision {
    const TITLE: &'static str = "Final Investment Decision";

    fn quality(&self) -> Quality {
        self.quality
    }

    fn set_quality(&mut self, quality: Quality) {
        self.quality = quality;
    }

    fn fallback(ticker: &str, reason: &str) -> Self {
        let rationale = format!("Decision for {ticker} could not be structured: {reason}");
        Self {
            executive_summary: format!(
                "Synthesis for {ticker} did not complete. Holding until a full analysis is available."
            ),
            market_thesis: "Unavailable".to_string(),
            fundamental_thesis: "Unavailable".to_string(),
            bull_case_strength: 5.0,
            bear_case_strength: 5.0,
            consensus_direction: ConsensusDirection::Neutral,
            low_risk_recommendation: RecommendationTier::hold(PositionSize::Minimal, &rationale),
            medium_risk_recommendation: RecommendationTier::hold(PositionSize::Quarter, &rationale),
            high_risk_recommendation: RecommendationTier::hold(PositionSize::Half, &rationale),
            time_horizon_outlook: HorizonOutlook::default(),
            key_decision_factors: vec![format!("Synthesis failed: {reason}")],
            monitoring_points: vec!["Re-run the analysis".to_string()],
            final_confidence: 0.2,
            quality: Quality::Degraded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Signal;
    use crate::records::testing::{assert_round_trip, assert_schema_shape};

    fn tier(action: TierAction, size: PositionSize, stop: Option<&str>) -> RecommendationTier {
        RecommendationTier {
            action,
            position_size: size,
            entry_strategy: "Scale in over 3 days".to_string(),
            stop_loss: stop.map(str::to_string),
            rationale: "Fits the risk budget.".to_string(),
        }
    }

    #[test]
    fn test_round_trip_and_schema() {
        let record = SynthesisDecision {
            executive_summary: "Constructive setup with valuation risk.".to_string(),
            market_thesis: "Uptrend intact.".to_string(),
            fundamental_thesis: "Growth accelerating.".to_string(),
            bull_case_strength: 7.3,
            bear_case_strength: 4.6,
            consensus_direction: ConsensusDirection::Bullish,
            low_risk_recommendation: tier(TierAction::Hold, PositionSize::Quarter, None),
            medium_risk_recommendation: tier(TierAction::Accumulate, PositionSize::Half, Some("Close below 50-day SMA")),
            high_risk_recommendation: tier(TierAction::Buy, PositionSize::Full, Some("-8%")),
            time_horizon_outlook: HorizonOutlook {
                short_term: Signal::Neutral,
                medium_term: Signal::Bullish,
                long_term: Signal::Bullish,
            },
            key_decision_factors: vec!["Momentum".to_string()],
            monitoring_points: vec!["Gross margin".to_string()],
            final_confidence: 0.66,
            quality: Quality::Structured,
        };
        assert_round_trip(&record);
        assert_schema_shape::<SynthesisDecision>();
    }

    #[test]
    fn test_fallback() {
        let record = SynthesisDecision::fallback("AMD", "deadline");
        assert_round_trip(&record);
        assert_eq!(record.consensus_direction, ConsensusDirection::Neutral);
        assert_eq!(record.final_confidence, 0.2);
        assert_eq!(record.low_risk_recommendation.position_size, PositionSize::Minimal);
        assert_eq!(record.medium_risk_recommendation.position_size, PositionSize::Quarter);
        assert_eq!(record.high_risk_recommendation.position_size, PositionSize::Half);
        assert!(
            [
                &record.low_risk_recommendation,
                &record.medium_risk_recommendation,
                &record.high_risk_recommendation
            ]
            .iter()
            .all(|t| t.action == TierAction::Hold)
        );
    }

    #[test]
    fn test_consensus_labels() {
        for label in ConsensusDirection::LABELS {
            let parsed: ConsensusDirection = serde_json::from_value(json!(label)).unwrap();
            assert_eq!(parsed.as_str(), *label);
        }
    }
}
