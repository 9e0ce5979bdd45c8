//! Bull and bear advocacy records

use super::{AnalysisRecord, Quality};
use agent_llm::tools::schema;
use agent_llm::{StructuredOutput, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Expected upside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsideDirection {
    SignificantlyHigher,
    ModeratelyHigher,
    SlightlyHigher,
}

impl UpsideDirection {
    /// Serialized labels
    pub const LABELS: &'static [&'static str] =
        &["significantly_higher", "moderately_higher", "slightly_higher"];
}

/// Expected downside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownsideDirection {
    SignificantlyLower,
    ModeratelyLower,
    SlightlyLower,
}

impl DownsideDirection {
    /// Serialized labels
    pub const LABELS: &'static [&'static str] =
        &["significantly_lower", "moderately_lower", "slightly_lower"];
}

/// Horizon a thesis plays out over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeHorizon {
    ShortTerm,
    MediumTerm,
    LongTerm,
    MultiTimeframe,
}

impl TimeHorizon {
    /// Serialized labels
    pub const LABELS: &'static [&'static str] =
        &["short_term", "medium_term", "long_term", "multi_timeframe"];
}

/// Action the bull advocates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BullAction {
    StrongBuy,
    Buy,
    Accumulate,
}

impl BullAction {
    /// Serialized labels
    pub const LABELS: &'static [&'static str] = &["strong_buy", "buy", "accumulate"];
}

/// Action the bear advocates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BearAction {
    StrongSell,
    Sell,
    Avoid,
}

impl BearAction {
    /// Serialized labels
    pub const LABELS: &'static [&'static str] = &["strong_sell", "sell", "avoid"];
}

/// Signals pulled from upstream analyses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalEvidence {
    pub technical_signals: Vec<String>,
    pub fundamental_signals: Vec<String>,
}

/// Upcoming catalysts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalysts {
    /// Next one to three months
    pub near_term: Vec<String>,
    /// Six months and beyond
    pub long_term: Vec<String>,
}

/// Risks the bull concedes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAcknowledgment {
    pub key_risks: Vec<String>,
    pub risk_mitigation: String,
}

/// Risks the bear presses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DownsideRisks {
    pub near_term: Vec<String>,
    pub long_term: Vec<String>,
}

/// The bear's rebuttal of the bullish view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterArguments {
    pub bull_case_weaknesses: Vec<String>,
    pub why_bulls_are_wrong: String,
}

/// Output of the bull advocacy stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BullCase {
    pub thesis_summary: String,
    pub bullish_signals: SignalEvidence,
    pub catalysts: Catalysts,
    pub target_price_direction: UpsideDirection,
    pub time_horizon: TimeHorizon,
    pub risk_acknowledgment: RiskAcknowledgment,
    /// Conviction in `[0, 1]`
    pub conviction_score: f64,
    pub recommended_action: BullAction,
    /// How the record was obtained
    #[serde(default)]
    pub quality: Quality,
}

/// Output of the bear advocacy stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BearCase {
    pub thesis_summary: String,
    pub bearish_signals: SignalEvidence,
    pub downside_risks: DownsideRisks,
    pub target_price_direction: DownsideDirection,
    pub time_horizon: TimeHorizon,
    pub counter_arguments: CounterArguments,
    /// Conviction in `[0, 1]`
    pub conviction_score: f64,
    pub recommended_action: BearAction,
    /// How the record was obtained
    #[serde(default)]
    pub quality: Quality,
}

fn signal_evidence_schema(direction: &str) -> Value {
    schema::object(
        json!({
            "technical_signals": schema::string_list(&format!("3-5 {direction} technical signals")),
            "fundamental_signals": schema::string_list(&format!("3-5 {direction} fundamental signals")),
        }),
        &["technical_signals", "fundamental_signals"],
    )
}

fn horizon_list_schema(what: &str) -> Value {
    schema::object(
        json!({
            "near_term": schema::string_list(&format!("2-3 near-term {what} (1-3 months)")),
            "long_term": schema::string_list(&format!("2-3 long-term {what} (6+ months)")),
        }),
        &["near_term", "long_term"],
    )
}

const BULL_SHAPE: &str = r#"{
  "thesis_summary": "3-4 sentence bullish thesis",
  "bullish_signals": {"technical_signals": ["string"], "fundamental_signals": ["string"]},
  "catalysts": {"near_term": ["string"], "long_term": ["string"]},
  "target_price_direction": "significantly_higher|moderately_higher|slightly_higher",
  "time_horizon": "short_term|medium_term|long_term|multi_timeframe",
  "risk_acknowledgment": {"key_risks": ["string"], "risk_mitigation": "string"},
  "conviction_score": number between 0 and 1,
  "recommended_action": "strong_buy|buy|accumulate"
}"#;

const BEAR_SHAPE: &str = r#"{
  "thesis_summary": "3-4 sentence bearish thesis",
  "bearish_signals": {"technical_signals": ["string"], "fundamental_signals": ["string"]},
  "downside_risks": {"near_term": ["string"], "long_term": ["string"]},
  "target_price_direction": "significantly_lower|moderately_lower|slightly_lower",
  "time_horizon": "short_term|medium_term|long_term|multi_timeframe",
  "counter_arguments": {"bull_case_weaknesses": ["string"], "why_bulls_are_wrong": "string"},
  "conviction_score": number between 0 and 1,
  "recommended_action": "strong_sell|sell|avoid"
}"#;

impl StructuredOutput for BullCase {
    const NAME: &'static str = "bull_case";
    const DESCRIPTION: &'static str = "The strongest evidence-based case for buying the security";

    fn json_schema() -> Value {
        schema::object(
            json!({
                "thesis_summary": schema::string("3-4 sentence bullish thesis"),
                "bullish_signals": signal_evidence_schema("bullish"),
                "catalysts": horizon_list_schema("catalysts"),
                "target_price_direction": schema::string_enum("Expected price direction", UpsideDirection::LABELS),
                "time_horizon": schema::string_enum("Investment time horizon", TimeHorizon::LABELS),
                "risk_acknowledgment": schema::object(
                    json!({
                        "key_risks": schema::string_list("2-3 risks to the bull case"),
                        "risk_mitigation": schema::string("Why these risks are manageable"),
                    }),
                    &["key_risks", "risk_mitigation"],
                ),
                "conviction_score": schema::bounded_number("Conviction in the bull case", 0.0, 1.0),
                "recommended_action": schema::string_enum("Recommended action", BullAction::LABELS),
            }),
            &[
                "thesis_summary",
                "bullish_signals",
                "catalysts",
                "target_price_direction",
                "time_horizon",
                "risk_acknowledgment",
                "conviction_score",
                "recommended_action",
            ],
        )
    }

    fn shape_hint() -> &'static str {
        BULL_SHAPE
    }

    fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_unit("conviction_score", self.conviction_score)
    }
}

impl AnalysisRecord for BullCase {
    const TITLE: &'static str = "Bull Case";

    fn quality(&self) -> Quality {
        self.quality
    }

    fn set_quality(&mut self, quality: Quality) {
        self.quality = quality;
    }

    fn fallback(ticker: &str, reason: &str) -> Self {
        Self {
            thesis_summary: format!("Bull case for {ticker} could not be structured: {reason}."),
            bullish_signals: SignalEvidence::default(),
            catalysts: Catalysts::default(),
            target_price_direction: UpsideDirection::ModeratelyHigher,
            time_horizon: TimeHorizon::MediumTerm,
            risk_acknowledgment: RiskAcknowledgment {
                key_risks: vec!["Analysis incomplete".to_string()],
                risk_mitigation: "Review upstream analyses manually".to_string(),
            },
            conviction_score: 0.3,
            recommended_action: BullAction::Accumulate,
            quality: Quality::Degraded,
        }
    }
}

impl StructuredOutput for BearCase {
    const NAME: &'static str = "bear_case";
    const DESCRIPTION: &'static str =
        "The strongest evidence-based case for selling or avoiding the security";

    fn json_schema() -> Value {
        schema::object(
            json!({
                "thesis_summary": schema::string("3-4 sentence bearish thesis"),
                "bearish_signals": signal_evidence_schema("bearish"),
                "downside_risks": horizon_list_schema("risks"),
                "target_price_direction": schema::string_enum("Expected price direction", DownsideDirection::LABELS),
                "time_horizon": schema::string_enum("Investment time horizon", TimeHorizon::LABELS),
                "counter_arguments": schema::object(
                    json!({
                        "bull_case_weaknesses": schema::string_list("2-3 flaws in the bullish arguments"),
                        "why_bulls_are_wrong": schema::string("Why the bullish thesis fails"),
                    }),
                    &["bull_case_weaknesses", "why_bulls_are_wrong"],
                ),
                "conviction_score": schema::bounded_number("Conviction in the bear case", 0.0, 1.0),
                "recommended_action": schema::string_enum("Recommended action", BearAction::LABELS),
            }),
            &[
                "thesis_summary",
                "bearish_signals",
                "downside_risks",
                "target_price_direction",
                "time_horizon",
                "counter_arguments",
                "conviction_score",
                "recommended_action",
            ],
        )
    }

    fn shape_hint() -> &'static str {
        BEAR_SHAPE
    }

    fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_unit("conviction_score", self.conviction_score)
    }
}

impl AnalysisRecord for BearCase {
    const TITLE: &'static str = "Bear Case";

    fn quality(&self) -> Quality {
        self.quality
    }

    fn set_quality(&mut self, quality: Quality) {
        self.quality = quality;
    }

    fn fallback(ticker: &str, reason: &str) -> Self {
        Self {
            thesis_summary: format!("Bear case for {ticker} could not be structured: {reason}."),
            bearish_signals: SignalEvidence::default(),
            downside_risks: DownsideRisks::default(),
            target_price_direction: DownsideDirection::ModeratelyLower,
            time_horizon: TimeHorizon::MediumTerm,
            counter_arguments: CounterArguments {
                bull_case_weaknesses: vec!["Analysis incomplete".to_string()],
                why_bulls_are_wrong: "Unable to complete the bear analysis".to_string(),
            },
            conviction_score: 0.3,
            recommended_action: BearAction::Avoid,
            quality: Quality::Degraded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::testing::{assert_round_trip, assert_schema_shape};

    #[test]
    fn test_bull_round_trip() {
        let record = BullCase {
            thesis_summary: "Share gains in servers continue.".to_string(),
            bullish_signals: SignalEvidence {
                technical_signals: vec!["Golden cross".to_string()],
                fundamental_signals: vec!["Margin expansion".to_string()],
            },
            catalysts: Catalysts {
                near_term: vec!["Earnings".to_string()],
                long_term: vec!["AI accelerators".to_string()],
            },
            target_price_direction: UpsideDirection::SignificantlyHigher,
            time_horizon: TimeHorizon::MultiTimeframe,
            risk_acknowledgment: RiskAcknowledgment {
                key_risks: vec!["Valuation".to_string()],
                risk_mitigation: "Growth supports multiple".to_string(),
            },
            conviction_score: 0.81,
            recommended_action: BullAction::Buy,
            quality: Quality::Structured,
        };
        assert_round_trip(&record);
        assert_schema_shape::<BullCase>();
    }

    #[test]
    fn test_bear_round_trip() {
        let record = BearCase {
            thesis_summary: "Cyclical peak risk.".to_string(),
            bearish_signals: SignalEvidence::default(),
            downside_risks: DownsideRisks {
                near_term: vec!["Guide down".to_string()],
                long_term: vec!["Competition".to_string()],
            },
            target_price_direction: DownsideDirection::SlightlyLower,
            time_horizon: TimeHorizon::ShortTerm,
            counter_arguments: CounterArguments {
                bull_case_weaknesses: vec!["Priced in".to_string()],
                why_bulls_are_wrong: "Expectations already reflect growth".to_string(),
            },
            conviction_score: 0.55,
            recommended_action: BearAction::Sell,
            quality: Quality::Parsed,
        };
        assert_round_trip(&record);
        assert_schema_shape::<BearCase>();
    }

    #[test]
    fn test_fallbacks() {
        let bull = BullCase::fallback("AMD", "timeout");
        assert_round_trip(&bull);
        assert_eq!(bull.target_price_direction, UpsideDirection::ModeratelyHigher);
        assert_eq!(bull.recommended_action, BullAction::Accumulate);
        assert_eq!(bull.conviction_score, 0.3);

        let bear = BearCase::fallback("AMD", "timeout");
        assert_round_trip(&bear);
        assert_eq!(bear.target_price_direction, DownsideDirection::ModeratelyLower);
        assert_eq!(bear.recommended_action, BearAction::Avoid);
        assert_eq!(bear.time_horizon, TimeHorizon::MediumTerm);
    }
}
