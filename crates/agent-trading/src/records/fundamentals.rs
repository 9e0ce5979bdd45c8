//! Fundamental analysis record

use super::{AnalysisRecord, Quality, check_scores};
use agent_llm::tools::schema;
use agent_llm::{StructuredOutput, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Verdict on the current valuation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationVerdict {
    /// Below fair value
    Undervalued,
    /// Near fair value
    FairlyValued,
    /// Above fair value
    Overvalued,
    /// Not enough data to judge
    InsufficientData,
}

impl ValuationVerdict {
    /// Serialized labels
    pub const LABELS: &'static [&'static str] =
        &["undervalued", "fairly_valued", "overvalued", "insufficient_data"];
}

/// Overall balance-sheet grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthGrade {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl HealthGrade {
    /// Serialized labels
    pub const LABELS: &'static [&'static str] = &["excellent", "good", "fair", "poor", "critical"];
}

/// Direction of a growth series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthTrend {
    Accelerating,
    Steady,
    Slowing,
    Declining,
    Volatile,
    Uncertain,
}

impl GrowthTrend {
    /// Serialized labels
    pub const LABELS: &'static [&'static str] = &[
        "accelerating",
        "steady",
        "slowing",
        "declining",
        "volatile",
        "uncertain",
    ];
}

/// How durable growth looks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sustainability {
    High,
    Medium,
    Low,
    Uncertain,
}

impl Sustainability {
    /// Serialized labels
    pub const LABELS: &'static [&'static str] = &["high", "medium", "low", "uncertain"];
}

/// Five-step investment rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl Rating {
    /// Serialized labels
    pub const LABELS: &'static [&'static str] = &["strong_buy", "buy", "hold", "sell", "strong_sell"];
}

/// Valuation metrics and verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    /// Price to earnings
    #[serde(default)]
    pub pe_ratio: Option<f64>,
    /// Price/earnings to growth
    #[serde(default)]
    pub peg_ratio: Option<f64>,
    /// Price to book
    #[serde(default)]
    pub price_to_book: Option<f64>,
    /// Verdict
    pub valuation_verdict: ValuationVerdict,
    /// Two to three sentences of reasoning
    pub valuation_reasoning: String,
}

/// Financial health scores, each in `[0, 10]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialHealth {
    pub liquidity_score: f64,
    pub leverage_score: f64,
    pub profitability_score: f64,
    pub cash_flow_score: f64,
    /// Overall grade
    pub overall_health: HealthGrade,
    /// Two to three sentences of reasoning
    pub health_reasoning: String,
}

/// Growth trajectory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Growth {
    pub revenue_growth_trend: GrowthTrend,
    pub earnings_growth_trend: GrowthTrend,
    pub growth_sustainability: Sustainability,
    /// Key growth drivers
    pub growth_drivers: Vec<String>,
}

/// Output of the fundamentals stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalAnalysis {
    pub valuation: Valuation,
    pub financial_health: FinancialHealth,
    pub growth: Growth,
    pub key_strengths: Vec<String>,
    pub red_flags: Vec<String>,
    pub competitive_advantages: Vec<String>,
    pub fundamental_rating: Rating,
    /// Confidence in `[0, 1]`
    pub confidence_score: f64,
    /// How the record was obtained
    #[serde(default)]
    pub quality: Quality,
}

impl FundamentalAnalysis {
    fn degraded(score: f64, grade: HealthGrade, reasoning: String, flag: String, confidence: f64) -> Self {
        Self {
            valuation: Valuation {
                pe_ratio: None,
                peg_ratio: None,
                price_to_book: None,
                valuation_verdict: ValuationVerdict::InsufficientData,
                valuation_reasoning: reasoning.clone(),
            },
            financial_health: FinancialHealth {
                liquidity_score: score,
                leverage_score: score,
                profitability_score: score,
                cash_flow_score: score,
                overall_health: grade,
                health_reasoning: reasoning,
            },
            growth: Growth {
                revenue_growth_trend: GrowthTrend::Uncertain,
                earnings_growth_trend: GrowthTrend::Uncertain,
                growth_sustainability: Sustainability::Uncertain,
                growth_drivers: Vec::new(),
            },
            key_strengths: Vec::new(),
            red_flags: vec![flag],
            competitive_advantages: Vec::new(),
            fundamental_rating: Rating::Hold,
            confidence_score: confidence,
            quality: Quality::Degraded,
        }
    }
}

const SHAPE: &str = r#"{
  "valuation": {
    "pe_ratio": number or null,
    "peg_ratio": number or null,
    "price_to_book": number or null,
    "valuation_verdict": "undervalued|fairly_valued|overvalued|insufficient_data",
    "valuation_reasoning": "string"
  },
  "financial_health": {
    "liquidity_score": number 0-10,
    "leverage_score": number 0-10,
    "profitability_score": number 0-10,
    "cash_flow_score": number 0-10,
    "overall_health": "excellent|good|fair|poor|critical",
    "health_reasoning": "string"
  },
  "growth": {
    "revenue_growth_trend": "accelerating|steady|slowing|declining|volatile|uncertain",
    "earnings_growth_trend": "accelerating|steady|slowing|declining|volatile|uncertain",
    "growth_sustainability": "high|medium|low|uncertain",
    "growth_drivers": ["string"]
  },
  "key_strengths": ["string"],
  "red_flags": ["string"],
  "competitive_advantages": ["string"],
  "fundamental_rating": "strong_buy|buy|hold|sell|strong_sell",
  "confidence_score": number between 0 and 1
}"#;

impl StructuredOutput for FundamentalAnalysis {
    const NAME: &'static str = "fundamental_analysis";
    const DESCRIPTION: &'static str =
        "Fundamental analysis of valuation, financial health and growth for one company";

    fn json_schema() -> Value {
        let score = |what: &str| schema::bounded_number(what, 0.0, 10.0);
        schema::object(
            json!({
                "valuation": schema::object(
                    json!({
                        "pe_ratio": schema::nullable(schema::number("Price to earnings ratio")),
                        "peg_ratio": schema::nullable(schema::number("PEG ratio")),
                        "price_to_book": schema::nullable(schema::number("Price to book ratio")),
                        "valuation_verdict": schema::string_enum("Valuation verdict", ValuationVerdict::LABELS),
                        "valuation_reasoning": schema::string("2-3 sentences on valuation"),
                    }),
                    &["valuation_verdict", "valuation_reasoning"],
                ),
                "financial_health": schema::object(
                    json!({
                        "liquidity_score": score("Liquidity score (0-10)"),
                        "leverage_score": score("Leverage score, higher is less leveraged (0-10)"),
                        "profitability_score": score("Profitability score (0-10)"),
                        "cash_flow_score": score("Cash flow score (0-10)"),
                        "overall_health": schema::string_enum("Overall financial health", HealthGrade::LABELS),
                        "health_reasoning": schema::string("2-3 sentences on financial health"),
                    }),
                    &[
                        "liquidity_score",
                        "leverage_score",
                        "profitability_score",
                        "cash_flow_score",
                        "overall_health",
                        "health_reasoning",
                    ],
                ),
                "growth": schema::object(
                    json!({
                        "revenue_growth_trend": schema::string_enum("Revenue growth trend", GrowthTrend::LABELS),
                        "earnings_growth_trend": schema::string_enum("Earnings growth trend", GrowthTrend::LABELS),
                        "growth_sustainability": schema::string_enum("Growth sustainability", Sustainability::LABELS),
                        "growth_drivers": schema::string_list("2-4 key growth drivers"),
                    }),
                    &[
                        "revenue_growth_trend",
                        "earnings_growth_trend",
                        "growth_sustainability",
                        "growth_drivers",
                    ],
                ),
                "key_strengths": schema::string_list("3-5 fundamental strengths"),
                "red_flags": schema::string_list("0-5 concerns or warning signs"),
                "competitive_advantages": schema::string_list("2-3 competitive moats"),
                "fundamental_rating": schema::string_enum("Investment rating", Rating::LABELS),
                "confidence_score": schema::bounded_number("Confidence in the analysis", 0.0, 1.0),
            }),
            &[
                "valuation",
                "financial_health",
                "growth",
                "key_strengths",
                "red_flags",
                "competitive_advantages",
                "fundamental_rating",
                "confidence_score",
            ],
        )
    }

    fn shape_hint() -> &'static str {
        SHAPE
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let health = &self.financial_health;
        check_scores(
            &[
                ("financial_health.liquidity_score", health.liquidity_score),
                ("financial_health.leverage_score", health.leverage_score),
                ("financial_health.profitability_score", health.profitability_score),
                ("financial_health.cash_flow_score", health.cash_flow_score),
            ],
            10.0,
        )?;

        for (field, ratio) in [
            ("valuation.pe_ratio", self.valuation.pe_ratio),
            ("valuation.peg_ratio", self.valuation.peg_ratio),
            ("valuation.price_to_book", self.valuation.price_to_book),
        ] {
            if ratio.is_some_and(|r| !r.is_finite()) {
                return Err(ValidationError::new(field, "not a finite number"));
            }
        }

        ValidationError::check_unit("confidence_score", self.confidence_score)
    }
}

impl AnalysisRecord for FundamentalAnalysis {
    const TITLE: &'static str = "Fundamental Analysis";

    fn quality(&self) -> Quality {
        self.quality
    }

    fn set_quality(&mut self, quality: Quality) {
        self.quality = quality;
    }

    fn fallback(ticker: &str, reason: &str) -> Self {
        Self::degraded(
            5.0,
            HealthGrade::Fair,
            format!("Fundamental analysis for {ticker} could not be structured."),
            format!("Extraction failed: {reason}"),
            0.3,
        )
    }

    fn unavailable(ticker: &str, reason: &str) -> Self {
        Self::degraded(
            0.0,
            HealthGrade::Critical,
            format!("Unable to analyze {ticker} fundamentals due to data fetching error."),
            format!("Data error: {reason}"),
            0.0,
        )
    }
}
