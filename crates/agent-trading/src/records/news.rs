//! News analysis record

use super::{AnalysisRecord, Quality, Signal};
use crate::config::MAX_LOOKBACK_DAYS;
use crate::evidence::{CoverageStats, ImpactScope, Selection};
use agent_llm::tools::schema;
use agent_llm::{StructuredOutput, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

const DEFAULT_LOOKBACK_DAYS: u32 = 7;

/// Net effect of a macro or sector theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeDirection {
    Tailwind,
    Headwind,
    Mixed,
}

impl ThemeDirection {
    /// Serialized labels
    pub const LABELS: &'static [&'static str] = &["tailwind", "headwind", "mixed"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandOutlook {
    Positive,
    Negative,
    Neutral,
    Uncertain,
}

impl DemandOutlook {
    /// Serialized labels
    pub const LABELS: &'static [&'static str] = &["positive", "negative", "neutral", "uncertain"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostPressure {
    Increasing,
    Decreasing,
    Stable,
    Uncertain,
}

impl CostPressure {
    /// Serialized labels
    pub const LABELS: &'static [&'static str] = &["increasing", "decreasing", "stable", "uncertain"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegulatoryRisk {
    Elevated,
    Moderate,
    Low,
    Uncertain,
}

impl RegulatoryRisk {
    /// Serialized labels
    pub const LABELS: &'static [&'static str] = &["elevated", "moderate", "low", "uncertain"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationImpact {
    Expansion,
    Compression,
    Neutral,
    Uncertain,
}

impl ValuationImpact {
    /// Serialized labels
    pub const LABELS: &'static [&'static str] = &["expansion", "compression", "neutral", "uncertain"];
}

/// A theme running through the kept articles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroTheme {
    pub theme: String,
    pub direction: ThemeDirection,
    /// Supporting articles among those kept
    pub evidence_count: u32,
    pub representative_titles: Vec<String>,
}

/// Company-specific impact synthesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyImpact {
    pub demand_outlook: DemandOutlook,
    pub cost_pressure: CostPressure,
    pub regulatory_risk: RegulatoryRisk,
    pub valuation_impact: ValuationImpact,
    pub reasoning: String,
}

impl CompanyImpact {
    fn uncertain(reasoning: &str) -> Self {
        Self {
            demand_outlook: DemandOutlook::Uncertain,
            cost_pressure: CostPressure::Uncertain,
            regulatory_risk: RegulatoryRisk::Uncertain,
            valuation_impact: ValuationImpact::Uncertain,
            reasoning: reasoning.to_string(),
        }
    }
}

/// One high-signal article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightedArticle {
    pub title: String,
    pub published_at: String,
    pub source: String,
    pub url: String,
    pub tags: Vec<String>,
    pub sentiment: Signal,
    pub impact_scope: ImpactScope,
    /// Relevance in `[0, 1]`
    pub relevance_score: f64,
    /// Short abstractive summary
    pub summary: String,
}

/// Output of the news stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsAnalysis {
    pub analysis_summary: String,
    /// Days looked back, `1..=30`
    pub lookback_window_days: u32,
    /// Overwritten with the selector's counts after extraction
    #[serde(default)]
    pub coverage_stats: CoverageStats,
    pub macro_themes: Vec<MacroTheme>,
    pub company_impact: CompanyImpact,
    pub catalysts: Vec<String>,
    pub risk_radar: Vec<String>,
    pub overall_sentiment: Signal,
    /// Confidence in `[0, 1]`
    pub confidence_score: f64,
    pub highlighted_articles: Vec<HighlightedArticle>,
    /// Distinct sources among the kept articles
    #[serde(default)]
    pub sources: Vec<String>,
    /// How the record was obtained
    #[serde(default)]
    pub quality: Quality,
}

impl NewsAnalysis {
    /// Degraded record for a window with no relevant coverage
    pub fn no_coverage(ticker: &str, lookback_days: u32, raw_articles: usize) -> Self {
        Self {
            analysis_summary: format!(
                "No company-relevant news for {ticker} in the last {lookback_days} days after filtering."
            ),
            lookback_window_days: lookback_days,
            coverage_stats: CoverageStats {
                raw_articles,
                ..CoverageStats::default()
            },
            macro_themes: Vec::new(),
            company_impact: CompanyImpact::uncertain(
                "Insufficient company-relevant coverage in the lookback window.",
            ),
            catalysts: Vec::new(),
            risk_radar: Vec::new(),
            overall_sentiment: Signal::Neutral,
            confidence_score: 0.15,
            highlighted_articles: Vec::new(),
            sources: Vec::new(),
            quality: Quality::Degraded,
        }
    }

    /// Replace the counts and sources with those of `selection`
    pub fn with_coverage(mut self, selection: &Selection, lookback_days: u32) -> Self {
        self.lookback_window_days = lookback_days;
        self.coverage_stats = selection.coverage();
        self.sources.clone_from(&selection.sources);
        self
    }
}

const SHAPE: &str = r#"{
  "analysis_summary": "3-4 sentence executive summary grounded in the kept news",
  "lookback_window_days": integer 1-30,
  "coverage_stats": {"articles": number, "sources": number, "unique_topics": number, "raw_articles": number},
  "macro_themes": [
    {"theme": "string", "direction": "tailwind|headwind|mixed", "evidence_count": number, "representative_titles": ["string"]}
  ],
  "company_impact": {
    "demand_outlook": "positive|negative|neutral|uncertain",
    "cost_pressure": "increasing|decreasing|stable|uncertain",
    "regulatory_risk": "elevated|moderate|low|uncertain",
    "valuation_impact": "expansion|compression|neutral|uncertain",
    "reasoning": "2-3 sentences grounded in kept news"
  },
  "catalysts": ["string"],
  "risk_radar": ["string"],
  "overall_sentiment": "bullish|bearish|neutral",
  "confidence_score": number between 0 and 1,
  "highlighted_articles": [
    {"title": "string", "published_at": "ISO-8601", "source": "string", "url": "string", "tags": ["string"],
     "sentiment": "bullish|bearish|neutral", "impact_scope": "company|sector|macro", "relevance_score": number between 0 and 1, "summary": "string"}
  ],
  "sources": ["string"]
}"#;

impl StructuredOutput for NewsAnalysis {
    const NAME: &'static str = "news_analysis";
    const DESCRIPTION: &'static str =
        "Company-relevant news analysis grounded in a filtered set of recent articles";

    fn json_schema() -> Value {
        let article = schema::object(
            json!({
                "title": schema::string("Headline"),
                "published_at": schema::string("ISO-8601 publish time"),
                "source": schema::string("Publisher"),
                "url": schema::string("Canonical URL"),
                "tags": schema::string_list("1-5 topic tags"),
                "sentiment": schema::string_enum("Article-level sentiment", Signal::LABELS),
                "impact_scope": schema::string_enum("Scope of impact", ImpactScope::LABELS),
                "relevance_score": schema::bounded_number("Relevance to the company", 0.0, 1.0),
                "summary": schema::string("Summary of at most 60 words"),
            }),
            &[
                "title",
                "published_at",
                "source",
                "url",
                "tags",
                "sentiment",
                "impact_scope",
                "relevance_score",
                "summary",
            ],
        );
        let theme = schema::object(
            json!({
                "theme": schema::string("Short name of the theme"),
                "direction": schema::string_enum("Net impact direction", ThemeDirection::LABELS),
                "evidence_count": schema::count("Supporting articles among those kept"),
                "representative_titles": schema::string_list("1-3 representative headlines"),
            }),
            &["theme", "direction", "evidence_count", "representative_titles"],
        );

        schema::object(
            json!({
                "analysis_summary": schema::string("3-4 sentence executive summary"),
                "lookback_window_days": schema::bounded_integer("Days looked back", 1, i64::from(MAX_LOOKBACK_DAYS)),
                "coverage_stats": schema::object(
                    json!({
                        "articles": schema::count("Articles kept"),
                        "sources": schema::count("Distinct sources kept"),
                        "unique_topics": schema::count("Estimated distinct topics"),
                        "raw_articles": schema::count("Articles received"),
                    }),
                    &["articles", "sources", "unique_topics", "raw_articles"],
                ),
                "macro_themes": schema::array("2-5 macro or sector themes", theme),
                "company_impact": schema::object(
                    json!({
                        "demand_outlook": schema::string_enum("Demand outlook", DemandOutlook::LABELS),
                        "cost_pressure": schema::string_enum("Cost pressure", CostPressure::LABELS),
                        "regulatory_risk": schema::string_enum("Regulatory risk", RegulatoryRisk::LABELS),
                        "valuation_impact": schema::string_enum("Valuation impact", ValuationImpact::LABELS),
                        "reasoning": schema::string("2-3 sentences grounded in kept news"),
                    }),
                    &[
                        "demand_outlook",
                        "cost_pressure",
                        "regulatory_risk",
                        "valuation_impact",
                        "reasoning",
                    ],
                ),
                "catalysts": schema::string_list("2-5 near-term catalysts"),
                "risk_radar": schema::string_list("3-6 key risks"),
                "overall_sentiment": schema::string_enum("Topline sentiment", Signal::LABELS),
                "confidence_score": schema::bounded_number("Confidence given breadth of coverage", 0.0, 1.0),
                "highlighted_articles": schema::array("3-10 high-signal articles", article),
                "sources": schema::string_list("Distinct sources among kept articles"),
            }),
            &[
                "analysis_summary",
                "lookback_window_days",
                "coverage_stats",
                "macro_themes",
                "company_impact",
                "catalysts",
                "risk_radar",
                "overall_sentiment",
                "confidence_score",
                "highlighted_articles",
                "sources",
            ],
        )
    }

    fn shape_hint() -> &'static str {
        SHAPE
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.lookback_window_days) {
            return Err(ValidationError::new(
                "lookback_window_days",
                format!("{} is outside 1..={MAX_LOOKBACK_DAYS}", self.lookback_window_days),
            ));
        }
        for article in &self.highlighted_articles {
            ValidationError::check_unit("highlighted_articles.relevance_score", article.relevance_score)?;
        }
        ValidationError::check_unit("confidence_score", self.confidence_score)
    }
}

impl AnalysisRecord for NewsAnalysis {
    const TITLE: &'static str = "News Analysis";

    fn quality(&self) -> Quality {
        self.quality
    }

    fn set_quality(&mut self, quality: Quality) {
        self.quality = quality;
    }

    fn fallback(_ticker: &str, reason: &str) -> Self {
        Self {
            analysis_summary: format!(
                "News analysis completed but encountered formatting issues: {reason}."
            ),
            company_impact: CompanyImpact::uncertain("Parser fallback; see the kept articles."),
            confidence_score: 0.35,
            ..Self::no_coverage("", DEFAULT_LOOKBACK_DAYS, 0)
        }
    }

    fn unavailable(ticker: &str, _reason: &str) -> Self {
        Self::no_coverage(ticker, DEFAULT_LOOKBACK_DAYS, 0)
    }
}
