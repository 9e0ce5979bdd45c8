//! Scripted providers, collectors and sample records for pipeline tests

#![allow(dead_code)]

use agent_llm::{CompletionRequest, CompletionResponse, LLMError, LLMProvider};
use agent_trading::collectors::{CollectRequest, Collector, NewsSource};
use agent_trading::records::{
    BearAction, BearCase, BullAction, BullCase, ConsensusDirection, FundamentalAnalysis,
    HealthGrade, IndicatorReading, Rating, Signal, SynthesisDecision, TechnicalAnalysis,
    TierAction, ValuationVerdict,
};
use agent_trading::{AnalysisRecord, TradingConfig, TradingError, TradingGraph};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
}

fn model_view<T: AnalysisRecord>(record: &T) -> Value {
    let mut value = serde_json::to_value(record).unwrap();
    value.as_object_mut().unwrap().remove("quality");
    value
}

/// Schema-enforcing provider answering from canned records
#[derive(Default)]
pub struct StructuredScript {
    records: HashMap<&'static str, Value>,
    pub prompts: Mutex<Vec<(String, String)>>,
}

impl StructuredScript {
    pub fn with<T: AnalysisRecord>(mut self, record: T) -> Self {
        self.records.insert(T::NAME, model_view(&record));
        self
    }

    /// Every record of a bullish run
    pub fn bullish() -> Self {
        Self::default()
            .with(technical())
            .with(fundamentals())
            .with(bull())
            .with(bear())
            .with(decision())
    }

    /// Prompt sent for the given schema
    pub fn prompt_for(&self, schema: &str) -> Option<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .find(|(name, _)| name == schema)
            .map(|(_, prompt)| prompt.clone())
    }
}

#[async_trait]
impl LLMProvider for StructuredScript {
    async fn complete(&self, request: CompletionRequest) -> agent_llm::Result<CompletionResponse> {
        let schema = request
            .response_schema
            .ok_or_else(|| LLMError::InvalidRequest("expected a schema".to_string()))?;
        let prompt = request
            .messages
            .last()
            .and_then(|m| m.text())
            .unwrap_or_default()
            .to_string();
        self.prompts
            .lock()
            .unwrap()
            .push((schema.name.clone(), prompt));
        self.records
            .get(schema.name.as_str())
            .cloned()
            .map(CompletionResponse::structured)
            .ok_or_else(|| LLMError::ProviderError(format!("no script for {}", schema.name)))
    }

    fn name(&self) -> &str {
        "structured-script"
    }

    fn supports_structured_output(&self) -> bool {
        true
    }
}

/// Text-only provider replying with queued answers in call order
pub struct TextScript {
    replies: Mutex<VecDeque<String>>,
}

impl TextScript {
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
        }
    }

    /// Fenced JSON replies for the five default stages
    pub fn bullish() -> Self {
        let fenced = |value: Value| format!("```json\n{value:#}\n```");
        Self::new(vec![
            fenced(model_view(&technical())),
            fenced(model_view(&fundamentals())),
            fenced(model_view(&bull())),
            fenced(model_view(&bear())),
            fenced(model_view(&decision())),
        ])
    }
}

#[async_trait]
impl LLMProvider for TextScript {
    async fn complete(&self, request: CompletionRequest) -> agent_llm::Result<CompletionResponse> {
        if request.response_schema.is_some() {
            return Err(LLMError::InvalidRequest("schema not supported".to_string()));
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .map(CompletionResponse::text)
            .ok_or_else(|| LLMError::ProviderError("script exhausted".to_string()))
    }

    fn name(&self) -> &str {
        "text-script"
    }
}

/// Provider whose every call fails
pub struct Unreachable;

#[async_trait]
impl LLMProvider for Unreachable {
    async fn complete(&self, _request: CompletionRequest) -> agent_llm::Result<CompletionResponse> {
        Err(LLMError::RequestFailed("connection refused".to_string()))
    }

    fn name(&self) -> &str {
        "unreachable"
    }

    fn supports_structured_output(&self) -> bool {
        true
    }
}

/// Collector returning canned text, or failing when `body` is `None`
pub struct Canned {
    name: &'static str,
    body: Option<&'static str>,
}

impl Canned {
    pub fn ok(name: &'static str, body: &'static str) -> Arc<dyn Collector> {
        Arc::new(Self {
            name,
            body: Some(body),
        })
    }

    pub fn failing(name: &'static str) -> Arc<dyn Collector> {
        Arc::new(Self { name, body: None })
    }
}

#[async_trait]
impl Collector for Canned {
    fn name(&self) -> &str {
        self.name
    }

    async fn collect(&self, request: &CollectRequest) -> agent_trading::Result<String> {
        self.body
            .map(str::to_string)
            .ok_or_else(|| TradingError::DataUnavailable {
                symbol: request.ticker.clone(),
                reason: "upstream timeout".to_string(),
            })
    }
}

/// News feed with fixed company and market articles
pub struct CannedNews {
    pub company: Vec<Value>,
    pub market: Vec<Value>,
}

#[async_trait]
impl NewsSource for CannedNews {
    async fn company_news(
        &self,
        _ticker: &str,
        _from: NaiveDate,
        _to: NaiveDate,
        limit: usize,
    ) -> agent_trading::Result<Vec<Value>> {
        Ok(self.company.iter().take(limit).cloned().collect())
    }

    async fn market_news(
        &self,
        _from: NaiveDate,
        _to: NaiveDate,
        limit: usize,
    ) -> agent_trading::Result<Vec<Value>> {
        Ok(self.market.iter().take(limit).cloned().collect())
    }
}

/// Graph over `provider` with canned collectors
pub fn graph(config: TradingConfig, provider: Arc<dyn LLMProvider>) -> TradingGraph {
    TradingGraph::builder(config, provider)
        .technical_collectors(vec![
            Canned::ok("Stock Data", "Daily prices for AMD, 30 sessions\nPeriod change: +6.20%"),
            Canned::ok("Technical Indicators", "RSI(14): 61.37\nMACD(12,26,9): 1.204"),
        ])
        .fundamentals_collectors(vec![
            Canned::ok("Company Overview", "P/E Ratio: 240.5\nPEG Ratio: 0.9"),
            Canned::ok("Balance Sheet", "Current Ratio: 2.50"),
            Canned::ok("Income Statement", "Revenue: $5,473,000,000"),
            Canned::ok("Cash Flow", "Operating Cash Flow: $521,000,000"),
            Canned::ok("Earnings", "2024-03-31: 0.62 vs 0.61"),
        ])
        .build()
        .unwrap()
}

pub fn technical() -> TechnicalAnalysis {
    let mut record = TechnicalAnalysis::fallback("AMD", "sample");
    record.analysis_summary = "AMD trades above its 50-day average with firm momentum.".to_string();
    record.selected_indicators = vec![IndicatorReading {
        name: "RSI".to_string(),
        value: 61.37,
        interpretation: "Constructive, not overbought".to_string(),
        signal: Signal::Bullish,
    }];
    record.market_sentiment = Signal::Bullish;
    record.confidence_score = 0.78;
    record
}

pub fn fundamentals() -> FundamentalAnalysis {
    let mut record = FundamentalAnalysis::fallback("AMD", "sample");
    record.valuation.pe_ratio = Some(240.5);
    record.valuation.valuation_verdict = ValuationVerdict::Overvalued;
    record.financial_health.overall_health = HealthGrade::Good;
    record.financial_health.liquidity_score = 8.0;
    record.fundamental_rating = Rating::Buy;
    record.confidence_score = 0.7;
    record
}

pub fn bull() -> BullCase {
    let mut record = BullCase::fallback("AMD", "sample");
    record.thesis_summary = "Accelerator share gains drive a multi-year re-rating.".to_string();
    record.conviction_score = 0.74;
    record.recommended_action = BullAction::Buy;
    record
}

pub fn bear() -> BearCase {
    let mut record = BearCase::fallback("AMD", "sample");
    record.thesis_summary = "Valuation already discounts flawless execution.".to_string();
    record.conviction_score = 0.55;
    record.recommended_action = BearAction::Avoid;
    record
}

pub fn decision() -> SynthesisDecision {
    let mut record = SynthesisDecision::fallback("AMD", "sample");
    record.executive_summary = "Accumulate on weakness; the bull case outweighs valuation risk.".to_string();
    record.bull_case_strength = 7.5;
    record.bear_case_strength = 5.0;
    record.consensus_direction = ConsensusDirection::Bullish;
    record.medium_risk_recommendation.action = TierAction::Buy;
    record.final_confidence = 0.72;
    record
}

