mod common;

use agent_core::{Error, StageOutcome};
use agent_trading::collectors::{CollectRequest, Collector};
use agent_trading::records::{BearAction, BullAction, TierAction};
use agent_llm::StructuredOutput;
use agent_trading::{ConsensusDirection, Quality, RunOptions, TradingConfig, TradingGraph};
use async_trait::async_trait;
use common::{CannedNews, StructuredScript, TextScript, Unreachable, as_of, graph};
use mockall::mock;
use serde_json::json;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

mock! {
    pub Feed {}

    #[async_trait]
    impl Collector for Feed {
        fn name(&self) -> &str;
        async fn collect(&self, request: &CollectRequest) -> agent_trading::Result<String>;
    }
}

#[tokio::test]
async fn test_full_run_produces_every_record() {
    let provider = Arc::new(StructuredScript::bullish());
    let graph = graph(TradingConfig::default(), provider.clone());

    let (item, log) = assert_ok!(graph.analyze_with_log("AMD", as_of()).await);

    assert_eq!(item.decision(), Some(ConsensusDirection::Bullish));
    assert_eq!(item.confidence(), Some(0.72));
    assert!(item.news.is_none());
    assert_eq!(
        item.qualities(),
        vec![
            ("technical", Quality::Structured),
            ("fundamentals", Quality::Structured),
            ("bull", Quality::Structured),
            ("bear", Quality::Structured),
            ("synthesis", Quality::Structured),
        ]
    );

    let bull = item.bull.as_ref().unwrap();
    assert_eq!(bull.record.recommended_action, BullAction::Buy);
    let bear = item.bear.as_ref().unwrap();
    assert_eq!(bear.record.recommended_action, BearAction::Avoid);
    let synthesis = item.synthesis.as_ref().unwrap();
    assert_eq!(synthesis.record.medium_risk_recommendation.action, TierAction::Buy);

    let transcript = item.transcript.as_ref().unwrap();
    assert!(
        transcript
            .response
            .text()
            .is_some_and(|text| text.starts_with("Final Investment Decision for AMD:"))
    );

    assert_eq!(log.reports().len(), 5);
    assert!(log.reports().iter().all(|r| r.outcome == StageOutcome::Extracted));
    assert!(log.degraded_stages().is_empty());
}

#[tokio::test]
async fn test_prompts_carry_collected_and_upstream_evidence() {
    let provider = Arc::new(StructuredScript::bullish());
    let graph = graph(TradingConfig::default(), provider.clone());

    let item = assert_ok!(graph.analyze("AMD", as_of()).await);

    let technical_prompt = provider.prompt_for("technical_analysis").unwrap();
    assert!(technical_prompt.contains("RSI(14): 61.37"));

    let fundamentals_prompt = provider.prompt_for("fundamental_analysis").unwrap();
    assert!(fundamentals_prompt.contains("Current Ratio: 2.50"));

    // The bear advocate answers the bull case it was given
    let bear_prompt = provider.prompt_for("bear_case").unwrap();
    let bull_serialized = &item.bull.as_ref().unwrap().serialized;
    assert!(bear_prompt.contains(bull_serialized.as_str()));
}

#[tokio::test]
async fn test_text_only_provider_yields_parsed_records() {
    let graph = graph(TradingConfig::default(), Arc::new(TextScript::bullish()));

    let item = assert_ok!(graph.analyze("AMD", as_of()).await);

    assert!(item.qualities().iter().all(|(_, q)| *q == Quality::Parsed));
    assert_eq!(item.decision(), Some(ConsensusDirection::Bullish));
}

#[tokio::test]
async fn test_unreachable_model_degrades_every_stage() {
    let graph = graph(TradingConfig::default(), Arc::new(Unreachable));

    let (item, log) = assert_ok!(graph.analyze_with_log("AMD", as_of()).await);

    assert_eq!(log.degraded_stages().len(), 5);
    assert!(item.qualities().iter().all(|(_, q)| q.is_degraded()));
    assert_eq!(item.decision(), Some(ConsensusDirection::Neutral));
    assert_eq!(item.confidence(), Some(0.2));

    // Degraded records keep the full shape
    assert_ok!(item.technical.as_ref().unwrap().record.validate());
    assert_ok!(item.fundamentals.as_ref().unwrap().record.validate());
    assert_ok!(item.synthesis.as_ref().unwrap().record.validate());
}

#[tokio::test]
async fn test_blank_ticker_aborts() {
    let graph = graph(TradingConfig::default(), Arc::new(StructuredScript::bullish()));

    let err = assert_err!(graph.analyze("   ", as_of()).await);
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn test_news_without_coverage_degrades_only_news() {
    let config = assert_ok!(TradingConfig::builder().include_news(true).build());
    let provider = Arc::new(StructuredScript::bullish());
    let graph = TradingGraph::builder(config, provider.clone())
        .technical_collectors(vec![common::Canned::ok("Stock Data", "Period change: +6.20%")])
        .fundamentals_collectors(vec![common::Canned::ok("Company Overview", "P/E Ratio: 240.5")])
        .news_source(Arc::new(CannedNews {
            company: Vec::new(),
            market: vec![json!({"title": "Celebrity wedding draws crowds", "source": "Gossip"})],
        }))
        .build()
        .unwrap();

    let (item, log) = assert_ok!(graph.analyze_with_log("AMD", as_of()).await);

    assert_eq!(log.reports().len(), 6);
    assert_eq!(log.degraded_stages(), vec!["news"]);

    let news = item.news.as_ref().unwrap();
    assert!(news.record.quality.is_degraded());
    assert_eq!(news.record.coverage_stats.articles, 0);
    assert!(provider.prompt_for("news_analysis").is_none());

    // Downstream stages see the degraded record, not the placeholder
    let bull_prompt = provider.prompt_for("bull_case").unwrap();
    assert!(bull_prompt.contains(news.serialized.as_str()));
}

#[tokio::test]
async fn test_partial_collector_failure_still_extracts() {
    let mut offline = MockFeed::new();
    offline.expect_name().return_const("Technical Indicators".to_string());
    offline.expect_collect().times(1).returning(|request| {
        Err(agent_trading::TradingError::DataUnavailable {
            symbol: request.ticker.clone(),
            reason: "upstream timeout".to_string(),
        })
    });

    let provider = Arc::new(StructuredScript::bullish());
    let graph = TradingGraph::builder(TradingConfig::default(), provider.clone())
        .technical_collectors(vec![
            common::Canned::ok("Stock Data", "Period change: +6.20%"),
            Arc::new(offline),
        ])
        .fundamentals_collectors(vec![common::Canned::failing("Company Overview")])
        .build()
        .unwrap();

    let (item, log) = assert_ok!(graph.analyze_with_log("AMD", as_of()).await);

    assert_eq!(log.degraded_stages(), vec!["fundamentals"]);
    assert_eq!(item.technical.as_ref().unwrap().quality(), Quality::Structured);

    let technical_prompt = provider.prompt_for("technical_analysis").unwrap();
    assert!(technical_prompt.contains("Period change: +6.20%"));
    assert!(provider.prompt_for("fundamental_analysis").is_none());

    let fundamentals = &item.fundamentals.as_ref().unwrap().record;
    assert_eq!(fundamentals.confidence_score, 0.0);
}

#[tokio::test]
async fn test_invalid_run_options_make_no_model_calls() {
    let provider = Arc::new(StructuredScript::bullish());
    let graph = graph(TradingConfig::default(), provider.clone());
    let options = RunOptions {
        lookback_days: 90,
        ..RunOptions::default()
    };

    let err = assert_err!(graph.analyze_with("AMD", as_of(), options).await);
    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(provider.prompts.lock().unwrap().is_empty());
}
