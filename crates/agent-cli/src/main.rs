//! Command-line interface for staged trading analysis

use agent_llm::providers::AnthropicProvider;
use agent_trading::{TradingConfig, TradingGraph, WorkItem};
use agent_utils::{AppConfig, init_tracing_with};
use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "trading-agents")]
#[command(about = "Risk-tiered investment decision for one ticker", long_about = None)]
struct Args {
    /// Ticker symbol, e.g. AMD
    ticker: String,

    /// Analysis date (YYYY-MM-DD), defaults to today
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Run the news stage before the technical stage
    #[arg(long)]
    news: bool,

    /// Days of news to look back over
    #[arg(long)]
    lookback: Option<u32>,

    /// Model for every stage
    #[arg(long)]
    model: Option<String>,

    /// Print the full work item as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

impl Args {
    fn config(&self) -> anyhow::Result<TradingConfig> {
        let mut builder = TradingConfig::builder()
            .with_env_api_keys()
            .include_news(self.news);
        if let Some(days) = self.lookback {
            builder = builder.lookback_days(days);
        }
        if let Some(model) = &self.model {
            builder = builder.analyst_model(model).synthesis_model(model);
        }
        Ok(builder.build()?)
    }
}

fn summary(item: &WorkItem, log: &agent_workflow::RunLog) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Stage", "Outcome", "Quality", "Elapsed"]);

    let qualities = item.qualities();
    for report in log.reports() {
        let quality = qualities
            .iter()
            .find(|(name, _)| *name == report.stage)
            .map_or_else(|| "-".to_string(), |(_, q)| format!("{q:?}"));
        table.add_row(vec![
            report.stage.clone(),
            format!("{:?}", report.outcome),
            quality,
            format!("{:.1?}", report.elapsed),
        ]);
    }
    table
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing_with(&AppConfig::from_env());

    let args = Args::parse();
    let as_of = args
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let provider = Arc::new(AnthropicProvider::from_env()?);
    let graph = TradingGraph::new(args.config()?, provider)?;
    info!(graph = %graph.describe(), "Starting trading-agents");

    let (item, log) = graph
        .analyze_with_log(&args.ticker, as_of)
        .await
        .with_context(|| format!("analysis of {} failed", args.ticker))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&item)?);
        return Ok(());
    }

    println!("{}", summary(&item, &log));
    if let (Some(decision), Some(confidence)) = (item.decision(), item.confidence()) {
        println!(
            "\n{} as of {}: {} (confidence {:.0}%)",
            item.ticker,
            item.as_of,
            decision.as_str(),
            confidence * 100.0
        );
    }
    if let Some(rationale) = item.rationale() {
        println!("{rationale}");
    }
    if let Some(synthesis) = &item.synthesis {
        let record = &synthesis.record;
        for (tier, recommendation) in [
            ("Low risk", &record.low_risk_recommendation),
            ("Medium risk", &record.medium_risk_recommendation),
            ("High risk", &record.high_risk_recommendation),
        ] {
            println!(
                "  {tier}: {:?}, {:?} position. {}",
                recommendation.action, recommendation.position_size, recommendation.rationale
            );
        }
    }
    Ok(())
}
