//! Data collectors
//!
//! A [`Collector`] fetches one independently fallible piece of evidence and
//! renders it as text for a prompt. A data stage runs its collectors
//! concurrently through [`Gathered::collect`]; one collector's failure never
//! blocks or fails the others.
//!
//! News is the exception: a [`NewsSource`] returns raw records that go
//! through the evidence selector before any prompt is built.

pub mod alpha_vantage;
pub mod finnhub;
pub mod indicators;
pub mod yahoo;

pub use alpha_vantage::{AlphaVantageClient, FundamentalReport, FundamentalsCollector};
pub use finnhub::FinnhubClient;
pub use indicators::{Bar, IndicatorSnapshot, compute_indicators};
pub use yahoo::{IndicatorCollector, PriceHistoryCollector, YahooFinanceClient};

use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// What a collector is asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectRequest {
    /// Ticker symbol
    pub ticker: String,
    /// Last date the data may cover
    pub as_of: NaiveDate,
}

impl CollectRequest {
    /// Create a request
    pub fn new(ticker: impl Into<String>, as_of: NaiveDate) -> Self {
        Self {
            ticker: ticker.into(),
            as_of,
        }
    }
}

/// One source of prompt evidence
#[async_trait]
pub trait Collector: Send + Sync {
    /// Section heading, e.g. `Balance Sheet`
    fn name(&self) -> &str;

    /// Fetch and render the evidence
    async fn collect(&self, request: &CollectRequest) -> Result<String>;
}

/// Company and market news feed
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Company news published between `from` and `to`, at most `limit` items
    async fn company_news(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
        limit: usize,
    ) -> Result<Vec<Value>>;

    /// General market news published between `from` and `to`, at most `limit` items
    async fn market_news(&self, from: NaiveDate, to: NaiveDate, limit: usize) -> Result<Vec<Value>>;
}

/// One collector's contribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Collector name
    pub name: String,
    /// Rendered evidence, or the error text
    pub body: std::result::Result<String, String>,
}

impl Section {
    /// Whether the collector succeeded
    pub fn is_ok(&self) -> bool {
        self.body.is_ok()
    }
}

/// Results of every collector of a stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gathered {
    sections: Vec<Section>,
}

impl Gathered {
    /// Run every collector concurrently, isolating failures
    pub async fn collect(collectors: &[Arc<dyn Collector>], request: &CollectRequest) -> Self {
        let results = join_all(collectors.iter().map(|c| c.collect(request))).await;

        let sections = collectors
            .iter()
            .zip(results)
            .map(|(collector, result)| {
                let body = result.map_err(|e| {
                    warn!(
                        collector = collector.name(),
                        ticker = %request.ticker,
                        error = %e,
                        "Collector failed"
                    );
                    e.to_string()
                });
                Section {
                    name: collector.name().to_string(),
                    body,
                }
            })
            .collect();

        Self { sections }
    }

    /// Sections in collector order
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Number of collectors that succeeded
    pub fn succeeded(&self) -> usize {
        self.sections.iter().filter(|s| s.is_ok()).count()
    }

    /// Whether no collector produced evidence
    pub fn all_failed(&self) -> bool {
        self.succeeded() == 0
    }

    /// `name: error` for every failed collector
    pub fn failure_summary(&self) -> String {
        let failures: Vec<String> = self
            .sections
            .iter()
            .filter_map(|s| s.body.as_ref().err().map(|e| format!("{}: {e}", s.name)))
            .collect();
        if failures.is_empty() {
            "no data collectors configured".to_string()
        } else {
            failures.join("; ")
        }
    }

    /// Render every section, substituting a placeholder for failures
    pub fn render(&self) -> String {
        self.sections
            .iter()
            .map(|section| match &section.body {
                Ok(body) => format!("## {}\n{}", section.name, body.trim_end()),
                Err(error) => format!("## {}\n[Unavailable: {error}]", section.name),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
