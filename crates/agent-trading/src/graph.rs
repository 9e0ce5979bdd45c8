//! The trading analysis graph
//!
//! Wires collectors, extractors and stages into the fixed pipeline:
//!
//! ```text
//! START -> [news] -> technical -> fundamentals -> bull -> bear -> synthesis -> END
//! ```

use crate::collectors::{
    AlphaVantageClient, Collector, FinnhubClient, FundamentalsCollector, IndicatorCollector,
    NewsSource, PriceHistoryCollector, YahooFinanceClient,
};
use crate::config::{RunOptions, TradingConfig};
use crate::error::{Result, TradingError};
use crate::evidence::EvidenceSelector;
use crate::prompts::{ANALYST_SYSTEM, PromptLibrary, SUPERVISOR_SYSTEM};
use crate::stages::{DataStage, NewsStage, ReasoningStage, StageContext};
use crate::state::WorkItem;
use agent_llm::{ExtractorConfig, LLMProvider, StructuredExtractor};
use agent_workflow::{Pipeline, RunLog};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};

/// Runs the full analysis for one ticker at a time
///
/// A graph holds no per-run state, so concurrent runs for different
/// tickers can share it.
pub struct TradingGraph {
    config: TradingConfig,
    pipeline: Pipeline<WorkItem>,
}

impl std::fmt::Debug for TradingGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradingGraph")
            .field("stages", &self.pipeline.stage_names())
            .finish_non_exhaustive()
    }
}

impl TradingGraph {
    /// Start building a graph over `provider`
    pub fn builder(config: TradingConfig, provider: Arc<dyn LLMProvider>) -> TradingGraphBuilder {
        TradingGraphBuilder {
            config,
            provider,
            technical: None,
            fundamentals: None,
            news: None,
        }
    }

    /// Build a graph with the default collectors
    pub fn new(config: TradingConfig, provider: Arc<dyn LLMProvider>) -> Result<Self> {
        Self::builder(config, provider).build()
    }

    /// Configuration in use
    pub fn config(&self) -> &TradingConfig {
        &self.config
    }

    /// Stage names in execution order
    pub fn stage_names(&self) -> Vec<&str> {
        self.pipeline.stage_names()
    }

    /// `START -> ... -> END`
    pub fn describe(&self) -> String {
        self.pipeline.describe()
    }

    /// Analyze `ticker` as of `as_of` with the configured run options
    pub async fn analyze(&self, ticker: &str, as_of: NaiveDate) -> agent_core::Result<WorkItem> {
        self.analyze_with(ticker, as_of, self.config.run_options())
            .await
    }

    /// Analyze `ticker` with per-run options
    pub async fn analyze_with(
        &self,
        ticker: &str,
        as_of: NaiveDate,
        options: RunOptions,
    ) -> agent_core::Result<WorkItem> {
        options.validate()?;
        let (item, _) = self.run(WorkItem::new(ticker, as_of).with_options(options)).await?;
        Ok(item)
    }

    /// Analyze `ticker` and also return the per-stage run log
    pub async fn analyze_with_log(
        &self,
        ticker: &str,
        as_of: NaiveDate,
    ) -> agent_core::Result<(WorkItem, RunLog)> {
        self.run(WorkItem::new(ticker, as_of).with_options(self.config.run_options()))
            .await
    }

    async fn run(&self, item: WorkItem) -> agent_core::Result<(WorkItem, RunLog)> {
        info!(ticker = %item.ticker, as_of = %item.as_of, run_id = %item.run_id, "Analysis started");
        let (item, log) = self.pipeline.run_with_log(item).await?;
        info!(
            ticker = %item.ticker,
            run_id = %item.run_id,
            decision = ?item.decision(),
            degraded = ?log.degraded_stages(),
            elapsed = ?log.total_elapsed(),
            "Analysis finished"
        );
        Ok((item, log))
    }
}

/// Builder for [`TradingGraph`]
///
/// Collectors and the news source default to the Yahoo Finance, Alpha
/// Vantage and Finnhub adapters; tests and alternative data vendors inject
/// their own.
pub struct TradingGraphBuilder {
    config: TradingConfig,
    provider: Arc<dyn LLMProvider>,
    technical: Option<Vec<Arc<dyn Collector>>>,
    fundamentals: Option<Vec<Arc<dyn Collector>>>,
    news: Option<Arc<dyn NewsSource>>,
}

impl TradingGraphBuilder {
    /// Replace the technical stage's collectors
    pub fn technical_collectors(mut self, collectors: Vec<Arc<dyn Collector>>) -> Self {
        self.technical = Some(collectors);
        self
    }

    /// Replace the fundamentals stage's collectors
    pub fn fundamentals_collectors(mut self, collectors: Vec<Arc<dyn Collector>>) -> Self {
        self.fundamentals = Some(collectors);
        self
    }

    /// Replace the news feed
    pub fn news_source(mut self, source: Arc<dyn NewsSource>) -> Self {
        self.news = Some(source);
        self
    }

    fn extractor(&self, model: &str, temperature: f32, system: &str) -> Arc<StructuredExtractor> {
        let mut config = ExtractorConfig::new(model)
            .max_tokens(self.config.max_tokens)
            .temperature(temperature)
            .system(system);
        if let Some(deadline) = self.config.deadline {
            config = config.deadline(deadline);
        }
        Arc::new(StructuredExtractor::new(self.provider.clone(), config))
    }

    fn default_technical(&self) -> Vec<Arc<dyn Collector>> {
        let yahoo = Arc::new(YahooFinanceClient::new(self.config.request_timeout));
        vec![
            Arc::new(PriceHistoryCollector::new(
                yahoo.clone(),
                self.config.price_history_days as usize,
            )),
            Arc::new(IndicatorCollector::new(yahoo)),
        ]
    }

    fn default_fundamentals(&self) -> Result<Vec<Arc<dyn Collector>>> {
        let Some(key) = &self.config.alpha_vantage_api_key else {
            warn!("No Alpha Vantage API key; the fundamentals stage will degrade");
            return Ok(Vec::new());
        };
        let client = AlphaVantageClient::new(
            key.clone(),
            self.config.alpha_vantage_rate_limit,
            self.config.request_timeout,
        )?;
        Ok(FundamentalsCollector::all(Arc::new(client)))
    }

    fn default_news(&self) -> Result<Arc<dyn NewsSource>> {
        let key = self.config.finnhub_api_key.as_ref().ok_or_else(|| {
            TradingError::ConfigError(
                "include_news requires FINNHUB_API_KEY or an injected news source".to_string(),
            )
        })?;
        let client = FinnhubClient::new(
            key.clone(),
            self.config.finnhub_rate_limit,
            self.config.request_timeout,
        )?;
        Ok(Arc::new(client))
    }

    /// Validate the configuration and assemble the pipeline
    pub fn build(mut self) -> Result<TradingGraph> {
        self.config.validate()?;

        let prompts = Arc::new(PromptLibrary::new()?);
        let analyst = StageContext::new(
            self.extractor(
                &self.config.analyst_model,
                self.config.analyst_temperature,
                ANALYST_SYSTEM,
            ),
            prompts.clone(),
        );
        let supervisor = StageContext::new(
            self.extractor(
                &self.config.synthesis_model,
                self.config.synthesis_temperature,
                SUPERVISOR_SYSTEM,
            ),
            prompts,
        );

        let technical = match self.technical.take() {
            Some(collectors) => collectors,
            None => self.default_technical(),
        };
        let fundamentals = match self.fundamentals.take() {
            Some(collectors) => collectors,
            None => self.default_fundamentals()?,
        };

        let mut builder = Pipeline::<WorkItem>::builder();
        if self.config.include_news {
            let source = match self.news.take() {
                Some(source) => source,
                None => self.default_news()?,
            };
            let selector = Arc::new(EvidenceSelector::new(self.config.vocabulary.clone()));
            builder = builder.add_stage(Arc::new(NewsStage::new(source, selector, analyst.clone())));
        }

        let pipeline = builder
            .add_stage(Arc::new(DataStage::technical(technical, analyst.clone())))
            .add_stage(Arc::new(DataStage::fundamentals(fundamentals, analyst.clone())))
            .add_stage(Arc::new(ReasoningStage::bull(analyst.clone())))
            .add_stage(Arc::new(ReasoningStage::bear(analyst)))
            .add_stage(Arc::new(ReasoningStage::synthesis(supervisor)))
            .build()?;

        info!(graph = %pipeline.describe(), "Trading graph built");
        Ok(TradingGraph {
            config: self.config,
            pipeline,
        })
    }
}
