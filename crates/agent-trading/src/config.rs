//! Configuration for trading analysis runs

use crate::error::{Result, TradingError};
use crate::evidence::{SelectionOptions, VocabularyBook};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default model for every stage
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Longest news lookback window, in days
pub const MAX_LOOKBACK_DAYS: u32 = 30;

/// Per-run tunables carried on the work item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Days of news to look back over
    pub lookback_days: u32,
    /// Inclusive lower bound on evidence relevance
    pub relevance_threshold: f64,
    /// Raw company articles considered
    pub max_company_articles: usize,
    /// Raw market articles considered
    pub max_macro_articles: usize,
    /// Articles kept after ranking
    pub max_kept_articles: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from(&TradingConfig::default())
    }
}

impl From<&TradingConfig> for RunOptions {
    fn from(config: &TradingConfig) -> Self {
        Self {
            lookback_days: config.lookback_days,
            relevance_threshold: config.relevance_threshold,
            max_company_articles: config.max_company_articles,
            max_macro_articles: config.max_macro_articles,
            max_kept_articles: config.max_kept_articles,
        }
    }
}

impl RunOptions {
    /// Selection tunables for the evidence selector
    pub fn selection(&self) -> SelectionOptions {
        SelectionOptions {
            relevance_threshold: self.relevance_threshold,
            max_company_articles: self.max_company_articles,
            max_macro_articles: self.max_macro_articles,
            max_kept_articles: self.max_kept_articles,
        }
    }

    /// Validate the tunables
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            return Err(TradingError::ConfigError(format!(
                "lookback_days must be between 1 and {MAX_LOOKBACK_DAYS}, got {}",
                self.lookback_days
            )));
        }

        if !(0.0..=1.0).contains(&self.relevance_threshold) {
            return Err(TradingError::ConfigError(format!(
                "relevance_threshold must be within [0, 1], got {}",
                self.relevance_threshold
            )));
        }

        if self.max_company_articles == 0
            || self.max_macro_articles == 0
            || self.max_kept_articles == 0
        {
            return Err(TradingError::ConfigError(
                "article caps must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration for a trading analysis graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Model used by the news, technical, fundamentals and advocacy stages
    pub analyst_model: String,

    /// Sampling temperature of the analyst stages
    pub analyst_temperature: f32,

    /// Model used by the synthesis stage
    pub synthesis_model: String,

    /// Sampling temperature of the synthesis stage
    pub synthesis_temperature: f32,

    /// Maximum tokens per model call
    pub max_tokens: usize,

    /// Deadline for each model call; expiry degrades the stage
    pub deadline: Option<Duration>,

    /// Days of news to look back over
    pub lookback_days: u32,

    /// Inclusive lower bound on evidence relevance
    pub relevance_threshold: f64,

    /// Raw company articles considered
    pub max_company_articles: usize,

    /// Raw market articles considered
    pub max_macro_articles: usize,

    /// Articles kept after ranking
    pub max_kept_articles: usize,

    /// Run the news stage ahead of the technical stage
    pub include_news: bool,

    /// Request timeout for data providers
    pub request_timeout: Duration,

    /// Trading days summarised by the price collector
    pub price_history_days: u32,

    /// Alpha Vantage API key (optional)
    pub alpha_vantage_api_key: Option<String>,

    /// Alpha Vantage requests per minute
    pub alpha_vantage_rate_limit: u32,

    /// Finnhub API key (optional)
    pub finnhub_api_key: Option<String>,

    /// Finnhub requests per minute
    pub finnhub_rate_limit: u32,

    /// Scoring vocabulary for the evidence selector
    pub vocabulary: VocabularyBook,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            analyst_model: DEFAULT_MODEL.to_string(),
            analyst_temperature: 0.0,
            synthesis_model: DEFAULT_MODEL.to_string(),
            synthesis_temperature: 0.7,
            max_tokens: 4096,
            deadline: None,
            lookback_days: 7,
            relevance_threshold: 0.6,
            max_company_articles: 50,
            max_macro_articles: 80,
            max_kept_articles: 80,
            include_news: false,
            request_timeout: Duration::from_secs(30),
            price_history_days: 30,
            alpha_vantage_api_key: None,
            alpha_vantage_rate_limit: 5,
            finnhub_api_key: None,
            finnhub_rate_limit: 60,
            vocabulary: VocabularyBook::with_builtin_defaults(),
        }
    }
}

impl TradingConfig {
    /// Create a new configuration builder
    pub fn builder() -> TradingConfigBuilder {
        TradingConfigBuilder::default()
    }

    /// Load provider API keys from `ALPHA_VANTAGE_API_KEY` and `FINNHUB_API_KEY`
    pub fn with_env_api_keys(mut self) -> Self {
        if let Ok(key) = std::env::var("ALPHA_VANTAGE_API_KEY") {
            self.alpha_vantage_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("FINNHUB_API_KEY") {
            self.finnhub_api_key = Some(key);
        }
        self
    }

    /// Per-run tunables derived from this configuration
    pub fn run_options(&self) -> RunOptions {
        RunOptions::from(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.run_options().validate()?;

        for (name, temperature) in [
            ("analyst_temperature", self.analyst_temperature),
            ("synthesis_temperature", self.synthesis_temperature),
        ] {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(TradingError::ConfigError(format!(
                    "{name} must be within [0, 2], got {temperature}"
                )));
            }
        }

        if self.max_tokens == 0 {
            return Err(TradingError::ConfigError(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.price_history_days == 0 {
            return Err(TradingError::ConfigError(
                "price_history_days must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for TradingConfig
#[derive(Debug, Default)]
pub struct TradingConfigBuilder {
    config: Option<TradingConfig>,
}

impl TradingConfigBuilder {
    fn edit(mut self, f: impl FnOnce(&mut TradingConfig)) -> Self {
        f(self.config.get_or_insert_with(TradingConfig::default));
        self
    }

    /// Set the analyst model
    pub fn analyst_model(self, model: impl Into<String>) -> Self {
        let model = model.into();
        self.edit(|c| c.analyst_model = model)
    }

    /// Set the analyst temperature
    pub fn analyst_temperature(self, temperature: f32) -> Self {
        self.edit(|c| c.analyst_temperature = temperature)
    }

    /// Set the synthesis model
    pub fn synthesis_model(self, model: impl Into<String>) -> Self {
        let model = model.into();
        self.edit(|c| c.synthesis_model = model)
    }

    /// Set the synthesis temperature
    pub fn synthesis_temperature(self, temperature: f32) -> Self {
        self.edit(|c| c.synthesis_temperature = temperature)
    }

    /// Set maximum tokens per model call
    pub fn max_tokens(self, max_tokens: usize) -> Self {
        self.edit(|c| c.max_tokens = max_tokens)
    }

    /// Set the model call deadline
    pub fn deadline(self, deadline: Duration) -> Self {
        self.edit(|c| c.deadline = Some(deadline))
    }

    /// Set the news lookback window
    pub fn lookback_days(self, days: u32) -> Self {
        self.edit(|c| c.lookback_days = days)
    }

    /// Set the relevance threshold
    pub fn relevance_threshold(self, threshold: f64) -> Self {
        self.edit(|c| c.relevance_threshold = threshold)
    }

    /// Set the per-source article caps
    pub fn article_caps(self, company: usize, macro_news: usize) -> Self {
        self.edit(|c| {
            c.max_company_articles = company;
            c.max_macro_articles = macro_news;
        })
    }

    /// Set the cap on kept articles
    pub fn max_kept_articles(self, kept: usize) -> Self {
        self.edit(|c| c.max_kept_articles = kept)
    }

    /// Enable or disable the news stage
    pub fn include_news(self, include: bool) -> Self {
        self.edit(|c| c.include_news = include)
    }

    /// Set request timeout
    pub fn request_timeout(self, duration: Duration) -> Self {
        self.edit(|c| c.request_timeout = duration)
    }

    /// Set the price summary window
    pub fn price_history_days(self, days: u32) -> Self {
        self.edit(|c| c.price_history_days = days)
    }

    /// Set Alpha Vantage API key
    pub fn alpha_vantage_api_key(self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.edit(|c| c.alpha_vantage_api_key = Some(key))
    }

    /// Set Finnhub API key
    pub fn finnhub_api_key(self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.edit(|c| c.finnhub_api_key = Some(key))
    }

    /// Set the scoring vocabulary
    pub fn vocabulary(self, vocabulary: VocabularyBook) -> Self {
        self.edit(|c| c.vocabulary = vocabulary)
    }

    /// Load API keys from environment
    pub fn with_env_api_keys(self) -> Self {
        self.edit(|c| *c = std::mem::take(c).with_env_api_keys())
    }

    /// Build the configuration
    pub fn build(self) -> Result<TradingConfig> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }
}
