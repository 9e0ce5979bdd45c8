//! Staged trading analysis
//!
//! This crate turns a ticker and a date into a risk-tiered investment
//! decision by running a fixed pipeline of analysis stages:
//!
//! - News (optional): company and market news, filtered by the
//!   [`EvidenceSelector`](evidence::EvidenceSelector) before any prompt is built
//! - Technical: price history and indicators from Yahoo Finance
//! - Fundamentals: company overview and financial statements from Alpha Vantage
//! - Bull and bear: adversarial advocacy over the records above
//! - Synthesis: the final decision with low, medium and high risk tiers
//!
//! Every stage turns model output into a validated record through the
//! structured extractor of `agent-llm`. A stage whose data or model output
//! fails still produces a record of the same shape, marked degraded; only
//! invalid input aborts a run.
//!
//! # Example
//!
//! ```rust,ignore
//! use agent_llm::providers::AnthropicProvider;
//! use agent_trading::{TradingConfig, TradingGraph};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = Arc::new(AnthropicProvider::from_env()?);
//!     let config = TradingConfig::builder().with_env_api_keys().build()?;
//!     let graph = TradingGraph::new(config, provider)?;
//!
//!     let item = graph.analyze("AMD", chrono::Utc::now().date_naive()).await?;
//!     println!("{:?} ({:?})", item.decision(), item.confidence());
//!     Ok(())
//! }
//! ```

pub mod collectors;
pub mod config;
pub mod error;
pub mod evidence;
pub mod graph;
pub mod prompts;
pub mod records;
pub mod stages;
pub mod state;

pub use config::{RunOptions, TradingConfig, TradingConfigBuilder};
pub use error::{Result, TradingError};
pub use evidence::{EvidenceSelector, Selection, SelectionOptions, VocabularyBook};
pub use graph::{TradingGraph, TradingGraphBuilder};
pub use records::{AnalysisRecord, ConsensusDirection, Quality};
pub use state::{Analysis, WorkItem};
