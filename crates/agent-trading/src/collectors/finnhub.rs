//! Finnhub news client

use super::NewsSource;
use crate::error::{Result, TradingError};
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://finnhub.io/api/v1";

/// Free tier limit
const DEFAULT_RATE_LIMIT: NonZeroU32 = match NonZeroU32::new(60) {
    Some(rate) => rate,
    None => NonZeroU32::MIN,
};

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Article as returned by both news endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FinnhubNewsArticle {
    pub category: String,
    /// Unix seconds
    pub datetime: i64,
    pub headline: String,
    pub id: i64,
    pub image: String,
    pub related: String,
    pub source: String,
    pub summary: String,
    pub url: String,
}

/// Finnhub API client
#[derive(Debug, Clone)]
pub struct FinnhubClient {
    client: Client,
    api_key: String,
    rate_limiter: SharedRateLimiter,
}

impl FinnhubClient {
    /// Create a client allowing `rate_limit` requests per minute
    pub fn new(api_key: impl Into<String>, rate_limit: u32, timeout: Duration) -> Result<Self> {
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(DEFAULT_RATE_LIMIT));
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Vec<FinnhubNewsArticle>> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(format!("{BASE_URL}/{path}"))
            .query(params)
            .query(&[("token", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| TradingError::ApiError(format!("Finnhub request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TradingError::RateLimitExceeded {
                provider: "Finnhub".to_string(),
            });
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TradingError::ApiError(format!(
                "Finnhub API error {status}: {body}"
            )));
        }

        let articles = response
            .json::<Vec<FinnhubNewsArticle>>()
            .await
            .map_err(|e| TradingError::ApiError(format!("Failed to parse Finnhub response: {e}")))?;
        debug!(path, articles = articles.len(), "Finnhub news received");
        Ok(articles)
    }
}

/// Articles published on `from` through `to`, newest first, at most `limit`
fn within_window(
    mut articles: Vec<FinnhubNewsArticle>,
    from: NaiveDate,
    to: NaiveDate,
    limit: usize,
) -> Result<Vec<Value>> {
    let start = day_start(from);
    let end = day_start(to + Days::new(1));
    articles.retain(|a| a.datetime >= start && a.datetime < end);
    articles.sort_by(|a, b| b.datetime.cmp(&a.datetime));
    articles.truncate(limit);

    articles
        .into_iter()
        .map(|a| serde_json::to_value(a).map_err(TradingError::from))
        .collect()
}

fn day_start(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map_or(0, |dt| dt.and_utc().timestamp())
}

#[async_trait]
impl NewsSource for FinnhubClient {
    async fn company_news(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
        limit: usize,
    ) -> Result<Vec<Value>> {
        let from_text = from.to_string();
        let to_text = to.to_string();
        let articles = self
            .get(
                "company-news",
                &[("symbol", ticker), ("from", &from_text), ("to", &to_text)],
            )
            .await?;
        within_window(articles, from, to, limit)
    }

    async fn market_news(&self, from: NaiveDate, to: NaiveDate, limit: usize) -> Result<Vec<Value>> {
        let articles = self.get("news", &[("category", "general")]).await?;
        within_window(articles, from, to, limit)
    }
}
