//! Yahoo Finance price history and the collectors built on it

use super::indicators::{Bar, compute_indicators};
use super::{CollectRequest, Collector};
use crate::error::{Result, TradingError};
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate};
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::debug;
use yahoo_finance_api as yahoo;

/// Calendar days fetched for the indicator set
const INDICATOR_WINDOW_DAYS: u64 = 365;

/// Yahoo Finance API client
#[derive(Debug, Clone)]
pub struct YahooFinanceClient {
    timeout: Duration,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Daily bars for `symbol` from `start` through `end`, oldest first
    pub async fn history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>> {
        let provider =
            yahoo::YahooConnector::new().map_err(|e| TradingError::YahooFinanceError(e.to_string()))?;

        let start_odt = to_offset(start)?;
        let end_odt = to_offset(end + Days::new(1))?;

        let response = tokio::time::timeout(
            self.timeout,
            provider.get_quote_history(symbol, start_odt, end_odt),
        )
        .await
        .map_err(|_| TradingError::YahooFinanceError(format!("request timed out after {:?}", self.timeout)))?
        .map_err(|e| TradingError::YahooFinanceError(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| TradingError::YahooFinanceError(e.to_string()))?;

        let bars: Vec<Bar> = quotes
            .iter()
            .filter_map(|q| {
                let date = DateTime::from_timestamp(q.timestamp as i64, 0)?.date_naive();
                Some(Bar {
                    date,
                    open: q.open,
                    high: q.high,
                    low: q.low,
                    close: q.close,
                    volume: q.volume,
                })
            })
            .filter(|bar| bar.date <= end)
            .collect();

        debug!(symbol, bars = bars.len(), "Fetched price history");

        if bars.is_empty() {
            return Err(TradingError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: format!("no price history between {start} and {end}"),
            });
        }
        Ok(bars)
    }
}

fn to_offset(date: NaiveDate) -> Result<OffsetDateTime> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .ok_or_else(|| TradingError::YahooFinanceError(format!("invalid date {date}")))?;
    OffsetDateTime::from_unix_timestamp(midnight)
        .map_err(|e| TradingError::YahooFinanceError(format!("Invalid timestamp: {e}")))
}

/// Recent daily prices and a summary of the window
#[derive(Debug, Clone)]
pub struct PriceHistoryCollector {
    client: Arc<YahooFinanceClient>,
    sessions: usize,
}

impl PriceHistoryCollector {
    /// Summarise the last `sessions` trading days
    pub fn new(client: Arc<YahooFinanceClient>, sessions: usize) -> Self {
        Self { client, sessions }
    }
}

#[async_trait]
impl Collector for PriceHistoryCollector {
    fn name(&self) -> &str {
        "Stock Data"
    }

    async fn collect(&self, request: &CollectRequest) -> Result<String> {
        // Weekends and holidays: fetch twice the calendar window
        let calendar_days = self.sessions as u64 * 2 + 7;
        let start = request.as_of - Days::new(calendar_days);
        let bars = self.client.history(&request.ticker, start, request.as_of).await?;
        let recent = &bars[bars.len().saturating_sub(self.sessions)..];
        Ok(render_price_history(&request.ticker, recent))
    }
}

/// Render bars with a period summary
pub fn render_price_history(ticker: &str, bars: &[Bar]) -> String {
    let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
        return format!("No price data for {ticker}");
    };

    let mut out = format!(
        "Daily prices for {ticker}, {} sessions from {} to {}\n",
        bars.len(),
        first.date,
        last.date
    );
    out.push_str("Date        Open      High      Low       Close     Volume\n");
    for bar in bars {
        let _ = writeln!(
            out,
            "{}  {:<8.2}  {:<8.2}  {:<8.2}  {:<8.2}  {}",
            bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume
        );
    }

    let high = bars.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let low = bars.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let avg_volume = bars.iter().map(|b| b.volume as f64).sum::<f64>() / bars.len() as f64;
    let change = if first.close == 0.0 {
        0.0
    } else {
        (last.close - first.close) / first.close * 100.0
    };

    let _ = writeln!(
        out,
        "\nPeriod change: {change:+.2}% ({:.2} to {:.2})",
        first.close, last.close
    );
    let _ = write!(
        out,
        "Period range: {low:.2} to {high:.2}; average volume {avg_volume:.0}"
    );
    out
}

/// RSI, moving averages, MACD, Bollinger bands and ATR
#[derive(Debug, Clone)]
pub struct IndicatorCollector {
    client: Arc<YahooFinanceClient>,
}

impl IndicatorCollector {
    /// Create the collector
    pub fn new(client: Arc<YahooFinanceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Collector for IndicatorCollector {
    fn name(&self) -> &str {
        "Technical Indicators"
    }

    async fn collect(&self, request: &CollectRequest) -> Result<String> {
        let start = request.as_of - Days::new(INDICATOR_WINDOW_DAYS);
        let bars = self.client.history(&request.ticker, start, request.as_of).await?;
        Ok(compute_indicators(&bars)?.render())
    }
}
