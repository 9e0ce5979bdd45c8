//! Alpha Vantage API client and the fundamentals collectors

use super::{CollectRequest, Collector};
use crate::error::{Result, TradingError};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde_json::Value;
use std::fmt::Write;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Free tier limit
const DEFAULT_RATE_LIMIT: NonZeroU32 = match NonZeroU32::new(5) {
    Some(rate) => rate,
    None => NonZeroU32::MIN,
};

const QUARTERLY_PERIODS: usize = 4;
const ANNUAL_PERIODS: usize = 2;
const QUARTERLY_EARNINGS: usize = 8;
const DESCRIPTION_CHARS: usize = 200;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Alpha Vantage API client
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    rate_limiter: SharedRateLimiter,
}

impl AlphaVantageClient {
    /// Create a new Alpha Vantage client
    ///
    /// # Arguments
    /// * `api_key` - Alpha Vantage API key
    /// * `rate_limit` - Maximum requests per minute (5 on the free tier)
    /// * `timeout` - Per-request timeout
    pub fn new(api_key: impl Into<String>, rate_limit: u32, timeout: Duration) -> Result<Self> {
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(DEFAULT_RATE_LIMIT));
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// Call `function` for `symbol` and return the raw document
    pub async fn fetch(&self, function: &str, symbol: &str) -> Result<Value> {
        self.rate_limiter.until_ready().await;

        let params = [
            ("function", function),
            ("symbol", symbol),
            ("apikey", self.api_key.as_str()),
        ];
        let response = self.client.get(BASE_URL).query(&params).send().await?;

        if !response.status().is_success() {
            return Err(TradingError::AlphaVantageError(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let data: Value = response.json().await?;
        debug!(function, symbol, "Alpha Vantage response received");
        check_response(data)
    }
}

fn check_response(data: Value) -> Result<Value> {
    if let Some(error) = data.get("Error Message") {
        return Err(TradingError::AlphaVantageError(text(error)));
    }
    if data.get("Note").is_some() {
        return Err(TradingError::RateLimitExceeded {
            provider: "Alpha Vantage".to_string(),
        });
    }
    if let Some(info) = data.get("Information") {
        return Err(TradingError::AlphaVantageError(text(info)));
    }
    Ok(data)
}

fn text(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), str::to_string)
}

/// One Alpha Vantage fundamentals document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundamentalReport {
    Overview,
    BalanceSheet,
    IncomeStatement,
    CashFlow,
    Earnings,
}

impl FundamentalReport {
    /// Every report, in prompt order
    pub const ALL: [Self; 5] = [
        Self::Overview,
        Self::BalanceSheet,
        Self::IncomeStatement,
        Self::CashFlow,
        Self::Earnings,
    ];

    /// API `function` parameter
    pub fn function(self) -> &'static str {
        match self {
            Self::Overview => "OVERVIEW",
            Self::BalanceSheet => "BALANCE_SHEET",
            Self::IncomeStatement => "INCOME_STATEMENT",
            Self::CashFlow => "CASH_FLOW",
            Self::Earnings => "EARNINGS",
        }
    }

    /// Section heading
    pub fn title(self) -> &'static str {
        match self {
            Self::Overview => "Company Overview",
            Self::BalanceSheet => "Balance Sheet",
            Self::IncomeStatement => "Income Statement",
            Self::CashFlow => "Cash Flow",
            Self::Earnings => "Earnings",
        }
    }

    fn statement_fields(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::BalanceSheet => &[
                ("totalAssets", "Total Assets"),
                ("totalCurrentAssets", "Current Assets"),
                ("cashAndCashEquivalentsAtCarryingValue", "Cash & Equivalents"),
                ("totalLiabilities", "Total Liabilities"),
                ("totalCurrentLiabilities", "Current Liabilities"),
                ("longTermDebt", "Long-term Debt"),
                ("totalShareholderEquity", "Shareholder Equity"),
            ],
            Self::IncomeStatement => &[
                ("totalRevenue", "Revenue"),
                ("costOfRevenue", "Cost of Revenue"),
                ("grossProfit", "Gross Profit"),
                ("researchAndDevelopment", "R&D"),
                ("operatingExpenses", "Operating Expenses"),
                ("operatingIncome", "Operating Income"),
                ("ebitda", "EBITDA"),
                ("netIncome", "Net Income"),
            ],
            Self::CashFlow => &[
                ("operatingCashflow", "Operating Cash Flow"),
                ("capitalExpenditures", "Capital Expenditures"),
                ("cashflowFromInvestment", "Investing Cash Flow"),
                ("cashflowFromFinancing", "Financing Cash Flow"),
                ("dividendPayout", "Dividends Paid"),
                ("changeInCashAndCashEquivalents", "Net Change in Cash"),
            ],
            Self::Overview | Self::Earnings => &[],
        }
    }

    /// Render a raw document for a prompt
    pub fn render(self, ticker: &str, data: &Value) -> Result<String> {
        match self {
            Self::Overview => render_overview(ticker, data),
            Self::Earnings => render_earnings(ticker, data),
            _ => render_statement(self, ticker, data),
        }
    }
}

fn field<'a>(data: &'a Value, key: &str) -> &'a str {
    match data.get(key).and_then(Value::as_str) {
        Some(v) if !v.is_empty() && v != "None" && v != "-" => v,
        _ => "N/A",
    }
}

/// `$1,234,567` for integral amounts, the raw text otherwise
fn money(raw: &str) -> String {
    let Ok(amount) = raw.parse::<i64>() else {
        return raw.to_string();
    };
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}${grouped}")
}

fn ratio(numerator: &str, denominator: &str) -> Option<f64> {
    let n: f64 = numerator.parse().ok()?;
    let d: f64 = denominator.parse().ok()?;
    (d != 0.0).then(|| n / d)
}

fn render_overview(ticker: &str, data: &Value) -> Result<String> {
    if data.get("Symbol").is_none() {
        return Err(no_data(ticker, "company overview"));
    }

    let dividend_yield = match field(data, "DividendYield").parse::<f64>() {
        Ok(y) => format!("{:.2}%", y * 100.0),
        Err(_) => "N/A".to_string(),
    };
    let description: String = field(data, "Description")
        .chars()
        .take(DESCRIPTION_CHARS)
        .collect();

    let mut out = format!("Company Overview for {ticker}:\n\nCompany Profile:\n");
    let _ = writeln!(out, "Name: {}", field(data, "Name"));
    let _ = writeln!(out, "Sector: {}", field(data, "Sector"));
    let _ = writeln!(out, "Industry: {}", field(data, "Industry"));
    let _ = writeln!(out, "Market Cap: {}", money(field(data, "MarketCapitalization")));

    out.push_str("\nValuation Metrics:\n");
    for (key, label) in [
        ("PERatio", "P/E Ratio"),
        ("PEGRatio", "PEG Ratio"),
        ("PriceToBookRatio", "Price/Book"),
        ("PriceToSalesRatioTTM", "Price/Sales (TTM)"),
        ("EVToRevenue", "EV/Revenue"),
        ("EVToEBITDA", "EV/EBITDA"),
    ] {
        let _ = writeln!(out, "{label}: {}", field(data, key));
    }

    out.push_str("\nMarket Metrics:\n");
    let _ = writeln!(out, "Beta: {}", field(data, "Beta"));
    let _ = writeln!(out, "Dividend Yield: {dividend_yield}");
    let _ = writeln!(out, "52-Week High: {}", field(data, "52WeekHigh"));
    let _ = writeln!(out, "52-Week Low: {}", field(data, "52WeekLow"));
    let _ = writeln!(out, "Analyst Target: {}", field(data, "AnalystTargetPrice"));
    let _ = write!(out, "\nDescription: {description}");
    Ok(out)
}

fn render_statement(report: FundamentalReport, ticker: &str, data: &Value) -> Result<String> {
    let quarterly = reports(data, "quarterlyReports", QUARTERLY_PERIODS);
    let annual = reports(data, "annualReports", ANNUAL_PERIODS);
    if quarterly.is_empty() && annual.is_empty() {
        return Err(no_data(ticker, report.title()));
    }

    let mut out = format!("{} for {ticker}:\n", report.title());
    for (heading, periods) in [("Quarterly", &quarterly), ("Annual", &annual)] {
        if periods.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{heading}:");
        for period in periods.iter() {
            let _ = writeln!(out, "Period Ending: {}", field(period, "fiscalDateEnding"));
            for (key, label) in report.statement_fields() {
                let _ = writeln!(out, "  {label}: {}", money(field(period, key)));
            }
        }
    }

    let latest = quarterly.first().or(annual.first());
    if let (FundamentalReport::BalanceSheet, Some(latest)) = (report, latest) {
        let current = ratio(
            field(latest, "totalCurrentAssets"),
            field(latest, "totalCurrentLiabilities"),
        );
        let leverage = ratio(
            field(latest, "totalLiabilities"),
            field(latest, "totalShareholderEquity"),
        );
        if let Some(current) = current {
            let _ = writeln!(out, "\nCurrent Ratio: {current:.2}");
        }
        if let Some(leverage) = leverage {
            let _ = writeln!(out, "Debt-to-Equity: {leverage:.2}");
        }
    }

    Ok(out.trim_end().to_string())
}

fn reports<'a>(data: &'a Value, key: &str, limit: usize) -> Vec<&'a Value> {
    data.get(key)
        .and_then(Value::as_array)
        .map(|periods| periods.iter().take(limit).collect())
        .unwrap_or_default()
}

fn render_earnings(ticker: &str, data: &Value) -> Result<String> {
    let quarterly = reports(data, "quarterlyEarnings", QUARTERLY_EARNINGS);
    let annual = reports(data, "annualEarnings", ANNUAL_PERIODS);
    if quarterly.is_empty() && annual.is_empty() {
        return Err(no_data(ticker, "earnings"));
    }

    let mut out = format!("Earnings for {ticker}:\n");
    if !quarterly.is_empty() {
        out.push_str("\nQuarterly (reported vs estimated EPS):\n");
        for q in &quarterly {
            let _ = writeln!(
                out,
                "{} (reported {}): {} vs {}, surprise {} ({}%)",
                field(q, "fiscalDateEnding"),
                field(q, "reportedDate"),
                field(q, "reportedEPS"),
                field(q, "estimatedEPS"),
                field(q, "surprise"),
                field(q, "surprisePercentage"),
            );
        }
    }
    if !annual.is_empty() {
        out.push_str("\nAnnual EPS:\n");
        for a in &annual {
            let _ = writeln!(
                out,
                "{}: {}",
                field(a, "fiscalDateEnding"),
                field(a, "reportedEPS")
            );
        }
    }
    Ok(out.trim_end().to_string())
}

fn no_data(ticker: &str, what: &str) -> TradingError {
    TradingError::DataUnavailable {
        symbol: ticker.to_string(),
        reason: format!("no {} data", what.to_lowercase()),
    }
}

/// Fetches and renders one [`FundamentalReport`]
#[derive(Debug, Clone)]
pub struct FundamentalsCollector {
    client: Arc<AlphaVantageClient>,
    report: FundamentalReport,
}

impl FundamentalsCollector {
    /// Create a collector for `report`
    pub fn new(client: Arc<AlphaVantageClient>, report: FundamentalReport) -> Self {
        Self { client, report }
    }

    /// One collector per report, sharing the client and its rate limiter
    pub fn all(client: Arc<AlphaVantageClient>) -> Vec<Arc<dyn Collector>> {
        FundamentalReport::ALL
            .into_iter()
            .map(|report| Arc::new(Self::new(client.clone(), report)) as Arc<dyn Collector>)
            .collect()
    }
}

#[async_trait]
impl Collector for FundamentalsCollector {
    fn name(&self) -> &str {
        self.report.title()
    }

    async fn collect(&self, request: &CollectRequest) -> Result<String> {
        let data = self
            .client
            .fetch(self.report.function(), &request.ticker)
            .await?;
        self.report.render(&request.ticker, &data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_money() {
        assert_eq!(money("1234567"), "$1,234,567");
        assert_eq!(money("-9500"), "-$9,500");
        assert_eq!(money("999"), "$999");
        assert_eq!(money("N/A"), "N/A");
    }

    #[test]
    fn test_check_response() {
        assert!(check_response(json!({"Symbol": "AMD"})).is_ok());
        assert!(matches!(
            check_response(json!({"Note": "Thank you for using Alpha Vantage!"})),
            Err(TradingError::RateLimitExceeded { .. })
        ));
        let err = check_response(json!({"Error Message": "Invalid API call."})).unwrap_err();
        assert_eq!(err.to_string(), "Alpha Vantage error: Invalid API call.");
    }

    #[test]
    fn test_render_overview() {
        let data = json!({
            "Symbol": "AMD",
            "Name": "Advanced Micro Devices Inc",
            "Sector": "TECHNOLOGY",
            "MarketCapitalization": "262000000000",
            "PERatio": "240.5",
            "PEGRatio": "None",
            "DividendYield": "0",
            "Description": "Advanced Micro Devices designs processors."
        });
        let text = FundamentalReport::Overview.render("AMD", &data).unwrap();
        assert!(text.contains("Name: Advanced Micro Devices Inc"));
        assert!(text.contains("Market Cap: $262,000,000,000"));
        assert!(text.contains("P/E Ratio: 240.5"));
        assert!(text.contains("PEG Ratio: N/A"));
        assert!(text.contains("Dividend Yield: 0.00%"));

        assert!(FundamentalReport::Overview.render("AMD", &json!({})).is_err());
    }

    #[test]
    fn test_render_balance_sheet() {
        let quarter = |date: &str| {
            json!({
                "fiscalDateEnding": date,
                "totalAssets": "67885000000",
                "totalCurrentAssets": "20000000000",
                "totalCurrentLiabilities": "8000000000",
                "totalLiabilities": "11000000000",
                "totalShareholderEquity": "55000000000",
            })
        };
        let data = json!({
            "quarterlyReports": [
                quarter("2024-03-31"), quarter("2023-12-31"), quarter("2023-09-30"),
                quarter("2023-06-30"), quarter("2023-03-31")
            ],
            "annualReports": [quarter("2023-12-31")],
        });

        let text = FundamentalReport::BalanceSheet.render("AMD", &data).unwrap();
        assert!(text.starts_with("Balance Sheet for AMD:"));
        assert_eq!(text.matches("Period Ending:").count(), 5);
        assert!(!text.contains("2023-03-31"));
        assert!(text.contains("Current Ratio: 2.50"));
        assert!(text.contains("Debt-to-Equity: 0.20"));
        assert!(text.contains("Long-term Debt: N/A"));
    }

    #[test]
    fn test_render_earnings() {
        let data = json!({
            "quarterlyEarnings": [{
                "fiscalDateEnding": "2024-03-31",
                "reportedDate": "2024-04-30",
                "reportedEPS": "0.62",
                "estimatedEPS": "0.61",
                "surprise": "0.01",
                "surprisePercentage": "1.6393"
            }],
            "annualEarnings": [{"fiscalDateEnding": "2023-12-31", "reportedEPS": "2.65"}]
        });
        let text = FundamentalReport::Earnings.render("AMD", &data).unwrap();
        assert!(text.contains("2024-03-31 (reported 2024-04-30): 0.62 vs 0.61"));
        assert!(text.contains("2023-12-31: 2.65"));

        let err = FundamentalReport::CashFlow.render("AMD", &json!({})).unwrap_err();
        assert!(matches!(err, TradingError::DataUnavailable { .. }));
    }

    #[tokio::test]
    #[ignore] // Requires ALPHA_VANTAGE_API_KEY and network access
    async fn test_fetch_overview() {
        let key = std::env::var("ALPHA_VANTAGE_API_KEY").unwrap();
        let client = AlphaVantageClient::new(key, 5, Duration::from_secs(30)).unwrap();
        let data = client.fetch("OVERVIEW", "IBM").await.unwrap();
        assert!(FundamentalReport::Overview.render("IBM", &data).is_ok());
    }
}
