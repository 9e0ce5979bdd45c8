//! Prompt templates for every analysis stage
//!
//! Templates are rendered with minijinja in strict mode, so a context that
//! misses a variable fails loudly instead of producing an empty section.
//! The output shape is not part of these prompts: the extractor adds the
//! schema or shape description itself.

use crate::error::Result;
use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;

/// Template names
pub const NEWS: &str = "news";
pub const TECHNICAL: &str = "technical";
pub const FUNDAMENTALS: &str = "fundamentals";
pub const BULL: &str = "bull";
pub const BEAR: &str = "bear";
pub const SYNTHESIS: &str = "synthesis";

/// Stand-ins for upstream records that are missing
pub const NO_NEWS: &str = "No news analysis available";
pub const NO_MARKET: &str = "No market analysis available";
pub const NO_FUNDAMENTALS: &str = "No fundamental analysis available";
pub const NO_BULL: &str = "No bull case available";
pub const NO_BEAR: &str = "No bear case available";

/// System prompt for the analyst stages
pub const ANALYST_SYSTEM: &str = "You are a rigorous equity research analyst. Base every statement on \
the data you are given, cite concrete values, and never invent figures, events or sources.";

/// System prompt for the final decision
pub const SUPERVISOR_SYSTEM: &str = "You are the chief investment officer of a research desk. You weigh \
your team's analyses against each other and give balanced, actionable, risk-tiered guidance.";

const NEWS_TEMPLATE: &str = r#"You are a company-focused markets news analyst. Using ONLY the articles below, which were already filtered for relevance to {{ ticker }}, analyse the news flow for {{ ticker }} over the last {{ lookback_days }} days up to {{ date }}.

Coverage: {{ coverage.articles }} articles kept out of {{ coverage.raw_articles }} collected, from {{ coverage.sources }} sources, about {{ coverage.unique_topics }} distinct topics.

**ARTICLES:**
{% for article in articles %}
{{ loop.index }}. [{{ article.impact_scope }} | relevance {{ article.relevance_score | round(2) }}] {{ article.title }}
   {{ article.source }}{% if article.published_at %}, {{ article.published_at }}{% endif %}{% if article.url %}
   {{ article.url }}{% endif %}{% if article.snippet %}
   {{ article.snippet }}{% endif %}
{% endfor %}
Requirements:
1. Summarise the news flow in 2-3 sentences.
2. Group the articles into macro or sector themes and judge each as a tailwind, headwind or mixed for {{ ticker }}.
3. Assess the impact on demand, costs, regulation and valuation. Use "uncertain" where the articles do not support a view.
4. List dated catalysts and the main risks the news points to.
5. Highlight the most decision-relevant articles, using only titles, sources and links that appear above.
6. Rate your confidence from 0.0 to 1.0; low coverage means low confidence."#;

const TECHNICAL_TEMPLATE: &str = r#"You are an expert market analyst. Analyse the following market data for {{ ticker }} as of {{ date }}.

{{ evidence }}

Requirements:
1. Analysis summary: a 2-3 sentence executive summary.
2. Indicators: interpret up to 8 of the most relevant indicators with their actual values.
3. Trend: assess the short-term (1-5 days), medium-term (1-4 weeks) and long-term (1-3 months) trend.
4. Key insights: 3-5 actionable observations for traders.
5. Risk factors: 2-4 concerns the data reveals.
6. Market sentiment: bullish, bearish or neutral overall.
7. Confidence: 0.0 to 1.0. Lower it for every section marked unavailable.

Be specific and data-driven. Avoid generic statements."#;

const FUNDAMENTALS_TEMPLATE: &str = r#"You are an expert fundamental analyst specialising in financial statement analysis and company valuation. Analyse {{ ticker }} as of {{ date }} using the data below.

{{ evidence }}

Requirements:
1. Valuation: report the P/E, PEG and price-to-book ratios when present and judge whether the stock is undervalued, fairly valued or overvalued. Use "insufficient_data" when the ratios are missing.
2. Financial health: score liquidity, leverage, profitability and cash flow from 0 to 10 and grade the overall health.
3. Growth: characterise the revenue and earnings trends across the reported periods, how sustainable growth is, and what drives it.
4. List key strengths, red flags and competitive advantages.
5. Give a rating from strong_buy to strong_sell.
6. Confidence: 0.0 to 1.0. Lower it for every section marked unavailable."#;

const BULL_TEMPLATE: &str = r#"You are an expert BULL analyst making the strongest possible case for BUYING {{ ticker }} as of {{ date }}.

Extract every positive signal, identify the catalysts that could drive the price higher, and build a compelling thesis. Stay intellectually honest about the risks while keeping a bullish stance.

**NEWS ANALYSIS:**
{{ news }}

**MARKET ANALYSIS:**
{{ market }}

**FUNDAMENTAL ANALYSIS:**
{{ fundamentals }}

Requirements:
1. Thesis summary: 3-4 sentences on why {{ ticker }} is a buy now.
2. Bullish signals: 3-5 technical and 3-5 fundamental signals with their values.
3. Catalysts: near-term and long-term. Prefer dated events from the news analysis and reference articles by title only.
4. Target price direction and time horizon.
5. Risk acknowledgment: the main risks and how they are mitigated.
6. Conviction from 0.0 to 1.0 and a recommended action (strong_buy, buy or accumulate)."#;

const BEAR_TEMPLATE: &str = r#"You are an expert BEAR analyst making the strongest possible case for SELLING or AVOIDING {{ ticker }} as of {{ date }}.

Extract every negative signal, identify the risks that could drive the price lower, and directly challenge the bull case.

**NEWS ANALYSIS:**
{{ news }}

**MARKET ANALYSIS:**
{{ market }}

**FUNDAMENTAL ANALYSIS:**
{{ fundamentals }}

**BULL CASE TO REBUT:**
{{ bull }}

Requirements:
1. Thesis summary: 3-4 sentences on why {{ ticker }} should be sold or avoided now.
2. Bearish signals: 3-5 technical and 3-5 fundamental signals with their values.
3. Downside risks: near-term and long-term. Reference articles by title only.
4. Target price direction and time horizon.
5. Counter-arguments: the weaknesses of the bull case and why the bulls are wrong.
6. Conviction from 0.0 to 1.0 and a recommended action (strong_sell, sell or avoid)."#;

const SYNTHESIS_TEMPLATE: &str = r#"You are the CHIEF INVESTMENT OFFICER making the final trading recommendation for {{ ticker }} as of {{ date }}.

Your team delivered the analyses below. Synthesise them into one coherent thesis, weigh the bull case against the bear case, and give risk-tiered recommendations with concrete entry and exit guidance.

**NEWS ANALYSIS:**
{{ news }}

**MARKET ANALYSIS (technical):**
{{ market }}

**FUNDAMENTAL ANALYSIS (financial):**
{{ fundamentals }}

**BULL CASE:**
{{ bull }}

**BEAR CASE:**
{{ bear }}

Requirements:
1. Executive summary: 4-5 sentences with the balanced thesis and overall approach.
2. Market thesis and fundamental thesis: 2-3 sentences each.
3. Score the strength of the bull case and of the bear case from 0 to 10 and state the consensus direction (bullish, bearish, neutral or mixed).
4. Recommendations for low-, medium- and high-risk investors: action, position size, entry strategy, optional stop loss and rationale. The three tiers should be DIFFERENT unless there is genuine consensus; do not give the same action to every tier by default.
5. Outlook for the short, medium and long term.
6. Key decision factors and monitoring points. Prefer dated catalysts.
7. Final confidence from 0.0 to 1.0.

Do not invent facts beyond the analyses provided."#;

/// Compiled templates for every stage
#[derive(Debug)]
pub struct PromptLibrary {
    env: Environment<'static>,
}

impl PromptLibrary {
    /// Compile the built-in templates
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);

        for (name, source) in [
            (NEWS, NEWS_TEMPLATE),
            (TECHNICAL, TECHNICAL_TEMPLATE),
            (FUNDAMENTALS, FUNDAMENTALS_TEMPLATE),
            (BULL, BULL_TEMPLATE),
            (BEAR, BEAR_TEMPLATE),
            (SYNTHESIS, SYNTHESIS_TEMPLATE),
        ] {
            env.add_template(name, source)?;
        }

        Ok(Self { env })
    }

    /// Render template `name` with `context`
    pub fn render<C: Serialize>(&self, name: &str, context: C) -> Result<String> {
        Ok(self.env.get_template(name)?.render(context)?)
    }
}
