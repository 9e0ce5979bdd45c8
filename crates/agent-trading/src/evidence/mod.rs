//! Evidence selection
//!
//! Turns two raw document streams (company-specific and market-wide) into one
//! deduplicated, scored, ranked and capped evidence set:
//!
//! ```text
//! raw company ─┐ truncate ─┐
//!              ├──────────── normalize → dedupe → score → filter → rank → cap
//! raw market ──┘ truncate ─┘
//! ```
//!
//! An empty selection is a normal outcome; callers substitute a degraded
//! record instead of failing.

mod item;
mod ranking;
mod relevance;
mod vocabulary;

pub use item::{EvidenceItem, ImpactScope, MAX_SNIPPET_CHARS, normalize, parse_timestamp};
pub use ranking::{TOPIC_TOKENS, cap, dedupe, estimate_topic_diversity, filter, rank};
pub use relevance::{Relevance, score};
pub use vocabulary::{DEFAULT_MACRO_TERMS, EntityVocabulary, Vocabulary, VocabularyBook};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

/// Per-run selection tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionOptions {
    /// Inclusive lower bound on relevance
    pub relevance_threshold: f64,
    /// Raw company items considered
    pub max_company_articles: usize,
    /// Raw market items considered
    pub max_macro_articles: usize,
    /// Items kept after ranking
    pub max_kept_articles: usize,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            relevance_threshold: 0.6,
            max_company_articles: 50,
            max_macro_articles: 80,
            max_kept_articles: 80,
        }
    }
}

/// Counts reported alongside a selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageStats {
    /// Items kept
    pub articles: usize,
    /// Distinct sources among kept items
    pub sources: usize,
    /// Estimated distinct topics among kept items
    pub unique_topics: usize,
    /// Raw items received across both streams
    pub raw_articles: usize,
}

/// Output of [`EvidenceSelector::select`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Ranked, capped evidence
    pub kept: Vec<EvidenceItem>,
    /// Raw items received across both streams
    pub raw_total: usize,
    /// Sorted distinct non-empty sources of the kept items
    pub sources: Vec<String>,
    /// Estimated distinct topics among kept items
    pub unique_topics: usize,
    /// Kept items that only cleared the threshold without an entity, sector or macro hit
    pub zero_signal_kept: usize,
}

impl Selection {
    /// Whether nothing was kept
    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }

    /// Coverage counts for the record
    pub fn coverage(&self) -> CoverageStats {
        CoverageStats {
            articles: self.kept.len(),
            sources: self.sources.len(),
            unique_topics: self.unique_topics,
            raw_articles: self.raw_total,
        }
    }
}

/// Scores and selects evidence with an injected vocabulary
#[derive(Debug, Clone, Default)]
pub struct EvidenceSelector {
    vocabulary: VocabularyBook,
}

impl EvidenceSelector {
    /// Create a selector over the given vocabulary
    pub fn new(vocabulary: VocabularyBook) -> Self {
        Self { vocabulary }
    }

    /// Vocabulary in use
    pub fn vocabulary(&self) -> &VocabularyBook {
        &self.vocabulary
    }

    /// Select evidence about `entity_id` from the two raw streams
    pub fn select(
        &self,
        entity_id: &str,
        company_raw: &[Value],
        market_raw: &[Value],
        options: &SelectionOptions,
    ) -> Selection {
        let raw_total = company_raw.len() + market_raw.len();
        let company = &company_raw[..company_raw.len().min(options.max_company_articles)];
        let market = &market_raw[..market_raw.len().min(options.max_macro_articles)];

        let vocabulary = self.vocabulary.resolve(entity_id);
        let scored = dedupe(normalize(company).into_iter().chain(normalize(market)))
            .into_iter()
            .map(|mut item| {
                let relevance = score(&item, entity_id, &vocabulary);
                item.relevance_score = relevance.score;
                item.scope = relevance.scope;
                item.zero_signal = relevance.zero_signal;
                item
            })
            .collect();

        let kept = cap(
            rank(filter(scored, options.relevance_threshold)),
            options.max_kept_articles,
        );

        let sources: Vec<String> = kept
            .iter()
            .map(|item| item.source.trim())
            .filter(|source| !source.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let zero_signal_kept = kept.iter().filter(|item| item.zero_signal).count();

        debug!(
            entity = entity_id,
            raw_total,
            kept = kept.len(),
            zero_signal_kept,
            "Evidence selected"
        );

        Selection {
            unique_topics: estimate_topic_diversity(&kept),
            kept,
            raw_total,
            sources,
            zero_signal_kept,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn selector() -> EvidenceSelector {
        EvidenceSelector::new(VocabularyBook::with_builtin_defaults())
    }

    #[test]
    fn test_empty_streams_select_nothing() {
        let selection = selector().select("AMD", &[], &[], &SelectionOptions::default());
        assert!(selection.is_empty());
        assert_eq!(selection.coverage(), CoverageStats::default());
    }

    #[test]
    fn test_select_pipeline() {
        let company = vec![
            json!({"title": "AMD unveils MI300 accelerators", "url": "https://n.example/1",
                   "source": "Reuters", "published_at": "2024-01-02T10:00:00Z"}),
            json!({"title": "Unrelated lifestyle story of the day", "url": "https://n.example/2",
                   "source": "Blog"}),
        ];
        let market = vec![
            json!({"title": "AMD unveils MI300 accelerators", "url": "https://n.example/1",
                   "source": "Wire copy"}),
            json!({"title": "Semiconductor tariff fears hit chips and GPU makers", "url": "https://n.example/3",
                   "source": "Bloomberg", "published_at": "2024-01-03"}),
            json!("garbage"),
        ];

        let selection = selector().select("AMD", &company, &market, &SelectionOptions::default());

        assert_eq!(selection.raw_total, 5);
        assert_eq!(selection.kept.len(), 2);
        assert_eq!(selection.kept[0].source, "Reuters");
        assert_eq!(selection.kept[0].scope, ImpactScope::Entity);
        assert_eq!(selection.kept[1].scope, ImpactScope::Sector);
        assert_eq!(selection.sources, vec!["Bloomberg", "Reuters"]);
        assert_eq!(selection.unique_topics, 2);
        assert_eq!(selection.zero_signal_kept, 0);
    }

    #[test]
    fn test_per_source_and_kept_caps() {
        let company: Vec<Value> = (0..5)
            .map(|i| json!({"title": format!("AMD Radeon headline number {i}"), "url": format!("c{i}")}))
            .collect();
        let options = SelectionOptions {
            max_company_articles: 3,
            max_kept_articles: 2,
            ..SelectionOptions::default()
        };

        let selection = selector().select("AMD", &company, &[], &options);
        assert_eq!(selection.raw_total, 5);
        assert_eq!(selection.kept.len(), 2);
    }
}
