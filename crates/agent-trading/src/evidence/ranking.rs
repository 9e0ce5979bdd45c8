//! Dedupe, filter, rank and cap

use super::item::{EvidenceItem, sha256_hex};
use std::collections::HashSet;

/// Leading title tokens hashed into a topic key
pub const TOPIC_TOKENS: usize = 7;

/// Keep the first item seen for every dedupe key, preserving order
pub fn dedupe(items: impl IntoIterator<Item = EvidenceItem>) -> Vec<EvidenceItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.dedupe_key()))
        .collect()
}

/// Keep items scoring at or above `threshold`
pub fn filter(items: Vec<EvidenceItem>, threshold: f64) -> Vec<EvidenceItem> {
    items
        .into_iter()
        .filter(|item| item.relevance_score >= threshold)
        .collect()
}

/// Sort by score descending, then publish time descending
///
/// Unparsable timestamps sort below every parsable one on a score tie. The
/// sort is stable.
pub fn rank(mut items: Vec<EvidenceItem>) -> Vec<EvidenceItem> {
    items.sort_by(|a, b| {
        b.relevance_score
            .total_cmp(&a.relevance_score)
            .then_with(|| b.published().cmp(&a.published()))
    });
    items
}

/// Truncate to the first `n` items
pub fn cap(mut items: Vec<EvidenceItem>, n: usize) -> Vec<EvidenceItem> {
    items.truncate(n);
    items
}

/// Rough count of distinct topics among `items`
///
/// Two titles sharing their first [`TOPIC_TOKENS`] lowercased words count
/// once. Untitled items are ignored.
pub fn estimate_topic_diversity(items: &[EvidenceItem]) -> usize {
    items
        .iter()
        .filter_map(|item| {
            let title = item.title.trim().to_lowercase();
            if title.is_empty() {
                return None;
            }
            let lead = title
                .split_whitespace()
                .take(TOPIC_TOKENS)
                .collect::<Vec<_>>()
                .join(" ");
            Some(sha256_hex(&lead))
        })
        .collect::<HashSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, url: &str, score: f64, published_at: &str) -> EvidenceItem {
        EvidenceItem {
            title: title.to_string(),
            url: url.to_string(),
            relevance_score: score,
            published_at: published_at.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_dedupe_first_seen_wins() {
        let items = vec![
            item("First", "https://a.example/1", 0.1, ""),
            item("Other", "https://a.example/2", 0.2, ""),
            item("Second copy", "HTTPS://A.EXAMPLE/1", 0.9, ""),
            item("No url", "", 0.3, ""),
            item("No url", "", 0.4, ""),
        ];

        let kept = dedupe(items);
        let titles: Vec<_> = kept.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Other", "No url"]);
        assert_eq!(kept[2].relevance_score, 0.3);
    }

    #[test]
    fn test_filter_threshold_is_inclusive() {
        let items = vec![
            item("below", "u1", 0.59, ""),
            item("exact", "u2", 0.6, ""),
            item("above", "u3", 0.9, ""),
        ];
        let kept = filter(items, 0.6);
        let titles: Vec<_> = kept.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["exact", "above"]);
    }

    #[test]
    fn test_rank_orders_by_score_then_recency() {
        let items = vec![
            item("old", "u1", 0.7, "2024-01-01T00:00:00Z"),
            item("unparsable", "u2", 0.7, "last tuesday"),
            item("top", "u3", 0.9, ""),
            item("new", "u4", 0.7, "2024-03-01"),
            item("low", "u5", 0.6, "2024-05-01"),
        ];

        let ranked = rank(items);
        let titles: Vec<_> = ranked.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["top", "new", "old", "unparsable", "low"]);
        assert!(
            ranked
                .windows(2)
                .all(|w| w[0].relevance_score >= w[1].relevance_score)
        );
    }

    #[test]
    fn test_cap() {
        let items = vec![item("a", "1", 0.9, ""), item("b", "2", 0.8, "")];
        assert_eq!(cap(items.clone(), 1).len(), 1);
        assert_eq!(cap(items, 10).len(), 2);
    }

    #[test]
    fn test_topic_diversity() {
        let items = vec![
            item("AMD beats estimates on strong data center demand this quarter", "1", 0.9, ""),
            item("AMD beats estimates on strong data center demand again", "2", 0.9, ""),
            item("Fed signals patience", "3", 0.7, ""),
            item("   ", "4", 0.7, ""),
        ];
        assert_eq!(estimate_topic_diversity(&items), 2);
        assert_eq!(estimate_topic_diversity(&[]), 0);
    }
}
