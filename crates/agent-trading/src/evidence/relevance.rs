//! Additive relevance scoring

use super::item::{EvidenceItem, ImpactScope};
use super::vocabulary::Vocabulary;

/// Weight of a direct identifier match
pub const ENTITY_WEIGHT: f64 = 0.55;
/// Weight per alias match
pub const ALIAS_WEIGHT: f64 = 0.45;
/// Weight per competitor or supply-chain mention
pub const COMPETITOR_WEIGHT: f64 = 0.25;
/// Weight per sector tag
pub const SECTOR_WEIGHT: f64 = 0.20;
/// Weight per macro term
pub const MACRO_WEIGHT: f64 = 0.12;
/// Subtracted from items with a very short title
pub const SHORT_TITLE_PENALTY: f64 = 0.08;
/// Titles shorter than this many characters are penalised
pub const SHORT_TITLE_CHARS: usize = 8;

/// Score and scope of one item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Relevance {
    /// Clamped to `[0, 1]`
    pub score: f64,
    /// Impact radius
    pub scope: ImpactScope,
    /// No entity, sector or macro term matched
    pub zero_signal: bool,
}

/// Score `item` against `entity_id` and its vocabulary
///
/// Matching is case-insensitive substring search over the title and snippet.
/// Empty terms never match.
pub fn score(item: &EvidenceItem, entity_id: &str, vocabulary: &Vocabulary<'_>) -> Relevance {
    let title = item.title.to_lowercase();
    let text = format!("{title} {}", item.snippet.to_lowercase());
    let mentions = |term: &str| {
        let term = term.trim();
        !term.is_empty() && text.contains(&term.to_lowercase())
    };
    let hits = |terms: &[String]| terms.iter().filter(|t| mentions(t)).count();

    let entity_hit = mentions(entity_id);
    let alias_hits = hits(vocabulary.aliases);
    let competitor_hits = hits(vocabulary.competitors);
    let sector_hits = hits(vocabulary.sector_tags);
    let macro_hits = hits(vocabulary.macro_terms);

    let mut total = alias_hits as f64 * ALIAS_WEIGHT
        + competitor_hits as f64 * COMPETITOR_WEIGHT
        + sector_hits as f64 * SECTOR_WEIGHT
        + macro_hits as f64 * MACRO_WEIGHT;
    if entity_hit {
        total += ENTITY_WEIGHT;
    }
    if title.chars().count() < SHORT_TITLE_CHARS {
        total -= SHORT_TITLE_PENALTY;
    }

    let direct = entity_hit || alias_hits > 0;
    let scope = if direct {
        ImpactScope::Entity
    } else if sector_hits > 0 {
        ImpactScope::Sector
    } else {
        ImpactScope::Macro
    };

    Relevance {
        score: total.clamp(0.0, 1.0),
        scope,
        zero_signal: !direct && sector_hits == 0 && macro_hits == 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, snippet: &str) -> EvidenceItem {
        EvidenceItem {
            title: title.to_string(),
            snippet: snippet.to_string(),
            ..Default::default()
        }
    }

    fn terms(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    struct Fixture {
        aliases: Vec<String>,
        competitors: Vec<String>,
        sector_tags: Vec<String>,
        macro_terms: Vec<String>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                aliases: terms(&["Advanced Micro Devices", "Radeon"]),
                competitors: terms(&["Intel", "NVIDIA"]),
                sector_tags: terms(&["semiconductor", "data center"]),
                macro_terms: terms(&["tariff", "inflation"]),
            }
        }

        fn vocabulary(&self) -> Vocabulary<'_> {
            Vocabulary {
                aliases: &self.aliases,
                competitors: &self.competitors,
                sector_tags: &self.sector_tags,
                macro_terms: &self.macro_terms,
            }
        }
    }

    #[test]
    fn test_entity_scope_and_clamp() {
        let fixture = Fixture::new();
        let relevance = score(
            &item("AMD launches new Radeon GPUs", "Advanced Micro Devices said"),
            "AMD",
            &fixture.vocabulary(),
        );
        assert_eq!(relevance.score, 1.0);
        assert_eq!(relevance.scope, ImpactScope::Entity);
        assert!(!relevance.zero_signal);
    }

    #[test]
    fn test_sector_and_macro_scope() {
        let fixture = Fixture::new();
        let vocab = fixture.vocabulary();

        let sector = score(&item("Semiconductor stocks rally", ""), "AMD", &vocab);
        assert_eq!(sector.scope, ImpactScope::Sector);
        assert!((sector.score - SECTOR_WEIGHT).abs() < 1e-9);

        let macro_only = score(&item("New tariff on imports announced", ""), "AMD", &vocab);
        assert_eq!(macro_only.scope, ImpactScope::Macro);
        assert!(!macro_only.zero_signal);
    }

    #[test]
    fn test_competitor_only_is_flagged_zero_signal() {
        let fixture = Fixture::new();
        let relevance = score(
            &item("Intel and NVIDIA trade blows in earnings week", ""),
            "AMD",
            &fixture.vocabulary(),
        );
        assert_eq!(relevance.scope, ImpactScope::Macro);
        assert!(relevance.zero_signal);
        assert!((relevance.score - 2.0 * COMPETITOR_WEIGHT).abs() < 1e-9);
    }

    #[test]
    fn test_short_title_penalty() {
        let fixture = Fixture::new();
        let relevance = score(&item("Tariff", ""), "AMD", &fixture.vocabulary());
        assert!((relevance.score - (MACRO_WEIGHT - SHORT_TITLE_PENALTY)).abs() < 1e-9);

        let nothing = score(&item("", ""), "AMD", &fixture.vocabulary());
        assert_eq!(nothing.score, 0.0);
    }

    #[test]
    fn test_empty_terms_never_match() {
        let aliases = terms(&["", "  "]);
        let vocab = Vocabulary {
            aliases: &aliases,
            ..Default::default()
        };
        let relevance = score(&item("Anything at all here", ""), "", &vocab);
        assert_eq!(relevance.score, 0.0);
        assert!(relevance.zero_signal);
    }

    #[test]
    fn test_score_is_monotonic_in_hits() {
        let fixture = Fixture::new();
        let vocab = fixture.vocabulary();
        let texts = [
            "Market update for the week",
            "Market update for the week: inflation",
            "Market update for the week: inflation, tariff",
            "Market update for the week: inflation, tariff, semiconductor",
            "Market update for the week: inflation, tariff, semiconductor, Intel",
            "Market update for the week: inflation, tariff, semiconductor, Intel, Radeon",
            "Market update for the week: inflation, tariff, semiconductor, Intel, Radeon, AMD",
        ];

        let scores: Vec<f64> = texts
            .iter()
            .map(|t| score(&item(t, ""), "AMD", &vocab).score)
            .collect();
        assert!(scores.windows(2).all(|w| w[1] >= w[0]), "{scores:?}");
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }
}
