//! Per-entity scoring vocabulary

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Macro factor keywords that often imply company impact
pub const DEFAULT_MACRO_TERMS: &[&str] = &[
    "oil price",
    "brent",
    "wti",
    "usd index",
    "dxy",
    "tariff",
    "export control",
    "subsidy",
    "interest rate",
    "fed",
    "ecb",
    "boe",
    "pboc",
    "inflation",
    "cpi",
    "ppi",
    "jobs report",
    "unemployment",
    "chips act",
    "supply chain",
    "geopolitical",
    "sanction",
];

/// Terms that tie a document to one entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityVocabulary {
    /// Product and company names that mean the entity itself
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Competitors, suppliers and customers
    #[serde(default)]
    pub competitors: Vec<String>,
    /// Sector and product-track terms
    #[serde(default)]
    pub sector_tags: Vec<String>,
}

impl EntityVocabulary {
    /// Build from string slices
    pub fn new(aliases: &[&str], competitors: &[&str], sector_tags: &[&str]) -> Self {
        Self {
            aliases: owned(aliases),
            competitors: owned(competitors),
            sector_tags: owned(sector_tags),
        }
    }
}

/// Vocabulary resolved for one scoring call
#[derive(Debug, Clone, Copy, Default)]
pub struct Vocabulary<'a> {
    /// Entity aliases
    pub aliases: &'a [String],
    /// Competitor mentions
    pub competitors: &'a [String],
    /// Sector tags
    pub sector_tags: &'a [String],
    /// Macro terms
    pub macro_terms: &'a [String],
}

/// Scoring vocabulary keyed by entity identifier, plus shared macro terms
///
/// Unknown identifiers resolve to empty entity sets; lookups are
/// case-insensitive on the identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyBook {
    #[serde(default)]
    entities: HashMap<String, EntityVocabulary>,
    #[serde(default)]
    macro_terms: Vec<String>,
}

impl VocabularyBook {
    /// Create an empty book
    pub fn new() -> Self {
        Self::default()
    }

    /// The dictionaries shipped with the analyzer
    pub fn with_builtin_defaults() -> Self {
        Self::new()
            .with_entity(
                "AMD",
                EntityVocabulary::new(
                    &["Advanced Micro Devices", "Radeon", "Ryzen", "EPYC", "Instinct MI", "MI300", "Zen"],
                    &["NVIDIA", "NVDA", "Intel", "INTC", "TSMC", "Qualcomm", "QCOM"],
                    &[
                        "semiconductor",
                        "chips",
                        "GPU",
                        "AI accelerator",
                        "data center",
                        "pc shipments",
                        "server cpu",
                        "foundry",
                    ],
                ),
            )
            .with_entity(
                "AAPL",
                EntityVocabulary::new(
                    &["Apple", "iPhone", "iPad", "MacBook", "Vision Pro"],
                    &["Samsung", "Xiaomi", "Huawei", "Google", "Alphabet", "Microsoft", "MSFT"],
                    &[
                        "smartphone",
                        "handset",
                        "wearables",
                        "services revenue",
                        "app store",
                        "supply chain",
                    ],
                ),
            )
            .with_entity(
                "NVDA",
                EntityVocabulary::new(
                    &["NVIDIA", "GeForce", "CUDA", "Hopper", "Blackwell", "RTX"],
                    &["AMD", "Intel", "Broadcom", "AVGO", "Qualcomm"],
                    &["gpu", "ai accelerator", "datacenter", "h100", "blackwell"],
                ),
            )
            .with_entity(
                "TSLA",
                EntityVocabulary::new(
                    &["Tesla", "Model 3", "Cybertruck", "Gigafactory", "Autopilot", "FSD"],
                    &["BYD", "NIO", "Xpeng", "XPENG", "GM", "Ford", "F"],
                    &[
                        "ev",
                        "electric vehicle",
                        "battery",
                        "autonomous driving",
                        "charging network",
                    ],
                ),
            )
            .with_macro_terms(DEFAULT_MACRO_TERMS.iter().copied())
    }

    /// Register (or replace) the vocabulary of an entity
    pub fn with_entity(mut self, identifier: &str, vocabulary: EntityVocabulary) -> Self {
        self.entities
            .insert(identifier.trim().to_uppercase(), vocabulary);
        self
    }

    /// Replace the macro terms
    pub fn with_macro_terms<I, T>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.macro_terms = terms.into_iter().map(Into::into).collect();
        self
    }

    /// Entity vocabulary, if one is registered
    pub fn entity(&self, identifier: &str) -> Option<&EntityVocabulary> {
        self.entities.get(&identifier.trim().to_uppercase())
    }

    /// Macro terms shared by every entity
    pub fn macro_terms(&self) -> &[String] {
        &self.macro_terms
    }

    /// Vocabulary for scoring documents against `identifier`
    pub fn resolve(&self, identifier: &str) -> Vocabulary<'_> {
        let entity = self.entity(identifier);
        Vocabulary {
            aliases: entity.map_or(&[], |e| e.aliases.as_slice()),
            competitors: entity.map_or(&[], |e| e.competitors.as_slice()),
            sector_tags: entity.map_or(&[], |e| e.sector_tags.as_slice()),
            macro_terms: &self.macro_terms,
        }
    }
}

fn owned(terms: &[&str]) -> Vec<String> {
    terms.iter().map(|t| (*t).to_string()).collect()
}
