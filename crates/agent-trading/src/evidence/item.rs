//! Canonical evidence items and normalisation of raw source records

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Longest body kept from a raw record, in characters
pub const MAX_SNIPPET_CHARS: usize = 500;

/// Title prefix hashed when an item has no locator, in characters
const TITLE_KEY_CHARS: usize = 64;

const TITLE_KEYS: &[&str] = &["title", "headline"];
const PUBLISHED_KEYS: &[&str] = &["published_at", "date", "time", "datetime", "time_published"];
const SOURCE_KEYS: &[&str] = &["source", "publisher", "domain"];
const URL_KEYS: &[&str] = &["url", "link"];
const BODY_KEYS: &[&str] = &["snippet", "summary", "description"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y%m%dT%H%M%S",
    "%Y%m%dT%H%M",
];

/// Impact radius of an evidence item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactScope {
    /// Names the entity or one of its aliases
    #[serde(rename = "company", alias = "entity")]
    Entity,
    /// Sector-wide
    Sector,
    /// Macroeconomic, and the default for items with no signal
    #[default]
    Macro,
}

impl ImpactScope {
    /// Labels accepted in model-facing schemas
    pub const LABELS: &'static [&'static str] = &["company", "sector", "macro"];
}

/// One externally sourced document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Headline
    pub title: String,
    /// Publish time as given by the source (RFC 3339 when it was a unix time)
    pub published_at: String,
    /// Publisher name
    pub source: String,
    /// Canonical locator
    pub url: String,
    /// Body or summary, at most [`MAX_SNIPPET_CHARS`] characters
    pub snippet: String,
    /// Relevance to the target entity, in `[0, 1]`
    #[serde(default)]
    pub relevance_score: f64,
    /// Impact radius
    #[serde(default, rename = "impact_scope")]
    pub scope: ImpactScope,
    /// Scored above zero without any entity, sector or macro hit
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub zero_signal: bool,
}

impl EvidenceItem {
    /// Map one raw source record onto the canonical shape
    ///
    /// Never fails: missing keys become empty strings and non-object values
    /// become an all-empty item.
    pub fn from_raw(raw: &Value) -> Self {
        let Some(fields) = raw.as_object() else {
            return Self::default();
        };

        Self {
            title: first_text(fields, TITLE_KEYS),
            published_at: first_timestamp(fields, PUBLISHED_KEYS),
            source: first_text(fields, SOURCE_KEYS),
            url: first_text(fields, URL_KEYS),
            snippet: first_text(fields, BODY_KEYS)
                .chars()
                .take(MAX_SNIPPET_CHARS)
                .collect(),
            ..Self::default()
        }
    }

    /// Deduplication key: hash of the locator, else of the leading title text
    pub fn dedupe_key(&self) -> String {
        let locator = self.url.trim();
        if locator.is_empty() {
            let prefix: String = self.title.chars().take(TITLE_KEY_CHARS).collect();
            sha256_hex(&prefix)
        } else {
            sha256_hex(&locator.to_lowercase())
        }
    }

    /// Parsed publish time, `None` when the source value is unparsable
    pub fn published(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.published_at)
    }
}

/// Normalise a batch of raw source records
pub fn normalize(raw: &[Value]) -> Vec<EvidenceItem> {
    raw.iter().map(EvidenceItem::from_raw).collect()
}

/// Parse the timestamp layouts news sources are known to emit
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    let naive = value.strip_suffix('Z').unwrap_or(value);
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(naive, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(naive, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

pub(crate) fn sha256_hex(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

fn first_text(fields: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| fields.get(*key))
        .find_map(|value| match value {
            Value::String(text) if !text.is_empty() => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

fn first_timestamp(fields: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| fields.get(*key))
        .find_map(|value| match value {
            Value::String(text) if !text.is_empty() => Some(text.clone()),
            Value::Number(number) => Some(
                number
                    .as_i64()
                    .and_then(|secs| DateTime::from_timestamp(secs, 0))
                    .map_or_else(|| number.to_string(), |time| time.to_rfc3339()),
            ),
            _ => None,
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_key_aliases() {
        let raw = vec![
            json!({
                "headline": "AMD ships MI300",
                "datetime": 1_704_067_200,
                "source": "Reuters",
                "url": "https://example.com/a",
                "summary": "Shipments began.",
            }),
            json!({
                "title": "Fed holds rates",
                "time_published": "20240105T143000",
                "publisher": "Bloomberg",
                "link": "https://example.com/b",
                "description": "No change.",
            }),
        ];

        let items = normalize(&raw);
        assert_eq!(items[0].title, "AMD ships MI300");
        assert_eq!(items[0].published_at, "2024-01-01T00:00:00+00:00");
        assert_eq!(items[0].snippet, "Shipments began.");
        assert_eq!(items[1].source, "Bloomberg");
        assert_eq!(items[1].url, "https://example.com/b");
        assert!(items[1].published().is_some());
    }

    #[test]
    fn test_normalize_never_fails() {
        let items = normalize(&[json!("not an object"), json!({"title": null})]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], EvidenceItem::default());
        assert_eq!(items[1].title, "");
    }

    #[test]
    fn test_empty_value_falls_through_to_next_key() {
        let item = EvidenceItem::from_raw(&json!({"title": "", "headline": "Chip demand rises"}));
        assert_eq!(item.title, "Chip demand rises");
    }

    #[test]
    fn test_snippet_is_truncated() {
        let long = "x".repeat(MAX_SNIPPET_CHARS + 100);
        let item = EvidenceItem::from_raw(&json!({"snippet": long}));
        assert_eq!(item.snippet.chars().count(), MAX_SNIPPET_CHARS);
    }

    #[test]
    fn test_dedupe_key_prefers_locator() {
        let a = EvidenceItem {
            title: "One".to_string(),
            url: " HTTPS://Example.com/A ".to_string(),
            ..Default::default()
        };
        let b = EvidenceItem {
            title: "Two".to_string(),
            url: "https://example.com/a".to_string(),
            ..Default::default()
        };
        assert_eq!(a.dedupe_key(), b.dedupe_key());

        let untitled = EvidenceItem {
            title: "Same headline".to_string(),
            ..Default::default()
        };
        assert_eq!(untitled.dedupe_key(), sha256_hex("Same headline"));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-01-05T14:30:00Z").is_some());
        assert!(parse_timestamp("2024-01-05T14:30:00+02:00").is_some());
        assert!(parse_timestamp("2024-01-05T14:30:00.123").is_some());
        assert!(parse_timestamp("2024-01-05 14:30:00").is_some());
        assert!(parse_timestamp("20240105T143000").is_some());
        assert!(parse_timestamp("2024-01-05").is_some());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_scope_labels() {
        assert_eq!(serde_json::to_value(ImpactScope::Entity).unwrap(), "company");
        let scope: ImpactScope = serde_json::from_value(json!("entity")).unwrap();
        assert_eq!(scope, ImpactScope::Entity);
    }
}
