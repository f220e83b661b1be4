//! Index search: AND-combined filters over skill entries.

use serde::Serialize;

use super::{SignedCatalogIndex, SkillEntry};
use crate::manifest::TrustLevel;

/// All supplied filters combine with AND.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Case-insensitive substring over name or description.
    pub text: Option<String>,
    /// Exact tag membership.
    pub tag: Option<String>,
    /// Exact membership in required or optional capabilities.
    pub capability: Option<String>,
}

/// Latest-version projection of a matching skill.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchHit {
    pub name: String,
    pub description: String,
    pub version: String,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub trust_level: TrustLevel,
}

/// Filter the index; results keep the stored (name-sorted) order.
pub fn search(index: &SignedCatalogIndex, query: &SearchQuery) -> Vec<SearchHit> {
    index
        .skills
        .iter()
        .filter(|entry| matches(entry, query))
        .map(|entry| SearchHit {
            name: entry.name.clone(),
            description: entry.description.clone(),
            version: entry.latest.clone(),
            tags: entry.tags.clone(),
            category: entry.category.clone(),
            trust_level: entry.trust_level,
        })
        .collect()
}

fn matches(entry: &SkillEntry, query: &SearchQuery) -> bool {
    if let Some(text) = &query.text {
        let needle = text.to_lowercase();
        if !entry.name.to_lowercase().contains(&needle)
            && !entry.description.to_lowercase().contains(&needle)
        {
            return false;
        }
    }
    if let Some(tag) = &query.tag {
        if !entry.tags.iter().any(|t| t == tag) {
            return false;
        }
    }
    if let Some(capability) = &query.capability {
        if !entry.capabilities.declared().any(|c| c == capability) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{Author, Capabilities};
    use std::collections::BTreeMap;

    fn entry(name: &str, description: &str, tags: &[&str], caps: &[&str]) -> SkillEntry {
        SkillEntry {
            name: name.to_string(),
            description: description.to_string(),
            author: Author {
                name: "Tester".to_string(),
                github: "tester".to_string(),
            },
            capabilities: Capabilities {
                required: caps.iter().map(|c| c.to_string()).collect(),
                optional: None,
            },
            tags: tags.iter().map(|t| t.to_string()).collect(),
            category: None,
            trust_level: TrustLevel::Community,
            latest: "1.0.0".to_string(),
            versions: BTreeMap::new(),
        }
    }

    fn sample_index() -> SignedCatalogIndex {
        SignedCatalogIndex {
            version: 1,
            updated: "2026-02-01T00:00:00Z".to_string(),
            skills: vec![
                entry("json-tools", "Work with JSON documents", &["json"], &["filesystem"]),
                entry("weather-check", "Weather forecast lookups", &["weather"], &["network"]),
            ],
            signature: String::new(),
        }
    }

    #[test]
    fn text_filter_is_case_insensitive_substring() {
        let index = sample_index();
        let hits = search(
            &index,
            &SearchQuery {
                text: Some("WEATHER".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "weather-check");
    }

    #[test]
    fn filters_combine_with_and() {
        let index = sample_index();
        let hits = search(
            &index,
            &SearchQuery {
                text: Some("json".to_string()),
                capability: Some("network".to_string()),
                ..Default::default()
            },
        );
        assert!(hits.is_empty());
    }

    #[test]
    fn tag_filter_is_exact_membership() {
        let index = sample_index();
        let hits = search(
            &index,
            &SearchQuery {
                tag: Some("jso".to_string()),
                ..Default::default()
            },
        );
        assert!(hits.is_empty());
    }

    #[test]
    fn empty_query_returns_everything_in_stored_order() {
        let index = sample_index();
        let hits = search(&index, &SearchQuery::default());
        assert_eq!(
            hits.iter().map(|h| h.name.as_str()).collect::<Vec<_>>(),
            vec!["json-tools", "weather-check"]
        );
    }
}
