//! Skill manifest model and parsing.
//!
//! Every skill version carries a `manifest.yaml` describing the skill:
//! identity, author, required capabilities, and a typed config schema.
//! Parsing is strict serde; per-field lint findings live in
//! [`crate::screen::manifest_check`].

use once_cell::sync::Lazy;
use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{KkError, Result};

/// Skill names: lowercase alphanumerics and hyphens, no leading or
/// trailing hyphen.
pub static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]*[a-z0-9]$").expect("invalid skill name regex"));

pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillManifest {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: Author,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub config: Vec<ConfigField>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub frameworks: Option<Frameworks>,
    /// Catalog-assigned; ignored when supplied by an author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_level: Option<TrustLevel>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Author {
    pub name: String,
    pub github: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Capabilities {
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<Vec<String>>,
}

impl Capabilities {
    /// All declared capabilities, required first.
    pub fn declared(&self) -> impl Iterator<Item = &str> {
        self.required
            .iter()
            .chain(self.optional.iter().flatten())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Frameworks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tested: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigField {
    pub key: String,
    #[serde(rename = "type")]
    pub field_type: ConfigFieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFieldType {
    /// Stored in the platform secure store, never in plain config.
    Credential,
    String,
    Number,
    Boolean,
    Enum,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TrustLevel {
    FirstParty,
    Verified,
    Community,
}

impl std::fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FirstParty => write!(f, "first-party"),
            Self::Verified => write!(f, "verified"),
            Self::Community => write!(f, "community"),
        }
    }
}

impl SkillManifest {
    pub fn from_yaml(input: &str) -> Result<Self> {
        serde_yaml::from_str(input)
            .map_err(|err| KkError::Invalid(format!("manifest parse error: {err}")))
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Strict validation for catalog-side use (index build, signing).
    /// Lint-time per-field findings are produced separately.
    pub fn validate(&self) -> Result<()> {
        if self.name.len() < NAME_MIN_LEN || self.name.len() > NAME_MAX_LEN {
            return Err(KkError::Invalid(format!(
                "skill name must be {NAME_MIN_LEN}-{NAME_MAX_LEN} characters: {}",
                self.name
            )));
        }
        if !NAME_RE.is_match(&self.name) {
            return Err(KkError::Invalid(format!(
                "skill name must match ^[a-z0-9][a-z0-9-]*[a-z0-9]$: {}",
                self.name
            )));
        }
        Version::parse(&self.version)
            .map_err(|err| KkError::Invalid(format!("version must be valid semver: {err}")))?;
        if self.description.trim().is_empty() {
            return Err(KkError::Invalid("description must be non-empty".to_string()));
        }
        if self.author.name.trim().is_empty() || self.author.github.trim().is_empty() {
            return Err(KkError::Invalid(
                "author.name and author.github must be non-empty".to_string(),
            ));
        }
        for field in &self.config {
            if field.key.trim().is_empty() {
                return Err(KkError::Invalid("config key must be non-empty".to_string()));
            }
            if field.field_type == ConfigFieldType::Enum
                && field.enum_values.as_ref().map_or(true, Vec::is_empty)
            {
                return Err(KkError::Invalid(format!(
                    "config field {} has enum type but no enum_values",
                    field.key
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) const SAMPLE_YAML: &str = r#"
name: weather-check
version: 1.0.0
description: Fetch and summarize the local weather forecast
author:
  name: Jordan Fields
  github: jfields
capabilities:
  required:
    - network
  optional:
    - location
config:
  - key: api_key
    type: credential
    required: true
    description: Weather provider API key
  - key: units
    type: enum
    required: false
    default: metric
    description: Unit system for temperatures
    enum_values:
      - metric
      - imperial
tags:
  - weather
  - forecast
category: utilities
"#;

    #[test]
    fn parses_and_validates_sample() {
        let manifest = SkillManifest::from_yaml(SAMPLE_YAML).unwrap();
        manifest.validate().unwrap();
        assert_eq!(manifest.name, "weather-check");
        assert_eq!(manifest.config[0].field_type, ConfigFieldType::Credential);
        assert_eq!(
            manifest.capabilities.declared().collect::<Vec<_>>(),
            vec!["network", "location"]
        );
    }

    #[test]
    fn yaml_round_trip_preserves_fields() {
        let manifest = SkillManifest::from_yaml(SAMPLE_YAML).unwrap();
        let reparsed = SkillManifest::from_yaml(&manifest.to_yaml().unwrap()).unwrap();
        assert_eq!(manifest, reparsed);
    }

    #[test]
    fn rejects_bad_names() {
        let mut manifest = SkillManifest::from_yaml(SAMPLE_YAML).unwrap();
        for bad in ["A-upper", "-leading", "trailing-", "x", "has_underscore"] {
            manifest.name = bad.to_string();
            assert!(manifest.validate().is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn rejects_enum_without_values() {
        let mut manifest = SkillManifest::from_yaml(SAMPLE_YAML).unwrap();
        manifest.config[1].enum_values = None;
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("enum_values"));
    }

    #[test]
    fn rejects_non_semver_version() {
        let mut manifest = SkillManifest::from_yaml(SAMPLE_YAML).unwrap();
        manifest.version = "1.0".to_string();
        assert!(manifest.validate().is_err());
    }
}
