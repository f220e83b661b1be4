//! Signed catalog: index model, build/update, revocation, search, cache.

mod cache;
mod index;
mod revocation;
mod search;

pub use cache::IndexCache;
pub use index::{build_index, compare_versions, update_index, verify_index};
pub use revocation::{
    check_installed, create_revocation_list, is_revoked, revocation_for, verify_revocation_list,
    RevocationEntry, RevocationSeverity, SignedRevocationList,
};
pub use search::{search, SearchHit, SearchQuery};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{KkError, Result};
use crate::manifest::{Author, Capabilities, TrustLevel};

/// Current index schema version.
pub const INDEX_VERSION: u32 = 1;

/// One published archive of a skill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillVersion {
    pub version: String,
    /// Relative archive path, e.g. `archives/foo/foo-1.0.0.tar.gz`.
    pub archive: String,
    /// SHA-256 of the archive bytes, lowercase hex.
    pub sha256: String,
    /// Ed25519 signature over the raw 32-byte digest, base64.
    pub signature: String,
    pub size: u64,
    pub published: String,
}

/// One skill with all of its published versions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillEntry {
    pub name: String,
    pub description: String,
    pub author: Author,
    pub capabilities: Capabilities,
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub trust_level: TrustLevel,
    pub latest: String,
    pub versions: BTreeMap<String, SkillVersion>,
}

/// The signed catalog index document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignedCatalogIndex {
    pub version: u32,
    pub updated: String,
    pub skills: Vec<SkillEntry>,
    pub signature: String,
}

impl SignedCatalogIndex {
    /// The signed body: the document minus its `signature` field.
    pub fn body_value(&self) -> Result<Value> {
        Ok(serde_json::json!({
            "version": self.version,
            "updated": self.updated,
            "skills": serde_json::to_value(&self.skills)?,
        }))
    }

    /// Canonical persisted form, signature included.
    pub fn to_canonical_string(&self) -> Result<String> {
        Ok(crate::signing::canonical_json(&serde_json::to_value(self)?))
    }

    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input)
            .map_err(|err| KkError::Invalid(format!("index parse error: {err}")))
    }

    pub fn entry(&self, name: &str) -> Option<&SkillEntry> {
        self.skills.iter().find(|entry| entry.name == name)
    }
}
