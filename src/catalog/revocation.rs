//! Signed revocation list.
//!
//! Append-only list of `(name, version)` pairs clients must refuse to
//! install. The signature covers the canonical JSON of the sorted
//! entries array.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::signing::{sign_object, verify_object, Keypair, PublicKey};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RevocationSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl std::fmt::Display for RevocationSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RevocationEntry {
    pub name: String,
    pub version: String,
    pub reason: String,
    pub revoked_at: String,
    pub severity: RevocationSeverity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignedRevocationList {
    pub entries: Vec<RevocationEntry>,
    pub signature: String,
}

impl SignedRevocationList {
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|err| {
            crate::error::KkError::Invalid(format!("revocation list parse error: {err}"))
        })
    }

    pub fn to_canonical_string(&self) -> Result<String> {
        Ok(crate::signing::canonical_json(&serde_json::to_value(
            self,
        )?))
    }
}

/// Sort entries by `(name, version)` and sign the canonical array.
pub fn create_revocation_list(
    mut entries: Vec<RevocationEntry>,
    keypair: &Keypair,
) -> Result<SignedRevocationList> {
    entries.sort_by(|a, b| (a.name.as_str(), a.version.as_str()).cmp(&(b.name.as_str(), b.version.as_str())));
    let signature = sign_object(&serde_json::to_value(&entries)?, keypair);
    Ok(SignedRevocationList { entries, signature })
}

pub fn verify_revocation_list(list: &SignedRevocationList, public: &PublicKey) -> bool {
    match serde_json::to_value(&list.entries) {
        Ok(body) => verify_object(&body, &list.signature, public),
        Err(_) => false,
    }
}

/// Exact match on both name and version.
pub fn is_revoked(list: &SignedRevocationList, name: &str, version: &str) -> bool {
    revocation_for(list, name, version).is_some()
}

/// The matching entry, if any.
pub fn revocation_for<'a>(
    list: &'a SignedRevocationList,
    name: &str,
    version: &str,
) -> Option<&'a RevocationEntry> {
    list.entries
        .iter()
        .find(|entry| entry.name == name && entry.version == version)
}

/// Report which installed `(name, version)` pairs appear in the list.
/// Purely a report: installed state is never mutated.
pub fn check_installed<'a>(
    list: &'a SignedRevocationList,
    installed: &[(String, String)],
) -> Vec<&'a RevocationEntry> {
    installed
        .iter()
        .filter_map(|(name, version)| revocation_for(list, name, version))
        .collect()
}
