//! The review rubric: a closed set of categories with fixed default
//! severities, plus risk aggregation and the install recommendation.

use serde::{Deserialize, Serialize};

use crate::manifest::TrustLevel;

/// Maximum evidence snippet length carried by a review finding.
pub const EVIDENCE_MAX_LEN: usize = 120;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewCategory {
    CredentialAccess,
    DataExfiltration,
    SecurityModification,
    InstructionHiding,
    ScopeMismatch,
    PermissionEscalation,
    UnclearPurpose,
    ExcessiveCapabilities,
}

impl ReviewCategory {
    pub const ALL: [ReviewCategory; 8] = [
        Self::CredentialAccess,
        Self::DataExfiltration,
        Self::SecurityModification,
        Self::InstructionHiding,
        Self::ScopeMismatch,
        Self::PermissionEscalation,
        Self::UnclearPurpose,
        Self::ExcessiveCapabilities,
    ];

    pub fn default_severity(self) -> ReviewSeverity {
        match self {
            Self::CredentialAccess | Self::DataExfiltration | Self::SecurityModification => {
                ReviewSeverity::Critical
            }
            Self::InstructionHiding | Self::ScopeMismatch | Self::PermissionEscalation => {
                ReviewSeverity::High
            }
            Self::UnclearPurpose | Self::ExcessiveCapabilities => ReviewSeverity::Medium,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CredentialAccess => "credential-access",
            Self::DataExfiltration => "data-exfiltration",
            Self::SecurityModification => "security-modification",
            Self::InstructionHiding => "instruction-hiding",
            Self::ScopeMismatch => "scope-mismatch",
            Self::PermissionEscalation => "permission-escalation",
            Self::UnclearPurpose => "unclear-purpose",
            Self::ExcessiveCapabilities => "excessive-capabilities",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::CredentialAccess => "Reads, collects, or targets stored secrets",
            Self::DataExfiltration => "Sends local data to an external destination",
            Self::SecurityModification => "Weakens security controls or monitoring",
            Self::InstructionHiding => "Overrides or conceals instructions from the user",
            Self::ScopeMismatch => "Content exceeds the declared purpose and capabilities",
            Self::PermissionEscalation => "Requests elevated privileges it does not need",
            Self::UnclearPurpose => "Purpose is too vague to assess",
            Self::ExcessiveCapabilities => "Declares more capabilities than its purpose needs",
        }
    }
}

impl std::fmt::Display for ReviewCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ReviewSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ReviewSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for ReviewSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// One finding from the review layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewFinding {
    pub category: ReviewCategory,
    pub severity: ReviewSeverity,
    pub description: String,
    /// Snippet from the matched region, at most [`EVIDENCE_MAX_LEN`] chars.
    pub evidence: String,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        write!(f, "{name}")
    }
}

/// Overall risk is the maximum severity across findings.
pub fn aggregate_risk(findings: &[ReviewFinding]) -> RiskLevel {
    findings
        .iter()
        .map(|finding| match finding.severity {
            ReviewSeverity::Critical => RiskLevel::Critical,
            ReviewSeverity::High => RiskLevel::High,
            ReviewSeverity::Medium => RiskLevel::Medium,
            ReviewSeverity::Low => RiskLevel::Low,
        })
        .max()
        .unwrap_or(RiskLevel::None)
}

/// Recommendation text parameterized by risk and trust level. Any
/// critical finding means "do not install" regardless of trust.
pub fn recommendation(risk: RiskLevel, trust: TrustLevel) -> String {
    match risk {
        RiskLevel::Critical => {
            "Do not install: critical security findings were detected.".to_string()
        }
        RiskLevel::High => {
            "Not recommended: high-severity findings need manual review before install."
                .to_string()
        }
        RiskLevel::Medium | RiskLevel::Low => format!(
            "Review the findings before installing this {trust} skill."
        ),
        RiskLevel::None => match trust {
            TrustLevel::FirstParty | TrustLevel::Verified => {
                "Safe to install: no findings.".to_string()
            }
            TrustLevel::Community => {
                "No findings, but this is a community skill: confirm the author and run \
                 `kithkit selftest` before relying on it."
                    .to_string()
            }
        },
    }
}
