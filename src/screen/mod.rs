//! Content screener: deterministic pre-publication and pre-install risk
//! detection.
//!
//! Two layers. The first is a set of deterministic checks (pattern scan,
//! scope, structure, naming, unicode, manifest) aggregated by
//! [`lint_dir`]. The second is the review layer: a closed rubric of
//! categories, a context builder for an external review agent, and a
//! reference [`PatternDetector`] exercised by the self-test harness.

pub mod detector;
pub mod manifest_check;
pub mod naming;
pub mod patterns;
pub mod review;
pub mod rubric;
pub mod scanner;
pub mod scope;
pub mod selftest;
pub mod structure;
pub mod unicode;

pub use detector::{PatternDetector, ReviewDetector};
pub use rubric::{
    aggregate_risk, recommendation, Confidence, ReviewCategory, ReviewFinding, ReviewSeverity,
    RiskLevel,
};
pub use selftest::{run_selftest, SelfTestSummary};

use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::manifest::SkillManifest;

/// Text files the scanner and unicode checks cover.
pub const SCANNED_FILES: &[&str] = &["SKILL.md", "reference.md", "CHANGELOG.md"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// One screener finding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finding {
    pub severity: Severity,
    /// Which check produced this finding.
    pub check: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// 1-based line number, when the finding is line-anchored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Rule or finding id, e.g. `injection/ignore-instructions`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// Result of one named check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub findings: Vec<Finding>,
}

impl CheckResult {
    pub fn passed(&self) -> bool {
        !self
            .findings
            .iter()
            .any(|finding| finding.severity == Severity::Error)
    }
}

/// Finding counts by severity.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SeverityScore {
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

/// Aggregated lint output.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub checks: Vec<CheckResult>,
    /// True iff no finding anywhere has error severity.
    pub pass: bool,
    pub score: SeverityScore,
    pub duration_ms: u128,
}

impl LintResult {
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.checks.iter().flat_map(|check| check.findings.iter())
    }
}

/// Run every deterministic check over a skill source directory.
///
/// `existing_names` feeds the typosquat check; pass the catalog's
/// current skill names when available.
pub fn lint_dir(dir: &Path, existing_names: &[String]) -> Result<LintResult> {
    let started = Instant::now();
    let mut checks = Vec::new();

    checks.push(CheckResult {
        name: "structure".to_string(),
        findings: structure::check_structure(dir, &structure::SizeLimits::default())?,
    });

    let manifest_path = dir.join("manifest.yaml");
    let manifest_yaml = if manifest_path.exists() {
        Some(std::fs::read_to_string(&manifest_path)?)
    } else {
        None
    };
    let manifest = manifest_yaml
        .as_deref()
        .and_then(|yaml| SkillManifest::from_yaml(yaml).ok());

    checks.push(CheckResult {
        name: "manifest".to_string(),
        findings: match manifest_yaml.as_deref() {
            Some(yaml) => manifest_check::check_manifest(yaml),
            None => Vec::new(),
        },
    });

    let mut pattern_findings = Vec::new();
    let mut unicode_findings = Vec::new();
    for file in SCANNED_FILES {
        let path = dir.join(file);
        if !path.exists() {
            continue;
        }
        let content = std::fs::read_to_string(&path)?;
        pattern_findings.extend(scanner::scan_content(file, &content));
        unicode_findings.extend(unicode::check_unicode(file, &content));
    }
    if let Some(yaml) = manifest_yaml.as_deref() {
        unicode_findings.extend(unicode::check_unicode("manifest.yaml", yaml));
    }
    checks.push(CheckResult {
        name: "patterns".to_string(),
        findings: pattern_findings,
    });
    checks.push(CheckResult {
        name: "unicode".to_string(),
        findings: unicode_findings,
    });

    if let Some(manifest) = &manifest {
        let skill_md_path = dir.join("SKILL.md");
        if skill_md_path.exists() {
            let skill_md = std::fs::read_to_string(&skill_md_path)?;
            checks.push(CheckResult {
                name: "scope".to_string(),
                findings: scope::check_scope(manifest, &skill_md),
            });
        }
        checks.push(CheckResult {
            name: "naming".to_string(),
            findings: naming::check_naming(&manifest.name, existing_names),
        });
    }

    let mut score = SeverityScore::default();
    for finding in checks.iter().flat_map(|check| check.findings.iter()) {
        match finding.severity {
            Severity::Error => score.errors += 1,
            Severity::Warning => score.warnings += 1,
            Severity::Info => score.info += 1,
        }
    }

    Ok(LintResult {
        pass: score.errors == 0,
        score,
        duration_ms: started.elapsed().as_millis(),
        checks,
    })
}
