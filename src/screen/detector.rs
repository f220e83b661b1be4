//! Pattern-based review detector.
//!
//! The reference implementation of the detector interface used by the
//! self-test harness and the optional pre-install screen. Keyword and
//! regex families map onto rubric categories; confidence rises to high
//! when at least two patterns of a family hit.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use super::rubric::{
    Confidence, ReviewCategory, ReviewFinding, EVIDENCE_MAX_LEN,
};
use super::scanner::normalize_whitespace;
use super::scope;
use crate::manifest::SkillManifest;

/// Interface shared by the self-test harness and pre-install screening.
pub trait ReviewDetector {
    fn detect(&self, manifest: &SkillManifest, content: &str) -> Vec<ReviewFinding>;
}

/// Declared capabilities beyond this count suggest over-reach.
const CAPABILITY_BUDGET: usize = 4;

/// Descriptions shorter than this cannot express a purpose.
const MIN_DESCRIPTION_LEN: usize = 12;

struct Family {
    category: ReviewCategory,
    patterns: Vec<Regex>,
}

fn family(category: ReviewCategory, patterns: &[&str]) -> Family {
    Family {
        category,
        patterns: patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .unwrap_or_else(|err| panic!("invalid detector pattern: {err}"))
            })
            .collect(),
    }
}

static FAMILIES: Lazy<Vec<Family>> = Lazy::new(|| {
    vec![
        family(
            ReviewCategory::CredentialAccess,
            &[
                r"(read|collect|gather|dump|extract|harvest|list)\s+(all\s+)?(the\s+)?(stored\s+)?(passwords|credentials|secrets|api\s+keys|tokens|login\s+information)",
                r"(keychain|credential\s+manager|password\s+vault|secret\s+store)",
                r"\.aws/credentials|\.ssh/|\.netrc|\.git-credentials",
                r"(stored|saved)\s+(login|password|credential)",
                r"browser\s+(profile|cookies|passwords)",
            ],
        ),
        family(
            ReviewCategory::DataExfiltration,
            &[
                r"curl\s[^\n]*\$\(",
                r"(curl|wget)\s[^\n]*(--data|\s-d\s|--form|\s-F\s|--upload-file|\s-T\s)",
                r"(post|send|upload|transmit|forward)\w*\s[^\n]{0,60}(https?://|to\s+[a-z0-9][a-z0-9.-]*\.[a-z]{2,})",
                r"base64\s[^\n]*\|",
            ],
        ),
        family(
            ReviewCategory::SecurityModification,
            &[
                r"disable[^\n]{0,40}(firewall|antivirus|defender|gatekeeper|selinux|protection)",
                r"(turn\s+off|stop|kill)[^\n]{0,40}(security|monitoring|logging|audit)",
                r"modify[^\n]{0,40}(sudoers|hosts\s+file|security\s+polic)",
                r"(bypass|override)[^\n]{0,30}(safety|security|guardrails)",
            ],
        ),
        family(
            ReviewCategory::InstructionHiding,
            &[
                r"(ignore|disregard|forget)\s+(all\s+|any\s+)?(previous|prior|above|earlier)\s+instructions",
                r"do\s+not\s+(tell|inform|alert)\s+the\s+user",
                r"without\s+(telling|informing|notifying|asking)\s+the\s+user",
                r"you\s+are\s+now\s",
                r"(quietly|secretly|silently)\s+(run|execute|perform|stop|send)",
            ],
        ),
        family(
            ReviewCategory::PermissionEscalation,
            &[
                r"\bsudo\s",
                r"chmod\s+777",
                r"set(uid|cap)\b",
                r"run\s+as\s+(root|administrator)",
            ],
        ),
    ]
});

pub struct PatternDetector;

impl ReviewDetector for PatternDetector {
    fn detect(&self, manifest: &SkillManifest, content: &str) -> Vec<ReviewFinding> {
        let mut findings = Vec::new();
        // Normalized form catches phrases split across lines.
        let normalized = normalize_whitespace(content);

        for family in FAMILIES.iter() {
            let mut hits = 0usize;
            let mut first_evidence: Option<String> = None;
            for pattern in &family.patterns {
                if let Some(found) = pattern.find(&normalized) {
                    hits += 1;
                    if first_evidence.is_none() {
                        first_evidence = Some(snippet(&normalized, found.start()));
                    }
                }
            }
            if hits == 0 {
                continue;
            }
            findings.push(ReviewFinding {
                category: family.category,
                severity: family.category.default_severity(),
                description: format!(
                    "{} indicator{} matched for {}",
                    hits,
                    if hits == 1 { "" } else { "s" },
                    family.category
                ),
                evidence: first_evidence.unwrap_or_default(),
                confidence: if hits >= 2 {
                    Confidence::High
                } else {
                    Confidence::Medium
                },
            });
        }

        // Scope-mismatch inference: content topics versus declared
        // capabilities, reusing the lint-layer topic groups.
        for scope_finding in scope::check_scope(manifest, content) {
            findings.push(ReviewFinding {
                category: ReviewCategory::ScopeMismatch,
                severity: ReviewCategory::ScopeMismatch.default_severity(),
                description: "content topics exceed declared capabilities".to_string(),
                evidence: truncate(&scope_finding.message),
                confidence: Confidence::Medium,
            });
        }

        if manifest.description.trim().len() < MIN_DESCRIPTION_LEN {
            findings.push(ReviewFinding {
                category: ReviewCategory::UnclearPurpose,
                severity: ReviewCategory::UnclearPurpose.default_severity(),
                description: "description is too short to express a purpose".to_string(),
                evidence: truncate(&manifest.description),
                confidence: Confidence::Low,
            });
        }

        if manifest.capabilities.required.len() > CAPABILITY_BUDGET {
            findings.push(ReviewFinding {
                category: ReviewCategory::ExcessiveCapabilities,
                severity: ReviewCategory::ExcessiveCapabilities.default_severity(),
                description: format!(
                    "{} required capabilities declared (budget {})",
                    manifest.capabilities.required.len(),
                    CAPABILITY_BUDGET
                ),
                evidence: truncate(&manifest.capabilities.required.join(", ")),
                confidence: Confidence::Medium,
            });
        }

        findings
    }
}

fn snippet(normalized: &str, start: usize) -> String {
    // Regex match offsets are byte positions on char boundaries.
    truncate(&normalized[start..])
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= EVIDENCE_MAX_LEN {
        return text.to_string();
    }
    text.chars().take(EVIDENCE_MAX_LEN - 3).collect::<String>() + "..."
}
