//! Scope check: does the skill content talk about things its manifest
//! never declared?
//!
//! Each topic group carries detection keywords and relation terms. A
//! topic trips when at least two distinct keywords each appear at least
//! twice in `SKILL.md`; the finding is suppressed when the skill's
//! name, description, or any declared capability relates to the topic.

use super::{Finding, Severity};
use crate::manifest::SkillManifest;

struct TopicGroup {
    topic: &'static str,
    keywords: &'static [&'static str],
    related: &'static [&'static str],
}

const TOPICS: &[TopicGroup] = &[
    TopicGroup {
        topic: "credentials",
        keywords: &[
            "password",
            "credential",
            "token",
            "api key",
            "ssh key",
            "keychain",
            "private key",
            "secret",
        ],
        related: &["credential", "auth", "secret", "password", "key", "login", "vault"],
    },
    TopicGroup {
        topic: "system",
        keywords: &[
            "sudo",
            "chmod",
            "chown",
            "systemctl",
            "launchctl",
            "registry",
            "kernel",
            "/etc/",
            "firewall",
        ],
        related: &["system", "admin", "shell", "process", "exec", "os"],
    },
    TopicGroup {
        topic: "network",
        keywords: &[
            "curl",
            "wget",
            "http request",
            "upload",
            "download",
            "socket",
            "endpoint",
            "post request",
        ],
        related: &["network", "http", "web", "api", "fetch", "request"],
    },
];

const MIN_DISTINCT_KEYWORDS: usize = 2;
const MIN_OCCURRENCES: usize = 2;

pub fn check_scope(manifest: &SkillManifest, skill_md: &str) -> Vec<Finding> {
    let content = skill_md.to_lowercase();
    let declared: String = {
        let mut parts: Vec<String> = vec![
            manifest.name.to_lowercase(),
            manifest.description.to_lowercase(),
        ];
        parts.extend(manifest.capabilities.declared().map(str::to_lowercase));
        parts.join(" ")
    };

    let mut findings = Vec::new();
    for group in TOPICS {
        let hot: Vec<&str> = group
            .keywords
            .iter()
            .copied()
            .filter(|keyword| count_occurrences(&content, keyword) >= MIN_OCCURRENCES)
            .collect();
        if hot.len() < MIN_DISTINCT_KEYWORDS {
            continue;
        }
        if group.related.iter().any(|term| declared.contains(term)) {
            continue;
        }
        findings.push(Finding {
            severity: Severity::Warning,
            check: "scope".to_string(),
            message: format!(
                "SKILL.md repeatedly discusses {} ({}) but no declared capability, name, or description relates to it",
                group.topic,
                hot.join(", ")
            ),
            file: Some("SKILL.md".to_string()),
            line: None,
            pattern: Some("scope/mismatch".to_string()),
        });
    }
    findings
}

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    let mut count = 0;
    let mut from = 0;
    while let Some(position) = haystack[from..].find(needle) {
        count += 1;
        from += position + needle.len();
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather_manifest() -> SkillManifest {
        SkillManifest::from_yaml(
            "name: weather-check\nversion: 1.0.0\ndescription: Weather forecast lookups\n\
             author:\n  name: T\n  github: t\n\
             capabilities:\n  required:\n    - network\n",
        )
        .unwrap()
    }

    #[test]
    fn credential_heavy_content_without_related_capability_warns() {
        let manifest = weather_manifest();
        let skill_md = "Collect the password and the token.\n\
                        Store the password next to the token for later.\n";
        let findings = check_scope(&manifest, skill_md);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].pattern.as_deref(), Some("scope/mismatch"));
        assert!(findings[0].message.contains("credentials"));
    }

    #[test]
    fn single_mentions_do_not_trip() {
        let manifest = weather_manifest();
        let skill_md = "Mention password once and token once.\n";
        assert!(check_scope(&manifest, skill_md).is_empty());
    }

    #[test]
    fn declared_capability_suppresses_the_topic() {
        let manifest = SkillManifest::from_yaml(
            "name: cred-helper\nversion: 1.0.0\ndescription: Manage credentials safely\n\
             author:\n  name: T\n  github: t\n\
             capabilities:\n  required:\n    - credential-store\n",
        )
        .unwrap();
        let skill_md = "Handle the password and the token.\n\
                        Rotate the password and refresh the token.\n";
        assert!(check_scope(&manifest, skill_md).is_empty());
    }

    #[test]
    fn network_topic_suppressed_for_network_capability() {
        let manifest = weather_manifest();
        let skill_md = "Run curl to fetch data, then curl again.\n\
                        Download results, download the forecast.\n";
        assert!(check_scope(&manifest, skill_md).is_empty());
    }
}
