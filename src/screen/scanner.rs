//! Two-pass pattern scanner.
//!
//! Pass one tests every single-line rule against each line, carrying a
//! 1-based line number. Pass two tests multiline rules against the
//! whole file with whitespace runs collapsed to single spaces, and
//! suppresses any hit whose base rule already fired on this file.

use std::collections::HashSet;

use super::patterns::SCAN_RULES;
use super::Finding;

/// Collapse every whitespace run to a single space.
pub fn normalize_whitespace(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut in_run = false;
    for c in content.chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// Scan one text file's content.
pub fn scan_content(file: &str, content: &str) -> Vec<Finding> {
    let mut findings = Vec::new();

    for (index, line) in content.lines().enumerate() {
        for rule in SCAN_RULES.iter().filter(|rule| !rule.multiline) {
            if rule.regex.is_match(line) {
                findings.push(Finding {
                    severity: rule.severity,
                    check: "patterns".to_string(),
                    message: rule.description.to_string(),
                    file: Some(file.to_string()),
                    line: Some(index + 1),
                    pattern: Some(rule.id.to_string()),
                });
            }
        }
    }

    let hit_ids: HashSet<String> = findings
        .iter()
        .filter_map(|finding| finding.pattern.clone())
        .collect();

    let normalized = normalize_whitespace(content);
    for rule in SCAN_RULES.iter().filter(|rule| rule.multiline) {
        if !rule.regex.is_match(&normalized) {
            continue;
        }
        // Dedup: skip when the corresponding single-line rule already
        // fired for this file.
        let base_id = rule.id.strip_suffix("-multiline").unwrap_or(rule.id);
        if hit_ids.contains(base_id) {
            continue;
        }
        findings.push(Finding {
            severity: rule.severity,
            check: "patterns".to_string(),
            message: rule.description.to_string(),
            file: Some(file.to_string()),
            line: None,
            pattern: Some(rule.id.to_string()),
        });
    }

    findings
}
