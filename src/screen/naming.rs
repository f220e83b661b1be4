//! Naming check: pattern, length, reserved names, typosquat distance.

use super::{Finding, Severity};
use crate::manifest::{NAME_MAX_LEN, NAME_MIN_LEN, NAME_RE};

/// Names no skill may claim.
pub const RESERVED_NAMES: &[&str] = &[
    "skill", "skills", "install", "uninstall", "update", "search", "list", "test", "core",
    "system", "admin", "default", "catalog", "registry", "kithkit",
];

/// Typosquat threshold: edit distance at or below this to an existing
/// name produces a warning.
pub const TYPOSQUAT_DISTANCE: usize = 2;

pub fn check_naming(name: &str, existing: &[String]) -> Vec<Finding> {
    let mut findings = Vec::new();

    if name.len() < NAME_MIN_LEN || name.len() > NAME_MAX_LEN {
        findings.push(naming_finding(
            Severity::Error,
            format!("name must be {NAME_MIN_LEN}-{NAME_MAX_LEN} characters, got {}", name.len()),
        ));
    } else if !NAME_RE.is_match(name) {
        findings.push(naming_finding(
            Severity::Error,
            format!("name must be lowercase alphanumerics and hyphens: {name}"),
        ));
    }

    if RESERVED_NAMES.contains(&name) {
        findings.push(naming_finding(
            Severity::Error,
            format!("name is reserved: {name}"),
        ));
    }

    for other in existing {
        if other == name {
            continue;
        }
        let distance = levenshtein(name, other);
        if distance <= TYPOSQUAT_DISTANCE {
            findings.push(naming_finding(
                Severity::Warning,
                format!("name is edit distance {distance} from existing skill {other} (possible typosquat)"),
            ));
        }
    }

    findings
}

fn naming_finding(severity: Severity, message: String) -> Finding {
    Finding {
        severity,
        check: "naming".to_string(),
        message,
        file: None,
        line: None,
        pattern: None,
    }
}

/// Classic two-row edit distance.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_distance_basics() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
        assert_eq!(levenshtein("weather-check", "weather-cheek"), 1);
    }

    #[test]
    fn valid_unseen_name_is_clean() {
        assert!(check_naming("weather-check", &[]).is_empty());
    }

    #[test]
    fn reserved_names_are_rejected() {
        let findings = check_naming("install", &[]);
        assert!(findings
            .iter()
            .any(|f| f.severity == Severity::Error && f.message.contains("reserved")));
    }

    #[test]
    fn near_duplicate_warns_with_distance() {
        let findings = check_naming("weather-check", &["weather-chek".to_string()]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert!(findings[0].message.contains("distance 1"));
    }

    #[test]
    fn exact_existing_name_is_not_a_typosquat_of_itself() {
        assert!(check_naming("weather-check", &["weather-check".to_string()]).is_empty());
    }

    #[test]
    fn bad_pattern_is_an_error() {
        let findings = check_naming("Bad_Name", &[]);
        assert!(findings.iter().any(|f| f.severity == Severity::Error));
    }
}
