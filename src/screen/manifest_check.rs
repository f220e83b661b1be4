//! Manifest validator: per-field findings rather than parse failures.
//!
//! Works over loosely-parsed YAML so one bad field does not mask the
//! rest. Catalog-side code uses the strict `SkillManifest::validate`
//! instead.

use semver::Version;
use serde_yaml::Value;

use super::{Finding, Severity};
use crate::manifest::{NAME_MAX_LEN, NAME_MIN_LEN, NAME_RE};

const CONFIG_TYPES: &[&str] = &["credential", "string", "number", "boolean", "enum"];

pub fn check_manifest(yaml: &str) -> Vec<Finding> {
    let value: Value = match serde_yaml::from_str(yaml) {
        Ok(value) => value,
        Err(err) => {
            return vec![finding(
                Severity::Error,
                "manifest",
                format!("manifest is not valid YAML: {err}"),
            )]
        }
    };

    let mut findings = Vec::new();

    match string_field(&value, "name") {
        None => findings.push(missing("name")),
        Some(name) => {
            if name.len() < NAME_MIN_LEN || name.len() > NAME_MAX_LEN {
                findings.push(finding(
                    Severity::Error,
                    "name",
                    format!("name must be {NAME_MIN_LEN}-{NAME_MAX_LEN} characters"),
                ));
            } else if !NAME_RE.is_match(name) {
                findings.push(finding(
                    Severity::Error,
                    "name",
                    "name must be lowercase alphanumerics and hyphens".to_string(),
                ));
            }
        }
    }

    match string_field(&value, "version") {
        None => findings.push(missing("version")),
        Some(version) => {
            if Version::parse(version).is_err() {
                findings.push(finding(
                    Severity::Error,
                    "version",
                    format!("version is not valid semver: {version}"),
                ));
            }
        }
    }

    match string_field(&value, "description") {
        None => findings.push(missing("description")),
        Some(description) if description.trim().is_empty() => {
            findings.push(finding(
                Severity::Error,
                "description",
                "description must be non-empty".to_string(),
            ));
        }
        Some(_) => {}
    }

    match value.get("author") {
        None => findings.push(missing("author")),
        Some(author) => {
            for sub in ["name", "github"] {
                if string_field(author, sub).map_or(true, |s| s.trim().is_empty()) {
                    findings.push(finding(
                        Severity::Error,
                        "author",
                        format!("author.{sub} must be non-empty"),
                    ));
                }
            }
        }
    }

    if let Some(tags) = value.get("tags") {
        if !tags.is_sequence() {
            findings.push(finding(
                Severity::Error,
                "tags",
                "tags must be an array".to_string(),
            ));
        }
    }

    if let Some(config) = value.get("config") {
        match config.as_sequence() {
            None => findings.push(finding(
                Severity::Error,
                "config",
                "config must be an array".to_string(),
            )),
            Some(fields) => {
                for (index, field) in fields.iter().enumerate() {
                    check_config_field(index, field, &mut findings);
                }
            }
        }
    }

    if value.get("trust_level").is_some() {
        findings.push(finding(
            Severity::Info,
            "trust_level",
            "trust_level is catalog-assigned; the submitted value is ignored".to_string(),
        ));
    }

    findings
}

fn check_config_field(index: usize, field: &Value, findings: &mut Vec<Finding>) {
    let key = string_field(field, "key").unwrap_or("?");
    if key == "?" {
        findings.push(finding(
            Severity::Error,
            "config",
            format!("config[{index}] is missing key"),
        ));
    }
    match string_field(field, "type") {
        None => findings.push(finding(
            Severity::Error,
            "config",
            format!("config field {key} is missing type"),
        )),
        Some(field_type) if !CONFIG_TYPES.contains(&field_type) => {
            findings.push(finding(
                Severity::Error,
                "config",
                format!("config field {key} has unknown type {field_type}"),
            ));
        }
        Some("enum") => {
            let values = field.get("enum_values").and_then(Value::as_sequence);
            if values.map_or(true, |v| v.is_empty()) {
                findings.push(finding(
                    Severity::Error,
                    "config",
                    format!("config field {key} has enum type but no enum_values"),
                ));
            }
        }
        Some(_) => {}
    }
    if string_field(field, "description").map_or(true, |s| s.trim().is_empty()) {
        findings.push(finding(
            Severity::Error,
            "config",
            format!("config field {key} is missing description"),
        ));
    }
}

fn string_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

fn missing(field: &str) -> Finding {
    finding(
        Severity::Error,
        field,
        format!("required field missing: {field}"),
    )
}

fn finding(severity: Severity, field: &str, message: String) -> Finding {
    Finding {
        severity,
        check: format!("manifest/{field}"),
        message,
        file: Some("manifest.yaml".to_string()),
        line: None,
        pattern: None,
    }
}
