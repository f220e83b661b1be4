//! Structure check: required files, executable denylist, size caps.

use std::path::Path;

use walkdir::WalkDir;

use super::{Finding, Severity};
use crate::archive::{MAX_FILE_SIZE, MAX_TOTAL_SIZE};
use crate::error::Result;

/// Files every skill must ship.
pub const REQUIRED_FILES: &[&str] = &["manifest.yaml", "SKILL.md"];

/// Extensions that never belong in a skill: scripts, binaries, shared
/// libraries, bytecode.
pub const DENIED_EXTENSIONS: &[&str] = &[
    "sh", "bash", "zsh", "fish", "ps1", "bat", "cmd", "py", "rb", "pl", "js", "mjs", "exe", "dll",
    "so", "dylib", "bin", "o", "a", "pyc", "pyo", "class", "jar", "wasm",
];

/// Size caps, overridable for tests.
#[derive(Debug, Clone, Copy)]
pub struct SizeLimits {
    pub max_file: u64,
    pub max_total: u64,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            max_file: MAX_FILE_SIZE,
            max_total: MAX_TOTAL_SIZE,
        }
    }
}

pub fn check_structure(dir: &Path, limits: &SizeLimits) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();

    for required in REQUIRED_FILES {
        if !dir.join(required).is_file() {
            findings.push(Finding {
                severity: Severity::Error,
                check: "structure".to_string(),
                message: format!("required file missing: {required}"),
                file: Some(required.to_string()),
                line: None,
                pattern: None,
            });
        }
    }

    let mut total: u64 = 0;
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.map_err(|err| {
            crate::error::KkError::Config(format!("walk {}: {err}", dir.display()))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or(entry.path())
            .display()
            .to_string();

        if let Some(extension) = entry.path().extension().and_then(|e| e.to_str()) {
            if DENIED_EXTENSIONS.contains(&extension.to_lowercase().as_str()) {
                findings.push(Finding {
                    severity: Severity::Error,
                    check: "structure".to_string(),
                    message: format!("executable file type not allowed: .{extension}"),
                    file: Some(rel.clone()),
                    line: None,
                    pattern: None,
                });
            }
        }

        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        if size > limits.max_file {
            findings.push(Finding {
                severity: Severity::Error,
                check: "structure".to_string(),
                message: format!("file exceeds {} byte cap: {size} bytes", limits.max_file),
                file: Some(rel),
                line: None,
                pattern: None,
            });
        }
        total += size;
    }

    if total > limits.max_total {
        findings.push(Finding {
            severity: Severity::Error,
            check: "structure".to_string(),
            message: format!(
                "skill exceeds {} byte total cap: {total} bytes",
                limits.max_total
            ),
            file: None,
            line: None,
            pattern: None,
        });
    }

    Ok(findings)
}
