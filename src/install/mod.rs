//! Verified skill installation.
//!
//! The install state machine runs LOCATE → REVOKE → FETCH → VERIFY →
//! DEDUP → EXTRACT → META, in that order. Every failure path leaves the
//! filesystem as it was at entry, or with only the install directory
//! removed. Metadata is written last and acts as the commit marker.

mod lifecycle;
mod metadata;

pub use lifecycle::{
    check_for_update, list_installed, restore_backup, uninstall, update, InstalledSkill,
    UninstallOutcome, UpdateCheck, UpdateStatus,
};
pub use metadata::{InstallMetadata, CONFIG_FILE, METADATA_FILE};

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};

use crate::archive::extract;
use crate::catalog::{revocation_for, SignedCatalogIndex, SignedRevocationList};
use crate::error::{KkError, Result};
use crate::manifest::{ConfigFieldType, SkillManifest, TrustLevel};
use crate::signing::{sha256_digest, sha256_hex, PublicKey};

/// Callback that fetches archive bytes for a `SkillVersion.archive`
/// path. Transport is the caller's business.
pub type FetchFn<'a> = dyn Fn(&str) -> Result<Vec<u8>> + 'a;

pub struct InstallOptions<'a> {
    pub name: &'a str,
    /// Defaults to the entry's `latest`.
    pub version: Option<&'a str>,
    pub index: &'a SignedCatalogIndex,
    pub revocations: Option<&'a SignedRevocationList>,
    pub public_key: &'a PublicKey,
    pub skills_dir: &'a Path,
    pub fetch: &'a FetchFn<'a>,
}

#[derive(Debug, Clone)]
pub struct InstallOutcome {
    pub name: String,
    pub version: String,
    pub install_dir: PathBuf,
    pub trust_level: TrustLevel,
}

/// Run the install state machine for one skill.
pub fn install(opts: &InstallOptions<'_>) -> Result<InstallOutcome> {
    // LOCATE
    let entry = opts
        .index
        .entry(opts.name)
        .ok_or_else(|| KkError::NotFound(format!("skill not in index: {}", opts.name)))?;
    let version = opts.version.unwrap_or(&entry.latest);
    let record = entry.versions.get(version).ok_or_else(|| {
        KkError::NotFound(format!("version not in index: {} {version}", opts.name))
    })?;

    // REVOKE
    if let Some(list) = opts.revocations {
        if let Some(revocation) = revocation_for(list, opts.name, version) {
            return Err(KkError::Revoked {
                reason: revocation.reason.clone(),
                severity: revocation.severity.to_string(),
            });
        }
    }

    // FETCH
    let bytes = (opts.fetch)(&record.archive)
        .map_err(|err| KkError::Fetch(format!("{}: {err}", record.archive)))?;

    // VERIFY
    let actual = sha256_hex(&bytes);
    if actual != record.sha256 {
        return Err(KkError::Integrity(format!(
            "archive hash mismatch for {} {version}: expected {}, got {actual}",
            opts.name, record.sha256
        )));
    }
    if !opts.public_key.verify(&sha256_digest(&bytes), &record.signature) {
        return Err(KkError::Integrity(format!(
            "archive signature verification failed for {} {version}",
            opts.name
        )));
    }
    debug!(skill = opts.name, version, "archive verified");

    // DEDUP
    let install_dir = opts.skills_dir.join(opts.name);
    if let Some(existing) = InstallMetadata::load(&install_dir)? {
        if existing.version == version {
            return Err(KkError::AlreadyInstalled(format!(
                "{} {version} is already installed",
                opts.name
            )));
        }
    }

    // EXTRACT (rollback on any later failure)
    let finish = || -> Result<()> {
        extract(&bytes, &install_dir)?;
        generate_config(&install_dir)?;
        InstallMetadata {
            name: opts.name.to_string(),
            version: version.to_string(),
            source: record.archive.clone(),
            sha256: record.sha256.clone(),
            signature: record.signature.clone(),
            installed_at: Utc::now().to_rfc3339(),
            trust_level: entry.trust_level,
        }
        .write(&install_dir)?;
        Ok(())
    };
    if let Err(err) = finish() {
        let _ = std::fs::remove_dir_all(&install_dir);
        return Err(err);
    }

    info!(skill = opts.name, version, dir = %install_dir.display(), "installed");
    Ok(InstallOutcome {
        name: opts.name.to_string(),
        version: version.to_string(),
        install_dir,
        trust_level: entry.trust_level,
    })
}

/// Generate a starter config file from the manifest's config schema.
/// The file belongs to the user afterwards: it is never overwritten,
/// and updates preserve its bytes.
fn generate_config(install_dir: &Path) -> Result<()> {
    let config_path = install_dir.join(CONFIG_FILE);
    if config_path.exists() {
        return Ok(());
    }
    let manifest_path = install_dir.join("manifest.yaml");
    if !manifest_path.exists() {
        return Ok(());
    }
    let manifest = SkillManifest::from_yaml(&std::fs::read_to_string(&manifest_path)?)?;
    if manifest.config.is_empty() {
        return Ok(());
    }

    let mut out = format!(
        "# Configuration for {} v{}\n# Generated on install; edits here survive updates.\n",
        manifest.name, manifest.version
    );
    for field in &manifest.config {
        out.push('\n');
        out.push_str(&format!("# {}", field.description));
        if field.required {
            out.push_str(" (required)");
        }
        out.push('\n');
        if field.field_type == ConfigFieldType::Credential {
            out.push_str("# Credential value: prefer your platform secure store.\n");
        }
        out.push_str(&format!("{} = {}\n", field.key, placeholder(field)));
    }
    std::fs::write(&config_path, out)?;
    Ok(())
}

fn placeholder(field: &crate::manifest::ConfigField) -> String {
    if let Some(default) = &field.default {
        return match default {
            serde_json::Value::String(s) => format!("{s:?}"),
            other => other.to_string(),
        };
    }
    match field.field_type {
        ConfigFieldType::Credential | ConfigFieldType::String => "\"\"".to_string(),
        ConfigFieldType::Number => "0".to_string(),
        ConfigFieldType::Boolean => "false".to_string(),
        ConfigFieldType::Enum => field
            .enum_values
            .as_ref()
            .and_then(|values| values.first())
            .map(|v| format!("{v:?}"))
            .unwrap_or_else(|| "\"\"".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::pack;
    use crate::catalog::{SkillEntry, SkillVersion};
    use crate::manifest::{Author, Capabilities};
    use crate::signing::Keypair;
    use std::collections::BTreeMap;
    use std::collections::HashMap;

    pub(crate) struct Fixture {
        pub index: SignedCatalogIndex,
        pub archives: HashMap<String, Vec<u8>>,
        pub keypair: Keypair,
    }

    pub(crate) fn manifest_yaml(name: &str, version: &str) -> String {
        format!(
            "name: {name}\nversion: {version}\ndescription: Test skill {name}\n\
             author:\n  name: Tester\n  github: tester\n\
             capabilities:\n  required:\n    - network\n\
             config:\n  - key: api_key\n    type: credential\n    required: true\n    description: API key\n"
        )
    }

    pub(crate) fn fixture(skills: &[(&str, &str)]) -> Fixture {
        let keypair = Keypair::generate().unwrap();
        let mut archives = HashMap::new();
        let mut entries = Vec::new();
        for (name, version) in skills {
            let archive_bytes = pack(
                name,
                &[
                    (
                        "manifest.yaml".to_string(),
                        manifest_yaml(name, version).into_bytes(),
                    ),
                    ("SKILL.md".to_string(), format!("# {name}\n").into_bytes()),
                ],
            )
            .unwrap();
            let archive_path = format!("archives/{name}/{name}-{version}.tar.gz");
            let record = SkillVersion {
                version: version.to_string(),
                archive: archive_path.clone(),
                sha256: sha256_hex(&archive_bytes),
                signature: keypair.sign(&sha256_digest(&archive_bytes)),
                size: archive_bytes.len() as u64,
                published: "2026-02-01T00:00:00Z".to_string(),
            };
            archives.insert(archive_path, archive_bytes);
            let mut versions = BTreeMap::new();
            versions.insert(version.to_string(), record);
            entries.push(SkillEntry {
                name: name.to_string(),
                description: format!("Test skill {name}"),
                author: Author {
                    name: "Tester".to_string(),
                    github: "tester".to_string(),
                },
                capabilities: Capabilities {
                    required: vec!["network".to_string()],
                    optional: None,
                },
                tags: Vec::new(),
                category: None,
                trust_level: TrustLevel::Verified,
                latest: version.to_string(),
                versions,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        let index = SignedCatalogIndex {
            version: 1,
            updated: "2026-02-01T00:00:00Z".to_string(),
            skills: entries,
            signature: String::new(),
        };
        Fixture {
            index,
            archives,
            keypair,
        }
    }

    #[test]
    fn happy_path_installs_and_writes_metadata() {
        let fx = fixture(&[("weather-check", "1.0.0")]);
        let dir = tempfile::tempdir().unwrap();
        let fetch = |path: &str| -> Result<Vec<u8>> {
            fx.archives
                .get(path)
                .cloned()
                .ok_or_else(|| KkError::Fetch(path.to_string()))
        };
        let outcome = install(&InstallOptions {
            name: "weather-check",
            version: None,
            index: &fx.index,
            revocations: None,
            public_key: &fx.keypair.public_key(),
            skills_dir: dir.path(),
            fetch: &fetch,
        })
        .unwrap();

        assert_eq!(outcome.version, "1.0.0");
        assert!(outcome.install_dir.join("SKILL.md").exists());
        assert!(outcome.install_dir.join("manifest.yaml").exists());
        assert!(outcome.install_dir.join(CONFIG_FILE).exists());
        let meta = InstallMetadata::load(&outcome.install_dir).unwrap().unwrap();
        assert_eq!(meta.version, "1.0.0");
        assert_eq!(meta.trust_level, TrustLevel::Verified);
    }

    #[test]
    fn unknown_skill_is_not_found() {
        let fx = fixture(&[("weather-check", "1.0.0")]);
        let dir = tempfile::tempdir().unwrap();
        let fetch = |_: &str| -> Result<Vec<u8>> { Ok(Vec::new()) };
        let err = install(&InstallOptions {
            name: "nope",
            version: None,
            index: &fx.index,
            revocations: None,
            public_key: &fx.keypair.public_key(),
            skills_dir: dir.path(),
            fetch: &fetch,
        })
        .unwrap_err();
        assert!(matches!(err, KkError::NotFound(_)));
    }

    #[test]
    fn tampered_archive_fails_integrity_and_leaves_no_metadata() {
        let fx = fixture(&[("weather-check", "1.0.0")]);
        let dir = tempfile::tempdir().unwrap();
        let fetch = |path: &str| -> Result<Vec<u8>> {
            let mut bytes = fx.archives.get(path).cloned().unwrap();
            bytes.extend_from_slice(b"tampered");
            Ok(bytes)
        };
        let err = install(&InstallOptions {
            name: "weather-check",
            version: None,
            index: &fx.index,
            revocations: None,
            public_key: &fx.keypair.public_key(),
            skills_dir: dir.path(),
            fetch: &fetch,
        })
        .unwrap_err();
        assert!(err.to_string().to_lowercase().contains("hash"));
        assert!(!dir.path().join("weather-check").join(METADATA_FILE).exists());
    }

    #[test]
    fn second_install_of_same_version_is_already_installed() {
        let fx = fixture(&[("weather-check", "1.0.0")]);
        let dir = tempfile::tempdir().unwrap();
        let fetch = |path: &str| -> Result<Vec<u8>> { Ok(fx.archives.get(path).cloned().unwrap()) };
        let opts = InstallOptions {
            name: "weather-check",
            version: None,
            index: &fx.index,
            revocations: None,
            public_key: &fx.keypair.public_key(),
            skills_dir: dir.path(),
            fetch: &fetch,
        };
        install(&opts).unwrap();
        let err = install(&opts).unwrap_err();
        assert!(matches!(err, KkError::AlreadyInstalled(_)));
    }

    #[test]
    fn revoked_version_fails_with_reason_and_severity() {
        use crate::catalog::{create_revocation_list, RevocationEntry, RevocationSeverity};

        let fx = fixture(&[("malicious-skill", "1.0.0")]);
        let dir = tempfile::tempdir().unwrap();
        let list = create_revocation_list(
            vec![RevocationEntry {
                name: "malicious-skill".to_string(),
                version: "1.0.0".to_string(),
                reason: "exfiltrates credentials".to_string(),
                revoked_at: "2026-01-01T00:00:00Z".to_string(),
                severity: RevocationSeverity::Critical,
            }],
            &fx.keypair,
        )
        .unwrap();
        let fetch = |path: &str| -> Result<Vec<u8>> { Ok(fx.archives.get(path).cloned().unwrap()) };
        let err = install(&InstallOptions {
            name: "malicious-skill",
            version: Some("1.0.0"),
            index: &fx.index,
            revocations: Some(&list),
            public_key: &fx.keypair.public_key(),
            skills_dir: dir.path(),
            fetch: &fetch,
        })
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("exfiltrates credentials"));
        assert!(message.contains("critical"));
        assert!(!dir.path().join("malicious-skill").exists());
    }

    #[test]
    fn fetch_failure_surfaces_as_fetch_error() {
        let fx = fixture(&[("weather-check", "1.0.0")]);
        let dir = tempfile::tempdir().unwrap();
        let fetch = |_: &str| -> Result<Vec<u8>> { Err(KkError::Fetch("connection refused".to_string())) };
        let err = install(&InstallOptions {
            name: "weather-check",
            version: None,
            index: &fx.index,
            revocations: None,
            public_key: &fx.keypair.public_key(),
            skills_dir: dir.path(),
            fetch: &fetch,
        })
        .unwrap_err();
        assert!(matches!(err, KkError::Fetch(_)));
    }
}
