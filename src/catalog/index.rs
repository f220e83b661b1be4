//! Catalog index build, incremental update, and verification.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;

use semver::Version;
use tracing::{debug, warn};

use super::{SignedCatalogIndex, SkillEntry, SkillVersion, INDEX_VERSION};
use crate::archive::extract_manifest;
use crate::error::{KkError, Result};
use crate::manifest::{SkillManifest, TrustLevel};
use crate::signing::{sha256_digest, sha256_hex, sign_object, verify_object, Keypair, PublicKey};

/// Order version strings: semver when both parse, lexical fallback.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (Version::parse(a), Version::parse(b)) {
        (Ok(va), Ok(vb)) => va.cmp(&vb),
        _ => a.cmp(b),
    }
}

struct ParsedArchive {
    manifest: SkillManifest,
    version: SkillVersion,
}

/// Build a signed index from a directory of archives.
///
/// Layout: `{archives_dir}/{skill}/{skill}-{version}.tar.gz`.
/// Enumeration is lexical at both levels so two builds over the same
/// archive set produce byte-identical output for the same timestamp.
pub fn build_index(
    archives_dir: &Path,
    keypair: &Keypair,
    updated: &str,
) -> Result<SignedCatalogIndex> {
    let mut subdirs = Vec::new();
    for entry in std::fs::read_dir(archives_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            subdirs.push(entry.path());
        }
    }
    subdirs.sort();

    let mut skills: BTreeMap<String, Vec<ParsedArchive>> = BTreeMap::new();
    for subdir in &subdirs {
        let dir_name = subdir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let mut archives = Vec::new();
        for entry in std::fs::read_dir(subdir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(".tar.gz"))
            {
                archives.push(path);
            }
        }
        archives.sort();

        for path in archives {
            let parsed = parse_archive(&path, &dir_name, keypair, updated)?;
            if parsed.manifest.name != dir_name {
                warn!(
                    archive = %path.display(),
                    manifest_name = %parsed.manifest.name,
                    dir = %dir_name,
                    "manifest name does not match archive directory"
                );
            }
            skills
                .entry(parsed.manifest.name.clone())
                .or_default()
                .push(parsed);
        }
    }

    let entries: Vec<SkillEntry> = skills
        .into_values()
        .map(assemble_entry)
        .collect::<Result<_>>()?;

    sign_index(entries, keypair, updated)
}

/// Insert or replace one version in an existing index, refresh the
/// skill-level metadata from the archive's manifest, and re-sign.
/// Untouched version records are preserved verbatim.
pub fn update_index(
    existing: &SignedCatalogIndex,
    archive_path: &Path,
    keypair: &Keypair,
    updated: &str,
) -> Result<SignedCatalogIndex> {
    let dir_name = archive_path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let parsed = parse_archive(archive_path, &dir_name, keypair, updated)?;
    let manifest = parsed.manifest;
    let version = parsed.version;

    let mut skills = existing.skills.clone();
    match skills.iter_mut().find(|entry| entry.name == manifest.name) {
        Some(entry) => {
            entry
                .versions
                .insert(version.version.clone(), version.clone());
            entry.latest = entry
                .versions
                .keys()
                .max_by(|a, b| compare_versions(a, b))
                .cloned()
                .unwrap_or_else(|| version.version.clone());
            entry.description = manifest.description.clone();
            entry.author = manifest.author.clone();
            entry.capabilities = sorted_capabilities(&manifest);
            entry.tags = sorted_tags(&manifest);
            entry.category = manifest.category.clone();
            // trust_level stays catalog-assigned.
        }
        None => {
            let mut versions = BTreeMap::new();
            versions.insert(version.version.clone(), version.clone());
            skills.push(SkillEntry {
                name: manifest.name.clone(),
                description: manifest.description.clone(),
                author: manifest.author.clone(),
                capabilities: sorted_capabilities(&manifest),
                tags: sorted_tags(&manifest),
                category: manifest.category.clone(),
                trust_level: TrustLevel::Community,
                latest: version.version.clone(),
                versions,
            });
        }
    }
    skills.sort_by(|a, b| a.name.cmp(&b.name));

    sign_index(skills, keypair, updated)
}

/// Verify the index signature: strip `signature`, canonicalize the
/// rest, Ed25519-verify.
pub fn verify_index(index: &SignedCatalogIndex, public: &PublicKey) -> bool {
    match index.body_value() {
        Ok(body) => verify_object(&body, &index.signature, public),
        Err(_) => false,
    }
}

fn parse_archive(
    path: &Path,
    dir_name: &str,
    keypair: &Keypair,
    updated: &str,
) -> Result<ParsedArchive> {
    let bytes = std::fs::read(path)?;
    let manifest_yaml = extract_manifest(&bytes)?;
    let manifest = SkillManifest::from_yaml(&manifest_yaml)?;
    manifest.validate()?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| KkError::Invalid(format!("bad archive file name: {}", path.display())))?;
    debug!(archive = %path.display(), skill = %manifest.name, "indexed archive");

    Ok(ParsedArchive {
        version: SkillVersion {
            version: manifest.version.clone(),
            archive: format!("archives/{dir_name}/{file_name}"),
            sha256: sha256_hex(&bytes),
            signature: keypair.sign(&sha256_digest(&bytes)),
            size: bytes.len() as u64,
            published: updated.to_string(),
        },
        manifest,
    })
}

fn assemble_entry(archives: Vec<ParsedArchive>) -> Result<SkillEntry> {
    let mut versions = BTreeMap::new();
    let mut manifests: BTreeMap<String, SkillManifest> = BTreeMap::new();
    for parsed in archives {
        manifests.insert(parsed.version.version.clone(), parsed.manifest);
        versions.insert(parsed.version.version.clone(), parsed.version);
    }
    let latest = versions
        .keys()
        .max_by(|a, b| compare_versions(a, b))
        .cloned()
        .ok_or_else(|| KkError::Invalid("skill has no versions".to_string()))?;
    let manifest = &manifests[&latest];

    Ok(SkillEntry {
        name: manifest.name.clone(),
        description: manifest.description.clone(),
        author: manifest.author.clone(),
        capabilities: sorted_capabilities(manifest),
        tags: sorted_tags(manifest),
        category: manifest.category.clone(),
        trust_level: TrustLevel::Community,
        latest,
        versions,
    })
}

fn sorted_capabilities(manifest: &SkillManifest) -> crate::manifest::Capabilities {
    let mut capabilities = manifest.capabilities.clone();
    capabilities.required.sort();
    if let Some(optional) = capabilities.optional.as_mut() {
        optional.sort();
    }
    capabilities
}

fn sorted_tags(manifest: &SkillManifest) -> Vec<String> {
    let mut tags = manifest.tags.clone();
    tags.sort();
    tags
}

fn sign_index(
    skills: Vec<SkillEntry>,
    keypair: &Keypair,
    updated: &str,
) -> Result<SignedCatalogIndex> {
    let body = serde_json::json!({
        "version": INDEX_VERSION,
        "updated": updated,
        "skills": serde_json::to_value(&skills)?,
    });
    let signature = sign_object(&body, keypair);
    Ok(SignedCatalogIndex {
        version: INDEX_VERSION,
        updated: updated.to_string(),
        skills,
        signature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::pack;

    fn manifest_yaml(name: &str, version: &str) -> String {
        format!(
            "name: {name}\nversion: {version}\ndescription: Test skill {name}\n\
             author:\n  name: Tester\n  github: tester\n\
             capabilities:\n  required:\n    - network\n\
             tags:\n  - zulu\n  - alpha\n"
        )
    }

    pub(crate) fn write_archive(dir: &Path, name: &str, version: &str) {
        let skill_dir = dir.join(name);
        std::fs::create_dir_all(&skill_dir).unwrap();
        let archive = pack(
            name,
            &[
                ("manifest.yaml".to_string(), manifest_yaml(name, version).into_bytes()),
                ("SKILL.md".to_string(), format!("# {name}\n").into_bytes()),
            ],
        )
        .unwrap();
        std::fs::write(skill_dir.join(format!("{name}-{version}.tar.gz")), archive).unwrap();
    }

    #[test]
    fn semver_ordering_with_lexical_fallback() {
        assert_eq!(compare_versions("1.9.0", "1.10.0"), Ordering::Less);
        assert_eq!(compare_versions("2.0.0", "2.0.0"), Ordering::Equal);
        // Non-semver strings fall back to lexical comparison.
        assert_eq!(compare_versions("v2", "v10"), Ordering::Greater);
    }

    #[test]
    fn build_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["alpha", "bravo", "charlie"] {
            write_archive(dir.path(), name, "1.0.0");
        }
        let keypair = Keypair::generate().unwrap();
        let a = build_index(dir.path(), &keypair, "2026-02-01T00:00:00Z").unwrap();
        let b = build_index(dir.path(), &keypair, "2026-02-01T00:00:00Z").unwrap();
        assert_eq!(
            a.to_canonical_string().unwrap(),
            b.to_canonical_string().unwrap()
        );
        assert_eq!(
            a.skills.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            vec!["alpha", "bravo", "charlie"]
        );
    }

    #[test]
    fn tags_and_capabilities_are_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), "alpha", "1.0.0");
        let keypair = Keypair::generate().unwrap();
        let index = build_index(dir.path(), &keypair, "2026-02-01T00:00:00Z").unwrap();
        assert_eq!(index.skills[0].tags, vec!["alpha", "zulu"]);
    }

    #[test]
    fn latest_uses_semver_not_lexical() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), "alpha", "1.9.0");
        write_archive(dir.path(), "alpha", "1.10.0");
        let keypair = Keypair::generate().unwrap();
        let index = build_index(dir.path(), &keypair, "2026-02-01T00:00:00Z").unwrap();
        assert_eq!(index.skills[0].latest, "1.10.0");
    }

    #[test]
    fn incremental_update_preserves_existing_records() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), "alpha", "1.0.0");
        write_archive(dir.path(), "charlie", "1.0.0");
        let keypair = Keypair::generate().unwrap();
        let initial = build_index(dir.path(), &keypair, "2026-02-01T00:00:00Z").unwrap();

        write_archive(dir.path(), "bravo", "1.0.0");
        let bravo_archive = dir.path().join("bravo/bravo-1.0.0.tar.gz");
        let updated =
            update_index(&initial, &bravo_archive, &keypair, "2026-02-01T00:00:00Z").unwrap();

        assert_eq!(
            updated
                .skills
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>(),
            vec!["alpha", "bravo", "charlie"]
        );
        // Untouched version records are byte-identical to the initial build.
        for name in ["alpha", "charlie"] {
            let before = serde_json::to_string(&initial.entry(name).unwrap().versions).unwrap();
            let after = serde_json::to_string(&updated.entry(name).unwrap().versions).unwrap();
            assert_eq!(before, after);
        }
        assert!(verify_index(&updated, &keypair.public_key()));
    }

    #[test]
    fn verify_rejects_tampered_body() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), "alpha", "1.0.0");
        let keypair = Keypair::generate().unwrap();
        let mut index = build_index(dir.path(), &keypair, "2026-02-01T00:00:00Z").unwrap();
        assert!(verify_index(&index, &keypair.public_key()));

        index.skills[0].description = "tampered".to_string();
        assert!(!verify_index(&index, &keypair.public_key()));
    }
}
