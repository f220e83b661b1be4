//! Deterministic index construction and incremental update.

use std::path::Path;

use tempfile::tempdir;

use kithkit::archive::pack;
use kithkit::catalog::{build_index, update_index, verify_index};
use kithkit::signing::Keypair;

const UPDATED: &str = "2026-02-01T00:00:00Z";

fn write_archive(archives_dir: &Path, name: &str, version: &str) {
    let skill_dir = archives_dir.join(name);
    std::fs::create_dir_all(&skill_dir).unwrap();
    let archive = pack(
        name,
        &[
            (
                "manifest.yaml".to_string(),
                format!(
                    "name: {name}\nversion: {version}\ndescription: Skill {name}\n\
                     author:\n  name: Tester\n  github: tester\n\
                     capabilities:\n  required:\n    - network\n\
                     tags:\n  - util\n"
                )
                .into_bytes(),
            ),
            ("SKILL.md".to_string(), format!("# {name}\n").into_bytes()),
        ],
    )
    .unwrap();
    std::fs::write(skill_dir.join(format!("{name}-{version}.tar.gz")), archive).unwrap();
}

#[test]
fn two_builds_over_the_same_archives_are_byte_identical() {
    let dir = tempdir().unwrap();
    let archives_dir = dir.path().join("archives");
    for name in ["alpha", "bravo", "charlie"] {
        write_archive(&archives_dir, name, "1.0.0");
    }
    let keypair = Keypair::generate().unwrap();

    let first = build_index(&archives_dir, &keypair, UPDATED).unwrap();
    let second = build_index(&archives_dir, &keypair, UPDATED).unwrap();
    assert_eq!(
        first.to_canonical_string().unwrap(),
        second.to_canonical_string().unwrap()
    );
}

#[test]
fn incremental_update_matches_order_and_preserves_records() {
    let dir = tempdir().unwrap();
    let archives_dir = dir.path().join("archives");
    write_archive(&archives_dir, "alpha", "1.0.0");
    write_archive(&archives_dir, "charlie", "1.0.0");
    let keypair = Keypair::generate().unwrap();
    let initial = build_index(&archives_dir, &keypair, UPDATED).unwrap();

    write_archive(&archives_dir, "bravo", "1.0.0");
    let updated = update_index(
        &initial,
        &archives_dir.join("bravo/bravo-1.0.0.tar.gz"),
        &keypair,
        UPDATED,
    )
    .unwrap();

    assert_eq!(
        updated
            .skills
            .iter()
            .map(|entry| entry.name.as_str())
            .collect::<Vec<_>>(),
        vec!["alpha", "bravo", "charlie"]
    );
    assert!(verify_index(&updated, &keypair.public_key()));

    // alpha and charlie version records byte-identical to the initial build
    for name in ["alpha", "charlie"] {
        let before =
            serde_json::to_string(&initial.entry(name).unwrap().versions).unwrap();
        let after = serde_json::to_string(&updated.entry(name).unwrap().versions).unwrap();
        assert_eq!(before, after, "version records changed for {name}");
    }
}

#[test]
fn adding_a_version_updates_latest_and_keeps_old_versions() {
    let dir = tempdir().unwrap();
    let archives_dir = dir.path().join("archives");
    write_archive(&archives_dir, "alpha", "1.0.0");
    let keypair = Keypair::generate().unwrap();
    let initial = build_index(&archives_dir, &keypair, UPDATED).unwrap();

    write_archive(&archives_dir, "alpha", "1.1.0");
    let updated = update_index(
        &initial,
        &archives_dir.join("alpha/alpha-1.1.0.tar.gz"),
        &keypair,
        "2026-03-01T00:00:00Z",
    )
    .unwrap();

    let entry = updated.entry("alpha").unwrap();
    assert_eq!(entry.latest, "1.1.0");
    assert_eq!(entry.versions.len(), 2);
    assert_eq!(
        serde_json::to_string(&entry.versions["1.0.0"]).unwrap(),
        serde_json::to_string(&initial.entry("alpha").unwrap().versions["1.0.0"]).unwrap()
    );
}
