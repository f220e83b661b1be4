//! Property tests for the serialization and archive layers.

use proptest::prelude::*;
use serde_json::Value;

use kithkit::archive::{extract, pack};
use kithkit::signing::{canonical_json, sign_object, verify_object, Keypair};

/// Arbitrary JSON values, bounded in depth and width.
fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        "[a-zA-Z0-9 _\\-\n\t]{0,24}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..6).prop_map(|m| {
                Value::Object(m.into_iter().collect())
            }),
        ]
    })
}

proptest! {
    #[test]
    fn canonical_json_is_idempotent(value in arb_json()) {
        let once = canonical_json(&value);
        let reparsed: Value = serde_json::from_str(&once).unwrap();
        prop_assert_eq!(canonical_json(&reparsed), once);
    }

    #[test]
    fn canonical_json_ignores_key_insertion_order(
        pairs in prop::collection::btree_map("[a-z]{1,6}", any::<i64>(), 1..8)
    ) {
        let pairs: Vec<(String, i64)> = pairs.into_iter().collect();
        let forward: Value = Value::Object(
            pairs.iter().cloned().map(|(k, v)| (k, Value::Number(v.into()))).collect()
        );
        let reversed: Value = Value::Object(
            pairs.iter().rev().cloned().map(|(k, v)| (k, Value::Number(v.into()))).collect()
        );
        prop_assert_eq!(canonical_json(&forward), canonical_json(&reversed));
    }

    #[test]
    fn archive_round_trip_preserves_content(
        files in prop::collection::btree_map(
            "[a-z]{1,12}\\.md",
            prop::collection::vec(any::<u8>(), 0..2048),
            1..5,
        )
    ) {
        let inputs: Vec<(String, Vec<u8>)> = files.into_iter().collect();
        let archive = pack("prop-skill", &inputs).unwrap();

        let dir = tempfile::tempdir().unwrap();
        extract(&archive, dir.path()).unwrap();
        for (name, content) in &inputs {
            let on_disk = std::fs::read(dir.path().join(name)).unwrap();
            prop_assert_eq!(&on_disk, content);
        }
    }
}

#[test]
fn signed_object_verifies_under_canonical_bytes() {
    let keypair = Keypair::generate().unwrap();
    let body = serde_json::json!({
        "skills": [{"name": "alpha"}],
        "updated": "2026-02-01T00:00:00Z",
        "version": 1,
    });
    let signature = sign_object(&body, &keypair);
    assert!(verify_object(&body, &signature, &keypair.public_key()));

    let tampered = serde_json::json!({
        "skills": [{"name": "alpha2"}],
        "updated": "2026-02-01T00:00:00Z",
        "version": 1,
    });
    assert!(!verify_object(&tampered, &signature, &keypair.public_key()));
}
