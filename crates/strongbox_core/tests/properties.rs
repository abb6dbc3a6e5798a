//! Property tests for the wallet call surface.

use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeSet;
use strongbox_core::{
    CategoryCounts, Config, Entry, EntryList, Envelope, ErrorKind, ImportSummary, Tags, Wallet,
};
use tempfile::TempDir;

/// Strategy for entry identity components.
fn ident_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_:]{0,11}").expect("Invalid regex")
}

/// Strategy for values, including characters that need escaping.
fn value_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[ -~\n\"\\\\é🔒]{0,64}").expect("Invalid regex")
}

fn tags_strategy() -> impl Strategy<Value = Tags> {
    prop::collection::btree_map(ident_strategy(), value_strategy(), 0..4)
}

fn entry_strategy() -> impl Strategy<Value = Entry> {
    (ident_strategy(), ident_strategy(), value_strategy(), tags_strategy()).prop_map(
        |(category, name, value, tags)| Entry {
            category,
            name,
            value,
            tags,
        },
    )
}

fn wallet() -> (TempDir, Wallet) {
    let dir = tempfile::tempdir().expect("tempdir");
    // Syncing every insert only slows the properties down.
    let wallet = Wallet::at(dir.path().join("w.db")).with_config(Config::new().sync_on_commit(false));
    (dir, wallet)
}

fn as_set(entries: Vec<Entry>) -> BTreeSet<(String, String, String, Tags)> {
    entries
        .into_iter()
        .map(|e| (e.category, e.name, e.value, e.tags))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn insert_then_list_is_lossless(entries in prop::collection::vec(entry_strategy(), 0..12)) {
        let (_dir, wallet) = wallet();
        wallet.provision("K1").unwrap();

        // Later writes to the same identity win.
        let mut expected = std::collections::BTreeMap::new();
        for entry in &entries {
            wallet
                .insert_entry("K1", &entry.category, &entry.name, &entry.value, entry.tags.clone())
                .unwrap();
            expected.insert((entry.category.clone(), entry.name.clone()), entry.clone());
        }

        let listed = wallet.entries("K1").unwrap();
        prop_assert_eq!(as_set(listed), as_set(expected.into_values().collect()));
    }

    #[test]
    fn category_counts_sum_to_entry_count(entries in prop::collection::vec(entry_strategy(), 0..12)) {
        let (_dir, wallet) = wallet();
        for entry in &entries {
            wallet
                .insert_entry("K1", &entry.category, &entry.name, &entry.value, Tags::new())
                .unwrap();
        }

        let categories = wallet.categories("K1").unwrap();
        prop_assert_eq!(categories.total(), wallet.entries("K1").unwrap().len() as u64);
    }

    #[test]
    fn wrong_key_never_opens(key in "[a-zA-Z0-9]{1,16}") {
        prop_assume!(key != "K1");
        let (_dir, wallet) = wallet();
        wallet.provision("K1").unwrap();
        wallet.insert("K1", "user1", "secret").unwrap();

        let err = wallet.entries(&key).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::Authentication);
        prop_assert_eq!(wallet.entries("K1").unwrap().len(), 1);
    }

    #[test]
    fn import_counts_good_and_bad_items(
        items in prop::collection::vec((ident_strategy(), ident_strategy(), any::<bool>()), 0..16)
    ) {
        let (_dir, wallet) = wallet();

        // Unique names so every good item lands as its own entry.
        let mut batch = serde_json::Map::new();
        let mut good = 0u64;
        for (index, (category, name, malformed)) in items.iter().enumerate() {
            let name = format!("{name}-{index}");
            let value = if *malformed { json!(null) } else { json!("v") };
            if !*malformed {
                good += 1;
            }
            batch
                .entry(category.clone())
                .or_insert_with(|| json!([]))
                .as_array_mut()
                .unwrap()
                .push(json!({"name": name, "value": value}));
        }
        let batch = serde_json::Value::Object(batch).to_string();

        let summary = wallet.import("K1", &batch).unwrap();
        prop_assert_eq!(summary.imported, good);
        prop_assert_eq!(summary.failed, items.len() as u64 - good);
        prop_assert_eq!(summary.categories.total(), good);
        prop_assert_eq!(wallet.entries("K1").unwrap().len() as u64, good);
    }
}

#[test]
fn provision_then_open_with_same_key() {
    let (_dir, wallet) = wallet();
    wallet.provision("K1").unwrap();
    assert!(wallet.entries("K1").unwrap().is_empty());
    assert_eq!(
        wallet.categories("K2").unwrap_err().kind(),
        ErrorKind::Authentication
    );
}

#[test]
fn duplicate_insert_keeps_latest_value() {
    let (_dir, wallet) = wallet();
    wallet.insert("K1", "user1", "first").unwrap();
    wallet.insert("K1", "user1", "second").unwrap();

    let entries = wallet.entries("K1").unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].value, "second");
}

#[test]
fn end_to_end_envelopes() {
    let (_dir, wallet) = wallet();

    let provisioned: Envelope<_> = wallet.provision("K1").map(|()| strongbox_core::Ack {}).into();
    assert_eq!(provisioned.encode(), r#"{"success":true}"#);

    let inserted: Envelope<_> = wallet
        .insert("K1", "user1", "secret")
        .map(|()| strongbox_core::Ack {})
        .into();
    assert_eq!(inserted.encode(), r#"{"success":true}"#);

    let listed: Envelope<_> = wallet
        .entries("K1")
        .map(|entries| EntryList { entries })
        .into();
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&listed.encode()).unwrap(),
        json!({
            "success": true,
            "entries": [{"category": "general", "name": "user1", "value": "secret", "tags": {}}]
        })
    );

    let imported: Envelope<ImportSummary> = wallet
        .import(
            "K1",
            r#"{"general":[{"name":"user2","value":"x","tags":{}}],"bad":[{"name":"broken","value":null}]}"#,
        )
        .into();
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&imported.encode()).unwrap(),
        json!({"success": true, "imported": 1, "failed": 1, "categories": {"general": 1}})
    );

    let categories: Envelope<_> = wallet
        .categories("K1")
        .map(|categories| CategoryCounts { categories })
        .into();
    assert_eq!(
        categories.encode(),
        r#"{"success":true,"categories":{"general":2}}"#
    );
}

#[test]
fn store_file_holds_no_plaintext() {
    let (_dir, wallet) = wallet();
    wallet
        .insert_entry(
            "K1",
            "general",
            "user1",
            "very-secret-value",
            [("env".to_string(), "prod-tag".to_string())].into_iter().collect(),
        )
        .unwrap();

    let bytes = std::fs::read(wallet.location()).unwrap();
    let contains = |needle: &[u8]| bytes.windows(needle.len()).any(|w| w == needle);
    assert!(!contains(b"very-secret-value"));
    assert!(!contains(b"user1"));
    assert!(!contains(b"prod-tag"));
}

#[test]
fn concurrent_calls_serialize() {
    let (_dir, wallet) = wallet();
    wallet.provision("K1").unwrap();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let wallet = wallet.clone();
            std::thread::spawn(move || {
                for i in 0..5 {
                    wallet.insert("K1", &format!("t{t}-{i}"), "v").unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(wallet.categories("K1").unwrap().get("general"), 20);
}
