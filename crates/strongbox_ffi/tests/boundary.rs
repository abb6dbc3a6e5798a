//! Calls the exported C functions the way a foreign host would.

use serde_json::{json, Value};
use std::ffi::{c_char, CString};
use std::path::Path;
use strongbox_ffi::*;
use tempfile::TempDir;

fn cstr(text: &str) -> CString {
    CString::new(text).unwrap()
}

/// Reads a returned envelope and releases it immediately.
fn take(ptr: *mut c_char) -> Value {
    assert!(!ptr.is_null());
    let owned = unsafe { ReturnedString::from_raw(ptr) }.unwrap();
    serde_json::from_str(owned.to_str().unwrap()).unwrap()
}

struct Host {
    _dir: TempDir,
    path: CString,
}

impl Host {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = cstr(dir.path().join("w.db").to_str().unwrap());
        Self { _dir: dir, path }
    }

    fn provision(&self, key: &str) -> Value {
        take(unsafe { strongbox_provision_wallet(self.path.as_ptr(), cstr(key).as_ptr()) })
    }

    fn insert(&self, key: &str, name: &str, value: &str) -> Value {
        take(unsafe {
            strongbox_insert_entry(
                self.path.as_ptr(),
                cstr(key).as_ptr(),
                cstr(name).as_ptr(),
                cstr(value).as_ptr(),
            )
        })
    }

    fn list(&self, key: &str) -> Value {
        take(unsafe { strongbox_list_entries(self.path.as_ptr(), cstr(key).as_ptr()) })
    }

    fn import(&self, key: &str, batch: &str) -> Value {
        take(unsafe {
            strongbox_import_bulk_entries(
                self.path.as_ptr(),
                cstr(key).as_ptr(),
                cstr(batch).as_ptr(),
            )
        })
    }

    fn categories(&self, key: &str) -> Value {
        take(unsafe { strongbox_list_categories(self.path.as_ptr(), cstr(key).as_ptr()) })
    }
}

#[test]
fn full_session_scenario() {
    let host = Host::new();

    assert_eq!(host.provision("K1"), json!({"success": true}));
    assert_eq!(host.insert("K1", "user1", "secret"), json!({"success": true}));
    assert_eq!(
        host.list("K1"),
        json!({
            "success": true,
            "entries": [{"category": "general", "name": "user1", "value": "secret", "tags": {}}]
        })
    );
    assert_eq!(
        host.import(
            "K1",
            r#"{"general":[{"name":"user2","value":"x","tags":{}}],"bad":[{"name":"broken","value":null}]}"#
        ),
        json!({"success": true, "imported": 1, "failed": 1, "categories": {"general": 1}})
    );
    assert_eq!(
        host.categories("K1"),
        json!({"success": true, "categories": {"general": 2}})
    );
}

#[test]
fn wrong_key_is_a_failure_envelope() {
    let host = Host::new();
    host.provision("K1");
    host.insert("K1", "user1", "secret");

    for response in [host.list("K2"), host.categories("K2"), host.insert("K2", "x", "y")] {
        assert_eq!(response["success"], false);
        assert!(response["error"].as_str().unwrap().contains("authentication"));
        assert_eq!(response.as_object().unwrap().len(), 2);
    }

    assert_eq!(host.list("K1")["entries"].as_array().unwrap().len(), 1);
}

#[test]
fn malformed_batch_is_a_failure_envelope() {
    let host = Host::new();
    let response = host.import("K1", r#"{"general": "not a list"}"#);

    assert_eq!(response["success"], false);
    assert!(response["error"].as_str().unwrap().contains("general"));
}

#[test]
fn unwritable_path_is_a_failure_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let path = cstr(dir.path().join("no").join("such").join("w.db").to_str().unwrap());

    let response = take(unsafe { strongbox_provision_wallet(path.as_ptr(), cstr("K1").as_ptr()) });
    assert_eq!(response["success"], false);
    assert!(!Path::new(path.to_str().unwrap()).exists());
}

#[test]
fn null_arguments_are_named() {
    let host = Host::new();

    let response = take(unsafe { strongbox_list_entries(host.path.as_ptr(), std::ptr::null()) });
    assert_eq!(response["success"], false);
    assert!(response["error"].as_str().unwrap().contains("'key'"));

    let response = take(unsafe {
        strongbox_insert_entry(
            host.path.as_ptr(),
            cstr("K1").as_ptr(),
            cstr("user1").as_ptr(),
            std::ptr::null(),
        )
    });
    assert!(response["error"].as_str().unwrap().contains("'value'"));
}

#[test]
fn tagged_insert_round_trips_tags() {
    let host = Host::new();
    let key = cstr("K1");

    let response = take(unsafe {
        strongbox_insert_tagged_entry(
            host.path.as_ptr(),
            key.as_ptr(),
            cstr("did").as_ptr(),
            cstr("did:sov:1").as_ptr(),
            cstr(r#"{"verkey":"abc"}"#).as_ptr(),
            cstr(r#"{"method":"sov"}"#).as_ptr(),
        )
    });
    assert_eq!(response, json!({"success": true}));

    let response = take(unsafe {
        strongbox_insert_tagged_entry(
            host.path.as_ptr(),
            key.as_ptr(),
            cstr("did").as_ptr(),
            cstr("did:sov:2").as_ptr(),
            cstr("v").as_ptr(),
            std::ptr::null(),
        )
    });
    assert_eq!(response, json!({"success": true}));

    let listing = host.list("K1");
    let entries = listing["entries"].as_array().unwrap();
    let first = entries.iter().find(|e| e["name"] == "did:sov:1").unwrap();
    assert_eq!(first["value"], r#"{"verkey":"abc"}"#);
    assert_eq!(first["tags"], json!({"method": "sov"}));
    let second = entries.iter().find(|e| e["name"] == "did:sov:2").unwrap();
    assert_eq!(second["tags"], json!({}));
}

#[test]
fn hostile_values_stay_parseable() {
    let host = Host::new();
    let nasty = "\"}]{\\ \n\t\u{7f} \u{1F512}";

    assert_eq!(host.insert("K1", nasty, nasty), json!({"success": true}));
    let listing = host.list("K1");
    assert_eq!(listing["entries"][0]["name"], nasty);
    assert_eq!(listing["entries"][0]["value"], nasty);
}

#[test]
fn released_buffers_are_not_reused_by_later_calls() {
    let host = Host::new();
    host.provision("K1");

    // Release each result as soon as it is read; later calls must be unaffected.
    for i in 0..16 {
        let ptr = unsafe {
            strongbox_insert_entry(
                host.path.as_ptr(),
                cstr("K1").as_ptr(),
                cstr(&format!("user{i}")).as_ptr(),
                cstr("v").as_ptr(),
            )
        };
        let text = unsafe { ReturnedString::from_raw(ptr) }
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert_eq!(text, r#"{"success":true}"#);
    }

    assert_eq!(
        host.categories("K1"),
        json!({"success": true, "categories": {"general": 16}})
    );
}
