//! In-memory document store used by tests and local experiments.
//!
//! Documents live in a mutex-guarded vector so listing order is stable
//! (insertion order, matching how a real store streams a small
//! collection). Updates can be made to fail deterministically per key,
//! which is how the partial-failure scenarios are exercised without a
//! real store.

use std::collections::HashSet;
use std::sync::Mutex;

use serde_json::Value;

use crate::ports::{Document, DocumentStore, Snapshot, StoreError};

/// In-memory [`DocumentStore`] with merge-update semantics.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    docs: Vec<Document>,
    failing: HashSet<String>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a document, replacing any existing one with the same key.
    pub fn insert(&self, key: &str, fields: Snapshot) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner.docs.iter_mut().find(|(k, _)| k == key) {
            existing.1 = fields;
        } else {
            inner.docs.push((key.to_string(), fields));
        }
    }

    /// Makes every subsequent `update` against `key` fail with an error.
    pub fn fail_updates_for(&self, key: &str) {
        self.inner.lock().unwrap().failing.insert(key.to_string());
    }

    /// Returns a copy of the stored snapshot for `key`, if present.
    #[must_use]
    pub fn snapshot(&self, key: &str) -> Option<Snapshot> {
        let inner = self.inner.lock().unwrap();
        inner.docs.iter().find(|(k, _)| k == key).map(|(_, fields)| fields.clone())
    }

    /// Number of documents currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().docs.len()
    }

    /// True when the store holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for MemoryStore {
    fn list(&self) -> Result<Vec<Document>, StoreError> {
        Ok(self.inner.lock().unwrap().docs.clone())
    }

    fn update(&self, key: &str, fields: &Snapshot) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.failing.contains(key) {
            return Err(format!("injected update failure for {key}").into());
        }
        match inner.docs.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => {
                for (name, value) in fields {
                    existing.insert(name.clone(), value.clone());
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn query_equals(&self, field: &str, value: &Value) -> Result<Vec<Document>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .docs
            .iter()
            .filter(|(_, fields)| fields.get(field) == Some(value))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Snapshot {
        value.as_object().expect("fields literal must be an object").clone()
    }

    #[test]
    fn update_merges_without_removing_fields() {
        let store = MemoryStore::new();
        store.insert("T1", fields(json!({ "name": "Lobby", "is_active": false })));

        let ok = store.update("T1", &fields(json!({ "qr_code": "terminal_id:T1" }))).unwrap();
        assert!(ok);

        let snap = store.snapshot("T1").unwrap();
        assert_eq!(snap.get("name"), Some(&json!("Lobby")));
        assert_eq!(snap.get("is_active"), Some(&json!(false)));
        assert_eq!(snap.get("qr_code"), Some(&json!("terminal_id:T1")));
    }

    #[test]
    fn update_unknown_key_is_rejected_not_upserted() {
        let store = MemoryStore::new();
        let ok = store.update("missing", &fields(json!({ "qr_code": "x" }))).unwrap();
        assert!(!ok);
        assert!(store.is_empty());
    }

    #[test]
    fn injected_failures_error() {
        let store = MemoryStore::new();
        store.insert("T1", fields(json!({})));
        store.fail_updates_for("T1");

        let err = store.update("T1", &fields(json!({ "is_active": true }))).unwrap_err();
        assert!(err.to_string().contains("T1"));
    }

    #[test]
    fn query_equals_matches_exact_values() {
        let store = MemoryStore::new();
        store.insert("T1", fields(json!({ "qr_code": "terminal_id:T1" })));
        store.insert("T2", fields(json!({ "qr_code": "terminal_id:T2" })));

        let matches = store.query_equals("qr_code", &json!("terminal_id:T2")).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].0, "T2");

        let none = store.query_equals("qr_code", &json!("terminal_id:T3")).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn list_preserves_insertion_order() {
        let store = MemoryStore::new();
        store.insert("B", fields(json!({})));
        store.insert("A", fields(json!({})));

        let keys: Vec<String> = store.list().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["B", "A"]);
    }
}
