//! Document store port for collection reads and partial updates.

use serde_json::{Map, Value};

/// A document's field mapping as handed back by the store.
pub type Snapshot = Map<String, Value>;

/// One document: its store-assigned key plus its field mapping.
pub type Document = (String, Snapshot);

/// Boxed error type used at the store boundary.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Collection-level access to a document store.
///
/// Abstracting the store lets the passes run against Firestore in
/// production and an in-memory fake in tests, and keeps the store handle
/// an explicit argument rather than process-wide state.
pub trait DocumentStore: Send + Sync {
    /// Reads the full collection in store order.
    ///
    /// # Errors
    ///
    /// Returns an error when the listing cannot complete; callers treat
    /// this as fatal for the whole run.
    fn list(&self) -> Result<Vec<Document>, StoreError>;

    /// Merge-updates the named fields on one document.
    ///
    /// Fields not named in `fields` must be left untouched. Returns
    /// `Ok(false)` when the store rejects the write without raising an
    /// error (e.g. the document no longer exists).
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails outright; callers record it
    /// against the one record and continue.
    fn update(&self, key: &str, fields: &Snapshot) -> Result<bool, StoreError>;

    /// Returns all documents whose `field` equals `value`.
    ///
    /// # Errors
    ///
    /// Returns an error when the query cannot be executed.
    fn query_equals(&self, field: &str, value: &Value) -> Result<Vec<Document>, StoreError>;
}
