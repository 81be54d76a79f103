//! Typed view of a terminal document.
//!
//! The store hands back untyped field mappings; [`Terminal`] gives them
//! names and types, and [`Field`] makes "absent" explicit instead of
//! relying on ad hoc defaulting at every call site.

use serde_json::{Map, Value};

use crate::error::ReconcileError;

/// Tri-state presence of a document field.
///
/// Firestore distinguishes a field that is missing entirely from one
/// stored as explicit null. Canonicalization treats both as missing, but
/// keeping them apart in the model makes that decision visible instead of
/// burying it in `.get()` fallbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    /// The field is not present in the snapshot.
    Absent,
    /// The field is present but stored as null (or as a value of the
    /// wrong type, which is equally unusable).
    Null,
    /// The field holds a well-typed value.
    Value(T),
}

impl<T> Field<T> {
    /// The contained value, if the field holds one.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Absent | Self::Null => None,
        }
    }

    /// True when the field is absent or null.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Absent | Self::Null)
    }
}

/// One terminal record as fetched from the store.
#[derive(Debug, Clone)]
pub struct Terminal {
    /// Store-assigned document key. Immutable once created.
    pub id: String,
    /// Denormalized copy of the key; should always equal `id`.
    pub terminal_id: Field<String>,
    /// Display name. Optional, never corrected.
    pub name: Field<String>,
    /// Scannable payload; canonical form is `terminal_id:<id>`.
    pub qr_code: Field<String>,
    /// External image URL for displaying the code. Display asset only.
    pub qr_code_url: Field<String>,
    /// Whether the terminal is in service. Defaults to true when missing.
    pub is_active: Field<bool>,
}

impl Terminal {
    /// Builds a typed record from a store snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::InvalidRecord`] when `key` is empty; a
    /// record without its identifying key cannot be corrected.
    pub fn from_snapshot(key: &str, snapshot: &Map<String, Value>) -> Result<Self, ReconcileError> {
        if key.is_empty() {
            let name = string_field(snapshot, "name");
            let context = match name.value() {
                Some(n) => format!("empty key, name {n:?}"),
                None => "empty key".to_string(),
            };
            return Err(ReconcileError::InvalidRecord { context });
        }

        Ok(Self {
            id: key.to_string(),
            terminal_id: string_field(snapshot, "terminal_id"),
            name: string_field(snapshot, "name"),
            qr_code: string_field(snapshot, "qr_code"),
            qr_code_url: string_field(snapshot, "qr_code_url"),
            is_active: bool_field(snapshot, "is_active"),
        })
    }

    /// The canonical QR payload for a record key.
    #[must_use]
    pub fn expected_qr_code(id: &str) -> String {
        format!("terminal_id:{id}")
    }
}

/// Reads a string field from a snapshot as a tri-state.
pub fn string_field(snapshot: &Map<String, Value>, name: &str) -> Field<String> {
    match snapshot.get(name) {
        None => Field::Absent,
        Some(Value::String(s)) => Field::Value(s.clone()),
        Some(_) => Field::Null,
    }
}

/// Reads a boolean field from a snapshot as a tri-state.
pub fn bool_field(snapshot: &Map<String, Value>, name: &str) -> Field<bool> {
    match snapshot.get(name) {
        None => Field::Absent,
        Some(Value::Bool(b)) => Field::Value(*b),
        Some(_) => Field::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: Value) -> Map<String, Value> {
        value.as_object().expect("snapshot literal must be an object").clone()
    }

    #[test]
    fn parses_fully_populated_record() {
        let snap = snapshot(json!({
            "terminal_id": "T1",
            "name": "Lobby",
            "qr_code": "terminal_id:T1",
            "qr_code_url": "https://example.com/qr.png",
            "is_active": false,
        }));

        let terminal = Terminal::from_snapshot("T1", &snap).unwrap();
        assert_eq!(terminal.id, "T1");
        assert_eq!(terminal.terminal_id, Field::Value("T1".into()));
        assert_eq!(terminal.name, Field::Value("Lobby".into()));
        assert_eq!(terminal.qr_code, Field::Value("terminal_id:T1".into()));
        assert_eq!(terminal.is_active, Field::Value(false));
    }

    #[test]
    fn distinguishes_absent_from_null() {
        let snap = snapshot(json!({ "qr_code": null }));

        let terminal = Terminal::from_snapshot("T2", &snap).unwrap();
        assert_eq!(terminal.qr_code, Field::Null);
        assert_eq!(terminal.terminal_id, Field::Absent);
        assert!(terminal.qr_code.is_missing());
        assert!(terminal.terminal_id.is_missing());
    }

    #[test]
    fn wrong_typed_fields_read_as_null() {
        let snap = snapshot(json!({ "is_active": "yes", "qr_code": 42 }));

        let terminal = Terminal::from_snapshot("T3", &snap).unwrap();
        assert_eq!(terminal.is_active, Field::Null);
        assert_eq!(terminal.qr_code, Field::Null);
    }

    #[test]
    fn empty_key_is_invalid() {
        let snap = snapshot(json!({ "name": "Orphan" }));

        let err = Terminal::from_snapshot("", &snap).unwrap_err();
        assert!(err.to_string().contains("Orphan"));
    }

    #[test]
    fn expected_qr_code_uses_id() {
        assert_eq!(Terminal::expected_qr_code("T9"), "terminal_id:T9");
    }
}
