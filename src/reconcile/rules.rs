//! Canonicalization rules for terminal records.

use serde_json::Value;

use crate::ports::Snapshot;
use crate::record::Terminal;

/// Computes the minimal field updates that bring a record into canonical
/// shape. Empty when the record is already canonical.
///
/// The three rules are independent and order-free:
/// - `terminal_id` must equal the document key.
/// - `qr_code` must equal `terminal_id:<key>`.
/// - `is_active` must be present; an existing boolean (including `false`)
///   is never overwritten.
///
/// Absent and null fields are treated alike; a null payload is as useless
/// to the scanning client as a missing one.
#[must_use]
pub fn canonical_updates(terminal: &Terminal) -> Snapshot {
    let mut updates = Snapshot::new();
    let expected_qr = Terminal::expected_qr_code(&terminal.id);

    if terminal.terminal_id.value() != Some(&terminal.id) {
        updates.insert("terminal_id".to_string(), Value::String(terminal.id.clone()));
    }

    if terminal.qr_code.value() != Some(&expected_qr) {
        updates.insert("qr_code".to_string(), Value::String(expected_qr));
    }

    if terminal.is_active.value().is_none() {
        updates.insert("is_active".to_string(), Value::Bool(true));
    }

    updates
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn terminal(key: &str, snapshot: Value) -> Terminal {
        let map = snapshot.as_object().expect("snapshot literal must be an object").clone();
        Terminal::from_snapshot(key, &map).unwrap()
    }

    #[test]
    fn stages_all_three_fields_for_bare_record() {
        let t = terminal("T1", json!({ "name": "Lobby", "qr_code": null }));

        let updates = canonical_updates(&t);
        assert_eq!(updates.get("terminal_id"), Some(&json!("T1")));
        assert_eq!(updates.get("qr_code"), Some(&json!("terminal_id:T1")));
        assert_eq!(updates.get("is_active"), Some(&json!(true)));
        assert_eq!(updates.len(), 3);
    }

    #[test]
    fn canonical_record_produces_empty_update_set() {
        let t = terminal(
            "T2",
            json!({
                "terminal_id": "T2",
                "qr_code": "terminal_id:T2",
                "is_active": false,
            }),
        );

        assert!(canonical_updates(&t).is_empty());
    }

    #[test]
    fn stale_terminal_id_is_fixed_without_touching_correct_qr() {
        let t = terminal(
            "T3",
            json!({
                "terminal_id": "WRONG",
                "qr_code": "terminal_id:T3",
            }),
        );

        let updates = canonical_updates(&t);
        assert_eq!(updates.get("terminal_id"), Some(&json!("T3")));
        assert!(!updates.contains_key("qr_code"));
        assert_eq!(updates.get("is_active"), Some(&json!(true)));
    }

    #[test]
    fn existing_false_is_active_is_preserved() {
        let t = terminal(
            "T4",
            json!({
                "terminal_id": "T4",
                "qr_code": "terminal_id:T4",
                "is_active": false,
            }),
        );

        assert!(!canonical_updates(&t).contains_key("is_active"));
    }

    #[test]
    fn null_is_active_is_staged_to_true() {
        let t = terminal(
            "T5",
            json!({
                "terminal_id": "T5",
                "qr_code": "terminal_id:T5",
                "is_active": null,
            }),
        );

        let updates = canonical_updates(&t);
        assert_eq!(updates.get("is_active"), Some(&json!(true)));
        assert_eq!(updates.len(), 1);
    }

    #[test]
    fn non_canonical_qr_code_is_rewritten() {
        let t = terminal(
            "T6",
            json!({
                "terminal_id": "T6",
                "qr_code": "T6",
                "is_active": true,
            }),
        );

        let updates = canonical_updates(&t);
        assert_eq!(updates.get("qr_code"), Some(&json!("terminal_id:T6")));
        assert_eq!(updates.len(), 1);
    }
}
