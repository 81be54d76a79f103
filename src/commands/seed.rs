//! `fleetfix seed` command.

use crate::ports::DocumentStore;
use crate::seed::{SAMPLE_QR_URLS, apply_seed, format_seed_plan, format_seed_summary, plan_seed};

/// Execute the `seed` command against the given store, using the built-in
/// sample URL pool.
///
/// # Errors
///
/// Returns an error string when the collection cannot be listed or when
/// any record fails to update.
pub fn run_with_store(store: &dyn DocumentStore, dry_run: bool) -> Result<(), String> {
    let plan = plan_seed(store, &SAMPLE_QR_URLS).map_err(|e| e.to_string())?;

    if dry_run {
        println!("Dry run — planned updates:");
        print!("{}", format_seed_plan(&plan));
        return Ok(());
    }

    let summary = apply_seed(store, &plan);
    print!("{}", format_seed_summary(&summary));

    if summary.failed() > 0 {
        return Err(format!("{} record(s) failed to update", summary.failed()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> crate::ports::Snapshot {
        value.as_object().expect("fields literal must be an object").clone()
    }

    #[test]
    fn dry_run_writes_nothing() {
        let store = MemoryStore::new();
        store.insert("T1", fields(json!({})));

        run_with_store(&store, true).unwrap();
        assert!(!store.snapshot("T1").unwrap().contains_key("qr_code_url"));
    }

    #[test]
    fn live_run_assigns_urls() {
        let store = MemoryStore::new();
        store.insert("T1", fields(json!({})));

        run_with_store(&store, false).unwrap();
        assert_eq!(
            store.snapshot("T1").unwrap().get("qr_code_url"),
            Some(&json!(SAMPLE_QR_URLS[0]))
        );
    }

    #[test]
    fn failed_updates_surface_as_command_error() {
        let store = MemoryStore::new();
        store.insert("T1", fields(json!({})));
        store.fail_updates_for("T1");

        let err = run_with_store(&store, false).unwrap_err();
        assert!(err.contains("failed to update"));
    }
}
