//! `fleetfix reconcile` command.

use crate::ports::DocumentStore;
use crate::reconcile::{Reconciler, Verification, format_plan, format_summary};

/// Execute the `reconcile` command against the given store.
///
/// # Errors
///
/// Returns an error string when the collection cannot be listed, when any
/// record fails to update, or when post-pass verification fails. The
/// latter two are raised after the full report has been printed, so the
/// exit code reflects a run whose details are already on screen.
pub fn run_with_store(store: &dyn DocumentStore, dry_run: bool) -> Result<(), String> {
    let reconciler = Reconciler::new(store);
    let plan = reconciler.plan().map_err(|e| e.to_string())?;

    if dry_run {
        println!("Dry run — planned updates:");
        print!("{}", format_plan(&plan));
        return Ok(());
    }

    let summary = reconciler.apply(&plan);
    print!("{}", format_summary(&summary));

    if summary.failed() > 0 {
        return Err(format!("{} record(s) failed to update", summary.failed()));
    }
    if matches!(summary.verification, Verification::Failed { .. }) {
        return Err("QR code lookup verification failed".to_string());
    }
    Ok(())
}
