//! Command dispatch and handlers.

pub mod reconcile;
pub mod seed;

use crate::adapters::FirestoreStore;
use crate::cli::Command;
use crate::config::StoreConfig;
use crate::ports::DocumentStore;

/// Dispatch a parsed command to its handler.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails; `main`
/// maps that to a nonzero exit code.
pub fn dispatch(command: &Command) -> Result<(), String> {
    match command {
        Command::Reconcile { dry_run, collection } => {
            let store = connect(collection.as_deref())?;
            reconcile::run_with_store(&store, *dry_run)
        }
        Command::Seed { dry_run, collection } => {
            let store = connect(collection.as_deref())?;
            seed::run_with_store(&store, *dry_run)
        }
    }
}

/// Builds the live store from the environment, applying the per-run
/// collection override.
fn connect(collection: Option<&str>) -> Result<impl DocumentStore, String> {
    let mut config = StoreConfig::from_env()?;
    if let Some(collection) = collection {
        config.collection = collection.to_string();
    }
    FirestoreStore::connect(config).map_err(|e| format!("failed to connect to store: {e}"))
}
