//! Error taxonomy for reconciliation and seeding runs.
//!
//! Only run-fatal conditions are errors. Per-record update failures and
//! the verification outcome are data carried in the run summary, so they
//! never propagate past the driver boundary.

use thiserror::Error;

/// Run-fatal failures raised by the reconciliation and seeding passes.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A fetched record has no usable identifying key.
    ///
    /// The record itself is unrecoverable; the drivers catch this per
    /// record, count it as failed, and keep going.
    #[error("record has no identifying key ({context})")]
    InvalidRecord {
        /// Short description of the offending snapshot.
        context: String,
    },

    /// The initial collection listing could not complete. Nothing was
    /// processed.
    #[error("document store unavailable: {0}")]
    StoreUnavailable(String),

    /// The seeding pass was handed an empty URL pool.
    #[error("sample URL pool is empty")]
    EmptyUrlPool,
}
