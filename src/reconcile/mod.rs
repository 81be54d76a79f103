//! Reconciliation pass: canonicalization rules plus the driver that
//! applies them across a collection.
//!
//! Idempotent: a record already in canonical shape produces an empty
//! update set, so re-running a completed pass writes nothing.

pub mod driver;
pub mod rules;

pub use driver::{
    PlannedRecord, ReconcilePlan, ReconcileSummary, Reconciler, RecordFailure, Verification,
    format_plan, format_summary,
};
pub use rules::canonical_updates;
