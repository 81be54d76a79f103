//! QR URL seeding pass.
//!
//! Assigns a display URL to every record by cycling through a fixed pool
//! of sample URLs keyed by the record's position in the batch. This is a
//! best-effort test-data pass, independent of full reconciliation: it
//! backfills a missing `qr_code` but never corrects a non-canonical one,
//! and it does not enforce the `terminal_id` invariant at all.

use std::fmt::Write as _;

use serde_json::Value;

use crate::error::ReconcileError;
use crate::ports::{DocumentStore, Snapshot};
use crate::record::{Terminal, string_field};
use crate::reconcile::RecordFailure;

/// Sample URL pool used when the caller does not supply one.
pub const SAMPLE_QR_URLS: [&str; 5] = [
    "https://res.cloudinary.com/demo/image/upload/v1234567890/qr_codes/terminal_1.png",
    "https://res.cloudinary.com/demo/image/upload/v1234567890/qr_codes/terminal_2.png",
    "https://res.cloudinary.com/demo/image/upload/v1234567890/qr_codes/terminal_3.png",
    "https://res.cloudinary.com/demo/image/upload/v1234567890/qr_codes/terminal_4.png",
    "https://res.cloudinary.com/demo/image/upload/v1234567890/qr_codes/terminal_5.png",
];

/// One staged seed update.
#[derive(Debug, Clone)]
pub struct PlannedSeed {
    /// Document key.
    pub key: String,
    /// Display name, when the record has one.
    pub name: Option<String>,
    /// Fields to write: always `qr_code_url`, plus `qr_code` when the
    /// record lacks one.
    pub updates: Snapshot,
}

/// What a seeding pass decided before touching the store.
#[derive(Debug, Clone)]
pub struct SeedPlan {
    /// Staged updates in fetch order.
    pub seeds: Vec<PlannedSeed>,
    /// Records that could not be parsed.
    pub invalid: Vec<RecordFailure>,
}

/// Result of applying a seed plan.
#[derive(Debug, Clone)]
pub struct SeedSummary {
    /// Total records seen.
    pub processed: usize,
    /// Records whose updates were written successfully.
    pub updated: usize,
    /// Per-record failures.
    pub failures: Vec<RecordFailure>,
}

impl SeedSummary {
    /// Number of failed records.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Fetches the collection and stages a URL for every record, cycling
/// through `pool` by batch position.
///
/// # Errors
///
/// Returns [`ReconcileError::EmptyUrlPool`] when `pool` is empty and
/// [`ReconcileError::StoreUnavailable`] when the listing fails.
pub fn plan_seed(store: &dyn DocumentStore, pool: &[&str]) -> Result<SeedPlan, ReconcileError> {
    if pool.is_empty() {
        return Err(ReconcileError::EmptyUrlPool);
    }

    let documents =
        store.list().map_err(|e| ReconcileError::StoreUnavailable(e.to_string()))?;

    let mut seeds = Vec::new();
    let mut invalid = Vec::new();

    for (position, (key, snapshot)) in documents.iter().enumerate() {
        match Terminal::from_snapshot(key, snapshot) {
            Ok(terminal) => {
                let url = pool[position % pool.len()];
                let mut updates = Snapshot::new();
                updates.insert("qr_code_url".to_string(), Value::String(url.to_string()));
                // Weak backfill only: an existing payload is kept as-is
                // even when it is not canonical.
                if string_field(snapshot, "qr_code").is_missing() {
                    updates.insert(
                        "qr_code".to_string(),
                        Value::String(Terminal::expected_qr_code(&terminal.id)),
                    );
                }
                seeds.push(PlannedSeed {
                    key: terminal.id,
                    name: terminal.name.value().cloned(),
                    updates,
                });
            }
            Err(err) => {
                log::warn!("skipping unparseable record: {err}");
                invalid.push(RecordFailure {
                    key: "<missing>".to_string(),
                    detail: err.to_string(),
                });
            }
        }
    }

    Ok(SeedPlan { seeds, invalid })
}

/// Applies a seed plan. Write failures are collected, never fatal.
#[must_use]
pub fn apply_seed(store: &dyn DocumentStore, plan: &SeedPlan) -> SeedSummary {
    let mut updated = 0;
    let mut failures = plan.invalid.clone();

    for seed in &plan.seeds {
        match store.update(&seed.key, &seed.updates) {
            Ok(true) => updated += 1,
            Ok(false) => {
                log::warn!("store rejected seed update for {}", seed.key);
                failures.push(RecordFailure {
                    key: seed.key.clone(),
                    detail: "store rejected seed update".to_string(),
                });
            }
            Err(err) => {
                log::warn!("seed update failed for {}: {err}", seed.key);
                failures.push(RecordFailure {
                    key: seed.key.clone(),
                    detail: format!("seed update failed: {err}"),
                });
            }
        }
    }

    SeedSummary { processed: plan.seeds.len() + plan.invalid.len(), updated, failures }
}

/// Formats a seed plan as a human-readable listing.
#[must_use]
pub fn format_seed_plan(plan: &SeedPlan) -> String {
    let mut out = String::new();

    for seed in &plan.seeds {
        let label = match &seed.name {
            Some(name) => format!("{} ({name})", seed.key),
            None => seed.key.clone(),
        };
        let staged: Vec<String> =
            seed.updates.iter().map(|(field, value)| format!("{field} = {value}")).collect();
        let _ = writeln!(out, "  {label}: {}", staged.join(", "));
    }
    if plan.seeds.is_empty() {
        out.push_str("  (no records to seed)\n");
    }
    for failure in &plan.invalid {
        let _ = writeln!(out, "  cannot process: {}", failure.detail);
    }

    out
}

/// Formats a seed summary as a human-readable report.
#[must_use]
pub fn format_seed_summary(summary: &SeedSummary) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Processed: {}", summary.processed);
    let _ = writeln!(out, "Updated:   {}", summary.updated);
    let _ = writeln!(out, "Failed:    {}", summary.failed());
    for failure in &summary.failures {
        let _ = writeln!(out, "  - {}: {}", failure.key, failure.detail);
    }

    out
}
