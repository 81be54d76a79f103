//! Reconciliation driver: fetch, diff, apply, verify, summarize.
//!
//! Planning is separated from applying so the `--dry-run` path can print
//! exactly what would be written without touching the store. Per-record
//! write failures never abort the pass; they are collected into the
//! summary and reported together.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::ReconcileError;
use crate::ports::{DocumentStore, Snapshot};
use crate::record::Terminal;
use crate::reconcile::rules::canonical_updates;

/// One parsed record together with the updates staged for it.
#[derive(Debug, Clone)]
pub struct PlannedRecord {
    /// Document key.
    pub key: String,
    /// Display name, when the record has one.
    pub name: Option<String>,
    /// The record's `qr_code` as currently stored.
    pub existing_qr: Option<String>,
    /// Fields that need to change. Empty for canonical records.
    pub updates: Snapshot,
}

/// A record that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// Document key, or a placeholder when the key itself was missing.
    pub key: String,
    /// What went wrong, with enough context to diagnose offline.
    pub detail: String,
}

/// Outcome of the post-pass lookup check.
///
/// The check guards against mismatches invisible in the stored value but
/// visible to the query engine (whitespace, encoding), by resolving one
/// canonical payload back to its record through the store's equality
/// index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The equality query resolved the payload to the expected record.
    Passed {
        /// Key of the record the query resolved.
        key: String,
        /// The payload that was looked up.
        qr_code: String,
    },
    /// The query did not return the expected record.
    Failed {
        /// Key of the record the query should have resolved.
        key: String,
        /// The payload that was looked up.
        qr_code: String,
        /// Why the check failed.
        detail: String,
    },
    /// No record carried a usable payload, so there was nothing to check.
    Skipped,
}

/// What a pass decided before touching the store.
#[derive(Debug, Clone)]
pub struct ReconcilePlan {
    /// Parse-ok records in fetch order.
    pub records: Vec<PlannedRecord>,
    /// Records that could not be parsed (missing key).
    pub invalid: Vec<RecordFailure>,
}

impl ReconcilePlan {
    /// Records with a non-empty update set.
    pub fn fixes(&self) -> impl Iterator<Item = &PlannedRecord> {
        self.records.iter().filter(|r| !r.updates.is_empty())
    }

    /// Number of records already in canonical shape.
    #[must_use]
    pub fn already_correct(&self) -> usize {
        self.records.iter().filter(|r| r.updates.is_empty()).count()
    }

    /// Total records seen, including unparseable ones.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.records.len() + self.invalid.len()
    }
}

/// Result of applying a plan.
#[derive(Debug, Clone)]
pub struct ReconcileSummary {
    /// Total records seen.
    pub processed: usize,
    /// Records whose updates were written successfully.
    pub updated: usize,
    /// Records that needed no changes.
    pub already_correct: usize,
    /// Per-record failures (unparseable records and failed writes).
    pub failures: Vec<RecordFailure>,
    /// Outcome of the post-pass lookup check.
    pub verification: Verification,
    /// When the apply step started.
    pub started_at: DateTime<Utc>,
    /// When the apply step finished.
    pub finished_at: DateTime<Utc>,
}

impl ReconcileSummary {
    /// Number of failed records.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// True when no record failed and verification did not fail.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !matches!(self.verification, Verification::Failed { .. })
    }
}

/// Runs reconciliation passes against an explicit store handle.
pub struct Reconciler<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> Reconciler<'a> {
    /// Creates a reconciler bound to the given store.
    #[must_use]
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Fetches the collection and computes the update set for every
    /// record, without writing anything.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::StoreUnavailable`] when the listing
    /// fails; nothing has been processed in that case.
    pub fn plan(&self) -> Result<ReconcilePlan, ReconcileError> {
        let documents = self
            .store
            .list()
            .map_err(|e| ReconcileError::StoreUnavailable(e.to_string()))?;

        let mut records = Vec::new();
        let mut invalid = Vec::new();

        for (key, snapshot) in &documents {
            match Terminal::from_snapshot(key, snapshot) {
                Ok(terminal) => {
                    let updates = canonical_updates(&terminal);
                    records.push(PlannedRecord {
                        key: terminal.id.clone(),
                        name: terminal.name.value().cloned(),
                        existing_qr: terminal.qr_code.value().cloned(),
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

        Ok(ReconcilePlan { records, invalid })
    }

    /// Applies a plan: writes every staged update, then runs the lookup
    /// check. Write failures are collected, never fatal.
    #[must_use]
    pub fn apply(&self, plan: &ReconcilePlan) -> ReconcileSummary {
        let started_at = Utc::now();
        let mut updated = 0;
        let mut failures = plan.invalid.clone();
        let mut applied: Vec<&str> = Vec::new();

        for record in plan.fixes() {
            match self.store.update(&record.key, &record.updates) {
                Ok(true) => {
                    updated += 1;
                    applied.push(&record.key);
                }
                Ok(false) => {
                    log::warn!("store rejected update for {}", record.key);
                    failures.push(RecordFailure {
                        key: record.key.clone(),
                        detail: format!(
                            "store rejected update of {}",
                            field_list(&record.updates)
                        ),
                    });
                }
                Err(err) => {
                    log::warn!("update failed for {}: {err}", record.key);
                    failures.push(RecordFailure {
                        key: record.key.clone(),
                        detail: format!(
                            "update of {} failed: {err}",
                            field_list(&record.updates)
                        ),
                    });
                }
            }
        }

        let verification = self.verify(plan, &applied);

        ReconcileSummary {
            processed: plan.processed(),
            updated,
            already_correct: plan.already_correct(),
            failures,
            verification,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Picks the first record with a usable post-pass payload and checks
    /// that the store's equality index resolves it.
    fn verify(&self, plan: &ReconcilePlan, applied: &[&str]) -> Verification {
        let candidate = plan.records.iter().find_map(|record| {
            let staged =
                record.updates.get("qr_code").and_then(Value::as_str).map(String::from);
            let qr = if staged.is_some() && applied.contains(&record.key.as_str()) {
                staged
            } else {
                record.existing_qr.clone()
            };
            qr.filter(|q| !q.is_empty()).map(|q| (record.key.clone(), q))
        });

        let Some((key, qr_code)) = candidate else {
            return Verification::Skipped;
        };

        match self.store.query_equals("qr_code", &Value::String(qr_code.clone())) {
            Ok(matches) => {
                if matches.iter().any(|(k, _)| *k == key) {
                    Verification::Passed { key, qr_code }
                } else {
                    Verification::Failed {
                        key,
                        qr_code,
                        detail: format!("query returned {} match(es), none with the expected key", matches.len()),
                    }
                }
            }
            Err(err) => Verification::Failed { key, qr_code, detail: err.to_string() },
        }
    }
}

fn field_list(updates: &Snapshot) -> String {
    updates.keys().cloned().collect::<Vec<_>>().join(", ")
}

/// Formats a plan as a human-readable listing of staged updates.
#[must_use]
pub fn format_plan(plan: &ReconcilePlan) -> String {
    let mut out = String::new();

    for record in plan.fixes() {
        let label = match &record.name {
            Some(name) => format!("{} ({name})", record.key),
            None => record.key.clone(),
        };
        let staged: Vec<String> =
            record.updates.iter().map(|(field, value)| format!("{field} = {value}")).collect();
        let _ = writeln!(out, "  {label}: {}", staged.join(", "));
    }

    let fix_count = plan.fixes().count();
    if fix_count == 0 {
        out.push_str("  (no updates needed)\n");
    }

    let _ = writeln!(out, "{} record(s) already canonical", plan.already_correct());
    for failure in &plan.invalid {
        let _ = writeln!(out, "  cannot process: {}", failure.detail);
    }

    out
}

/// Formats a summary as a human-readable report.
#[must_use]
pub fn format_summary(summary: &ReconcileSummary) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Processed:       {}", summary.processed);
    let _ = writeln!(out, "Updated:         {}", summary.updated);
    let _ = writeln!(out, "Already correct: {}", summary.already_correct);
    let _ = writeln!(out, "Failed:          {}", summary.failed());
    for failure in &summary.failures {
        let _ = writeln!(out, "  - {}: {}", failure.key, failure.detail);
    }

    match &summary.verification {
        Verification::Passed { key, qr_code } => {
            let _ = writeln!(out, "Verification:    passed ({qr_code} -> {key})");
        }
        Verification::Failed { key, qr_code, detail } => {
            let _ = writeln!(out, "Verification:    FAILED ({qr_code} -> {key}): {detail}");
        }
        Verification::Skipped => {
            let _ = writeln!(out, "Verification:    skipped (no QR payload to check)");
        }
    }

    let elapsed = summary.finished_at - summary.started_at;
    let _ = writeln!(out, "Finished in {} ms", elapsed.num_milliseconds());

    out
}
