//! Per-batch runtime state and published snapshots.

use crate::models::record::BatchRecord;
use crate::state_machine::BatchState;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classification of one processed record.
///
/// `Invalid` and `LookupFailed` increment the batch's `failed` counter;
/// `Saved` increments `succeeded`. A persistence failure after a successful
/// lookup does not downgrade an already decided `Saved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    /// Failed structural validation; the lookup client is never invoked.
    Invalid,
    /// Transport error, non-200 status, or a 200 without a usable name.
    LookupFailed,
    /// 200 with a usable payload, handed to the result sink.
    Saved,
}

impl RecordOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Saved)
    }
}

/// One user-registered unit of work wrapping an uploaded set of records.
///
/// The engine exclusively owns the mutable run-time fields (`cursor`,
/// counters, `state`) while a processing task is active; everyone else
/// observes the batch through [`BatchSnapshot`]s.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Unique identifier, stable for the batch's lifetime.
    pub id: Uuid,
    /// Derived from the uploaded file name; `None` until a file is attached.
    pub label: Option<String>,
    /// Ordered record list, replaced wholesale by a load.
    pub records: Vec<BatchRecord>,
    /// Records persisted after a usable lookup.
    pub succeeded: usize,
    /// Records absorbed as invalid or lookup-failed.
    pub failed: usize,
    /// Index of the next unprocessed record (0..=total).
    pub cursor: usize,
    /// Lifecycle state observed between engine steps.
    pub state: BatchState,
}

impl Batch {
    /// Create an empty batch with no file attached.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            label: None,
            records: Vec::new(),
            succeeded: 0,
            failed: 0,
            cursor: 0,
            state: BatchState::Idle,
        }
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_active()
    }

    /// Label as rendered in display surfaces ("none" until a file lands).
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or("none")
    }

    /// Replace the record list wholesale, resetting all progress.
    pub fn load(&mut self, label: String, records: Vec<BatchRecord>) {
        self.label = Some(label);
        self.records = records;
        self.succeeded = 0;
        self.failed = 0;
        self.cursor = 0;
        self.state = BatchState::Idle;
    }

    /// Apply one record's outcome, advancing cursor and counter together so
    /// `succeeded + failed == cursor` holds at every observable point.
    pub fn apply_outcome(&mut self, outcome: RecordOutcome) {
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.cursor += 1;
    }

    /// Fraction of the batch processed, formatted with two decimals.
    pub fn percent_complete(&self) -> String {
        if self.records.is_empty() {
            return "0.00%".to_string();
        }
        let processed = (self.succeeded + self.failed) as f64;
        format!("{:.2}%", processed / self.records.len() as f64 * 100.0)
    }

    /// Immutable copy of the observable fields for publication.
    pub fn snapshot(&self) -> BatchSnapshot {
        BatchSnapshot {
            id: self.id,
            label: self.display_label().to_string(),
            total: self.total(),
            succeeded: self.succeeded,
            failed: self.failed,
            cursor: self.cursor,
            state: self.state,
            running: self.is_running(),
            percent_complete: self.percent_complete(),
        }
    }
}

impl Default for Batch {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of a batch published to observers after every record
/// and every state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSnapshot {
    pub id: Uuid,
    pub label: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cursor: usize,
    pub state: BatchState,
    pub running: bool,
    pub percent_complete: String,
}

impl BatchSnapshot {
    /// The two invariants every published snapshot must satisfy.
    pub fn is_consistent(&self) -> bool {
        self.succeeded + self.failed == self.cursor && self.cursor <= self.total
    }
}
