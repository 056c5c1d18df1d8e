//! Per-batch record loop.
//!
//! One cooperative task per batch walks the records in input order on a
//! fixed cadence. The pause signal is observed at step boundaries only: an
//! invoked lookup/save always runs to completion and its counters are
//! applied, keeping `succeeded + failed == cursor` consistent even when a
//! pause request lands mid-call.

use crate::clients::lookup::BalanceLookup;
use crate::events::{BatchEventKind, EventPublisher};
use crate::logging::log_record_outcome;
use crate::models::{BatchRecord, RecordOutcome};
use crate::registry::BatchHandle;
use crate::sink::ResultSink;
use crate::state_machine::BatchState;
use crate::token::TokenManager;
use crate::validation::validate_record;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Cancellation handle for one running loop.
///
/// `request_pause` invalidates the pending scheduled continuation: the flag
/// stops the next step from starting and the notify wakes the cadence wait
/// so the loop parks without burning the remaining delay.
#[derive(Debug, Default)]
pub struct PauseSignal {
    paused: AtomicBool,
    notify: Notify,
}

impl PauseSignal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn request_pause(&self) {
        self.paused.store(true, Ordering::Release);
        // notify_one stores a permit when the loop is mid-call rather than
        // mid-wait, so the cadence wait still returns immediately.
        self.notify.notify_one();
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }
}

/// Everything one batch loop needs, cloned out of the engine at spawn time.
pub(crate) struct WorkerContext {
    pub batch_id: Uuid,
    pub batch: BatchHandle,
    pub lookup: Arc<dyn BalanceLookup>,
    pub sink: Arc<dyn ResultSink>,
    pub tokens: Arc<TokenManager>,
    pub events: EventPublisher,
    pub record_interval: Duration,
    pub signal: Arc<PauseSignal>,
}

/// Run the record loop until pause or completion.
pub(crate) async fn run_batch_loop(ctx: WorkerContext) {
    loop {
        // Pause is observed here, at the step boundary, and nowhere else.
        if ctx.signal.is_paused() {
            let snapshot = {
                let mut batch = ctx.batch.write();
                batch.state = BatchState::Paused;
                batch.snapshot()
            };
            info!(batch_id = %ctx.batch_id, cursor = snapshot.cursor, "⏸️ Batch paused");
            ctx.events.publish(BatchEventKind::Paused, snapshot, None);
            return;
        }

        let (record, label) = {
            let batch = ctx.batch.read();
            if batch.cursor >= batch.total() {
                drop(batch);
                let snapshot = {
                    let mut batch = ctx.batch.write();
                    batch.state = BatchState::Completed;
                    batch.snapshot()
                };
                info!(
                    batch_id = %ctx.batch_id,
                    succeeded = snapshot.succeeded,
                    failed = snapshot.failed,
                    "✅ Batch completed"
                );
                ctx.events.publish(BatchEventKind::Completed, snapshot, None);
                return;
            }
            (
                batch.records[batch.cursor].clone(),
                batch.display_label().to_string(),
            )
        };

        let (outcome, detail) = classify_record(&ctx, &record, &label).await;

        let snapshot = {
            let mut batch = ctx.batch.write();
            batch.apply_outcome(outcome);
            batch.snapshot()
        };
        log_record_outcome(
            ctx.batch_id,
            snapshot.cursor - 1,
            &format!("{outcome:?}"),
            detail.as_deref(),
        );
        ctx.events
            .publish(BatchEventKind::RecordProcessed, snapshot, detail);

        // Cadence wait: the sole suspension point between records. A pause
        // or delete wakes it early; the paused flag is re-checked on top.
        tokio::select! {
            _ = tokio::time::sleep(ctx.record_interval) => {}
            _ = ctx.signal.notify.notified() => {}
        }
    }
}

/// Classify the record at the cursor: validate, look up with the latest
/// token, persist. Every failure is absorbed into the returned outcome.
async fn classify_record(
    ctx: &WorkerContext,
    record: &BatchRecord,
    label: &str,
) -> (RecordOutcome, Option<String>) {
    if let Err(e) = validate_record(record) {
        return (RecordOutcome::Invalid, Some(e.to_string()));
    }

    // Latest-value semantics: a token refreshed mid-batch is picked up on
    // the very next record.
    let token = ctx
        .tokens
        .current()
        .map(|t| t.as_str().to_string())
        .unwrap_or_default();

    let reply = match ctx
        .lookup
        .lookup(&record.identity, &record.benefit, &token)
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            debug!(batch_id = %ctx.batch_id, error = %e, "Lookup transport failure");
            return (RecordOutcome::LookupFailed, Some(e.to_string()));
        }
    };

    let usable = reply.is_usable();
    let balances = match reply.payload {
        Some(balances) if usable => balances,
        _ => {
            return (
                RecordOutcome::LookupFailed,
                Some(format!("unusable reply with status {}", reply.status)),
            )
        }
    };

    // The outcome is decided by the lookup; a save failure is logged but
    // does not downgrade it.
    if let Err(e) = ctx.sink.save(&balances, label).await {
        error!(
            batch_id = %ctx.batch_id,
            label = %label,
            error = %e,
            "Save failed after successful lookup; record still counts as saved"
        );
        return (RecordOutcome::Saved, Some(format!("save failed: {e}")));
    }

    (RecordOutcome::Saved, None)
}
