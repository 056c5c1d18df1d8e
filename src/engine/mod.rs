//! # Batch Processing Engine
//!
//! Orchestrates, per batch: sequencing, throttling, outcome classification,
//! counters, pause/resume/cancel, and mid-run token substitution. Each
//! started batch gets exactly one cooperative record loop; loops for
//! different batches run concurrently and independently.
//!
//! Commands (`start`, `pause`, `resume`, `delete`, `load`) go through state
//! checks held under the batch's write lock, and a running loop is the only
//! writer of that batch's progress fields, so a scheduled continuation can
//! never race a user action on the same state.

mod worker;

pub use worker::PauseSignal;

use crate::clients::lookup::BalanceLookup;
use crate::clients::auth::Credentials;
use crate::config::EngineConfig;
use crate::error::{BatchError, Result};
use crate::events::{BatchEvent, BatchEventKind, EventPublisher};
use crate::export::render_csv;
use crate::logging::log_batch_operation;
use crate::models::BatchSnapshot;
use crate::registry::BatchRegistry;
use crate::sink::ResultSink;
use crate::state_machine::BatchState;
use crate::token::TokenManager;
use crate::upload::{format_label, parse_upload};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;
use worker::{run_batch_loop, WorkerContext};

/// Bookkeeping for one running record loop.
struct ActiveLoop {
    signal: Arc<PauseSignal>,
    handle: JoinHandle<()>,
}

/// The batch processing engine.
pub struct BatchEngine {
    registry: Arc<BatchRegistry>,
    lookup: Arc<dyn BalanceLookup>,
    sink: Arc<dyn ResultSink>,
    tokens: Arc<TokenManager>,
    events: EventPublisher,
    record_interval: Duration,
    active: Arc<DashMap<Uuid, ActiveLoop>>,
}

impl BatchEngine {
    pub fn new(
        config: &EngineConfig,
        registry: Arc<BatchRegistry>,
        lookup: Arc<dyn BalanceLookup>,
        sink: Arc<dyn ResultSink>,
        tokens: Arc<TokenManager>,
    ) -> Self {
        Self {
            registry,
            lookup,
            sink,
            tokens,
            events: EventPublisher::new(config.event_channel_capacity),
            record_interval: config.record_interval(),
            active: Arc::new(DashMap::new()),
        }
    }

    pub fn registry(&self) -> &Arc<BatchRegistry> {
        &self.registry
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Subscribe to per-batch progress and lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<BatchEvent> {
        self.events.subscribe()
    }

    /// Sign in and install the shared token. Required once before the first
    /// `start`; failure leaves any previously held token untouched.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<()> {
        self.tokens.refresh(credentials).await.map(|_| ())
    }

    /// Register a new empty batch.
    pub fn add_batch(&self) -> Result<Uuid> {
        self.registry.add()
    }

    /// Current snapshot of one batch.
    pub fn snapshot(&self, id: Uuid) -> Result<BatchSnapshot> {
        Ok(self.registry.get(&id)?.read().snapshot())
    }

    /// Attach an uploaded file to a batch, replacing records wholesale and
    /// resetting all progress. Rejected while the batch is running.
    pub fn load(&self, id: Uuid, filename: &str, text: &str) -> Result<BatchSnapshot> {
        let handle = self.registry.get(&id)?;
        let records = parse_upload(text)?;
        let label = format_label(filename);

        let snapshot = {
            let mut batch = handle.write();
            if batch.is_running() {
                return Err(BatchError::State {
                    batch_id: id,
                    reason: "cannot load a file while the batch is running".to_string(),
                });
            }
            batch.load(label.clone(), records);
            batch.snapshot()
        };

        log_batch_operation(
            "load",
            id,
            &label,
            "success",
            Some(&format!("{} record(s)", snapshot.total)),
        );
        self.events
            .publish(BatchEventKind::Loaded, snapshot.clone(), None);
        Ok(snapshot)
    }

    /// Begin processing from the current cursor. Requires a loaded file and
    /// an available token (see [`BatchEngine::authenticate`]).
    pub fn start(&self, id: Uuid) -> Result<BatchSnapshot> {
        self.spawn_loop(id, BatchEventKind::Started, true)
    }

    /// Continue a paused batch from its cursor. Reuses the engine's current
    /// token reference, which may have been refreshed since the pause; a
    /// fresh sign-in is not required.
    pub fn resume(&self, id: Uuid) -> Result<BatchSnapshot> {
        self.spawn_loop(id, BatchEventKind::Resumed, false)
    }

    /// Stop the batch at the next step boundary and wait for its loop to
    /// park. Idempotent: pausing a batch that is not running returns its
    /// snapshot unchanged.
    pub async fn pause(&self, id: Uuid) -> Result<BatchSnapshot> {
        let handle = self.registry.get(&id)?;
        self.cancel_active(id).await;
        let snapshot = handle.read().snapshot();
        log_batch_operation("pause", id, &snapshot.label, "success", None);
        Ok(snapshot)
    }

    /// Cancel any in-flight processing, purge persisted rows under the
    /// batch's label, then remove the batch from the registry — in that
    /// order, so a failed purge leaves the batch in place for a retry.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let handle = self.registry.get(&id)?;
        self.cancel_active(id).await;

        let label = handle.read().label.clone();
        if let Some(label) = &label {
            self.sink.delete_by_label(label).await?;
        }

        let removed = self.registry.remove(&id)?;
        let snapshot = removed.read().snapshot();
        log_batch_operation("delete", id, &snapshot.label, "success", None);
        self.events.publish(BatchEventKind::Deleted, snapshot, None);
        Ok(())
    }

    /// Export every persisted row under the batch's label as CSV.
    pub async fn export(&self, id: Uuid) -> Result<String> {
        let handle = self.registry.get(&id)?;
        let label = handle.read().label.clone().ok_or(BatchError::State {
            batch_id: id,
            reason: "no file loaded; nothing to export".to_string(),
        })?;

        let rows = self.sink.select_by_label(&label).await?;
        Ok(render_csv(&rows))
    }

    /// Shared start/resume path.
    fn spawn_loop(
        &self,
        id: Uuid,
        kind: BatchEventKind,
        require_token: bool,
    ) -> Result<BatchSnapshot> {
        let handle = self.registry.get(&id)?;

        let snapshot = {
            let mut batch = handle.write();

            if batch.is_running() {
                return self.state_notice(id, batch.snapshot(), "already running");
            }
            if batch.state.is_terminal() {
                return self.state_notice(id, batch.snapshot(), "already completed");
            }
            if batch.label.is_none() || batch.total() == 0 {
                return Err(BatchError::State {
                    batch_id: id,
                    reason: "no file loaded".to_string(),
                });
            }
            if batch.cursor >= batch.total() {
                return self.state_notice(id, batch.snapshot(), "nothing left to process");
            }
            if require_token && !self.tokens.has_token() {
                return Err(BatchError::Auth(
                    "no token available; authenticate before starting".to_string(),
                ));
            }

            batch.state = BatchState::Running;
            batch.snapshot()
        };

        let signal = PauseSignal::new();
        let ctx = WorkerContext {
            batch_id: id,
            batch: handle,
            lookup: self.lookup.clone(),
            sink: self.sink.clone(),
            tokens: self.tokens.clone(),
            events: self.events.clone(),
            record_interval: self.record_interval,
            signal: signal.clone(),
        };

        let active = self.active.clone();
        let loop_signal = signal.clone();
        let (ready_tx, ready_rx) = tokio::sync::oneshot::channel::<()>();
        let join = tokio::spawn(async move {
            // Hold until the bookkeeping entry below is in place, so a very
            // short batch cannot finish before its entry is registered.
            let _ = ready_rx.await;
            run_batch_loop(ctx).await;
            // Only remove our own entry; a pause may already have replaced
            // it with a newer loop's bookkeeping.
            active.remove_if(&id, |_, entry| Arc::ptr_eq(&entry.signal, &loop_signal));
        });
        self.active.insert(
            id,
            ActiveLoop {
                signal,
                handle: join,
            },
        );
        let _ = ready_tx.send(());

        info!(batch_id = %id, cursor = snapshot.cursor, total = snapshot.total, "▶️ Batch loop spawned");
        self.events.publish(kind, snapshot.clone(), None);
        Ok(snapshot)
    }

    /// Invalidate the pending continuation of a running loop and wait for
    /// the loop to park. No-op when the batch has no active loop.
    async fn cancel_active(&self, id: Uuid) {
        if let Some((_, entry)) = self.active.remove(&id) {
            entry.signal.request_pause();
            let _ = entry.handle.await;
        }
    }

    /// Publish the no-op notification for an ineligible start/resume.
    fn state_notice(
        &self,
        id: Uuid,
        snapshot: BatchSnapshot,
        reason: &str,
    ) -> Result<BatchSnapshot> {
        warn!(batch_id = %id, reason = %reason, "Start/resume ignored");
        self.events.publish(
            BatchEventKind::StateNotice,
            snapshot,
            Some(reason.to_string()),
        );
        Err(BatchError::State {
            batch_id: id,
            reason: reason.to_string(),
        })
    }
}
