//! User-facing `RealtimeSession` API and shutdown sequence.
//!
//! The session runs on a dedicated background thread while location
//! samples are submitted from any thread and UI threads read published
//! spot statuses concurrently.
//!
//! # Architecture
//!
//! ```text
//! Location source             Worker thread                   UI thread(s)
//!     |                           |                               |
//!     |--submit(sample)---------->| select! {                     |
//!     |   [latest-wins slot +     |   wake_rx   -> take slot      |
//!     |    wake: bounded(1)]      |                 update_position
//!     |                           |                 publish       |
//!     |                           |   events_rx -> apply_event    |
//!     |                           |   shutdown  -> break          |
//!     |                           | }                             |
//!     |<--reports() [bounded(N), try_send]                        |
//!     |                           |        statuses() <-----------|
//! ```
//!
//! Submitting never blocks: a sample that arrives while a cycle is in
//! flight waits in the slot, and a newer one replaces it. Only the
//! freshest position is ever reconciled after the current cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use soundwalk_core::{FetchError, LocationSample};

use crate::lockstep::{LockstepSession, SessionError};
use crate::metrics::SessionMetrics;
use crate::reconcile::ReconcileOutcome;
use crate::registry::SpotStatus;
use crate::worker::{PendingSample, StatusBoard, WorkerState};

// ── Error types ──────────────────────────────────────────────────

/// Error submitting a sample to the worker thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitError {
    /// The worker thread has shut down.
    Shutdown,
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shutdown => write!(f, "reconcile thread has shut down"),
        }
    }
}

impl std::error::Error for SubmitError {}

// ── CycleReport ──────────────────────────────────────────────────

/// Result of one worker cycle, as returned by
/// [`LockstepSession::update_position()`].
#[derive(Clone, Debug, PartialEq)]
pub struct CycleReport {
    /// The sample that was processed.
    pub sample: LocationSample,
    /// `Ok(None)` when the sample was filtered out.
    pub result: Result<Option<ReconcileOutcome>, FetchError>,
}

// ── ShutdownReport ───────────────────────────────────────────────

/// Report from the shutdown sequence.
#[derive(Clone, Debug)]
pub struct ShutdownReport {
    /// Total time spent in the shutdown sequence.
    pub total_ms: u64,
    /// Whether the worker thread was joined and the session ended.
    pub worker_joined: bool,
    /// Final metrics, when the session was recovered.
    pub metrics: Option<SessionMetrics>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownState {
    Running,
    Dropped,
}

// ── RealtimeSession ──────────────────────────────────────────────

/// Session running on a background reconcile thread.
///
/// Created from a started [`LockstepSession`], which is moved into the
/// worker and recovered on shutdown.
pub struct RealtimeSession {
    pending: Arc<PendingSample>,
    wake_tx: Option<Sender<()>>,
    shutdown_tx: Option<Sender<()>>,
    reports_rx: Receiver<CycleReport>,
    board: Arc<StatusBoard>,
    stopped: Arc<AtomicBool>,
    worker: Option<JoinHandle<LockstepSession>>,
    state: ShutdownState,
    shutdown_timeout: Duration,
}

impl RealtimeSession {
    /// Move `session` onto a new worker thread.
    pub fn start(session: LockstepSession) -> Result<Self, SessionError> {
        let report_capacity = session.config().report_capacity;
        let shutdown_timeout = session.config().shutdown_timeout();

        let pending = Arc::new(PendingSample::default());
        let board = Arc::new(StatusBoard::new(&session));
        let stopped = Arc::new(AtomicBool::new(false));

        // Wake channel: bounded(1). A full channel already means "slot
        // non-empty", so senders never need to wait.
        let (wake_tx, wake_rx) = crossbeam_channel::bounded(1);
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        let (reports_tx, reports_rx) = crossbeam_channel::bounded(report_capacity);

        let state = WorkerState::new(
            session,
            Arc::clone(&pending),
            wake_rx,
            shutdown_rx,
            reports_tx,
            Arc::clone(&board),
            Arc::clone(&stopped),
        );
        let worker = thread::Builder::new()
            .name("soundwalk-reconcile".into())
            .spawn(move || state.run())
            .map_err(|e| SessionError::ThreadSpawn {
                reason: e.to_string(),
            })?;
        tracing::info!(report_capacity, "Realtime session started");

        Ok(Self {
            pending,
            wake_tx: Some(wake_tx),
            shutdown_tx: Some(shutdown_tx),
            reports_rx,
            board,
            stopped,
            worker: Some(worker),
            state: ShutdownState::Running,
            shutdown_timeout,
        })
    }

    /// Queue a location sample for reconciliation.
    ///
    /// Non-blocking. If an earlier sample is still waiting it is
    /// replaced and counted as superseded.
    pub fn submit(&self, sample: LocationSample) -> Result<(), SubmitError> {
        let wake_tx = self.wake_tx.as_ref().ok_or(SubmitError::Shutdown)?;
        if self.stopped.load(Ordering::Acquire) {
            return Err(SubmitError::Shutdown);
        }
        self.pending.put(sample);
        match wake_tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => Ok(()),
            Err(TrySendError::Disconnected(())) => Err(SubmitError::Shutdown),
        }
    }

    /// Cycle reports, in processing order.
    ///
    /// Reports that do not fit the channel are dropped.
    pub fn reports(&self) -> &Receiver<CycleReport> {
        &self.reports_rx
    }

    /// Spot statuses as of the last completed cycle or completion event.
    pub fn statuses(&self) -> Arc<[SpotStatus]> {
        self.board.statuses()
    }

    /// Metrics as of the last completed cycle or completion event.
    pub fn metrics(&self) -> SessionMetrics {
        self.board.metrics()
    }

    /// Whether the worker thread is still accepting samples.
    pub fn is_running(&self) -> bool {
        self.state == ShutdownState::Running && !self.stopped.load(Ordering::Acquire)
    }

    /// Stop the worker, recover the session, and release all resources.
    ///
    /// A cycle in flight is allowed to finish; a sample still waiting in
    /// the slot is discarded. If the worker does not stop within the
    /// configured timeout (a fetch hanging, say) it is left detached and
    /// releases the session itself when its cycle returns.
    pub fn shutdown(&mut self) -> ShutdownReport {
        if self.state == ShutdownState::Dropped {
            return ShutdownReport {
                total_ms: 0,
                worker_joined: true,
                metrics: None,
            };
        }

        let start = Instant::now();
        self.state = ShutdownState::Dropped;

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.try_send(());
        }
        self.wake_tx.take();

        let deadline = start + self.shutdown_timeout;
        let finished = loop {
            let done = self.stopped.load(Ordering::Acquire)
                || self.worker.as_ref().is_none_or(JoinHandle::is_finished);
            if done {
                break true;
            }
            if Instant::now() > deadline {
                break false;
            }
            thread::sleep(Duration::from_millis(1));
        };

        let mut worker_joined = false;
        let mut metrics = None;
        if finished {
            if let Some(handle) = self.worker.take() {
                match handle.join() {
                    Ok(session) => {
                        worker_joined = true;
                        metrics = Some(session.end());
                    }
                    Err(_) => tracing::warn!("Reconcile thread panicked"),
                }
            }
        } else {
            tracing::warn!(
                timeout_ms = self.shutdown_timeout.as_millis() as u64,
                "Reconcile thread did not stop in time, detaching"
            );
            self.worker.take();
        }

        let total_ms = start.elapsed().as_millis() as u64;
        tracing::info!(total_ms, worker_joined, "Realtime session shut down");
        ShutdownReport {
            total_ms,
            worker_joined,
            metrics,
        }
    }
}

impl Drop for RealtimeSession {
    fn drop(&mut self) {
        if self.state != ShutdownState::Dropped {
            self.shutdown();
        }
    }
}

impl std::fmt::Debug for RealtimeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeSession")
            .field("state", &self.state)
            .field("pending_reports", &self.reports_rx.len())
            .finish_non_exhaustive()
    }
}
