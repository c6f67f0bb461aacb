//! Reconcile loop, latest-wins sample slot, and status publication for
//! realtime mode.
//!
//! The worker thread owns the [`LockstepSession`] exclusively (moved in
//! via `thread::spawn`). Samples arrive through a [`PendingSample`] slot
//! that keeps only the freshest one; a `bounded(1)` wake channel tells
//! the worker the slot is non-empty. Completion events are multiplexed
//! with samples and shutdown via `select!`, so they are applied between
//! cycles, never during one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossbeam_channel::{select, Receiver, Sender, TrySendError};
use soundwalk_core::LocationSample;

use crate::lockstep::LockstepSession;
use crate::metrics::SessionMetrics;
use crate::playback::PlaybackEvent;
use crate::realtime::CycleReport;
use crate::registry::SpotStatus;

// ── PendingSample ────────────────────────────────────────────────

#[derive(Default)]
struct Slot {
    sample: Option<LocationSample>,
    superseded: u64,
}

/// Single-entry mailbox where a newer sample replaces an unprocessed one.
#[derive(Default)]
pub(crate) struct PendingSample {
    slot: Mutex<Slot>,
}

impl PendingSample {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `sample`. Returns whether an unprocessed sample was replaced.
    pub fn put(&self, sample: LocationSample) -> bool {
        let mut slot = self.lock();
        let replaced = slot.sample.replace(sample).is_some();
        if replaced {
            slot.superseded += 1;
        }
        replaced
    }

    /// Take the freshest sample and the number it superseded since the
    /// last take.
    pub fn take(&self) -> (Option<LocationSample>, u64) {
        let mut slot = self.lock();
        let superseded = std::mem::take(&mut slot.superseded);
        (slot.sample.take(), superseded)
    }
}

// ── StatusBoard ──────────────────────────────────────────────────

/// Last published view of the session, read by UI threads.
pub(crate) struct StatusBoard {
    inner: Mutex<Published>,
}

#[derive(Clone)]
struct Published {
    statuses: Arc<[SpotStatus]>,
    metrics: SessionMetrics,
}

impl StatusBoard {
    pub fn new(session: &LockstepSession) -> Self {
        Self {
            inner: Mutex::new(Published {
                statuses: session.statuses().into(),
                metrics: session.metrics().clone(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Published> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, session: &LockstepSession) {
        let next = Published {
            statuses: session.statuses().into(),
            metrics: session.metrics().clone(),
        };
        *self.lock() = next;
    }

    pub fn statuses(&self) -> Arc<[SpotStatus]> {
        Arc::clone(&self.lock().statuses)
    }

    pub fn metrics(&self) -> SessionMetrics {
        self.lock().metrics.clone()
    }
}

// ── WorkerState ──────────────────────────────────────────────────

/// State held by the worker thread's main loop.
pub(crate) struct WorkerState {
    session: LockstepSession,
    pending: Arc<PendingSample>,
    wake_rx: Receiver<()>,
    shutdown_rx: Receiver<()>,
    events_rx: Receiver<PlaybackEvent>,
    reports_tx: Sender<CycleReport>,
    board: Arc<StatusBoard>,
    stopped: Arc<AtomicBool>,
}

impl WorkerState {
    pub fn new(
        session: LockstepSession,
        pending: Arc<PendingSample>,
        wake_rx: Receiver<()>,
        shutdown_rx: Receiver<()>,
        reports_tx: Sender<CycleReport>,
        board: Arc<StatusBoard>,
        stopped: Arc<AtomicBool>,
    ) -> Self {
        let events_rx = session.events().clone();
        Self {
            session,
            pending,
            wake_rx,
            shutdown_rx,
            events_rx,
            reports_tx,
            board,
            stopped,
        }
    }

    /// Main loop. Runs until shutdown is signalled or the session
    /// handle's channels disconnect.
    ///
    /// Consumes self and returns the session so the caller can end it
    /// via `JoinHandle<LockstepSession>`.
    pub fn run(mut self) -> LockstepSession {
        loop {
            select! {
                recv(self.shutdown_rx) -> _ => break,
                recv(self.wake_rx) -> msg => {
                    if msg.is_err() {
                        break;
                    }
                    self.process_pending();
                }
                recv(self.events_rx) -> msg => {
                    if let Ok(event) = msg {
                        if self.session.apply_event(event) {
                            self.board.publish(&self.session);
                        }
                    }
                }
            }
        }

        self.stopped.store(true, Ordering::Release);
        self.session
    }

    fn process_pending(&mut self) {
        let (sample, superseded) = self.pending.take();
        self.session.note_superseded(superseded);
        let Some(sample) = sample else {
            return;
        };
        let result = self.session.update_position(sample);
        self.board.publish(&self.session);
        match self.reports_tx.try_send(CycleReport { sample, result }) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(_)) => {
                tracing::debug!(position = %sample.position, "Report channel full, dropping report");
            }
        }
    }
}
