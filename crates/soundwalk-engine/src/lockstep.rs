//! Lockstep (caller-driven) session.
//!
//! [`LockstepSession`] is the primary user-facing API for running the
//! engine synchronously. Each call to
//! [`update_position()`](LockstepSession::update_position) filters the
//! sample, fetches the surroundings for it, and reconciles the result,
//! all on the caller's thread.
//!
//! # Ownership model
//!
//! `LockstepSession` is [`Send`] (can be moved to a worker thread, which
//! is what [`RealtimeSession`](crate::RealtimeSession) does) but every
//! mutating method takes `&mut self`, so at most one reconciliation can
//! be in flight. The borrow checker enforces the serialization.
//!
//! # Shutdown
//!
//! [`end()`](LockstepSession::end) pauses and disconnects every bound
//! resource and returns the final metrics. Dropping a session without
//! calling `end()` releases resources the same way.

use std::error::Error;
use std::fmt;
use std::time::Instant;

use crossbeam_channel::Receiver;
use soundwalk_core::{
    AudioSink, CatalogProvider, FetchError, LocationSample, Position, SurroundingsProvider,
    SurroundingsSnapshot,
};

use crate::config::{ConfigError, SessionConfig};
use crate::metrics::SessionMetrics;
use crate::playback::PlaybackEvent;
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::registry::{RegistryError, SpotRegistry, SpotStatus};

// Compile-time assertion: LockstepSession is Send.
// Fails to compile if any collaborator is !Send.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<LockstepSession>();
    }
};

// ── SessionError ────────────────────────────────────────────────

/// Errors that prevent a session from starting.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionError {
    /// The configuration failed validation.
    Config(ConfigError),
    /// The catalog could not be fetched.
    Fetch(FetchError),
    /// The catalog could not be turned into a registry.
    Registry(RegistryError),
    /// The realtime worker thread could not be spawned.
    ThreadSpawn {
        /// Description of the spawn failure.
        reason: String,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Fetch(e) => write!(f, "catalog fetch: {e}"),
            Self::Registry(e) => write!(f, "registry: {e}"),
            Self::ThreadSpawn { reason } => write!(f, "thread spawn failed: {reason}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Fetch(e) => Some(e),
            Self::Registry(e) => Some(e),
            Self::ThreadSpawn { .. } => None,
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<FetchError> for SessionError {
    fn from(e: FetchError) -> Self {
        Self::Fetch(e)
    }
}

impl From<RegistryError> for SessionError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

// ── Sample filtering ────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SkipReason {
    Invalid,
    Repeated,
    Inaccurate,
}

impl SkipReason {
    fn as_str(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Repeated => "repeated",
            Self::Inaccurate => "inaccurate",
        }
    }
}

// ── LockstepSession ─────────────────────────────────────────────

/// Single-threaded session driven by the caller.
///
/// Created via [`start()`](LockstepSession::start), which fetches the
/// catalog once and builds the registry. Each
/// [`update_position()`](LockstepSession::update_position) call runs one
/// complete cycle: apply pending completion events → filter the sample
/// → fetch surroundings → reconcile → update metrics.
///
/// # Example
///
/// ```ignore
/// let mut session = LockstepSession::start(&mut catalog, surroundings, sink, config)?;
/// for sample in location_source {
///     if let Some(outcome) = session.update_position(sample)? {
///         render(session.registry().statuses());
///     }
/// }
/// let metrics = session.end();
/// ```
pub struct LockstepSession {
    reconciler: Reconciler,
    surroundings: Box<dyn SurroundingsProvider>,
    config: SessionConfig,
    metrics: SessionMetrics,
    last_position: Option<Position>,
    released: bool,
}

impl LockstepSession {
    /// Start a session.
    ///
    /// Validates `config`, fetches the catalog, builds the registry and,
    /// when `prebind_resources` is set, creates every audio resource up
    /// front. Resource creation failures are logged and retried on first
    /// entry; they do not fail the start.
    pub fn start(
        catalog: &mut dyn CatalogProvider,
        surroundings: Box<dyn SurroundingsProvider>,
        sink: Box<dyn AudioSink>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let spots = catalog.fetch_catalog()?;
        let registry = SpotRegistry::build(spots)?;
        let mut reconciler = Reconciler::new(registry, sink);
        let mut metrics = SessionMetrics::default();
        if config.prebind_resources {
            metrics.playback_failures += reconciler.prebind().len() as u64;
        }
        tracing::info!(
            spots = reconciler.registry().len(),
            prebind = config.prebind_resources,
            "Session started"
        );
        Ok(Self {
            reconciler,
            surroundings,
            config,
            metrics,
            last_position: None,
            released: false,
        })
    }

    /// Run one cycle for a new location sample.
    ///
    /// Returns `Ok(None)` when the sample was filtered out (invalid,
    /// repeated, or too inaccurate) and no fetch was made. A failed
    /// fetch leaves the registry untouched and is returned as-is; the
    /// next sample is processed normally.
    pub fn update_position(
        &mut self,
        sample: LocationSample,
    ) -> Result<Option<ReconcileOutcome>, FetchError> {
        self.pump_events();

        if let Some(reason) = self.skip_reason(&sample) {
            self.metrics.skipped_samples += 1;
            tracing::trace!(
                position = %sample.position,
                accuracy_m = sample.accuracy_m,
                reason = reason.as_str(),
                "Skipped location sample"
            );
            return Ok(None);
        }

        let started = Instant::now();
        let ids = match self.surroundings.fetch_surroundings(sample.position) {
            Ok(ids) => ids,
            Err(e) => {
                self.metrics.fetch_failures += 1;
                tracing::warn!(position = %sample.position, error = %e, "Surroundings fetch failed");
                return Err(e);
            }
        };
        self.last_position = Some(sample.position);
        let snapshot: SurroundingsSnapshot = ids.into();
        let outcome = self.reconciler.reconcile(&snapshot);
        self.metrics
            .record_cycle(&outcome, started.elapsed().as_micros() as u64);
        Ok(Some(outcome))
    }

    /// Reconcile a snapshot obtained outside the session's provider.
    ///
    /// Counts as a cycle but does not change the last accepted position.
    pub fn reconcile(&mut self, snapshot: &SurroundingsSnapshot) -> ReconcileOutcome {
        self.pump_events();
        let started = Instant::now();
        let outcome = self.reconciler.reconcile(snapshot);
        self.metrics
            .record_cycle(&outcome, started.elapsed().as_micros() as u64);
        outcome
    }

    fn skip_reason(&self, sample: &LocationSample) -> Option<SkipReason> {
        if !sample.position.is_valid() || !sample.accuracy_m.is_finite() || sample.accuracy_m < 0.0
        {
            return Some(SkipReason::Invalid);
        }
        if self.config.skip_repeated_positions && self.last_position == Some(sample.position) {
            return Some(SkipReason::Repeated);
        }
        match self.config.max_accuracy_m {
            Some(bound) if sample.accuracy_m > bound => Some(SkipReason::Inaccurate),
            _ => None,
        }
    }

    /// Apply one completion event. Returns whether state changed.
    pub fn apply_event(&mut self, event: PlaybackEvent) -> bool {
        let applied = self.reconciler.apply_event(event);
        if applied {
            self.metrics.completed_runs += 1;
        }
        applied
    }

    /// Apply all queued completion events. Returns how many changed state.
    ///
    /// Called automatically at the start of every cycle; call it directly
    /// to refresh `playing` flags between samples.
    pub fn pump_events(&mut self) -> usize {
        let applied = self.reconciler.pump_events();
        self.metrics.completed_runs += applied as u64;
        applied
    }

    pub(crate) fn note_superseded(&mut self, count: u64) {
        if count > 0 {
            self.metrics.superseded_samples += count;
            tracing::trace!(count, "Superseded pending samples");
        }
    }

    /// Receiver side of the completion-event queue.
    pub fn events(&self) -> &Receiver<PlaybackEvent> {
        self.reconciler.events()
    }

    /// Read-only registry access for rendering.
    pub fn registry(&self) -> &SpotRegistry {
        self.reconciler.registry()
    }

    /// Rendering view of every record, in catalog order.
    pub fn statuses(&self) -> Vec<SpotStatus> {
        self.reconciler.registry().statuses()
    }

    /// Cumulative metrics.
    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    /// The session's configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Position of the last sample whose fetch succeeded.
    pub fn last_position(&self) -> Option<Position> {
        self.last_position
    }

    /// End the session: silence and detach all resources.
    pub fn end(mut self) -> SessionMetrics {
        self.release();
        self.metrics.clone()
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let failures = self.reconciler.release();
        self.metrics.playback_failures += failures.len() as u64;
        tracing::info!(
            cycles = self.metrics.cycles,
            failures = failures.len(),
            "Session ended"
        );
    }
}

impl Drop for LockstepSession {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for LockstepSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockstepSession")
            .field("spots", &self.reconciler.registry().len())
            .field("last_position", &self.last_position)
            .field("cycles", &self.metrics.cycles)
            .field("released", &self.released)
            .finish()
    }
}
