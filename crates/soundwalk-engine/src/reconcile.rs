//! Surroundings reconciliation: the diff-and-apply core.
//!
//! [`Reconciler`] owns the [`SpotRegistry`] and the
//! [`PlaybackController`]. Each [`reconcile()`](Reconciler::reconcile)
//! call diffs a new snapshot against the registry's active set and
//! applies the resulting transitions:
//!
//! 1. `entered = snapshot − active`, `left = active − snapshot`; ids
//!    missing from the registry are dropped.
//! 2. If any entered spot is a global-stop zone, every playing record is
//!    paused and rewound first. `active` flags are left untouched.
//! 3. Entered spots become active and start playing.
//! 4. Left spots become inactive; one-shot sounds finish their run,
//!    everything else is paused and rewound.
//!
//! Transitions commute: the order within `entered` and within `left`
//! has no observable effect. A sink failure for one spot is recorded in
//! the outcome and does not stop the others.

use crossbeam_channel::Receiver;
use soundwalk_core::{AudioSink, SpotId, SurroundingsSnapshot};

use crate::playback::{PlaybackController, PlaybackEvent, SpotFailure};
use crate::policy::{self, Directive, Directives, Transition};
use crate::registry::{SpotRecord, SpotRegistry};

/// Result of one [`Reconciler::reconcile()`] call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Spots that became active, in snapshot order.
    pub entered: Vec<SpotId>,
    /// Spots that became inactive, in catalog order.
    pub left: Vec<SpotId>,
    /// A global-stop zone was among the entered spots.
    pub stop_zone_entered: bool,
    /// Spots silenced by a global-stop entry.
    pub silenced: Vec<SpotId>,
    /// Snapshot ids unknown to the registry.
    pub ignored: Vec<SpotId>,
    /// Per-spot sink failures. Never rolled back, never retried.
    pub failures: Vec<SpotFailure>,
}

impl ReconcileOutcome {
    /// Whether the snapshot matched the previous active set.
    pub fn is_unchanged(&self) -> bool {
        self.entered.is_empty() && self.left.is_empty()
    }

    /// Whether a global-stop zone was entered, whether or not anything
    /// was playing at the time.
    pub fn global_stop(&self) -> bool {
        self.stop_zone_entered
    }
}

/// Owner of all per-session spot state.
///
/// All mutation of the registry goes through `&mut self`, so at most
/// one reconciliation can be in progress at a time.
#[derive(Debug)]
pub struct Reconciler {
    registry: SpotRegistry,
    playback: PlaybackController,
}

impl Reconciler {
    /// Take ownership of a freshly built registry and the audio sink.
    pub fn new(registry: SpotRegistry, sink: Box<dyn AudioSink>) -> Self {
        Self {
            registry,
            playback: PlaybackController::new(sink),
        }
    }

    /// Read-only access for rendering.
    pub fn registry(&self) -> &SpotRegistry {
        &self.registry
    }

    /// Completion events waiting to be applied.
    ///
    /// Exposed so a driver can block on it alongside other channels.
    pub fn events(&self) -> &Receiver<PlaybackEvent> {
        self.playback.events()
    }

    /// Create resources for every spot with sound.
    ///
    /// Failures are returned and left for lazy creation on first entry.
    pub fn prebind(&mut self) -> Vec<SpotFailure> {
        let mut failures = Vec::new();
        for record in self.registry.iter_mut() {
            if let Err(f) = self.playback.bind(record) {
                tracing::warn!(spot = %f.spot, error = %f.error, "Resource creation failed");
                failures.push(f);
            }
        }
        failures
    }

    /// Diff `snapshot` against the active set and apply the transitions.
    pub fn reconcile(&mut self, snapshot: &SurroundingsSnapshot) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();

        // 1. Diff.
        let mut entered: Vec<(SpotId, Directives)> = Vec::new();
        for id in snapshot.iter() {
            match self.registry.find(id) {
                None => outcome.ignored.push(id),
                Some(record) if !record.is_active() => entered.push((
                    id,
                    policy::evaluate(record.zone(), record.can_play(), Transition::Enter),
                )),
                Some(_) => {}
            }
        }
        let left: Vec<(SpotId, Directives)> = self
            .registry
            .iter()
            .filter(|r| r.is_active() && !snapshot.contains(r.id()))
            .map(|r| {
                (
                    r.id(),
                    policy::evaluate(r.zone(), r.can_play(), Transition::Leave),
                )
            })
            .collect();

        if !outcome.ignored.is_empty() {
            tracing::debug!(ignored = ?outcome.ignored, "Dropped unknown spot ids");
        }

        // 2. Global stop takes precedence over every entry.
        let stop_all = entered
            .iter()
            .any(|(_, d)| d.contains(&Directive::StopAll));
        if stop_all {
            outcome.stop_zone_entered = true;
            self.silence_all(&mut outcome);
        }

        // 3. Entries.
        for (id, directives) in &entered {
            let Some(record) = self.registry.find_mut(*id) else {
                continue;
            };
            record.active = true;
            tracing::debug!(spot = %id, "Entered spot");
            for directive in directives {
                Self::apply(&mut self.playback, record, *directive, &mut outcome);
            }
            outcome.entered.push(*id);
        }

        // 4. Exits.
        for (id, directives) in &left {
            let Some(record) = self.registry.find_mut(*id) else {
                continue;
            };
            record.active = false;
            tracing::debug!(spot = %id, "Left spot");
            for directive in directives {
                Self::apply(&mut self.playback, record, *directive, &mut outcome);
            }
            outcome.left.push(*id);
        }

        outcome
    }

    /// Pause and rewind every playing record, including one-shot grace runs.
    fn silence_all(&mut self, outcome: &mut ReconcileOutcome) {
        for record in self.registry.iter_mut().filter(|r| r.playing()) {
            match self.playback.stop(record) {
                Ok(_) => outcome.silenced.push(record.id()),
                Err(f) => Self::report(f, outcome),
            }
        }
        tracing::debug!(silenced = ?outcome.silenced, "Global stop");
    }

    fn apply(
        playback: &mut PlaybackController,
        record: &mut SpotRecord,
        directive: Directive,
        outcome: &mut ReconcileOutcome,
    ) {
        let result = match directive {
            // Applied once for the whole cycle, before any entry.
            Directive::StopAll => Ok(()),
            Directive::Start => playback.start(record),
            Directive::FinishRun => playback.finish_run(record),
            Directive::StopAndRewind => playback.stop(record).map(|_| ()),
        };
        if let Err(f) = result {
            Self::report(f, outcome);
        }
    }

    fn report(failure: SpotFailure, outcome: &mut ReconcileOutcome) {
        tracing::warn!(
            spot = %failure.spot,
            op = %failure.op,
            error = %failure.error,
            "Playback operation failed"
        );
        outcome.failures.push(failure);
    }

    /// Apply one completion event. Returns whether state changed.
    pub fn apply_event(&mut self, event: PlaybackEvent) -> bool {
        match event {
            PlaybackEvent::Ended { spot, run } => {
                let Some(res) = self
                    .registry
                    .find_mut(spot)
                    .and_then(|r| r.resource.as_mut())
                else {
                    return false;
                };
                let applied = res.mark_ended(run);
                if applied {
                    tracing::debug!(spot = %spot, run, "Run completed");
                }
                applied
            }
        }
    }

    /// Apply every queued completion event. Returns how many changed state.
    pub fn pump_events(&mut self) -> usize {
        let pending: Vec<PlaybackEvent> = self.playback.events().try_iter().collect();
        pending
            .into_iter()
            .filter(|e| self.apply_event(*e))
            .count()
    }

    /// Silence and detach every resource at session end.
    ///
    /// `active` flags are left as they are; the registry is discarded
    /// with the session.
    pub fn release(&mut self) -> Vec<SpotFailure> {
        let mut failures = Vec::new();
        for record in self.registry.iter_mut() {
            if let Err(f) = self.playback.release(record) {
                tracing::warn!(spot = %f.spot, error = %f.error, "Release failed");
                failures.push(f);
            }
        }
        failures
    }
}
