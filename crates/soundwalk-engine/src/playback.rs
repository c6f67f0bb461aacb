//! Audio playback controller: directives in, sink operations out.
//!
//! [`PlaybackController`] translates [`Directive`]s into calls on an
//! [`AudioSink`]. It owns the sink and the completion-event channel;
//! per-spot resource state ([`AudioResource`]) lives in the spot's
//! [`SpotRecord`], so the controller holds nothing beyond the mapping
//! from record to bound resource.
//!
//! # Resource lifecycle
//!
//! A record with sound gets exactly one resource per session. It is
//! created on [`bind`](PlaybackController::bind) (eagerly at session
//! start, or lazily on first entry) and never recreated; a failed
//! creation leaves the record unbound and is retried on the next entry.
//! The loop flag is set at creation. If the sink rejects it, playback
//! goes ahead and the flag is set again on the next start.
//!
//! Every run that can end on its own gets a completion observer when it
//! starts, so a sound that finishes while its spot is still active is
//! reflected in [`SpotRecord::playing`]. A looping run is observed once
//! auto-repeat is switched off for its last iteration.
//!
//! Sink operations are skipped when the mirrored state shows they would
//! be no-ops, so a reconciliation that changes nothing issues no calls.
//!
//! [`Directive`]: crate::policy::Directive

use std::error::Error;
use std::fmt;

use crossbeam_channel::{Receiver, Sender};
use soundwalk_core::{AudioHandle, AudioSink, PlaybackError, PlaybackOp, SpotId};

use crate::policy;
use crate::registry::SpotRecord;

// ── AudioResource ─────────────────────────────────────────────────

/// Mirrored state of one sink resource.
///
/// Updated only after the sink accepted an operation, or when a
/// completion event reports the natural end of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioResource {
    handle: AudioHandle,
    connected: bool,
    paused: bool,
    at_start: bool,
    /// Auto-repeat wanted by the zone policy.
    looping: bool,
    /// Auto-repeat as last accepted by the sink.
    loop_enabled: bool,
    run: u64,
    watched_run: Option<u64>,
}

impl AudioResource {
    fn new(handle: AudioHandle, looping: bool) -> Self {
        Self {
            handle,
            connected: false,
            paused: true,
            at_start: true,
            looping,
            loop_enabled: false,
            run: 0,
            watched_run: None,
        }
    }

    /// The sink handle.
    pub fn handle(&self) -> AudioHandle {
        self.handle
    }

    /// Bound and not paused.
    pub fn is_playing(&self) -> bool {
        !self.paused
    }

    /// Routed to the sink's output.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Positioned at zero.
    pub fn is_at_start(&self) -> bool {
        self.at_start
    }

    /// Auto-repeat is currently switched on in the sink.
    pub fn is_looping(&self) -> bool {
        self.loop_enabled
    }

    /// Number of runs started so far.
    pub fn run(&self) -> u64 {
        self.run
    }

    /// A completion observer is registered for the current run.
    pub fn is_watched(&self) -> bool {
        self.watched_run == Some(self.run)
    }

    /// Apply the natural end of `run`. Stale runs are ignored.
    pub(crate) fn mark_ended(&mut self, run: u64) -> bool {
        if self.paused || self.run != run {
            return false;
        }
        self.paused = true;
        self.watched_run = None;
        true
    }
}

// ── Events and failures ───────────────────────────────────────────

/// Notification delivered from the sink's event context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// A watched run finished on its own.
    Ended {
        /// The spot whose resource finished.
        spot: SpotId,
        /// The run the observer was registered for.
        run: u64,
    },
}

/// A sink operation that failed for one spot.
///
/// Reported, never retried. The record's `active` flag is not rolled
/// back: it reflects geofence membership, not playback success.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpotFailure {
    /// The affected spot.
    pub spot: SpotId,
    /// The operation that failed.
    pub op: PlaybackOp,
    /// The sink's error.
    pub error: PlaybackError,
}

impl fmt::Display for SpotFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spot {}: {} failed: {}", self.spot, self.op, self.error)
    }
}

impl Error for SpotFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

fn fail(spot: SpotId, op: PlaybackOp) -> impl FnOnce(PlaybackError) -> SpotFailure {
    move |error| SpotFailure { spot, op, error }
}

// ── PlaybackController ────────────────────────────────────────────

/// Adapter between reconciler directives and an [`AudioSink`].
pub struct PlaybackController {
    sink: Box<dyn AudioSink>,
    events_tx: Sender<PlaybackEvent>,
    events_rx: Receiver<PlaybackEvent>,
}

impl PlaybackController {
    /// Wrap a sink. Completion events are queued on an internal channel.
    pub fn new(sink: Box<dyn AudioSink>) -> Self {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        Self {
            sink,
            events_tx,
            events_rx,
        }
    }

    /// Receiver of completion events. Clones share the same queue.
    pub fn events(&self) -> &Receiver<PlaybackEvent> {
        &self.events_rx
    }

    /// Create the record's resource if it has sound and none exists yet.
    ///
    /// A rejected loop flag is returned as a failure but the resource
    /// stays bound.
    pub(crate) fn bind(&mut self, record: &mut SpotRecord) -> Result<(), SpotFailure> {
        if record.resource.is_some() {
            return Ok(());
        }
        let id = record.id();
        let Some(sound) = record.spot().sound.as_ref() else {
            return Ok(());
        };
        let handle = self
            .sink
            .create(sound)
            .map_err(fail(id, PlaybackOp::Create))?;
        let config = policy::resource_config(record.zone());
        tracing::debug!(spot = %id, %handle, looping = config.looping, "Bound audio resource");
        let res = record
            .resource
            .insert(AudioResource::new(handle, config.looping));
        self.set_loop(id, res, config.looping)
    }

    /// Connect (idempotently) and play from position zero.
    ///
    /// A run that is still sounding, such as a one-shot grace run after
    /// a quick re-entry, is left to continue rather than restarted.
    /// Loop and observer failures are reported after playback started.
    pub(crate) fn start(&mut self, record: &mut SpotRecord) -> Result<(), SpotFailure> {
        let bound = self.bind(record);
        let id = record.id();
        let Some(res) = record.resource.as_mut() else {
            return bound;
        };
        let mut deferred = bound.err();
        let h = res.handle;
        if !res.connected {
            self.sink
                .connect(h)
                .map_err(fail(id, PlaybackOp::Connect))?;
            res.connected = true;
        }
        let wanted = res.looping;
        if deferred.is_none() && res.loop_enabled != wanted {
            deferred = self.set_loop(id, res, wanted).err();
        }
        if res.paused {
            if !res.at_start {
                self.sink
                    .rewind(h)
                    .map_err(fail(id, PlaybackOp::Rewind))?;
                res.at_start = true;
            }
            self.sink.play(h).map_err(fail(id, PlaybackOp::Play))?;
            res.paused = false;
            res.at_start = false;
            res.run += 1;
        } else {
            tracing::debug!(spot = %id, run = res.run, "Run still sounding, continuing");
        }
        if !res.loop_enabled {
            if let Err(f) = self.watch(id, res) {
                deferred.get_or_insert(f);
            }
        }
        match deferred {
            Some(f) => Err(f),
            None => Ok(()),
        }
    }

    /// Pause and rewind. Returns whether any sink call was needed.
    pub(crate) fn stop(&mut self, record: &mut SpotRecord) -> Result<bool, SpotFailure> {
        let id = record.id();
        let Some(res) = record.resource.as_mut() else {
            return Ok(false);
        };
        let mut changed = false;
        if !res.paused {
            self.sink
                .pause(res.handle)
                .map_err(fail(id, PlaybackOp::Pause))?;
            res.paused = true;
            changed = true;
        }
        if !res.at_start {
            self.sink
                .rewind(res.handle)
                .map_err(fail(id, PlaybackOp::Rewind))?;
            res.at_start = true;
            changed = true;
        }
        Ok(changed)
    }

    /// Let the current run finish and make sure its end is observed.
    ///
    /// A looping resource has auto-repeat switched off so the current
    /// iteration is the last; the next start switches it back on.
    pub(crate) fn finish_run(&mut self, record: &mut SpotRecord) -> Result<(), SpotFailure> {
        let id = record.id();
        let Some(res) = record.resource.as_mut() else {
            return Ok(());
        };
        if res.paused {
            return Ok(());
        }
        if res.loop_enabled {
            self.set_loop(id, res, false)?;
        }
        self.watch(id, res)
    }

    /// Pause and detach the resource at session end.
    pub(crate) fn release(&mut self, record: &mut SpotRecord) -> Result<(), SpotFailure> {
        let id = record.id();
        let Some(res) = record.resource.as_mut() else {
            return Ok(());
        };
        if !res.paused {
            self.sink
                .pause(res.handle)
                .map_err(fail(id, PlaybackOp::Pause))?;
            res.paused = true;
        }
        if res.connected {
            self.sink
                .disconnect(res.handle)
                .map_err(fail(id, PlaybackOp::Disconnect))?;
            res.connected = false;
        }
        Ok(())
    }

    fn set_loop(
        &mut self,
        id: SpotId,
        res: &mut AudioResource,
        enabled: bool,
    ) -> Result<(), SpotFailure> {
        self.sink
            .configure_loop(res.handle, enabled)
            .map_err(fail(id, PlaybackOp::ConfigureLoop))?;
        res.loop_enabled = enabled;
        Ok(())
    }

    /// Register an observer for the current run unless one exists.
    fn watch(&mut self, id: SpotId, res: &mut AudioResource) -> Result<(), SpotFailure> {
        if res.is_watched() {
            return Ok(());
        }
        let run = res.run;
        let tx = self.events_tx.clone();
        self.sink
            .on_ended(
                res.handle,
                Box::new(move || {
                    // The session may already be gone.
                    let _ = tx.send(PlaybackEvent::Ended { spot: id, run });
                }),
            )
            .map_err(fail(id, PlaybackOp::WatchEnded))?;
        res.watched_run = Some(run);
        Ok(())
    }
}

impl fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackController")
            .field("pending_events", &self.events_rx.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SpotRegistry;
    use soundwalk_core::Spot;
    use soundwalk_test_utils::fixtures::{
        asset_url, looping_spot, one_shot_spot, plain_spot, silent_spot,
    };
    use soundwalk_test_utils::{MockSink, SinkCall, SinkProbe};

    fn setup(spots: Vec<Spot>) -> (PlaybackController, SpotRegistry, SinkProbe) {
        let sink = MockSink::new();
        let probe = sink.probe();
        let reg = SpotRegistry::build(spots).unwrap();
        (PlaybackController::new(Box::new(sink)), reg, probe)
    }

    #[test]
    fn start_creates_connects_and_plays_once() {
        let (mut ctl, mut reg, probe) = setup(vec![plain_spot(1)]);
        let rec = reg.find_mut(SpotId(1)).unwrap();
        ctl.start(rec).unwrap();
        let h = probe.handle_for(&asset_url(1)).unwrap();
        assert_eq!(
            probe.calls(),
            vec![
                SinkCall::Create { url: asset_url(1) },
                SinkCall::ConfigureLoop(h, false),
                SinkCall::Connect(h),
                SinkCall::Play(h),
                SinkCall::OnEnded(h),
            ]
        );
        assert!(rec.playing());
        assert!(rec.resource().unwrap().is_watched());
        assert_eq!(rec.resource().unwrap().run(), 1);

        probe.clear_calls();
        ctl.start(rec).unwrap();
        assert_eq!(probe.call_count(), 0);
    }

    #[test]
    fn restart_after_stop_rewinds_only_once() {
        let (mut ctl, mut reg, probe) = setup(vec![plain_spot(1)]);
        let rec = reg.find_mut(SpotId(1)).unwrap();
        ctl.start(rec).unwrap();
        assert!(ctl.stop(rec).unwrap());
        let h = rec.audio_handle().unwrap();
        assert!(probe.resource(h).unwrap().at_start);

        probe.clear_calls();
        ctl.start(rec).unwrap();
        // Already rewound by stop; connect is idempotent.
        assert_eq!(probe.calls(), vec![SinkCall::Play(h), SinkCall::OnEnded(h)]);
        assert_eq!(probe.resource_count(), 1);
    }

    #[test]
    fn stop_is_idempotent() {
        let (mut ctl, mut reg, probe) = setup(vec![plain_spot(1)]);
        let rec = reg.find_mut(SpotId(1)).unwrap();
        ctl.start(rec).unwrap();
        assert!(ctl.stop(rec).unwrap());
        probe.clear_calls();
        assert!(!ctl.stop(rec).unwrap());
        assert_eq!(probe.call_count(), 0);
    }

    #[test]
    fn silent_record_never_touches_sink() {
        let (mut ctl, mut reg, probe) = setup(vec![silent_spot(1)]);
        let rec = reg.find_mut(SpotId(1)).unwrap();
        ctl.bind(rec).unwrap();
        ctl.start(rec).unwrap();
        assert!(!ctl.stop(rec).unwrap());
        ctl.finish_run(rec).unwrap();
        ctl.release(rec).unwrap();
        assert_eq!(probe.call_count(), 0);
        assert!(rec.resource().is_none());
    }

    #[test]
    fn looping_is_configured_at_creation() {
        let (mut ctl, mut reg, probe) = setup(vec![looping_spot(1)]);
        let rec = reg.find_mut(SpotId(1)).unwrap();
        ctl.bind(rec).unwrap();
        let h = rec.audio_handle().unwrap();
        assert!(probe.resource(h).unwrap().looping);
        assert!(rec.resource().unwrap().is_looping());
        ctl.bind(rec).unwrap();
        assert_eq!(probe.resource_count(), 1);
    }

    #[test]
    fn finish_run_registers_single_watcher_and_completes() {
        let (mut ctl, mut reg, probe) = setup(vec![one_shot_spot(1)]);
        let rec = reg.find_mut(SpotId(1)).unwrap();
        ctl.start(rec).unwrap();
        ctl.finish_run(rec).unwrap();
        ctl.finish_run(rec).unwrap();
        let h = rec.audio_handle().unwrap();
        assert_eq!(probe.pending_watchers(h), 1);
        assert!(rec.playing());

        probe.finish(h);
        let event = ctl.events().try_recv().unwrap();
        assert_eq!(event, PlaybackEvent::Ended { spot: SpotId(1), run: 1 });
        let PlaybackEvent::Ended { run, .. } = event;
        assert!(rec.resource.as_mut().unwrap().mark_ended(run));
        assert!(!rec.playing());
    }

    #[test]
    fn stale_completion_is_ignored() {
        let (mut ctl, mut reg, _probe) = setup(vec![one_shot_spot(1)]);
        let rec = reg.find_mut(SpotId(1)).unwrap();
        ctl.start(rec).unwrap();
        ctl.stop(rec).unwrap();
        ctl.start(rec).unwrap();
        assert!(!rec.resource.as_mut().unwrap().mark_ended(1));
        assert!(rec.playing());
    }

    #[test]
    fn looping_one_shot_suspends_loop_for_grace_run() {
        let mut spot = looping_spot(1);
        spot.zone.one_shot = true;
        let (mut ctl, mut reg, probe) = setup(vec![spot]);
        let rec = reg.find_mut(SpotId(1)).unwrap();
        ctl.start(rec).unwrap();
        let h = rec.audio_handle().unwrap();
        ctl.finish_run(rec).unwrap();
        assert!(!probe.resource(h).unwrap().looping);

        // Re-entry during the grace run keeps it going and restores the loop.
        probe.clear_calls();
        ctl.start(rec).unwrap();
        assert_eq!(probe.calls(), vec![SinkCall::ConfigureLoop(h, true)]);
        assert!(probe.resource(h).unwrap().looping);
        assert_eq!(rec.resource().unwrap().run(), 1);
    }

    #[test]
    fn failed_create_is_retried_on_next_start() {
        let (mut ctl, mut reg, probe) = setup(vec![plain_spot(1)]);
        probe.fail_on(PlaybackOp::Create, &asset_url(1));
        let rec = reg.find_mut(SpotId(1)).unwrap();
        let err = ctl.start(rec).unwrap_err();
        assert_eq!(err.op, PlaybackOp::Create);
        assert!(rec.resource().is_none());

        probe.clear_failures();
        ctl.start(rec).unwrap();
        assert!(rec.playing());
        assert_eq!(probe.resource_count(), 1);
    }

    #[test]
    fn failed_play_leaves_resource_paused() {
        let (mut ctl, mut reg, probe) = setup(vec![plain_spot(1)]);
        probe.fail_on(PlaybackOp::Play, &asset_url(1));
        let rec = reg.find_mut(SpotId(1)).unwrap();
        let err = ctl.start(rec).unwrap_err();
        assert_eq!(err.spot, SpotId(1));
        assert_eq!(err.op, PlaybackOp::Play);
        assert!(!rec.playing());
        assert!(rec.resource().unwrap().is_connected());
    }

    #[test]
    fn release_pauses_and_disconnects() {
        let (mut ctl, mut reg, probe) = setup(vec![plain_spot(1)]);
        let rec = reg.find_mut(SpotId(1)).unwrap();
        ctl.start(rec).unwrap();
        probe.clear_calls();
        ctl.release(rec).unwrap();
        let h = rec.audio_handle().unwrap();
        assert_eq!(probe.calls(), vec![SinkCall::Pause(h), SinkCall::Disconnect(h)]);
        assert!(!probe.resource(h).unwrap().connected);
    }

    #[test]
    fn natural_end_while_active_is_mirrored() {
        let (mut ctl, mut reg, probe) = setup(vec![plain_spot(1)]);
        let rec = reg.find_mut(SpotId(1)).unwrap();
        ctl.start(rec).unwrap();
        let h = rec.audio_handle().unwrap();
        assert_eq!(probe.pending_watchers(h), 1);

        assert_eq!(probe.finish(h), 1);
        let PlaybackEvent::Ended { run, .. } = ctl.events().try_recv().unwrap();
        assert!(rec.resource.as_mut().unwrap().mark_ended(run));
        assert!(!rec.playing());
        assert!(!probe.resource(h).unwrap().playing);

        // The next start plays a fresh run from zero.
        probe.clear_calls();
        ctl.start(rec).unwrap();
        assert_eq!(
            probe.calls(),
            vec![SinkCall::Rewind(h), SinkCall::Play(h), SinkCall::OnEnded(h)]
        );
        assert!(rec.playing() && probe.resource(h).unwrap().playing);
    }

    #[test]
    fn looping_run_is_not_watched_until_finishing() {
        let (mut ctl, mut reg, probe) = setup(vec![looping_spot(1)]);
        let rec = reg.find_mut(SpotId(1)).unwrap();
        ctl.start(rec).unwrap();
        let h = rec.audio_handle().unwrap();
        assert_eq!(probe.pending_watchers(h), 0);
        assert!(!rec.resource().unwrap().is_watched());
    }

    #[test]
    fn rejected_loop_flag_still_plays_and_is_retried() {
        let (mut ctl, mut reg, probe) = setup(vec![looping_spot(1)]);
        probe.fail_on(PlaybackOp::ConfigureLoop, &asset_url(1));
        let rec = reg.find_mut(SpotId(1)).unwrap();
        let err = ctl.start(rec).unwrap_err();
        assert_eq!(err.op, PlaybackOp::ConfigureLoop);
        let h = rec.audio_handle().unwrap();
        assert!(rec.playing());
        assert!(probe.resource(h).unwrap().playing);
        assert!(!rec.resource().unwrap().is_looping());
        // Without auto-repeat the run can end, so it is observed.
        assert_eq!(probe.pending_watchers(h), 1);

        probe.clear_failures();
        ctl.stop(rec).unwrap();
        probe.clear_calls();
        ctl.start(rec).unwrap();
        assert_eq!(
            probe.calls(),
            vec![SinkCall::ConfigureLoop(h, true), SinkCall::Play(h)]
        );
        assert!(probe.resource(h).unwrap().looping);
        assert!(rec.resource().unwrap().is_looping());
        assert_eq!(probe.resource_count(), 1);
    }
}
