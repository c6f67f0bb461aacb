//! Test utilities and mock collaborators for Soundwalk development.
//!
//! Provides a recording [`MockSink`] implementing [`AudioSink`], scripted
//! catalog and surroundings providers, and spot fixtures in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossbeam_channel::{Receiver, Sender};
use soundwalk_core::{
    AudioHandle, AudioSink, CatalogProvider, EndedCallback, FetchError, PlaybackError,
    PlaybackOp, Position, SoundDescriptor, Spot, SpotId, SurroundingsProvider,
};

// ── MockSink ─────────────────────────────────────────────────────

/// One call received by a [`MockSink`], failed or not.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkCall {
    Create { url: String },
    Connect(AudioHandle),
    Disconnect(AudioHandle),
    Play(AudioHandle),
    Pause(AudioHandle),
    Rewind(AudioHandle),
    ConfigureLoop(AudioHandle, bool),
    OnEnded(AudioHandle),
}

impl SinkCall {
    pub fn op(&self) -> PlaybackOp {
        match self {
            Self::Create { .. } => PlaybackOp::Create,
            Self::Connect(_) => PlaybackOp::Connect,
            Self::Disconnect(_) => PlaybackOp::Disconnect,
            Self::Play(_) => PlaybackOp::Play,
            Self::Pause(_) => PlaybackOp::Pause,
            Self::Rewind(_) => PlaybackOp::Rewind,
            Self::ConfigureLoop(..) => PlaybackOp::ConfigureLoop,
            Self::OnEnded(_) => PlaybackOp::WatchEnded,
        }
    }

    pub fn handle(&self) -> Option<AudioHandle> {
        match self {
            Self::Create { .. } => None,
            Self::Connect(h)
            | Self::Disconnect(h)
            | Self::Play(h)
            | Self::Pause(h)
            | Self::Rewind(h)
            | Self::ConfigureLoop(h, _)
            | Self::OnEnded(h) => Some(*h),
        }
    }
}

/// Simulated state of one resource inside a [`MockSink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockResource {
    pub url: String,
    pub connected: bool,
    pub playing: bool,
    pub at_start: bool,
    pub looping: bool,
}

#[derive(Default)]
struct SinkState {
    next_handle: u64,
    calls: Vec<SinkCall>,
    resources: HashMap<AudioHandle, MockResource>,
    watchers: HashMap<AudioHandle, Vec<EndedCallback>>,
    failures: HashSet<(PlaybackOp, String)>,
}

impl SinkState {
    fn url_of(&self, handle: AudioHandle) -> Result<String, PlaybackError> {
        self.resources
            .get(&handle)
            .map(|r| r.url.clone())
            .ok_or(PlaybackError::UnknownHandle { handle })
    }

    fn check(&self, op: PlaybackOp, url: &str) -> Result<(), PlaybackError> {
        if self.failures.contains(&(op, url.to_string())) {
            return Err(PlaybackError::Rejected {
                op,
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    /// Log `call`, then apply `f` to the resource unless a failure is injected.
    fn apply(
        &mut self,
        call: SinkCall,
        f: impl FnOnce(&mut MockResource),
    ) -> Result<(), PlaybackError> {
        let op = call.op();
        let handle = call.handle().ok_or(PlaybackError::Rejected {
            op,
            reason: "call without handle".to_string(),
        })?;
        self.calls.push(call);
        let url = self.url_of(handle)?;
        self.check(op, &url)?;
        if let Some(res) = self.resources.get_mut(&handle) {
            f(res);
        }
        Ok(())
    }
}

fn lock(state: &Mutex<SinkState>) -> MutexGuard<'_, SinkState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Recording [`AudioSink`] with simulated resource state.
///
/// Obtain a [`SinkProbe`] with [`probe`](MockSink::probe) before moving
/// the sink into the engine; the probe shares the sink's state.
pub struct MockSink {
    state: Arc<Mutex<SinkState>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SinkState {
                next_handle: 1,
                ..SinkState::default()
            })),
        }
    }

    pub fn probe(&self) -> SinkProbe {
        SinkProbe {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for MockSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for MockSink {
    fn create(&mut self, sound: &SoundDescriptor) -> Result<AudioHandle, PlaybackError> {
        let mut st = lock(&self.state);
        st.calls.push(SinkCall::Create {
            url: sound.asset_url.clone(),
        });
        st.check(PlaybackOp::Create, &sound.asset_url)?;
        let handle = AudioHandle(st.next_handle);
        st.next_handle += 1;
        st.resources.insert(
            handle,
            MockResource {
                url: sound.asset_url.clone(),
                connected: false,
                playing: false,
                at_start: true,
                looping: false,
            },
        );
        Ok(handle)
    }

    fn connect(&mut self, handle: AudioHandle) -> Result<(), PlaybackError> {
        lock(&self.state).apply(SinkCall::Connect(handle), |r| r.connected = true)
    }

    fn disconnect(&mut self, handle: AudioHandle) -> Result<(), PlaybackError> {
        lock(&self.state).apply(SinkCall::Disconnect(handle), |r| r.connected = false)
    }

    fn play(&mut self, handle: AudioHandle) -> Result<(), PlaybackError> {
        lock(&self.state).apply(SinkCall::Play(handle), |r| {
            r.playing = true;
            r.at_start = false;
        })
    }

    fn pause(&mut self, handle: AudioHandle) -> Result<(), PlaybackError> {
        lock(&self.state).apply(SinkCall::Pause(handle), |r| r.playing = false)
    }

    fn rewind(&mut self, handle: AudioHandle) -> Result<(), PlaybackError> {
        lock(&self.state).apply(SinkCall::Rewind(handle), |r| r.at_start = true)
    }

    fn configure_loop(
        &mut self,
        handle: AudioHandle,
        enabled: bool,
    ) -> Result<(), PlaybackError> {
        lock(&self.state).apply(SinkCall::ConfigureLoop(handle, enabled), |r| {
            r.looping = enabled
        })
    }

    fn on_ended(
        &mut self,
        handle: AudioHandle,
        callback: EndedCallback,
    ) -> Result<(), PlaybackError> {
        let mut st = lock(&self.state);
        st.apply(SinkCall::OnEnded(handle), |_| {})?;
        st.watchers.entry(handle).or_default().push(callback);
        Ok(())
    }
}

/// Inspection and fault-injection handle for a [`MockSink`].
#[derive(Clone)]
pub struct SinkProbe {
    state: Arc<Mutex<SinkState>>,
}

impl SinkProbe {
    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<SinkCall> {
        lock(&self.state).calls.clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.state).calls.len()
    }

    /// Calls that targeted `handle`.
    pub fn calls_for(&self, handle: AudioHandle) -> Vec<SinkCall> {
        lock(&self.state)
            .calls
            .iter()
            .filter(|c| c.handle() == Some(handle))
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        lock(&self.state).calls.clear();
    }

    /// Handle of the resource created for `url`.
    pub fn handle_for(&self, url: &str) -> Option<AudioHandle> {
        lock(&self.state)
            .resources
            .iter()
            .find(|(_, r)| r.url == url)
            .map(|(h, _)| *h)
    }

    pub fn resource(&self, handle: AudioHandle) -> Option<MockResource> {
        lock(&self.state).resources.get(&handle).cloned()
    }

    pub fn resource_count(&self) -> usize {
        lock(&self.state).resources.len()
    }

    /// Make every future `op` on the resource for `url` fail.
    pub fn fail_on(&self, op: PlaybackOp, url: &str) {
        lock(&self.state).failures.insert((op, url.to_string()));
    }

    pub fn clear_failures(&self) {
        lock(&self.state).failures.clear();
    }

    /// Number of completion observers waiting on `handle`.
    pub fn pending_watchers(&self, handle: AudioHandle) -> usize {
        lock(&self.state)
            .watchers
            .get(&handle)
            .map_or(0, Vec::len)
    }

    /// Simulate the natural end of the current run of `handle`.
    ///
    /// Stops the simulated resource and fires its pending observers
    /// outside the lock. Returns the number of observers fired.
    pub fn finish(&self, handle: AudioHandle) -> usize {
        let callbacks = {
            let mut st = lock(&self.state);
            if let Some(r) = st.resources.get_mut(&handle) {
                r.playing = false;
            }
            st.watchers.remove(&handle).unwrap_or_default()
        };
        let fired = callbacks.len();
        for cb in callbacks {
            cb();
        }
        fired
    }
}

// ── Providers ────────────────────────────────────────────────────

/// [`CatalogProvider`] returning a fixed spot list, or a fixed error.
pub struct StaticCatalog {
    result: Result<Vec<Spot>, FetchError>,
    pub fetches: usize,
}

impl StaticCatalog {
    pub fn new(spots: Vec<Spot>) -> Self {
        Self {
            result: Ok(spots),
            fetches: 0,
        }
    }

    pub fn failing(error: FetchError) -> Self {
        Self {
            result: Err(error),
            fetches: 0,
        }
    }
}

impl CatalogProvider for StaticCatalog {
    fn fetch_catalog(&mut self) -> Result<Vec<Spot>, FetchError> {
        self.fetches += 1;
        self.result.clone()
    }
}

#[derive(Default)]
struct ScriptState {
    responses: VecDeque<Result<Vec<SpotId>, FetchError>>,
    fallback: Vec<SpotId>,
    requests: Vec<Position>,
}

/// [`SurroundingsProvider`] answering from a queue of scripted responses.
///
/// Once the queue is empty, every request is answered with the
/// fallback set (initially empty). Cloning shares the script, so a test
/// can keep one clone for scripting and inspection.
#[derive(Clone, Default)]
pub struct ScriptedSurroundings {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedSurroundings {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a successful response.
    pub fn push(&self, ids: impl IntoIterator<Item = u64>) {
        self.state()
            .responses
            .push_back(Ok(ids.into_iter().map(SpotId).collect()));
    }

    /// Queue a failed response.
    pub fn push_err(&self, error: FetchError) {
        self.state().responses.push_back(Err(error));
    }

    /// Answer used once the queue is exhausted.
    pub fn set_fallback(&self, ids: impl IntoIterator<Item = u64>) {
        self.state().fallback = ids.into_iter().map(SpotId).collect();
    }

    /// Positions requested so far.
    pub fn requests(&self) -> Vec<Position> {
        self.state().requests.clone()
    }
}

impl SurroundingsProvider for ScriptedSurroundings {
    fn fetch_surroundings(&mut self, position: Position) -> Result<Vec<SpotId>, FetchError> {
        let mut st = self.state();
        st.requests.push(position);
        match st.responses.pop_front() {
            Some(r) => r,
            None => Ok(st.fallback.clone()),
        }
    }
}

/// [`SurroundingsProvider`] that blocks every fetch until released.
///
/// Each fetch first announces its position on the `started` channel,
/// then waits for one message on the gate before delegating to the
/// wrapped script. Lets tests hold a cycle in flight.
pub struct GatedSurroundings {
    inner: ScriptedSurroundings,
    started: Sender<Position>,
    gate: Receiver<()>,
}

/// Test-side ends of a [`GatedSurroundings`].
pub struct Gate {
    pub started: Receiver<Position>,
    pub release: Sender<()>,
}

impl GatedSurroundings {
    pub fn new(inner: ScriptedSurroundings) -> (Self, Gate) {
        let (started_tx, started_rx) = crossbeam_channel::unbounded();
        let (release_tx, release_rx) = crossbeam_channel::unbounded();
        (
            Self {
                inner,
                started: started_tx,
                gate: release_rx,
            },
            Gate {
                started: started_rx,
                release: release_tx,
            },
        )
    }
}

impl SurroundingsProvider for GatedSurroundings {
    fn fetch_surroundings(&mut self, position: Position) -> Result<Vec<SpotId>, FetchError> {
        let _ = self.started.send(position);
        if self.gate.recv().is_err() {
            return Err(FetchError::Transport {
                reason: "gate dropped".to_string(),
            });
        }
        self.inner.fetch_surroundings(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_sink_tracks_state_and_calls() {
        let mut sink = MockSink::new();
        let probe = sink.probe();
        let h = sink.create(&SoundDescriptor::new("u")).unwrap();
        sink.connect(h).unwrap();
        sink.play(h).unwrap();
        let res = probe.resource(h).unwrap();
        assert!(res.connected && res.playing && !res.at_start);
        sink.pause(h).unwrap();
        sink.rewind(h).unwrap();
        let res = probe.resource(h).unwrap();
        assert!(!res.playing && res.at_start);
        assert_eq!(probe.call_count(), 5);
        assert_eq!(probe.handle_for("u"), Some(h));
    }

    #[test]
    fn injected_failure_is_logged_and_returned() {
        let mut sink = MockSink::new();
        let probe = sink.probe();
        let h = sink.create(&SoundDescriptor::new("u")).unwrap();
        probe.fail_on(PlaybackOp::Play, "u");
        assert!(matches!(
            sink.play(h),
            Err(PlaybackError::Rejected {
                op: PlaybackOp::Play,
                ..
            })
        ));
        assert!(!probe.resource(h).unwrap().playing);
        assert_eq!(probe.calls().last(), Some(&SinkCall::Play(h)));
    }

    #[test]
    fn finish_fires_watchers_once() {
        let mut sink = MockSink::new();
        let probe = sink.probe();
        let h = sink.create(&SoundDescriptor::new("u")).unwrap();
        let (tx, rx) = crossbeam_channel::unbounded();
        sink.on_ended(h, Box::new(move || tx.send(()).unwrap()))
            .unwrap();
        assert_eq!(probe.pending_watchers(h), 1);
        assert_eq!(probe.finish(h), 1);
        assert_eq!(probe.finish(h), 0);
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn scripted_surroundings_falls_back() {
        let mut s = ScriptedSurroundings::new();
        s.push([1, 2]);
        s.push_err(FetchError::Status { code: 500 });
        s.set_fallback([7]);
        let p = Position::new(0.0, 0.0);
        assert_eq!(s.fetch_surroundings(p).unwrap(), vec![SpotId(1), SpotId(2)]);
        assert!(s.fetch_surroundings(p).is_err());
        assert_eq!(s.fetch_surroundings(p).unwrap(), vec![SpotId(7)]);
        assert_eq!(s.requests().len(), 3);
    }
}
