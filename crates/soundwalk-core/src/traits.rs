//! Collaborator traits: audio output and the two backend providers.
//!
//! The engine depends only on these abstractions. Concrete
//! implementations (a browser audio context, an HTTP client, a native
//! mixer) live outside the workspace.

use crate::error::{FetchError, PlaybackError};
use crate::id::{AudioHandle, SpotId};
use crate::position::Position;
use crate::spot::{SoundDescriptor, Spot};

/// One-time observer invoked when a resource finishes its current run.
pub type EndedCallback = Box<dyn FnOnce() + Send + 'static>;

/// Audio output capable of playing per-spot resources.
///
/// Operations are fire-and-forget: they return as soon as the sink has
/// accepted (or refused) the request. Implementations must be `Send`
/// so a session can be moved onto a worker thread.
pub trait AudioSink: Send {
    /// Bind a sound descriptor to a new playable resource.
    ///
    /// Called at most once per spot for the lifetime of a session.
    /// The returned resource starts paused at position zero and is not
    /// yet routed to the output.
    fn create(&mut self, sound: &SoundDescriptor) -> Result<AudioHandle, PlaybackError>;

    /// Route the resource to the output destination.
    fn connect(&mut self, handle: AudioHandle) -> Result<(), PlaybackError>;

    /// Detach the resource from the output destination.
    fn disconnect(&mut self, handle: AudioHandle) -> Result<(), PlaybackError>;

    /// Start or resume playback from the current position.
    fn play(&mut self, handle: AudioHandle) -> Result<(), PlaybackError>;

    /// Pause playback, keeping the current position.
    fn pause(&mut self, handle: AudioHandle) -> Result<(), PlaybackError>;

    /// Seek to position zero.
    fn rewind(&mut self, handle: AudioHandle) -> Result<(), PlaybackError>;

    /// Enable or disable auto-repeat.
    fn configure_loop(&mut self, handle: AudioHandle, enabled: bool)
        -> Result<(), PlaybackError>;

    /// Register a one-time observer for the end of the current run.
    ///
    /// The callback fires at most once, from whatever thread the sink
    /// uses for its events. It must not be invoked synchronously from
    /// inside this call.
    fn on_ended(&mut self, handle: AudioHandle, callback: EndedCallback)
        -> Result<(), PlaybackError>;
}

/// Source of the static spot catalog, fetched once per session.
pub trait CatalogProvider {
    /// Fetch every spot of the current progression.
    fn fetch_catalog(&mut self) -> Result<Vec<Spot>, FetchError>;
}

/// Source of surroundings snapshots, one call per reconciliation cycle.
///
/// This is the only suspension point of a cycle: the call may block on
/// I/O. Implementations must be `Send` for the realtime driver.
pub trait SurroundingsProvider: Send {
    /// Ids of the spots whose geofence contains `position`.
    fn fetch_surroundings(&mut self, position: Position) -> Result<Vec<SpotId>, FetchError>;
}
