//! Surroundings reconciliation and zone playback engine.
//!
//! Given a stream of surroundings snapshots (the spots whose geofence
//! contains the user), the engine computes entered/left transitions,
//! applies each zone's playback policy, and drives an [`AudioSink`].
//! Supports both lockstep (caller-driven) and realtime (worker thread)
//! modes.
//!
//! [`AudioSink`]: soundwalk_core::AudioSink

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod lockstep;
pub mod metrics;
pub mod playback;
pub mod policy;
pub mod realtime;
pub mod reconcile;
pub mod registry;
mod worker;

pub use config::{ConfigError, SessionConfig};
pub use lockstep::{LockstepSession, SessionError};
pub use metrics::SessionMetrics;
pub use playback::{AudioResource, PlaybackController, PlaybackEvent, SpotFailure};
pub use policy::{Directive, Directives, ResourceConfig, Transition};
pub use realtime::{CycleReport, RealtimeSession, ShutdownReport, SubmitError};
pub use reconcile::{ReconcileOutcome, Reconciler};
pub use registry::{RegistryError, SpotRecord, SpotRegistry, SpotStatus};
