//! Soundwalk: geofenced spot audio for location-based walks.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Soundwalk sub-crates. For most users, adding `soundwalk` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use soundwalk::prelude::*;
//! use soundwalk_test_utils::fixtures::{one_shot_spot, plain_spot};
//! use soundwalk_test_utils::{MockSink, ScriptedSurroundings, StaticCatalog};
//!
//! let mut catalog = StaticCatalog::new(vec![plain_spot(1), one_shot_spot(2)]);
//! let surroundings = ScriptedSurroundings::new();
//! surroundings.push([1, 2]);
//! surroundings.push([1]);
//!
//! let mut session = LockstepSession::start(
//!     &mut catalog,
//!     Box::new(surroundings),
//!     Box::new(MockSink::new()),
//!     SessionConfig::default(),
//! )
//! .unwrap();
//!
//! let entered = session
//!     .update_position(LocationSample::new(52.52, 13.405, 5.0))
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(entered.entered, vec![SpotId(1), SpotId(2)]);
//!
//! // Leaving the one-shot zone lets its sound finish.
//! let left = session
//!     .update_position(LocationSample::new(52.53, 13.405, 5.0))
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(left.left, vec![SpotId(2)]);
//! assert!(session.registry().find(SpotId(2)).unwrap().playing());
//!
//! let metrics = session.end();
//! assert_eq!(metrics.cycles, 2);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `soundwalk-core` | IDs, spots, positions, snapshots, collaborator traits |
//! | [`catalog`] | `soundwalk-catalog` | Backend endpoints and JSON decoding |
//! | [`engine`] | `soundwalk-engine` | Registry, policy, reconciler, lockstep and realtime sessions |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`soundwalk-core`).
///
/// Contains the spot model, positions, surroundings snapshots, error
/// types, and the collaborator traits ([`types::AudioSink`],
/// [`types::CatalogProvider`], [`types::SurroundingsProvider`]).
pub use soundwalk_core as types;

/// Backend endpoints and response decoding (`soundwalk-catalog`).
///
/// [`catalog::ApiConfig`] builds endpoint URLs;
/// [`catalog::decode_catalog`] and [`catalog::decode_surroundings`] turn
/// response bodies into core types.
pub use soundwalk_catalog as catalog;

/// Reconciliation and playback engine (`soundwalk-engine`).
///
/// [`engine::LockstepSession`] for caller-driven updates,
/// [`engine::RealtimeSession`] for a background reconcile thread.
pub use soundwalk_engine as engine;

/// Common imports for typical Soundwalk usage.
///
/// ```rust
/// use soundwalk::prelude::*;
/// ```
///
/// This imports the most frequently used types: session drivers and
/// configuration, the spot model, collaborator traits, and errors.
pub mod prelude {
    // Core types and traits
    pub use soundwalk_core::{
        AudioHandle, AudioSink, CatalogProvider, EndedCallback, LocationSample, Position,
        SoundDescriptor, Spot, SpotId, SurroundingsProvider, SurroundingsSnapshot, ZonePolicy,
    };

    // Errors
    pub use soundwalk_core::{FetchError, PlaybackError, PlaybackOp};

    // Catalog
    pub use soundwalk_catalog::{ApiConfig, CatalogError};

    // Engine
    pub use soundwalk_engine::{
        CycleReport, LockstepSession, RealtimeSession, ReconcileOutcome, SessionConfig,
        SessionError, SessionMetrics, SpotFailure, SpotStatus, SubmitError,
    };
}
