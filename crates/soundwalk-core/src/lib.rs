//! Core types and traits for the Soundwalk playback engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the Soundwalk workspace:
//! spot identifiers, the static spot model, surroundings snapshots,
//! error types, and the collaborator traits (audio sink, catalog and
//! surroundings providers).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod position;
pub mod spot;
pub mod surroundings;
pub mod traits;

pub use error::{FetchError, PlaybackError, PlaybackOp};
pub use id::{AudioHandle, SpotId};
pub use position::{LocationSample, Position};
pub use spot::{SoundDescriptor, Spot, SpotGeometry, ZonePolicy};
pub use surroundings::SurroundingsSnapshot;
pub use traits::{AudioSink, CatalogProvider, EndedCallback, SurroundingsProvider};
