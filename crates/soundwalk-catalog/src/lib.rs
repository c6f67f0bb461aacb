//! Backend wire format decoding for Soundwalk.
//!
//! The Soundwalk backend scopes everything under a *progression* (one
//! walk). Two endpoints matter to the engine:
//!
//! - `GET {base}/progressions/{id}/spots` returns the spot catalog.
//! - `GET {base}/progressions/{id}/surroundings?latitude=..&longitude=..`
//!   returns the spots whose geofence contains the given position.
//!
//! This crate builds those URLs ([`ApiConfig`]) and decodes the JSON
//! bodies into core types ([`decode_catalog`], [`decode_surroundings`]).
//! The HTTP transport itself is left to the embedding application.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod api;
pub mod error;
mod wire;

pub use api::ApiConfig;
pub use error::CatalogError;
pub use wire::{decode_catalog, decode_surroundings};
