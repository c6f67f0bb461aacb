//! Spot registry: one mutable runtime record per catalog spot.
//!
//! [`SpotRegistry`] is built once from the catalog and never gains or
//! loses entries afterwards. Only field-level mutation of existing
//! records happens, and only through the [`Reconciler`] and the
//! [`PlaybackController`] it drives; the mutators are crate-private so
//! rendering code can read `active`/`playing` but never write them.
//!
//! [`Reconciler`]: crate::reconcile::Reconciler
//! [`PlaybackController`]: crate::playback::PlaybackController

use std::error::Error;
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use soundwalk_core::{AudioHandle, Spot, SpotId, ZonePolicy};

use crate::playback::AudioResource;

// ── RegistryError ─────────────────────────────────────────────────

/// Errors detected while building a [`SpotRegistry`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// Two catalog entries share an id.
    DuplicateSpot {
        /// The repeated id.
        id: SpotId,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateSpot { id } => write!(f, "duplicate spot id {id} in catalog"),
        }
    }
}

impl Error for RegistryError {}

// ── SpotRecord ────────────────────────────────────────────────────

/// Read-only view of a record for rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpotStatus {
    /// The spot.
    pub id: SpotId,
    /// Member of the most recently reconciled snapshot.
    pub active: bool,
    /// Audio is bound and not paused.
    pub playing: bool,
}

/// Mutable runtime state of one spot.
#[derive(Debug)]
pub struct SpotRecord {
    spot: Spot,
    can_play: bool,
    pub(crate) active: bool,
    pub(crate) resource: Option<AudioResource>,
}

impl SpotRecord {
    fn new(spot: Spot) -> Self {
        let can_play = spot.has_sound();
        Self {
            spot,
            can_play,
            active: false,
            resource: None,
        }
    }

    /// The spot's id.
    pub fn id(&self) -> SpotId {
        self.spot.id
    }

    /// The static catalog entry.
    pub fn spot(&self) -> &Spot {
        &self.spot
    }

    /// The zone policy of the spot.
    pub fn zone(&self) -> ZonePolicy {
        self.spot.zone
    }

    /// Whether the spot is part of the current surroundings.
    ///
    /// Reflects geofence membership, not playback success.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the spot has a playable sound. Fixed at creation.
    pub fn can_play(&self) -> bool {
        self.can_play
    }

    /// Whether a resource is bound and currently not paused.
    ///
    /// May stay `true` after `active` turns `false` while a one-shot
    /// sound finishes its run.
    pub fn playing(&self) -> bool {
        self.resource.as_ref().is_some_and(AudioResource::is_playing)
    }

    /// The bound resource, if one has been created.
    pub fn resource(&self) -> Option<&AudioResource> {
        self.resource.as_ref()
    }

    /// Handle of the bound resource, if one has been created.
    pub fn audio_handle(&self) -> Option<AudioHandle> {
        self.resource.as_ref().map(AudioResource::handle)
    }

    /// Snapshot of the rendering-relevant flags.
    pub fn status(&self) -> SpotStatus {
        SpotStatus {
            id: self.id(),
            active: self.active,
            playing: self.playing(),
        }
    }
}

// ── SpotRegistry ──────────────────────────────────────────────────

/// In-memory collection of [`SpotRecord`]s keyed by id.
///
/// Iteration follows catalog order.
#[derive(Debug, Default)]
pub struct SpotRegistry {
    records: IndexMap<SpotId, SpotRecord>,
}

impl SpotRegistry {
    /// Build one inactive record per catalog spot.
    ///
    /// Fails on the first duplicated id.
    pub fn build(catalog: impl IntoIterator<Item = Spot>) -> Result<Self, RegistryError> {
        let mut records = IndexMap::new();
        for spot in catalog {
            let id = spot.id;
            if records.insert(id, SpotRecord::new(spot)).is_some() {
                return Err(RegistryError::DuplicateSpot { id });
            }
        }
        Ok(Self { records })
    }

    /// Look up a record by id.
    pub fn find(&self, id: SpotId) -> Option<&SpotRecord> {
        self.records.get(&id)
    }

    pub(crate) fn find_mut(&mut self, id: SpotId) -> Option<&mut SpotRecord> {
        self.records.get_mut(&id)
    }

    /// Ids of all records with `active == true`, in catalog order.
    pub fn active_ids(&self) -> IndexSet<SpotId> {
        self.records
            .values()
            .filter(|r| r.active)
            .map(SpotRecord::id)
            .collect()
    }

    /// Records whose audio is currently playing.
    pub fn playing_records(&self) -> impl Iterator<Item = &SpotRecord> {
        self.records.values().filter(|r| r.playing())
    }

    /// All records in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &SpotRecord> {
        self.records.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut SpotRecord> {
        self.records.values_mut()
    }

    /// Rendering view of every record, in catalog order.
    pub fn statuses(&self) -> Vec<SpotStatus> {
        self.records.values().map(SpotRecord::status).collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the catalog was empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
