//! Static spot definitions as delivered by the catalog.
//!
//! A [`Spot`] is immutable after catalog load. Mutable per-session state
//! (active flag, bound audio resource) lives in the engine's registry,
//! never here.

use std::time::Duration;

use crate::id::SpotId;
use crate::position::Position;

/// Playback policy flags attached to a spot's zone.
///
/// The flags are independent: a zone may be both one-shot and
/// global-stop. `looping` is a resource configuration flag applied once
/// at resource creation, not a transition behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ZonePolicy {
    /// Entering this zone silences every other playing spot first.
    pub global_stop: bool,
    /// Leaving this zone lets the current run finish instead of cutting it off.
    pub one_shot: bool,
    /// The sound repeats until explicitly stopped.
    pub looping: bool,
}

impl ZonePolicy {
    /// A plain zone: no flags set.
    pub const PLAIN: ZonePolicy = ZonePolicy {
        global_stop: false,
        one_shot: false,
        looping: false,
    };
}

/// Reference to the playable asset of a spot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoundDescriptor {
    /// Absolute URL of the audio asset.
    pub asset_url: String,
    /// Nominal duration, if the catalog reports one.
    pub duration: Option<Duration>,
}

impl SoundDescriptor {
    /// Create a descriptor with no known duration.
    pub fn new(asset_url: impl Into<String>) -> Self {
        Self {
            asset_url: asset_url.into(),
            duration: None,
        }
    }
}

/// Circular geofence of a spot.
///
/// Owned by the map collaborator; the engine carries it through but
/// never reads it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotGeometry {
    /// Center of the circle.
    pub center: Position,
    /// Radius in meters.
    pub radius_m: f64,
}

/// A geofenced point of interest with an optional sound and a zone policy.
#[derive(Clone, Debug, PartialEq)]
pub struct Spot {
    /// Unique identifier within the catalog.
    pub id: SpotId,
    /// Zone playback policy.
    pub zone: ZonePolicy,
    /// Playable asset. `None` means the spot toggles silently.
    pub sound: Option<SoundDescriptor>,
    /// Geofence, if the catalog provided one.
    pub geometry: Option<SpotGeometry>,
}

impl Spot {
    /// Create a spot without sound or geometry.
    pub fn new(id: impl Into<SpotId>, zone: ZonePolicy) -> Self {
        Self {
            id: id.into(),
            zone,
            sound: None,
            geometry: None,
        }
    }

    /// Attach a sound descriptor.
    pub fn with_sound(mut self, sound: SoundDescriptor) -> Self {
        self.sound = Some(sound);
        self
    }

    /// Attach a geofence.
    pub fn with_geometry(mut self, geometry: SpotGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Whether the spot has a playable asset.
    pub fn has_sound(&self) -> bool {
        self.sound.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_sound_and_geometry() {
        let spot = Spot::new(1, ZonePolicy::PLAIN)
            .with_sound(SoundDescriptor::new("https://host/a.mp3"))
            .with_geometry(SpotGeometry {
                center: Position::new(1.0, 2.0),
                radius_m: 25.0,
            });
        assert!(spot.has_sound());
        assert_eq!(spot.id, SpotId(1));
        assert_eq!(spot.geometry.map(|g| g.radius_m), Some(25.0));
    }

    #[test]
    fn default_policy_is_plain() {
        assert_eq!(ZonePolicy::default(), ZonePolicy::PLAIN);
        assert!(!Spot::new(2, ZonePolicy::default()).has_sound());
    }
}
