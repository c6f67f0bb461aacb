//! Benchmark profiles and utilities for the Soundwalk playback engine.
//!
//! Provides pre-built catalogs and walks for benchmarking:
//!
//! - [`reference_catalog`]: spots with a realistic mix of zone policies
//! - [`walk_snapshots`]: deterministic sequence of overlapping snapshots
//! - [`reference_session`]: a started [`LockstepSession`] over a mock sink

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use soundwalk_core::{SoundDescriptor, Spot, SpotId, SurroundingsSnapshot, ZonePolicy};
use soundwalk_engine::{LockstepSession, SessionConfig, SessionError};
use soundwalk_test_utils::{MockSink, ScriptedSurroundings, StaticCatalog};

/// Number of spots in the reference catalog.
pub const REFERENCE_SPOTS: u64 = 1_000;

/// Build a catalog of `spots` spots.
///
/// Per 20 spots: one global-stop zone without sound, three one-shot
/// sounds, two looping sounds, two silent info spots, and twelve plain
/// sounds.
pub fn reference_catalog(spots: u64) -> Vec<Spot> {
    (0..spots)
        .map(|id| {
            let (zone, sound) = match id % 20 {
                0 => (
                    ZonePolicy {
                        global_stop: true,
                        ..ZonePolicy::PLAIN
                    },
                    false,
                ),
                1..=3 => (
                    ZonePolicy {
                        one_shot: true,
                        ..ZonePolicy::PLAIN
                    },
                    true,
                ),
                4 | 5 => (
                    ZonePolicy {
                        looping: true,
                        ..ZonePolicy::PLAIN
                    },
                    true,
                ),
                6 | 7 => (ZonePolicy::PLAIN, false),
                _ => (ZonePolicy::PLAIN, true),
            };
            let spot = Spot::new(id, zone);
            if sound {
                spot.with_sound(SoundDescriptor::new(format!(
                    "https://assets.bench/spots/{id}.mp3"
                )))
            } else {
                spot
            }
        })
        .collect()
}

/// Generate `steps` snapshots of a walk across a catalog of `spots`.
///
/// Each snapshot is a window of `width` consecutive ids that slides by
/// two per step, so consecutive snapshots overlap and every step both
/// enters and leaves spots. One id in each snapshot is unknown to the
/// catalog.
pub fn walk_snapshots(spots: u64, steps: u64, width: u64) -> Vec<SurroundingsSnapshot> {
    let spots = spots.max(1);
    (0..steps)
        .map(|step| {
            let start = (step * 2) % spots;
            (start..start + width)
                .map(|id| SpotId(id % spots))
                .chain(std::iter::once(SpotId(spots + step)))
                .collect()
        })
        .collect()
}

/// Start a lockstep session over [`reference_catalog`].
///
/// Surroundings answer with an empty set; drive the session with
/// [`LockstepSession::reconcile`].
pub fn reference_session(spots: u64) -> Result<LockstepSession, SessionError> {
    LockstepSession::start(
        &mut StaticCatalog::new(reference_catalog(spots)),
        Box::new(ScriptedSurroundings::new()),
        Box::new(MockSink::new()),
        SessionConfig::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_mix_matches_description() {
        let spots = reference_catalog(40);
        assert_eq!(spots.len(), 40);
        assert_eq!(spots.iter().filter(|s| s.zone.global_stop).count(), 2);
        assert_eq!(spots.iter().filter(|s| s.zone.one_shot).count(), 6);
        assert_eq!(spots.iter().filter(|s| !s.has_sound()).count(), 6);
    }

    #[test]
    fn walk_windows_overlap_and_include_unknown_ids() {
        let walk = walk_snapshots(100, 5, 8);
        assert_eq!(walk.len(), 5);
        assert!(walk.iter().all(|s| s.len() == 9));
        assert!(walk[0].contains(SpotId(7)) && walk[1].contains(SpotId(7)));
        assert!(walk[0].contains(SpotId(100)));
    }

    #[test]
    fn reference_session_starts() {
        let session = reference_session(100).unwrap();
        assert_eq!(session.registry().len(), 100);
    }
}
