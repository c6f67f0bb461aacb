//! Property tests for reconciliation over arbitrary catalogs and walks.
//!
//! Each case builds a random catalog (any mix of zone flags, with or
//! without sound), then feeds a random sequence of snapshots that may
//! include ids unknown to the catalog.

use std::collections::BTreeSet;

use proptest::prelude::*;
use soundwalk_core::{AudioHandle, SoundDescriptor, Spot, SpotId, SurroundingsSnapshot, ZonePolicy};
use soundwalk_engine::{Reconciler, SpotRegistry};
use soundwalk_test_utils::fixtures::asset_url;
use soundwalk_test_utils::{MockSink, SinkProbe};

/// Ids `0..CATALOG_MAX` may be in the catalog; snapshots draw from a
/// wider range so unknown ids show up regularly.
const CATALOG_MAX: u64 = 8;
const SNAPSHOT_RANGE: u64 = 11;

#[derive(Clone, Copy, Debug)]
struct SpotFlags {
    sound: bool,
    global_stop: bool,
    one_shot: bool,
    looping: bool,
}

fn arb_flags() -> impl Strategy<Value = SpotFlags> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(sound, global_stop, one_shot, looping)| SpotFlags {
            sound,
            global_stop,
            one_shot,
            looping,
        },
    )
}

fn arb_catalog() -> impl Strategy<Value = Vec<SpotFlags>> {
    prop::collection::vec(arb_flags(), 1..CATALOG_MAX as usize)
}

fn arb_walk() -> impl Strategy<Value = Vec<Vec<u64>>> {
    prop::collection::vec(prop::collection::vec(0..SNAPSHOT_RANGE, 0..6), 1..10)
}

/// Per step: optionally pick the n-th playing, non-repeating resource
/// and let its run end on its own.
fn arb_finishes() -> impl Strategy<Value = Vec<Option<usize>>> {
    prop::collection::vec(prop::option::of(0..CATALOG_MAX as usize), 10)
}

fn build(catalog: &[SpotFlags]) -> (Reconciler, SinkProbe) {
    let spots = catalog.iter().enumerate().map(|(i, f)| {
        let id = i as u64;
        let spot = Spot::new(
            id,
            ZonePolicy {
                global_stop: f.global_stop,
                one_shot: f.one_shot,
                looping: f.looping,
            },
        );
        if f.sound {
            spot.with_sound(SoundDescriptor::new(asset_url(id)))
        } else {
            spot
        }
    });
    let sink = MockSink::new();
    let probe = sink.probe();
    let registry = SpotRegistry::build(spots).unwrap();
    (Reconciler::new(registry, Box::new(sink)), probe)
}

fn snapshot(ids: &[u64]) -> SurroundingsSnapshot {
    ids.iter().copied().map(SpotId).collect()
}

fn active_set(r: &Reconciler) -> BTreeSet<SpotId> {
    r.registry().active_ids().into_iter().collect()
}

proptest! {
    #[test]
    fn entered_and_left_partition_the_difference(
        catalog in arb_catalog(),
        walk in arb_walk(),
    ) {
        let (mut r, _probe) = build(&catalog);
        let known: BTreeSet<SpotId> = (0..catalog.len() as u64).map(SpotId).collect();

        for ids in &walk {
            let before = active_set(&r);
            let snap = snapshot(ids);
            let target: BTreeSet<SpotId> = snap.iter().filter(|id| known.contains(id)).collect();
            let unknown: BTreeSet<SpotId> = snap.iter().filter(|id| !known.contains(id)).collect();

            let outcome = r.reconcile(&snap);
            let entered: BTreeSet<SpotId> = outcome.entered.iter().copied().collect();
            let left: BTreeSet<SpotId> = outcome.left.iter().copied().collect();
            let ignored: BTreeSet<SpotId> = outcome.ignored.iter().copied().collect();

            let expected_entered: BTreeSet<SpotId> = target.difference(&before).copied().collect();
            let expected_left: BTreeSet<SpotId> = before.difference(&target).copied().collect();
            prop_assert_eq!(&entered, &expected_entered);
            prop_assert_eq!(&left, &expected_left);
            prop_assert!(entered.is_disjoint(&left));
            prop_assert_eq!(&ignored, &unknown);
            prop_assert_eq!(active_set(&r), target);
        }
    }

    #[test]
    fn repeating_a_snapshot_changes_nothing(
        catalog in arb_catalog(),
        walk in arb_walk(),
    ) {
        let (mut r, probe) = build(&catalog);
        for ids in &walk {
            let snap = snapshot(ids);
            r.reconcile(&snap);
            let statuses = r.registry().statuses();
            probe.clear_calls();

            let again = r.reconcile(&snap);
            prop_assert!(again.is_unchanged());
            prop_assert!(again.silenced.is_empty());
            prop_assert!(!again.global_stop());
            prop_assert_eq!(probe.call_count(), 0);
            prop_assert_eq!(r.registry().statuses(), statuses);
        }
    }

    #[test]
    fn playback_state_follows_zone_policy(
        catalog in arb_catalog(),
        walk in arb_walk(),
    ) {
        let (mut r, _probe) = build(&catalog);
        for ids in &walk {
            let outcome = r.reconcile(&snapshot(ids));
            let stop_entered = outcome
                .entered
                .iter()
                .any(|id| catalog[id.0 as usize].global_stop);

            for record in r.registry().iter() {
                let flags = catalog[record.id().0 as usize];
                // Spots without sound never play.
                if !flags.sound {
                    prop_assert!(!record.playing());
                    prop_assert!(record.audio_handle().is_none());
                }
                // Only one-shot sounds may keep playing outside their zone.
                if record.playing() && !record.is_active() {
                    prop_assert!(flags.one_shot);
                }
                // After a global stop, only this cycle's entries may sound.
                if stop_entered && record.playing() {
                    prop_assert!(outcome.entered.contains(&record.id()));
                }
            }
            // Every entered spot with sound is playing.
            for id in &outcome.entered {
                let flags = catalog[id.0 as usize];
                if flags.sound {
                    prop_assert!(r.registry().find(*id).unwrap().playing());
                }
            }
        }
    }

    #[test]
    fn playing_mirrors_the_sink_when_runs_end(
        catalog in arb_catalog(),
        walk in arb_walk(),
        finishes in arb_finishes(),
    ) {
        let (mut r, probe) = build(&catalog);
        for (ids, finish) in walk.iter().zip(finishes.iter().copied()) {
            r.reconcile(&snapshot(ids));

            if let Some(n) = finish {
                // A repeating resource never ends on its own.
                let candidates: Vec<AudioHandle> = r
                    .registry()
                    .playing_records()
                    .filter_map(|rec| rec.audio_handle())
                    .filter(|h| !probe.resource(*h).unwrap().looping)
                    .collect();
                if !candidates.is_empty() {
                    probe.finish(candidates[n % candidates.len()]);
                    r.pump_events();
                }
            }

            for record in r.registry().iter() {
                if let Some(h) = record.audio_handle() {
                    prop_assert_eq!(record.playing(), probe.resource(h).unwrap().playing);
                }
            }
        }
    }
}
