//! Reusable spot fixtures.
//!
//! Spot ids map to predictable asset URLs via [`asset_url`], so tests
//! can look up the mock resource of a spot with
//! [`SinkProbe::handle_for`](crate::SinkProbe::handle_for).

use soundwalk_core::{LocationSample, SoundDescriptor, Spot, ZonePolicy};

/// Asset URL used for the sound of spot `id`.
pub fn asset_url(id: u64) -> String {
    format!("https://assets.test/spots/{id}.mp3")
}

/// A spot without sound.
pub fn silent_spot(id: u64) -> Spot {
    Spot::new(id, ZonePolicy::PLAIN)
}

/// A plain spot with sound.
pub fn plain_spot(id: u64) -> Spot {
    sound_spot(id, ZonePolicy::PLAIN)
}

/// A spot with sound and the given policy.
pub fn sound_spot(id: u64, zone: ZonePolicy) -> Spot {
    Spot::new(id, zone).with_sound(SoundDescriptor::new(asset_url(id)))
}

/// A one-shot spot with sound.
pub fn one_shot_spot(id: u64) -> Spot {
    sound_spot(
        id,
        ZonePolicy {
            one_shot: true,
            ..ZonePolicy::PLAIN
        },
    )
}

/// A looping spot with sound.
pub fn looping_spot(id: u64) -> Spot {
    sound_spot(
        id,
        ZonePolicy {
            looping: true,
            ..ZonePolicy::PLAIN
        },
    )
}

/// A global-stop spot, with or without sound.
pub fn global_stop_spot(id: u64, with_sound: bool) -> Spot {
    let zone = ZonePolicy {
        global_stop: true,
        ..ZonePolicy::PLAIN
    };
    if with_sound {
        sound_spot(id, zone)
    } else {
        Spot::new(id, zone)
    }
}

/// The `n`-th sample of a walk heading north-east in 10 m steps.
pub fn walk_sample(n: u32) -> LocationSample {
    let step = 0.0001 * f64::from(n);
    LocationSample::new(52.52 + step, 13.405 + step, 5.0)
}
