//! JSON shapes of the backend responses and their conversion to core types.

use std::time::Duration;

use serde::Deserialize;
use soundwalk_core::{Position, SoundDescriptor, Spot, SpotGeometry, SpotId, ZonePolicy};

use crate::api::ApiConfig;
use crate::error::CatalogError;

#[derive(Debug, Deserialize)]
struct WireLocation {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct WireVariant {
    path: String,
    /// Seconds.
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WireSound {
    #[serde(default)]
    variants: Vec<WireVariant>,
}

#[derive(Debug, Deserialize)]
struct WireSpot {
    id: u64,
    #[serde(default)]
    location: Option<WireLocation>,
    #[serde(default)]
    radius: Option<f64>,
    #[serde(default)]
    sound: Option<WireSound>,
    #[serde(default, alias = "globalStop")]
    global_stop: bool,
    #[serde(default, alias = "oneShot")]
    one_shot: bool,
    #[serde(default, rename = "loop")]
    looping: bool,
}

/// Only the id matters; the backend also echoes location and radius.
#[derive(Debug, Deserialize)]
struct WireSurrounding {
    id: u64,
}

impl WireSpot {
    fn into_spot(self, api: &ApiConfig) -> Spot {
        let id = SpotId(self.id);
        let geometry = match (self.location, self.radius) {
            (Some(loc), Some(radius_m)) => Some(SpotGeometry {
                center: Position::new(loc.latitude, loc.longitude),
                radius_m,
            }),
            _ => None,
        };
        // The first variant is the canonical encoding.
        let sound = self
            .sound
            .and_then(|s| s.variants.into_iter().next())
            .map(|variant| SoundDescriptor {
                asset_url: api.asset_url(&variant.path),
                duration: variant.duration.and_then(|secs| {
                    let d = Duration::try_from_secs_f64(secs).ok();
                    if d.is_none() {
                        tracing::warn!(spot = %id, secs, "Ignoring invalid sound duration");
                    }
                    d
                }),
            });
        Spot {
            id,
            zone: ZonePolicy {
                global_stop: self.global_stop,
                one_shot: self.one_shot,
                looping: self.looping,
            },
            sound,
            geometry,
        }
    }
}

/// Decode the body of the spots endpoint.
///
/// Asset paths are resolved against `api`. A sound object with no
/// variants is treated as no sound. Duplicate ids are passed through;
/// the engine's registry rejects them.
pub fn decode_catalog(json: &str, api: &ApiConfig) -> Result<Vec<Spot>, CatalogError> {
    let wire: Vec<WireSpot> = serde_json::from_str(json)?;
    let spots: Vec<Spot> = wire.into_iter().map(|w| w.into_spot(api)).collect();
    tracing::debug!(
        count = spots.len(),
        with_sound = spots.iter().filter(|s| s.has_sound()).count(),
        "Decoded spot catalog"
    );
    Ok(spots)
}

/// Decode the body of the surroundings endpoint into spot ids.
pub fn decode_surroundings(json: &str) -> Result<Vec<SpotId>, CatalogError> {
    let wire: Vec<WireSurrounding> = serde_json::from_str(json)?;
    Ok(wire.into_iter().map(|w| SpotId(w.id)).collect())
}
