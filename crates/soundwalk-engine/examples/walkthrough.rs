//! Soundwalk walkthrough: a simulated stroll through three zones.
//!
//! Demonstrates:
//!   1. Decoding a backend catalog with `soundwalk-catalog`
//!   2. A surroundings provider that does its own geofencing
//!   3. An `AudioSink` that prints instead of playing
//!   4. Driving a `LockstepSession`, then the same walk on a
//!      `RealtimeSession` worker thread
//!
//! Run with:
//!   RUST_LOG=soundwalk_engine=debug cargo run --example walkthrough

use std::collections::HashMap;
use std::time::Duration;

use soundwalk_catalog::{decode_catalog, ApiConfig};
use soundwalk_core::{
    AudioHandle, AudioSink, CatalogProvider, EndedCallback, FetchError, LocationSample,
    PlaybackError, Position, SoundDescriptor, Spot, SpotId, SurroundingsProvider,
};
use soundwalk_engine::{LockstepSession, RealtimeSession, SessionConfig, SpotStatus};
use tracing_subscriber::EnvFilter;

// ─── Backend data ───────────────────────────────────────────────

const BASE_URL: &str = "https://walk.example.org";

const CATALOG: &str = r#"[
    { "id": 1, "location": { "latitude": 52.5200, "longitude": 13.4050 }, "radius": 40,
      "sound": { "variants": [{ "path": "/audio/birdsong.mp3" }] }, "loop": true },
    { "id": 2, "location": { "latitude": 52.5204, "longitude": 13.4054 }, "radius": 30,
      "sound": { "variants": [{ "path": "/audio/story.mp3", "duration": 45 }] },
      "one_shot": true },
    { "id": 3, "location": { "latitude": 52.5210, "longitude": 13.4060 }, "radius": 25,
      "global_stop": true }
]"#;

struct EmbeddedCatalog;

impl CatalogProvider for EmbeddedCatalog {
    fn fetch_catalog(&mut self) -> Result<Vec<Spot>, FetchError> {
        Ok(decode_catalog(CATALOG, &ApiConfig::new(BASE_URL, 1))?)
    }
}

// ─── Geofencing ─────────────────────────────────────────────────

const EARTH_RADIUS_M: f64 = 6_371_000.0;

fn distance_m(a: Position, b: Position) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Stands in for the backend's surroundings endpoint.
struct LocalGeofence {
    spots: Vec<Spot>,
}

impl SurroundingsProvider for LocalGeofence {
    fn fetch_surroundings(&mut self, position: Position) -> Result<Vec<SpotId>, FetchError> {
        Ok(self
            .spots
            .iter()
            .filter_map(|s| {
                let g = s.geometry?;
                (distance_m(g.center, position) <= g.radius_m).then_some(s.id)
            })
            .collect())
    }
}

// ─── Audio ──────────────────────────────────────────────────────

/// Prints every operation. Never finishes a run on its own.
#[derive(Default)]
struct ConsoleSink {
    urls: HashMap<AudioHandle, String>,
}

impl ConsoleSink {
    fn name(&self, handle: AudioHandle) -> Result<&str, PlaybackError> {
        self.urls
            .get(&handle)
            .map(|u| u.rsplit('/').next().unwrap_or(u.as_str()))
            .ok_or(PlaybackError::UnknownHandle { handle })
    }
}

impl AudioSink for ConsoleSink {
    fn create(&mut self, sound: &SoundDescriptor) -> Result<AudioHandle, PlaybackError> {
        let handle = AudioHandle(self.urls.len() as u64 + 1);
        self.urls.insert(handle, sound.asset_url.clone());
        Ok(handle)
    }

    fn connect(&mut self, _handle: AudioHandle) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn disconnect(&mut self, _handle: AudioHandle) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn play(&mut self, handle: AudioHandle) -> Result<(), PlaybackError> {
        println!("    ▶ {}", self.name(handle)?);
        Ok(())
    }

    fn pause(&mut self, handle: AudioHandle) -> Result<(), PlaybackError> {
        println!("    ⏸ {}", self.name(handle)?);
        Ok(())
    }

    fn rewind(&mut self, _handle: AudioHandle) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn configure_loop(&mut self, _handle: AudioHandle, _looping: bool) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn on_ended(&mut self, handle: AudioHandle, _callback: EndedCallback) -> Result<(), PlaybackError> {
        println!("    … letting {} finish", self.name(handle)?);
        Ok(())
    }
}

// ─── Walk ───────────────────────────────────────────────────────

fn walk() -> Vec<LocationSample> {
    (0..=8)
        .map(|n| {
            let step = 0.00015 * f64::from(n);
            LocationSample::new(52.5197 + step, 13.4047 + step, 5.0)
        })
        .collect()
}

fn render(statuses: &[SpotStatus]) {
    let line: Vec<String> = statuses
        .iter()
        .map(|s| {
            let mark = match (s.active, s.playing) {
                (true, true) => "●",
                (true, false) => "○",
                (false, true) => "◐",
                (false, false) => "·",
            };
            format!("{}{mark}", s.id)
        })
        .collect();
    println!("    [{}]", line.join(" "));
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let geofence = LocalGeofence {
        spots: EmbeddedCatalog.fetch_catalog()?,
    };

    println!("Lockstep walk");
    let mut session = LockstepSession::start(
        &mut EmbeddedCatalog,
        Box::new(geofence),
        Box::<ConsoleSink>::default(),
        SessionConfig::default(),
    )?;
    for sample in walk() {
        println!("  at {}", sample.position);
        if let Some(outcome) = session.update_position(sample)? {
            if !outcome.is_unchanged() {
                render(&session.statuses());
            }
        }
    }
    let metrics = session.end();
    println!(
        "  {} cycles, {} entered, {} left, {} global stops",
        metrics.cycles, metrics.entered_total, metrics.left_total, metrics.global_stops
    );

    println!("Realtime walk");
    let session = LockstepSession::start(
        &mut EmbeddedCatalog,
        Box::new(LocalGeofence {
            spots: EmbeddedCatalog.fetch_catalog()?,
        }),
        Box::<ConsoleSink>::default(),
        SessionConfig::default(),
    )?;
    let mut rt = RealtimeSession::start(session)?;
    for sample in walk() {
        rt.submit(sample)?;
        let report = rt.reports().recv_timeout(Duration::from_secs(1))?;
        if let Ok(Some(outcome)) = report.result {
            if !outcome.is_unchanged() {
                render(&rt.statuses());
            }
        }
    }
    let report = rt.shutdown();
    println!(
        "  shut down in {} ms (joined: {})",
        report.total_ms, report.worker_joined
    );
    Ok(())
}
