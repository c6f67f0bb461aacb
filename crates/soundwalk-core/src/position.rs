//! Geographic positions and location samples.

use std::fmt;

/// A WGS84 position in decimal degrees.
///
/// The engine never performs geometry on positions; it only forwards
/// them to the surroundings provider and compares consecutive samples
/// for equality.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    /// Latitude in degrees, positive north.
    pub latitude: f64,
    /// Longitude in degrees, positive east.
    pub longitude: f64,
}

impl Position {
    /// Create a position from latitude and longitude.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both coordinates are finite and within WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// One fix emitted by the location source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocationSample {
    /// Estimated position.
    pub position: Position,
    /// Radius of the 68% confidence circle, in meters.
    pub accuracy_m: f64,
}

impl LocationSample {
    /// Create a sample from raw coordinates and accuracy.
    pub fn new(latitude: f64, longitude: f64, accuracy_m: f64) -> Self {
        Self {
            position: Position::new(latitude, longitude),
            accuracy_m,
        }
    }
}
