//! Synthetic flight-track generator for tests and benchmarks.
//!
//! Generates deterministic, seeded GPS tracks with a known overall shape
//! (out-and-return, triangle), providing ground truth for validating the
//! turnpoint search without real IGC files.
//!
//! # Example
//!
//! ```rust
//! use xcscore::synthetic::SyntheticFlight;
//!
//! let track = SyntheticFlight::triangle(42).generate();
//! assert!(track.len() > 100);
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::TrackPoint;

/// Meters per degree of latitude on the FAI sphere.
const METERS_PER_DEGREE: f64 = 111_194.9;

/// A scripted flight: straight legs flown at constant speed with GPS noise.
#[derive(Debug, Clone)]
pub struct SyntheticFlight {
    /// Takeoff coordinate (latitude, longitude) in degrees.
    pub origin: (f64, f64),
    /// Legs as (bearing in degrees clockwise from north, length in meters).
    pub legs: Vec<(f64, f64)>,
    /// Seconds between fixes.
    pub fix_interval_seconds: u32,
    /// Ground speed in m/s.
    pub speed_ms: f64,
    /// GPS noise amplitude in meters.
    pub noise_meters: f64,
    /// RNG seed; identical seeds generate identical tracks.
    pub seed: u64,
}

impl SyntheticFlight {
    /// A roughly equilateral closed triangle, ~30 km of flying.
    pub fn triangle(seed: u64) -> Self {
        Self {
            origin: (46.5, 8.0),
            legs: vec![(0.0, 10_000.0), (120.0, 10_000.0), (240.0, 10_000.0)],
            fix_interval_seconds: 4,
            speed_ms: 10.0,
            noise_meters: 5.0,
            seed,
        }
    }

    /// A straight out-and-return flight, ~24 km of flying.
    pub fn out_and_return(seed: u64) -> Self {
        Self {
            origin: (46.5, 8.0),
            legs: vec![(90.0, 12_000.0), (270.0, 12_000.0)],
            fix_interval_seconds: 4,
            speed_ms: 10.0,
            noise_meters: 5.0,
            seed,
        }
    }

    /// Generate the fix sequence.
    pub fn generate(&self) -> Vec<TrackPoint> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let (mut lat, mut lon) = self.origin;
        let step = self.speed_ms * f64::from(self.fix_interval_seconds);
        let mut seconds = 10 * 3600;
        let mut track = vec![TrackPoint::new(lat, lon, seconds)];

        for &(bearing_deg, length) in &self.legs {
            let bearing = bearing_deg.to_radians();
            let mut remaining = length;
            while remaining > 0.0 {
                let advance = step.min(remaining);
                lat += advance * bearing.cos() / METERS_PER_DEGREE;
                lon += advance * bearing.sin() / (METERS_PER_DEGREE * lat.to_radians().cos());
                seconds += self.fix_interval_seconds;

                let noise_deg = self.noise_meters / METERS_PER_DEGREE;
                let jitter_lat = if noise_deg > 0.0 {
                    rng.gen_range(-noise_deg..noise_deg)
                } else {
                    0.0
                };
                let jitter_lon = if noise_deg > 0.0 {
                    rng.gen_range(-noise_deg..noise_deg)
                } else {
                    0.0
                };
                track.push(TrackPoint::new(lat + jitter_lat, lon + jitter_lon, seconds));
                remaining -= advance;
            }
        }
        track
    }
}
