//! # xcscore
//!
//! Flight track scoring for glider and paraglider distance contests.
//!
//! Given a recorded GPS track, this library finds the best-scoring **free
//! distance** path (4 legs through 5 chosen fixes) and the best-scoring
//! **triangle** of each shape class (FAI and flat), using a precomputed
//! geodesic distance matrix and an exact branch-and-bound turnpoint search.
//!
//! This library provides:
//! - Great-circle distances on the FAI sphere, rounded to whole meters
//! - The pairwise distance matrix with straight-line flight records
//! - Closure and free-end tables that turn the O(n⁵) naive problem into
//!   an O(n²) precomputation plus a pruned O(n³) scan
//! - The turnpoint optimizer with a non-blocking progress snapshot
//! - IGC track loading with the classic fix filters, and flight statistics
//!
//! ## Features
//!
//! - **`parallel`** - Build the distance matrix on the rayon thread pool
//!
//! ## Quick Start
//!
//! ```rust
//! use xcscore::{optimize, OptimizeConfig, TrackPoint};
//!
//! let track: Vec<TrackPoint> = (0..100)
//!     .map(|i| TrackPoint::new(46.5 + 0.001 * i as f64, 8.0, 36_000 + 4 * i))
//!     .collect();
//!
//! let score = optimize(&track, OptimizeConfig::default());
//! let free = score.free_flight.expect("enough points for a 5-fix path");
//! println!("best free distance: {:.3} km", free.km());
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, XcError};

// Geodesic distance on the FAI sphere
pub mod geo;
pub use geo::distance_meters;

// Pairwise distance matrix and straight-line records
pub mod matrix;
pub use matrix::{DistanceMatrix, LegRecord};

// Best triangle closure per turnpoint bracket
pub mod closure;
pub use closure::{Closure, ClosureTable};

// Best final leg per turnpoint
pub mod free_end;
pub use free_end::{FreeEnd, FreeEndTable};

// Turnpoint search
pub mod optimizer;
pub use optimizer::{
    optimize, Candidate, CandidateKind, FlightScore, OptimizeConfig, Optimizer, ProgressHandle,
    SearchSnapshot, MIN_POINTS,
};

// IGC track loading
pub mod igc;
pub use igc::{load_igc, parse_igc, IgcOptions, IgcTrack};

// Flight statistics
pub mod stats;
pub use stats::FlightStats;

// Synthetic tracks for tests and benchmarks
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// One GPS fix of a flight track.
///
/// Tracks are ordered chronologically; the fix position in the sequence is
/// the index every other structure in this crate speaks in.
///
/// # Example
/// ```
/// use xcscore::TrackPoint;
/// let fix = TrackPoint::new(46.5, 8.0, 10 * 3600); // over the Alps at 10:00
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    /// Latitude in degrees, north positive.
    pub latitude: f64,
    /// Longitude in degrees, east positive.
    pub longitude: f64,
    /// Time of day in seconds.
    pub seconds: u32,
}

impl TrackPoint {
    pub fn new(latitude: f64, longitude: f64, seconds: u32) -> Self {
        Self {
            latitude,
            longitude,
            seconds,
        }
    }

    /// Check if the fix has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}
