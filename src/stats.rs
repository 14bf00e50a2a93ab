//! Flight statistics accumulated while reading a track.
//!
//! Speed, altitude and vario are presentation-layer byproducts of the track
//! load: they are computed from the raw fix stream in one pass and never feed
//! back into the turnpoint search.

use serde::{Deserialize, Serialize};

use crate::geo;
use crate::TrackPoint;

/// Summary statistics for one flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightStats {
    /// Number of fixes the statistics were accumulated over.
    pub fixes: usize,
    /// First fix time, seconds of day.
    pub start_seconds: u32,
    /// Last fix time, seconds of day.
    pub end_seconds: u32,
    /// Maximum ground speed in km/h; samples at or above the plausibility
    /// ceiling are excluded as GPS glitches.
    pub max_speed_kmh: f64,
    /// Mean ground speed in km/h over all speed samples.
    pub mean_speed_kmh: f64,
    /// GPS altitude of the first fix, meters.
    pub takeoff_altitude: i32,
    pub max_altitude: i32,
    pub min_altitude: i32,
    /// Best climb rate in m/s.
    pub max_vario_ms: f64,
    /// Worst sink rate in m/s.
    pub min_vario_ms: f64,
}

impl FlightStats {
    pub fn duration_seconds(&self) -> u32 {
        self.end_seconds.saturating_sub(self.start_seconds)
    }
}

/// One-pass accumulator over the fix stream.
#[derive(Debug)]
pub(crate) struct StatsBuilder {
    speed_ceiling_kmh: f64,
    previous: Option<(TrackPoint, i32)>,
    stats: Option<FlightStats>,
    speed_sum: f64,
    speed_samples: usize,
}

impl StatsBuilder {
    pub(crate) fn new(speed_ceiling_kmh: f64) -> Self {
        Self {
            speed_ceiling_kmh,
            previous: None,
            stats: None,
            speed_sum: 0.0,
            speed_samples: 0,
        }
    }

    /// Fold in one fix. Returns the ground speed from the previous fix in
    /// km/h, when one exists and time moved forward.
    pub(crate) fn record(&mut self, point: TrackPoint, altitude: i32) -> Option<f64> {
        let stats = self.stats.get_or_insert(FlightStats {
            fixes: 0,
            start_seconds: point.seconds,
            end_seconds: point.seconds,
            max_speed_kmh: 0.0,
            mean_speed_kmh: 0.0,
            takeoff_altitude: altitude,
            max_altitude: altitude,
            min_altitude: altitude,
            max_vario_ms: 0.0,
            min_vario_ms: 0.0,
        });
        stats.fixes += 1;
        stats.end_seconds = point.seconds;
        stats.max_altitude = stats.max_altitude.max(altitude);
        stats.min_altitude = stats.min_altitude.min(altitude);

        let mut speed = None;
        if let Some((prev, prev_alt)) = self.previous {
            let dt = i64::from(point.seconds) - i64::from(prev.seconds);
            if dt > 0 {
                let meters = geo::haversine_distance(&prev, &point);
                let kmh = meters * 3.6 / dt as f64;
                if kmh < self.speed_ceiling_kmh {
                    stats.max_speed_kmh = stats.max_speed_kmh.max(kmh);
                }
                self.speed_sum += kmh;
                self.speed_samples += 1;
                let vario = f64::from(altitude - prev_alt) / dt as f64;
                stats.max_vario_ms = stats.max_vario_ms.max(vario);
                stats.min_vario_ms = stats.min_vario_ms.min(vario);
                speed = Some(kmh);
            }
        }
        self.previous = Some((point, altitude));
        speed
    }

    pub(crate) fn finish(self) -> Option<FlightStats> {
        let mut stats = self.stats?;
        if self.speed_samples > 0 {
            stats.mean_speed_kmh = self.speed_sum / self.speed_samples as f64;
        }
        Some(stats)
    }
}
