//! IGC track loading.
//!
//! Reads the position fixes (B records) of an IGC file into the ordered
//! [`TrackPoint`] sequence the optimizer consumes, applying the classic
//! pre-filters: an optional time-of-day window, and removal of successive
//! fixes that carry no information (same timestamp and under half a meter of
//! displacement — below GPS resolution). Everything else in the file is
//! ignored except the `HFDTE` header, which is kept for reporting.
//!
//! A fix stream like `B1101355206343N00006198WA0058700558` decodes as
//! time 11:01:35, 52°06.343' N, 0°06.198' W, GPS altitude 00558 m.

use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::error::{Result, XcError};
use crate::stats::{FlightStats, StatsBuilder};
use crate::TrackPoint;

/// Displacement below which two fixes are considered coincident.
const MIN_DISPLACEMENT_M: f64 = 0.5;

/// Track loading options.
#[derive(Debug, Clone, Copy)]
pub struct IgcOptions {
    /// Drop fixes before this second of day.
    pub begin_seconds: u32,
    /// Stop reading at the first fix after this second of day.
    pub end_seconds: u32,
    /// Ground speeds at or above this are logged as implausible and excluded
    /// from the maximum-speed statistic.
    pub max_speed_kmh: f64,
}

impl Default for IgcOptions {
    fn default() -> Self {
        Self {
            begin_seconds: 0,
            end_seconds: 24 * 60 * 60,
            max_speed_kmh: 90.0,
        }
    }
}

/// A loaded flight track.
#[derive(Debug, Clone)]
pub struct IgcTrack {
    /// Chronological fixes, filtered.
    pub points: Vec<TrackPoint>,
    /// Statistics over every fix inside the time window (including ones the
    /// duplicate filter dropped). `None` when the window was empty.
    pub stats: Option<FlightStats>,
    /// Raw contents of the `HFDTE` header, if present.
    pub date: Option<String>,
    /// Fixes dropped for repeating the previous timestamp in place.
    pub dropped_duplicates: usize,
    /// Fixes dropped for moving less than the GPS resolution.
    pub dropped_still: usize,
}

/// Load and filter a track from an IGC file.
pub fn load_igc(path: &Path, options: &IgcOptions) -> Result<IgcTrack> {
    let content = fs::read_to_string(path).map_err(|source| XcError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let track = parse_igc(&content, options);
    if track.points.is_empty() {
        return Err(XcError::NoFixes {
            path: path.display().to_string(),
        });
    }
    info!("{}: {} trackpoints read", path.display(), track.points.len());
    Ok(track)
}

/// Parse IGC content. Unparseable lines are skipped, not fatal; an entirely
/// fix-free input simply yields an empty track.
pub fn parse_igc(content: &str, options: &IgcOptions) -> IgcTrack {
    let mut points: Vec<TrackPoint> = Vec::new();
    let mut date = None;
    let mut stats = StatsBuilder::new(options.max_speed_kmh);
    let mut dropped_duplicates = 0usize;
    let mut dropped_still = 0usize;
    let mut previous: Option<TrackPoint> = None;

    for line in content.lines() {
        let line = line.trim_end();
        if let Some(rest) = line.strip_prefix("HFDTE") {
            date = Some(rest.trim().to_string());
            continue;
        }
        let Some((point, altitude)) = parse_b_record(line) else {
            continue;
        };
        if point.seconds < options.begin_seconds {
            continue;
        }
        if point.seconds > options.end_seconds {
            break;
        }

        if let Some(speed) = stats.record(point, altitude) {
            if speed >= options.max_speed_kmh {
                warn!(
                    "implausible speed {speed:.1} km/h at {} (ceiling {} km/h)",
                    format_time(point.seconds),
                    options.max_speed_kmh
                );
            }
        }

        match previous {
            None => points.push(point),
            Some(prev) => {
                let displacement = crate::geo::haversine_distance(&prev, &point);
                if point.seconds < prev.seconds {
                    warn!("time going backwards before {}", format_time(point.seconds));
                }
                if point.seconds != prev.seconds {
                    if displacement < MIN_DISPLACEMENT_M {
                        dropped_still += 1;
                    } else {
                        points.push(point);
                    }
                } else if displacement >= MIN_DISPLACEMENT_M {
                    warn!(
                        "zero time delta but {displacement:.1} m displacement at {}",
                        format_time(point.seconds)
                    );
                    points.push(point);
                } else {
                    dropped_duplicates += 1;
                }
            }
        }
        previous = Some(point);
    }

    if dropped_duplicates > 0 {
        info!("{dropped_duplicates} duplicate fixes dropped (same time and position)");
    }
    if dropped_still > 0 {
        info!("{dropped_still} near-stationary fixes dropped");
    }

    IgcTrack {
        points,
        stats: stats.finish(),
        date,
        dropped_duplicates,
        dropped_still,
    }
}

/// Decode one B record; `None` when the line is not a well-formed fix.
fn parse_b_record(line: &str) -> Option<(TrackPoint, i32)> {
    let bytes = line.as_bytes();
    if bytes.first() != Some(&b'B') || bytes.len() < 35 {
        return None;
    }
    if !line.is_ascii() {
        return None;
    }

    let seconds = parse_time_fields(&line[1..3], &line[3..5], &line[5..7])?;

    let lat_sign = match bytes[14] {
        b'N' => 1.0,
        b'S' => -1.0,
        _ => return None,
    };
    let lon_sign = match bytes[23] {
        b'E' => 1.0,
        b'W' => -1.0,
        _ => return None,
    };
    // DDMMmmm / DDDMMmmm: whole degrees plus thousandths of minutes.
    let latitude = lat_sign
        * (line[7..9].parse::<f64>().ok()? + line[9..14].parse::<f64>().ok()? / 60_000.0);
    let longitude = lon_sign
        * (line[15..18].parse::<f64>().ok()? + line[18..23].parse::<f64>().ok()? / 60_000.0);
    let altitude = line[30..35].parse::<i32>().ok()?;

    let point = TrackPoint {
        latitude,
        longitude,
        seconds,
    };
    if !point.is_valid() {
        return None;
    }
    Some((point, altitude))
}

fn parse_time_fields(hh: &str, mm: &str, ss: &str) -> Option<u32> {
    let hours = hh.parse::<u32>().ok()?;
    let minutes = mm.parse::<u32>().ok()?;
    let seconds = ss.parse::<u32>().ok()?;
    Some(hours * 3600 + minutes * 60 + seconds)
}

/// Parse a possibly partial `hh[:mm[:ss]]` time of day into seconds.
pub fn parse_time_of_day(input: &str) -> Result<u32> {
    let invalid = || XcError::InvalidTime {
        input: input.to_string(),
    };
    let mut parts = input.split(':');
    let hours: u32 = parts.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
    let minutes: u32 = match parts.next() {
        Some(p) => p.parse().map_err(|_| invalid())?,
        None => 0,
    };
    let seconds: u32 = match parts.next() {
        Some(p) => p.parse().map_err(|_| invalid())?,
        None => 0,
    };
    if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
        return Err(invalid());
    }
    Ok(hours * 3600 + minutes * 60 + seconds)
}

/// Format seconds of day as `hh:mm:ss`.
pub fn format_time(seconds: u32) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}
