//! Tests for IGC track loading

use xcscore::igc::{format_time, parse_time_of_day};
use xcscore::{parse_igc, IgcOptions, XcError};

const SAMPLE: &str = "\
AXXX001
HFDTE280803
B1101355206343N00006198WA0058700558
B1101455206443N00006198WA0058700568
B1101555206543N00006198WA0058700578
LXXX some comment line
";

#[test]
fn test_parse_sample() {
    let track = parse_igc(SAMPLE, &IgcOptions::default());
    assert_eq!(track.points.len(), 3);
    assert_eq!(track.date.as_deref(), Some("280803"));

    let first = track.points[0];
    assert_eq!(first.seconds, 11 * 3600 + 60 + 35);
    assert!((first.latitude - (52.0 + 6343.0 / 60_000.0)).abs() < 1e-9);
    assert!((first.longitude - (-(6198.0 / 60_000.0))).abs() < 1e-9);
}

#[test]
fn test_southern_western_hemispheres() {
    let content = "B1101355206343S00006198EA0058700558\n";
    let track = parse_igc(content, &IgcOptions::default());
    assert_eq!(track.points.len(), 1);
    assert!(track.points[0].latitude < 0.0);
    assert!(track.points[0].longitude > 0.0);
}

#[test]
fn test_duplicate_fixes_dropped() {
    let content = "\
B1101355206343N00006198WA0058700558
B1101355206343N00006198WA0058700558
B1101455206443N00006198WA0058700568
";
    let track = parse_igc(content, &IgcOptions::default());
    assert_eq!(track.points.len(), 2);
    assert_eq!(track.dropped_duplicates, 1);
}

#[test]
fn test_stationary_fixes_dropped() {
    // Same position, advancing time: below GPS resolution, dropped.
    let content = "\
B1101355206343N00006198WA0058700558
B1101455206343N00006198WA0058700558
B1101555206443N00006198WA0058700568
";
    let track = parse_igc(content, &IgcOptions::default());
    assert_eq!(track.points.len(), 2);
    assert_eq!(track.dropped_still, 1);
    // Statistics still cover the dropped fix.
    assert_eq!(track.stats.unwrap().fixes, 3);
}

#[test]
fn test_time_window() {
    let options = IgcOptions {
        begin_seconds: 11 * 3600 + 60 + 40,
        ..IgcOptions::default()
    };
    let track = parse_igc(SAMPLE, &options);
    assert_eq!(track.points.len(), 2);
    assert_eq!(track.points[0].seconds, 11 * 3600 + 60 + 45);

    let options = IgcOptions {
        end_seconds: 11 * 3600 + 60 + 50,
        ..IgcOptions::default()
    };
    let track = parse_igc(SAMPLE, &options);
    assert_eq!(track.points.len(), 2);
}

#[test]
fn test_malformed_lines_skipped() {
    let content = "\
B110135
Bgarbage
B1101355206343X00006198WA0058700558
B1101355206343N00006198WA0058700558
";
    let track = parse_igc(content, &IgcOptions::default());
    assert_eq!(track.points.len(), 1);
}

#[test]
fn test_out_of_range_coordinates_skipped() {
    // 95° of latitude is syntactically well-formed but not a place on Earth.
    let content = "\
B1101359506343N00006198WA0058700558
B1101355206343N18106198WA0058700558
B1101455206443N00006198WA0058700568
";
    let track = parse_igc(content, &IgcOptions::default());
    assert_eq!(track.points.len(), 1);
    assert_eq!(track.points[0].seconds, 11 * 3600 + 60 + 45);
}

#[test]
fn test_empty_input() {
    let track = parse_igc("", &IgcOptions::default());
    assert!(track.points.is_empty());
    assert!(track.stats.is_none());
}

#[test]
fn test_load_missing_file() {
    let result = xcscore::load_igc(
        std::path::Path::new("/nonexistent/flight.igc"),
        &IgcOptions::default(),
    );
    assert!(matches!(result, Err(XcError::Io { .. })));
}

#[test]
fn test_parse_time_of_day() {
    assert_eq!(parse_time_of_day("11").unwrap(), 11 * 3600);
    assert_eq!(parse_time_of_day("11:30").unwrap(), 11 * 3600 + 30 * 60);
    assert_eq!(parse_time_of_day("11:30:15").unwrap(), 11 * 3600 + 30 * 60 + 15);
    assert!(parse_time_of_day("abc").is_err());
    assert!(parse_time_of_day("11:61").is_err());
    assert!(parse_time_of_day("1:2:3:4").is_err());
}

#[test]
fn test_format_time() {
    assert_eq!(format_time(11 * 3600 + 60 + 35), "11:01:35");
    assert_eq!(format_time(0), "00:00:00");
}
