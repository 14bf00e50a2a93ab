//! Tests for the free-end table

use xcscore::synthetic::SyntheticFlight;
use xcscore::{DistanceMatrix, FreeEndTable, TrackPoint};

#[test]
fn test_matches_unpruned_scan() {
    let track = SyntheticFlight::triangle(21).generate();
    let matrix = DistanceMatrix::build(&track);
    let pruned = FreeEndTable::build(&matrix);
    let unpruned = FreeEndTable::build_unpruned(&matrix);
    for k in 0..matrix.len() {
        assert_eq!(pruned.best_end(k), unpruned.best_end(k), "turnpoint {k}");
    }
}

#[test]
fn test_matches_brute_force() {
    let mut flight = SyntheticFlight::out_and_return(22);
    flight.fix_interval_seconds = 30;
    let track = flight.generate();
    let matrix = DistanceMatrix::build(&track);
    let table = FreeEndTable::build(&matrix);

    for k in 0..matrix.len() {
        let mut best = 0;
        for m in k..matrix.len() {
            best = best.max(matrix.dist(k, m));
        }
        let entry = table.best_end(k);
        assert_eq!(entry.meters, best, "turnpoint {k}");
        assert!(entry.end >= k);
        assert_eq!(matrix.dist(k, entry.end), entry.meters);
    }
}

#[test]
fn test_last_point_reaches_itself() {
    let track = SyntheticFlight::triangle(23).generate();
    let matrix = DistanceMatrix::build(&track);
    let table = FreeEndTable::build(&matrix);
    let last = table.best_end(matrix.len() - 1);
    assert_eq!(last.meters, 0);
    assert_eq!(last.end, matrix.len() - 1);
}

#[test]
fn test_degenerate_track_does_not_hang() {
    // All fixes coincident: maxConsecutive is 0, so the skip shortcut must
    // fall back to step 1 instead of dividing by zero.
    let track: Vec<TrackPoint> = (0..50).map(|i| TrackPoint::new(46.5, 8.0, i)).collect();
    let matrix = DistanceMatrix::build(&track);
    assert_eq!(matrix.max_consecutive.meters, 0);
    let table = FreeEndTable::build(&matrix);
    for k in 0..matrix.len() {
        assert_eq!(table.best_end(k).meters, 0);
    }
}
