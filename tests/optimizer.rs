//! Tests for the turnpoint optimizer

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use xcscore::synthetic::SyntheticFlight;
use xcscore::{
    optimize, Candidate, CandidateKind, DistanceMatrix, OptimizeConfig, Optimizer, TrackPoint,
};

/// A triangle flight small enough for the exhaustive cross-checks.
fn triangle_track(seed: u64) -> Vec<TrackPoint> {
    let mut flight = SyntheticFlight::triangle(seed);
    flight.fix_interval_seconds = 10;
    flight.speed_ms = 15.0;
    flight.generate()
}

/// An open zigzag flight that scores as free distance, not as a triangle.
fn zigzag_track(seed: u64) -> Vec<TrackPoint> {
    let mut flight = SyntheticFlight::out_and_return(seed);
    flight.legs = vec![
        (80.0, 8_000.0),
        (120.0, 6_000.0),
        (60.0, 7_000.0),
        (100.0, 9_000.0),
    ];
    flight.fix_interval_seconds = 10;
    flight.speed_ms = 15.0;
    flight.generate()
}

#[test]
fn test_single_point() {
    let track = vec![TrackPoint::new(46.5, 8.0, 0)];
    let score = optimize(&track, OptimizeConfig::default());
    assert_eq!(score.point_count, 1);
    assert_eq!(score.max_distance.meters, 0);
    assert!(score.free_flight.is_none());
    assert!(score.flat_triangle.is_none());
    assert!(score.fai_triangle.is_none());
}

#[test]
fn test_four_points_skips_search_but_reports_records() {
    let track = vec![
        TrackPoint::new(0.0, 0.0, 0),
        TrackPoint::new(0.0, 1.0, 10),
        TrackPoint::new(1.0, 1.0, 20),
        TrackPoint::new(1.0, 0.0, 30),
    ];
    let score = optimize(&track, OptimizeConfig::default());
    assert!(score.free_flight.is_none());
    assert!(score.flat_triangle.is_none());
    assert!(score.fai_triangle.is_none());
    // The straight-line records are still derived.
    assert!(score.max_distance.meters > 150_000);
    assert_eq!(score.max_distance.from, 0);
    assert_eq!(score.max_distance.to, 2);
}

#[test]
fn test_skip_search_flag() {
    let track = triangle_track(1);
    let score = optimize(
        &track,
        OptimizeConfig {
            skip_search: true,
            ..OptimizeConfig::default()
        },
    );
    assert!(score.free_flight.is_none());
    assert!(score.max_distance.meters > 0);
}

#[test]
fn test_indices_are_ordered() {
    let track = triangle_track(2);
    let score = optimize(&track, OptimizeConfig::default());
    for candidate in [score.free_flight, score.flat_triangle, score.fai_triangle]
        .into_iter()
        .flatten()
    {
        let idx = candidate.indices;
        for w in idx.windows(2) {
            assert!(w[0] <= w[1], "unordered indices {idx:?}");
        }
        assert!(idx[4] < track.len());
    }
}

#[test]
fn test_free_distance_beats_naive_tuple() {
    let track = zigzag_track(3);
    let n = track.len();
    let matrix = DistanceMatrix::build(&track);
    let naive = [0, n / 4, n / 2, 3 * n / 4, n - 1];
    let naive_score: i64 = naive
        .windows(2)
        .map(|w| i64::from(matrix.dist(w[0], w[1])))
        .sum();

    let score = optimize(&track, OptimizeConfig::default());
    let free = score.free_flight.expect("free flight candidate");
    assert!(
        i64::from(free.meters) >= naive_score,
        "optimizer {} below naive 5-tuple {naive_score}",
        free.meters
    );
    // The reported score equals the sum of its own four legs.
    let legs: i64 = free
        .indices
        .windows(2)
        .map(|w| i64::from(matrix.dist(w[0], w[1])))
        .sum();
    assert_eq!(i64::from(free.meters), legs);
}

fn assert_triangle_consistent(matrix: &DistanceMatrix, candidate: &Candidate) {
    let [p1, p2, p3, p4, p5] = candidate.indices;
    let a = i64::from(matrix.dist(p2, p3));
    let b = i64::from(matrix.dist(p3, p4));
    let c = i64::from(matrix.dist(p2, p4));
    let d = i64::from(matrix.dist(p1, p5));
    let sum = a + b + c;
    assert!(5 * d <= sum, "closing leg over 20%: 5*{d} > {sum}");
    assert_eq!(i64::from(candidate.meters), sum - d, "score != legs - closing");
    let fai = 25 * a >= 7 * sum && 25 * b >= 7 * sum && 25 * c >= 7 * sum;
    match candidate.kind {
        CandidateKind::FaiTriangle => assert!(fai, "FAI candidate fails the 28% rule"),
        CandidateKind::FlatTriangle => assert!(!fai, "flat candidate passes the 28% rule"),
        CandidateKind::FreeFlight => panic!("not a triangle"),
    }
}

#[test]
fn test_triangle_candidates_are_consistent() {
    let track = triangle_track(4);
    let matrix = DistanceMatrix::build(&track);
    let score = optimize(&track, OptimizeConfig::default());

    // An equilateral triangle flight must produce an FAI triangle covering
    // most of the flown distance.
    let fai = score.fai_triangle.expect("FAI triangle on a triangle flight");
    assert_triangle_consistent(&matrix, &fai);
    assert!(fai.meters > 25_000, "FAI score only {} m", fai.meters);

    if let Some(flat) = &score.flat_triangle {
        assert_triangle_consistent(&matrix, flat);
    }
}

#[test]
fn test_pruning_equivalence_triangle_flight() {
    let track = triangle_track(5);
    assert!(track.len() >= 50);
    let pruned = optimize(&track, OptimizeConfig::default());
    let exhaustive = optimize(
        &track,
        OptimizeConfig {
            exhaustive: true,
            ..OptimizeConfig::default()
        },
    );
    assert_eq!(pruned.free_flight, exhaustive.free_flight);
    assert_eq!(pruned.flat_triangle, exhaustive.flat_triangle);
    assert_eq!(pruned.fai_triangle, exhaustive.fai_triangle);
}

#[test]
fn test_pruning_equivalence_open_flight() {
    let track = zigzag_track(6);
    assert!(track.len() >= 50);
    let pruned = optimize(&track, OptimizeConfig::default());
    let exhaustive = optimize(
        &track,
        OptimizeConfig {
            exhaustive: true,
            ..OptimizeConfig::default()
        },
    );
    assert_eq!(pruned.free_flight, exhaustive.free_flight);
    assert_eq!(pruned.flat_triangle, exhaustive.flat_triangle);
    assert_eq!(pruned.fai_triangle, exhaustive.fai_triangle);
}

/// An irregular random-walk flight. Step lengths vary by a factor of 40, so
/// a single index move can realize almost the full consecutive-fix drift
/// bound — the geometry the skip shortcuts have to survive, which smooth
/// constant-speed flights never produce.
fn scribble_track(seed: u64, n: usize) -> Vec<TrackPoint> {
    const METERS_PER_DEGREE: f64 = 111_194.9;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut lat = 46.5f64;
    let mut lon = 8.0f64;
    let mut track = Vec::with_capacity(n);
    for i in 0..n {
        track.push(TrackPoint::new(lat, lon, i as u32 * 10));
        let bearing = rng.gen_range(0.0..std::f64::consts::TAU);
        let step = rng.gen_range(50.0..2_000.0);
        lat += step * bearing.cos() / METERS_PER_DEGREE;
        lon += step * bearing.sin() / (METERS_PER_DEGREE * lat.to_radians().cos());
    }
    track
}

#[test]
fn test_pruning_equivalence_irregular_tracks() {
    for seed in 0..120u64 {
        let n = 10 + (seed as usize * 7) % 41;
        let track = scribble_track(seed, n);
        let pruned = optimize(&track, OptimizeConfig::default());
        let exhaustive = optimize(
            &track,
            OptimizeConfig {
                exhaustive: true,
                ..OptimizeConfig::default()
            },
        );
        assert_eq!(pruned.free_flight, exhaustive.free_flight, "seed {seed}, n {n}");
        assert_eq!(pruned.flat_triangle, exhaustive.flat_triangle, "seed {seed}, n {n}");
        assert_eq!(pruned.fai_triangle, exhaustive.fai_triangle, "seed {seed}, n {n}");
    }
}

#[test]
fn test_degenerate_identical_points() {
    let track: Vec<TrackPoint> = (0..20).map(|i| TrackPoint::new(46.5, 8.0, i)).collect();
    let score = optimize(&track, OptimizeConfig::default());
    assert_eq!(score.max_distance.meters, 0);
    assert_eq!(score.max_consecutive.meters, 0);
    // A zero-length free path exists; zero-size triangles are not reported.
    let free = score.free_flight.expect("free path over coincident fixes");
    assert_eq!(free.meters, 0);
    assert!(score.flat_triangle.is_none());
    assert!(score.fai_triangle.is_none());
}

#[test]
fn test_free_flight_on_out_and_return() {
    // Out-and-return: the best open path is roughly one leg out or back,
    // and the best triangle (if any) is worth little.
    let track = SyntheticFlight::out_and_return(7).generate();
    let score = optimize(&track, OptimizeConfig::default());
    let free = score.free_flight.expect("free flight candidate");
    assert!(free.meters > 11_000, "free score only {} m", free.meters);
    assert_eq!(free.kind, CandidateKind::FreeFlight);
}

#[test]
fn test_progress_snapshot() {
    let track = triangle_track(8);
    let optimizer = Optimizer::new(&track, OptimizeConfig::default());
    let progress = optimizer.progress();

    // Before the run: nothing published.
    let before = progress.snapshot();
    assert!(before.free_flight.is_none());

    let score = optimizer.run();

    // After the run the snapshot holds the final bests.
    let after = progress.snapshot();
    assert_eq!(after.free_flight, score.free_flight);
    assert_eq!(after.flat_triangle, score.flat_triangle);
    assert_eq!(after.fai_triangle, score.fai_triangle);
}

#[test]
fn test_progress_snapshot_from_other_thread() {
    let track = triangle_track(9);
    let optimizer = Optimizer::new(&track, OptimizeConfig::default());
    let progress = optimizer.progress();

    let reader = std::thread::spawn(move || {
        // Poll while the search may be running; must never block or tear.
        for _ in 0..100 {
            let snapshot = progress.snapshot();
            if let Some(candidate) = snapshot.free_flight {
                assert!(candidate.indices[4] < 10_000);
            }
        }
    });

    let score = optimizer.run();
    reader.join().expect("reader thread");
    assert!(score.free_flight.is_some());
}

#[test]
fn test_olc_points_and_best_flight() {
    let track = triangle_track(10);
    let score = optimize(&track, OptimizeConfig::default());
    let fai = score.fai_triangle.expect("FAI triangle");
    assert!((fai.olc_points() - fai.km() * 2.0).abs() < 1e-9);

    let best = score.best_flight().expect("best flight");
    for candidate in [score.free_flight, score.flat_triangle, score.fai_triangle]
        .into_iter()
        .flatten()
    {
        assert!(best.olc_points() >= candidate.olc_points());
    }
}
