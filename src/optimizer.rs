//! Branch-and-bound search for the best-scoring contest paths.
//!
//! The search scans candidate turnpoint triples (i2, i3, i4) over the track,
//! maintaining three records simultaneously:
//!
//! - **free flight**: the best open 5-point path; the start leg (best i1 for
//!   each i2) and final leg ([`FreeEndTable`]) are resolved outside the
//!   innermost loop,
//! - **flat triangle** and **FAI triangle**: turnpoints (i2, i3, i4) plus the
//!   closing start/end pair from the [`ClosureTable`], accepted when the
//!   closing leg is at most 20% of the leg sum, classified FAI when every leg
//!   is at least 28% of the leg sum, scored as leg sum minus closing leg.
//!
//! Exhaustive scanning would be O(n³); the scan instead advances each index
//! by the largest provably safe step. One index step moves any leg endpoint
//! to a neighboring fix, so no leg can change by more than the maximum
//! consecutive-fix distance per step — from that Lipschitz bound and the gap
//! between the current position and the record, a skip count follows for each
//! objective, and the scan takes the tightest one that is safe for all three.
//! Skipped positions can at best *equal* a record, never strictly beat one,
//! and records only update on strict improvement, so the pruned search is
//! exact: it returns bit-identical results to a step-1 scan
//! ([`OptimizeConfig::exhaustive`]).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::closure::ClosureTable;
use crate::free_end::FreeEndTable;
use crate::matrix::{DistanceMatrix, LegRecord};
use crate::TrackPoint;

/// Minimum number of fixes for a 5-turnpoint optimization.
pub const MIN_POINTS: usize = 5;

/// Scored path categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateKind {
    /// Open 4-leg path through 5 points.
    FreeFlight,
    /// Closed triangle failing the FAI leg-balance rule.
    FlatTriangle,
    /// Closed triangle with every leg ≥ 28% of the leg sum.
    FaiTriangle,
}

impl CandidateKind {
    /// OLC scoring multiplier applied to the kilometer distance.
    pub fn multiplier(&self) -> f64 {
        match self {
            CandidateKind::FreeFlight => 1.5,
            CandidateKind::FlatTriangle => 1.75,
            CandidateKind::FaiTriangle => 2.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateKind::FreeFlight => "free_flight",
            CandidateKind::FlatTriangle => "flat_triangle",
            CandidateKind::FaiTriangle => "fai_triangle",
        }
    }
}

/// One scored path: five fix indices in track order plus the score.
///
/// For triangles the indices are (start, turn 1, turn 2, turn 3, end) with
/// the score already reduced by the closing distance; for free flight they
/// are the five waypoints of the open path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub kind: CandidateKind,
    /// Fix indices, non-decreasing in track order.
    pub indices: [usize; 5],
    /// Score in meters (leg sum, minus the closing leg for triangles).
    pub meters: u32,
}

impl Candidate {
    /// Score in kilometers.
    pub fn km(&self) -> f64 {
        f64::from(self.meters) / 1000.0
    }

    /// OLC contest points (kilometers × category multiplier).
    pub fn olc_points(&self) -> f64 {
        self.km() * self.kind.multiplier()
    }
}

/// Search options.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimizeConfig {
    /// Build the distance matrix and straight-line records only; skip the
    /// turnpoint search entirely.
    pub skip_search: bool,
    /// Force step-1 scans everywhere, disabling every skip-ahead shortcut.
    /// Useful only to cross-check the pruned search; results are identical.
    pub exhaustive: bool,
}

/// Final result of scoring one track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightScore {
    /// Number of fixes scored.
    pub point_count: usize,
    /// Farthest pair of fixes (straight-distance record).
    pub max_distance: LegRecord,
    /// Farthest consecutive pair of fixes.
    pub max_consecutive: LegRecord,
    /// Farthest fix from takeoff.
    pub max_takeoff: LegRecord,
    /// Best open 5-point path, when the search ran.
    pub free_flight: Option<Candidate>,
    /// Best triangle failing the FAI rule, if any was found.
    pub flat_triangle: Option<Candidate>,
    /// Best FAI triangle, if any was found.
    pub fai_triangle: Option<Candidate>,
}

impl FlightScore {
    /// The candidate worth the most OLC points. Ties go to the higher
    /// multiplier, matching contest practice.
    pub fn best_flight(&self) -> Option<&Candidate> {
        let mut best: Option<&Candidate> = None;
        for candidate in [&self.free_flight, &self.flat_triangle, &self.fai_triangle]
            .into_iter()
            .flatten()
        {
            match best {
                Some(current) if current.olc_points() > candidate.olc_points() => {}
                _ => best = Some(candidate),
            }
        }
        best
    }
}

// ============================================================================
// Progress snapshot
// ============================================================================

/// Point-in-time view of the running search, readable from any thread.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchSnapshot {
    pub free_flight: Option<Candidate>,
    pub flat_triangle: Option<Candidate>,
    pub fai_triangle: Option<Candidate>,
    /// Current first-turnpoint scan position.
    pub scan_i2: usize,
    /// Current third-turnpoint scan position.
    pub scan_i4: usize,
}

#[derive(Default)]
struct ProgressShared {
    best: Mutex<(Option<Candidate>, Option<Candidate>, Option<Candidate>)>,
    scan_i2: AtomicUsize,
    scan_i4: AtomicUsize,
}

/// Cheaply cloneable handle for polling the search from another thread.
///
/// The search publishes each record improvement under a briefly-held mutex
/// and its scan position through atomics; a reader never observes a torn
/// candidate and never stalls the search beyond one record write.
#[derive(Clone, Default)]
pub struct ProgressHandle {
    shared: Arc<ProgressShared>,
}

impl ProgressHandle {
    /// Current best-known candidates and scan position.
    pub fn snapshot(&self) -> SearchSnapshot {
        let best = self
            .shared
            .best
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        SearchSnapshot {
            free_flight: best.0,
            flat_triangle: best.1,
            fai_triangle: best.2,
            scan_i2: self.shared.scan_i2.load(Ordering::Relaxed),
            scan_i4: self.shared.scan_i4.load(Ordering::Relaxed),
        }
    }

    fn publish(&self, candidate: Candidate) {
        let mut best = self
            .shared
            .best
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match candidate.kind {
            CandidateKind::FreeFlight => best.0 = Some(candidate),
            CandidateKind::FlatTriangle => best.1 = Some(candidate),
            CandidateKind::FaiTriangle => best.2 = Some(candidate),
        }
    }
}

// ============================================================================
// Search
// ============================================================================

/// Everything the search reads: the precomputed tables, plus the Lipschitz
/// step bound. Built once per run, immutable during the scan.
struct SearchContext {
    matrix: DistanceMatrix,
    closure: ClosureTable,
    free_end: FreeEndTable,
    /// Maximum consecutive-fix distance; 0 disables all skipping.
    max_step: i64,
}

/// Mutable record for one category during the scan.
#[derive(Clone, Copy)]
struct Record {
    score: i64,
    indices: Option<[usize; 5]>,
}

impl Record {
    const EMPTY: Record = Record { score: 0, indices: None };

    fn candidate(&self, kind: CandidateKind) -> Option<Candidate> {
        self.indices.map(|indices| Candidate {
            kind,
            indices,
            meters: self.score as u32,
        })
    }
}

/// Scores a track: builds the distance tables, runs the turnpoint search and
/// exposes a progress snapshot while doing so.
pub struct Optimizer<'a> {
    points: &'a [TrackPoint],
    config: OptimizeConfig,
    progress: ProgressHandle,
}

impl<'a> Optimizer<'a> {
    pub fn new(points: &'a [TrackPoint], config: OptimizeConfig) -> Self {
        Self {
            points,
            config,
            progress: ProgressHandle::default(),
        }
    }

    /// Handle for polling intermediate results from another thread.
    pub fn progress(&self) -> ProgressHandle {
        self.progress.clone()
    }

    /// Score the track. Infallible: too few points is reported through the
    /// result (`None` candidates), not as an error.
    pub fn run(&self) -> FlightScore {
        let n = self.points.len();
        debug!("building {n}×{n} distance matrix");
        let matrix = DistanceMatrix::build(self.points);
        info!(
            "straight distance record: {} m ({} → {})",
            matrix.max_distance.meters, matrix.max_distance.from, matrix.max_distance.to
        );

        let mut score = FlightScore {
            point_count: n,
            max_distance: matrix.max_distance,
            max_consecutive: matrix.max_consecutive,
            max_takeoff: matrix.max_takeoff,
            free_flight: None,
            flat_triangle: None,
            fai_triangle: None,
        };

        if self.config.skip_search {
            return score;
        }
        if n < MIN_POINTS {
            info!("only {n} points given, no optimization");
            return score;
        }

        debug!("building closure table and free-end table");
        let closure = ClosureTable::build(&matrix);
        let free_end = if self.config.exhaustive {
            FreeEndTable::build_unpruned(&matrix)
        } else {
            FreeEndTable::build(&matrix)
        };
        let ctx = SearchContext {
            max_step: if self.config.exhaustive {
                0
            } else {
                i64::from(matrix.max_consecutive.meters)
            },
            matrix,
            closure,
            free_end,
        };

        let (free, flat, fai) = self.search(&ctx, n);
        score.free_flight = free.candidate(CandidateKind::FreeFlight);
        score.flat_triangle = flat.candidate(CandidateKind::FlatTriangle);
        score.fai_triangle = fai.candidate(CandidateKind::FaiTriangle);
        score
    }

    fn search(&self, ctx: &SearchContext, n: usize) -> (Record, Record, Record) {
        let (mut free, mut flat, mut fai) = warm_start(&ctx.matrix, n);
        for (record, kind) in [
            (&free, CandidateKind::FreeFlight),
            (&flat, CandidateKind::FlatTriangle),
            (&fai, CandidateKind::FaiTriangle),
        ] {
            if let Some(candidate) = record.candidate(kind) {
                self.progress.publish(candidate);
            }
        }

        let matrix = &ctx.matrix;
        let max_step = ctx.max_step;
        debug!("scanning turnpoints (per-step leg drift bound: {max_step} m)");

        for i2 in 0..(n - 2) {
            self.progress.shared.scan_i2.store(i2, Ordering::Relaxed);

            // Best start leg for a free path turning first at i2. A fix
            // strictly below the running best by more than the drift over
            // the skipped range can never catch up, so jump past it.
            let mut e = 0i64;
            let mut i1 = 0usize;
            let mut i = 0usize;
            while i < i2 {
                let t = matrix.dist_i64(i, i2);
                if t >= e {
                    e = t;
                    i1 = i;
                }
                i += clamp_step(div_or_zero(e - t, max_step));
            }

            let mut free_less_e = free.score - e;
            let mut i4 = (n - 1) as i64;
            while i4 >= (i2 + 2) as i64 {
                let i4u = i4 as usize;
                self.progress.shared.scan_i4.store(i4u, Ordering::Relaxed);

                let c = matrix.dist_i64(i2, i4u);
                let closing = ctx.closure.closing(i2, i4u);
                let d = i64::from(closing.meters);
                let c25 = 25 * c;
                // 5d − c ≤ a + b  ⟺  the 20% closing rule 5d ≤ a + b + c.
                let d5_minus_c = 5 * d - c;
                let d_minus_c = d - c;
                let mut flat_gap = flat.score + d_minus_c;
                let mut fai_gap = fai.score + d_minus_c;

                let best_end = ctx.free_end.best_end(i4u);
                let f = i64::from(best_end.meters);
                let free_gap = free_less_e - f;

                let mut max_ab = 0i64;
                // Upper bound on a + b over *every* i3 in range, skipped
                // positions included: a position s steps past the last one
                // visited exceeds its a + b by at most s × drift. The
                // i4-level bounds below must use this, not max_ab, which
                // only covers visited positions and can undercount once the
                // i3 scan skips.
                let mut ab_bound = 0i64;
                let drift = 2 * max_step;
                let mut best_i3 = i2 + 1;
                let mut i3 = i2 + 1;
                while i3 < i4u {
                    let a = matrix.dist_i64(i2, i3);
                    let b = matrix.dist_i64(i3, i4u);
                    let ab = a + b;
                    if ab > max_ab {
                        max_ab = ab;
                        best_i3 = i3;
                    }
                    if d5_minus_c <= ab {
                        // Valid triangle; classify and score.
                        let sum7 = 7 * (ab + c);
                        let score = ab + c - d;
                        let indices = [closing.start, i2, i3, i4u, closing.end];
                        if c25 >= sum7 && 25 * a >= sum7 && 25 * b >= sum7 {
                            if score > fai.score {
                                fai = Record {
                                    score,
                                    indices: Some(indices),
                                };
                                fai_gap = score + d_minus_c;
                                self.progress.publish(Candidate {
                                    kind: CandidateKind::FaiTriangle,
                                    indices,
                                    meters: score as u32,
                                });
                            }
                        } else if score > flat.score {
                            flat = Record {
                                score,
                                indices: Some(indices),
                            };
                            flat_gap = score + d_minus_c;
                            self.progress.publish(Candidate {
                                kind: CandidateKind::FlatTriangle,
                                indices,
                                meters: score as u32,
                            });
                        }
                    }

                    // Moving i3 drifts both a and b, so 2× per step. The
                    // triangle skip is the larger of "cannot become valid"
                    // and "cannot beat either triangle record".
                    let fs_skip = div_or_zero(free_gap - ab, drift) + 1;
                    let validity_skip = div_or_zero(d5_minus_c - ab, drift);
                    let flat_skip = div_or_zero(flat_gap - ab, drift) + 1;
                    let fai_skip = div_or_zero(fai_gap - ab, drift) + 1;
                    let triangle_skip = validity_skip.max(flat_skip.min(fai_skip));
                    let step = clamp_step(triangle_skip.min(fs_skip));
                    let padded = ab + drift * (step as i64 - 1);
                    if padded > ab_bound {
                        ab_bound = padded;
                    }
                    i3 += step;
                }

                let total = max_ab + e + f;
                if total > free.score {
                    let indices = [i1, i2, best_i3, i4u, best_end.end];
                    free = Record {
                        score: total,
                        indices: Some(indices),
                    };
                    free_less_e = total - e;
                    self.progress.publish(Candidate {
                        kind: CandidateKind::FreeFlight,
                        indices,
                        meters: total as u32,
                    });
                }

                // Moving i4 drifts: b and the final leg for the free path
                // (2×); for triangles b and c up plus the closing minimum
                // down (3×); for validity additionally the 5× factor on the
                // closing leg (7×). Gaps are measured from ab_bound: an i3
                // the inner scan skipped may still hold the true maximum.
                let fs_skip = div_or_zero(free_less_e - f - ab_bound, 2 * max_step) + 1;
                let validity_skip = div_or_zero(d5_minus_c - ab_bound, 7 * max_step);
                let flat_skip = div_or_zero(flat_gap - ab_bound, 3 * max_step) + 1;
                let fai_skip = div_or_zero(fai_gap - ab_bound, 3 * max_step) + 1;
                let triangle_skip = validity_skip.max(flat_skip.min(fai_skip));
                i4 -= clamp_step(triangle_skip.min(fs_skip)) as i64;
            }
        }
        (free, flat, fai)
    }
}

/// Convenience wrapper: score a track in one call.
pub fn optimize(points: &[TrackPoint], config: OptimizeConfig) -> FlightScore {
    Optimizer::new(points, config).run()
}

/// Seed the records with two guessed routes so the skip bounds have a real
/// gap to work with from the first iteration. Guesses are genuine candidates
/// (evaluated with the same rules), so warm starting never changes the
/// optimum.
fn warm_start(matrix: &DistanceMatrix, n: usize) -> (Record, Record, Record) {
    let route = [n * 3 / 8, n / 2, n * 5 / 8, n * 3 / 4, n - 1];
    let score = route.windows(2).map(|w| matrix.dist_i64(w[0], w[1])).sum();
    let free = Record {
        score,
        indices: Some(route),
    };

    let mut flat = Record::EMPTY;
    let mut fai = Record::EMPTY;
    // One triangle started on a leg, one started at its first turnpoint.
    let guesses = [
        [0, n / 6, n / 2, n * 5 / 6, n - 1],
        [0, 0, n / 3, n * 2 / 3, n - 1],
    ];
    for guess in guesses {
        let [p1, p2, p3, p4, p5] = guess;
        let a = matrix.dist_i64(p2, p3);
        let b = matrix.dist_i64(p3, p4);
        let c = matrix.dist_i64(p2, p4);
        let d = matrix.dist_i64(p1, p5);
        let sum = a + b + c;
        if 5 * d > sum {
            continue;
        }
        let score = sum - d;
        let sum7 = 7 * sum;
        let record = if 25 * a >= sum7 && 25 * b >= sum7 && 25 * c >= sum7 {
            &mut fai
        } else {
            &mut flat
        };
        if score > record.score {
            *record = Record {
                score,
                indices: Some(guess),
            };
        }
    }
    (free, flat, fai)
}

/// Floor division of a pruning gap by a per-step drift; zero (never skip
/// beyond the clamp) when the drift is zero.
#[inline]
fn div_or_zero(gap: i64, per_step: i64) -> i64 {
    if per_step <= 0 {
        0
    } else {
        gap / per_step
    }
}

/// A scan always advances by at least one position.
#[inline]
fn clamp_step(step: i64) -> usize {
    if step < 1 {
        1
    } else {
        step as usize
    }
}
