//! Pairwise distance matrix over a flight track.
//!
//! [`DistanceMatrix`] holds the great-circle distance in whole meters between
//! every pair of track points, stored as the upper triangle of a symmetric
//! matrix, plus the three straight-line records derived in the same pass:
//! the farthest pair overall, the farthest *consecutive* pair (the Lipschitz
//! bound that powers every pruning shortcut downstream), and the farthest
//! point from takeoff.
//!
//! Distances are `u32` meters; every sum or scaled comparison downstream is
//! carried out in `i64`, which leaves far more than the required 25× headroom
//! over any terrestrial leg.

use serde::{Deserialize, Serialize};

use crate::geo::PointTrig;
use crate::TrackPoint;

/// A straight-line record: a distance and the index pair achieving it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegRecord {
    /// Distance in whole meters.
    pub meters: u32,
    /// Index of the earlier point.
    pub from: usize,
    /// Index of the later point.
    pub to: usize,
}

/// Upper-triangular (i ≤ j) view over a flat backing store.
///
/// Row i holds columns i..n, so cell (i, j) lives at
/// `row_offset(i) + (j - i)`. Bounds are checked in debug builds only; the
/// search loops sit on top of this accessor and are index-hot.
#[derive(Debug, Clone)]
pub(crate) struct TriMatrix<T> {
    n: usize,
    cells: Vec<T>,
}

impl<T: Copy + Default> TriMatrix<T> {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            n,
            cells: vec![T::default(); n * (n + 1) / 2],
        }
    }

    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        debug_assert!(i <= j && j < self.n, "triangular access ({i}, {j}) out of range");
        i * self.n - i * (i + 1) / 2 + j
    }

    #[inline]
    pub(crate) fn get(&self, i: usize, j: usize) -> T {
        self.cells[self.offset(i, j)]
    }

    #[inline]
    pub(crate) fn set(&mut self, i: usize, j: usize, value: T) {
        let at = self.offset(i, j);
        self.cells[at] = value;
    }

    /// Split the backing store into per-row mutable slices (row i has n − i
    /// cells, columns i..n).
    pub(crate) fn rows_mut(&mut self) -> Vec<&mut [T]> {
        let n = self.n;
        let mut rows = Vec::with_capacity(n);
        let mut rest = self.cells.as_mut_slice();
        for i in 0..n {
            let (row, tail) = rest.split_at_mut(n - i);
            rows.push(row);
            rest = tail;
        }
        rows
    }
}

/// Symmetric integer-meter distance matrix with its derived records.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    n: usize,
    legs: TriMatrix<u32>,
    /// Farthest pair of points anywhere in the track.
    pub max_distance: LegRecord,
    /// Farthest pair of *consecutive* points. Bounds how much any leg can
    /// change when one endpoint index shifts by one.
    pub max_consecutive: LegRecord,
    /// Farthest point from the first fix (straight-distance-from-takeoff).
    pub max_takeoff: LegRecord,
}

impl DistanceMatrix {
    /// Build the matrix with one O(n²) pass over all pairs.
    ///
    /// Per-point trigonometry is precomputed once so each pair costs a single
    /// cosine/sqrt/asin. With the `parallel` feature the rows are filled on
    /// the rayon pool; the result is identical either way.
    pub fn build(points: &[TrackPoint]) -> Self {
        let n = points.len();
        let trig: Vec<PointTrig> = points.iter().map(PointTrig::new).collect();
        let mut legs = TriMatrix::new(n);

        fill_rows(&mut legs, &trig);

        // Derive the three records in a read-only sweep. Strict `>` keeps the
        // earliest achieving pair on ties.
        let mut max_distance = LegRecord::default();
        let mut max_consecutive = LegRecord::default();
        let mut max_takeoff = LegRecord::default();
        for i in 0..n {
            for j in (i + 1)..n {
                let meters = legs.get(i, j);
                if meters > max_distance.meters {
                    max_distance = LegRecord { meters, from: i, to: j };
                }
                if j == i + 1 && meters > max_consecutive.meters {
                    max_consecutive = LegRecord { meters, from: i, to: j };
                }
                if i == 0 && meters > max_takeoff.meters {
                    max_takeoff = LegRecord { meters, from: i, to: j };
                }
            }
        }

        Self {
            n,
            legs,
            max_distance,
            max_consecutive,
            max_takeoff,
        }
    }

    /// Number of track points.
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Distance in meters between points `i` and `j`, in either order.
    #[inline]
    pub fn dist(&self, i: usize, j: usize) -> u32 {
        if i <= j {
            self.legs.get(i, j)
        } else {
            self.legs.get(j, i)
        }
    }

    /// `dist(i, j)` widened for the search's signed arithmetic.
    #[inline]
    pub(crate) fn dist_i64(&self, i: usize, j: usize) -> i64 {
        i64::from(self.dist(i, j))
    }
}

#[cfg(not(feature = "parallel"))]
fn fill_rows(legs: &mut TriMatrix<u32>, trig: &[PointTrig]) {
    for (i, row) in legs.rows_mut().into_iter().enumerate() {
        fill_row(i, row, trig);
    }
}

#[cfg(feature = "parallel")]
fn fill_rows(legs: &mut TriMatrix<u32>, trig: &[PointTrig]) {
    use rayon::prelude::*;

    legs.rows_mut()
        .into_par_iter()
        .enumerate()
        .for_each(|(i, row)| fill_row(i, row, trig));
}

#[inline]
fn fill_row(i: usize, row: &mut [u32], trig: &[PointTrig]) {
    let ti = trig[i];
    for (k, cell) in row.iter_mut().enumerate() {
        *cell = ti.distance_to(&trig[i + k]);
    }
}
