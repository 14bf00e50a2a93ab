//! Best triangle closure per turnpoint bracket.
//!
//! For a triangle whose first turnpoint is `i` and last turnpoint is `j`, the
//! flight may start at any fix at or before `i` and end at any fix at or
//! after `j`; the scoring penalty is the distance between those two fixes.
//! [`ClosureTable`] precomputes, for every bracket (i, j), the smallest such
//! closing distance and the start/end fixes achieving it.
//!
//! Without this table the search would have to minimize the closing pair
//! inside its innermost loop, an O(n⁵) proposition; the table is filled once
//! in O(n²) by dynamic programming and read in O(1).

use crate::matrix::{DistanceMatrix, TriMatrix};

/// Smallest achievable closing leg for one turnpoint bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Closure {
    /// Closing distance in meters.
    pub meters: u32,
    /// Start fix (≤ first turnpoint) achieving it.
    pub start: usize,
    /// End fix (≥ last turnpoint) achieving it.
    pub end: usize,
}

/// Compact cell; indices stored as u32 to halve the table footprint.
#[derive(Debug, Clone, Copy, Default)]
struct Cell {
    meters: u32,
    start: u32,
    end: u32,
}

/// Minimum closing distance for every bracket i < j.
#[derive(Debug, Clone)]
pub struct ClosureTable {
    n: usize,
    cells: TriMatrix<Cell>,
}

impl ClosureTable {
    /// Fill the table from the distance matrix.
    ///
    /// Row 0 is a descending-j running minimum over `dist(0, j)`; each later
    /// row folds in the newly admitted start fix `i` and inherits the rest
    /// from row i − 1:
    ///
    /// `C(i, j) = min(dist(i, j), C(i, j+1), C(i−1, j))`
    ///
    /// Comparisons are strict, so on ties the entry discovered earliest in
    /// scan order wins — the same deterministic rule the rest of the search
    /// uses.
    pub fn build(matrix: &DistanceMatrix) -> Self {
        let n = matrix.len();
        let mut cells = TriMatrix::new(n);
        if n < 2 {
            return Self { n, cells };
        }

        let mut minimum = u32::MAX;
        let mut min_end = 0u32;
        for j in (1..n).rev() {
            let d = matrix.dist(0, j);
            if d < minimum {
                minimum = d;
                min_end = j as u32;
            }
            cells.set(0, j, Cell { meters: minimum, start: 0, end: min_end });
        }

        for i in 1..n.saturating_sub(1) {
            // Last column seeds the row minimum from the row above.
            let above = cells.get(i - 1, n - 1);
            let mut running = above;
            let d = matrix.dist(i, n - 1);
            if d < running.meters {
                running = Cell { meters: d, start: i as u32, end: (n - 1) as u32 };
            }
            cells.set(i, n - 1, running);

            for j in ((i + 1)..(n - 1)).rev() {
                let d = matrix.dist(i, j);
                if d < running.meters {
                    running = Cell { meters: d, start: i as u32, end: j as u32 };
                }
                let above = cells.get(i - 1, j);
                if above.meters < running.meters {
                    running = above;
                }
                cells.set(i, j, running);
            }
        }

        Self { n, cells }
    }

    /// Closure record for the bracket (i, j). Requires i < j.
    #[inline]
    pub fn closing(&self, i: usize, j: usize) -> Closure {
        debug_assert!(i < j && j < self.n);
        let cell = self.cells.get(i, j);
        Closure {
            meters: cell.meters,
            start: cell.start as usize,
            end: cell.end as usize,
        }
    }
}
