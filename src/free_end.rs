//! Best final leg per turnpoint.
//!
//! For a free-distance path whose last turnpoint is `k`, the best endpoint is
//! the fix at or after `k` farthest from it. [`FreeEndTable`] precomputes
//! that distance and endpoint for every `k`, so the search reads its final
//! leg in O(1).

use crate::matrix::DistanceMatrix;

/// Farthest reachable endpoint at or after one turnpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreeEnd {
    /// Distance to the best endpoint in meters.
    pub meters: u32,
    /// Index of the best endpoint.
    pub end: usize,
}

/// Best final leg for every candidate last turnpoint.
#[derive(Debug, Clone)]
pub struct FreeEndTable {
    entries: Vec<FreeEnd>,
}

impl FreeEndTable {
    /// Build the table, one right-to-left maximum scan per turnpoint.
    ///
    /// Each scan skips ahead by `(runningMax − candidate) / maxConsecutive`
    /// positions: no skipped fix can close that gap, since a fix one index
    /// away can differ by at most the maximum consecutive-fix distance. A
    /// skipped fix is always *strictly* below the running maximum, so ties
    /// are never lost and the table is exact. Zero `maxConsecutive`
    /// (degenerate all-coincident tracks) disables skipping entirely.
    pub fn build(matrix: &DistanceMatrix) -> Self {
        Self::build_with_step(matrix, i64::from(matrix.max_consecutive.meters))
    }

    /// Build with plain step-1 scans; for cross-checking the pruned build.
    pub fn build_unpruned(matrix: &DistanceMatrix) -> Self {
        Self::build_with_step(matrix, 0)
    }

    fn build_with_step(matrix: &DistanceMatrix, per_step: i64) -> Self {
        let n = matrix.len();
        let mut entries = vec![FreeEnd::default(); n];
        for k in 0..n {
            let mut best = FreeEnd { meters: 0, end: n - 1 };
            let mut i = (n - 1) as i64;
            while i >= k as i64 {
                let f = matrix.dist(k, i as usize);
                if f >= best.meters {
                    best = FreeEnd { meters: f, end: i as usize };
                }
                let mut step = if per_step > 0 {
                    (i64::from(best.meters) - i64::from(f)) / per_step
                } else {
                    1
                };
                if step < 1 {
                    step = 1;
                }
                i -= step;
            }
            entries[k] = best;
        }
        Self { entries }
    }

    /// Best final leg for last turnpoint `k`.
    #[inline]
    pub fn best_end(&self, k: usize) -> FreeEnd {
        self.entries[k]
    }
}
