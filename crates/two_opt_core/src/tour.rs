use std::collections::{HashMap, HashSet};

use crate::point::Point;

/// A cyclic permutation of points interpreted as a closed polyline.
///
/// Alongside the point sequence the tour maintains an `id -> position` table
/// so spatial-index hits can be mapped back to tour positions in O(1). The
/// table is refreshed for exactly the index ranges a reversal touches, which
/// the short-side rule keeps small.
#[derive(Clone, Debug)]
pub struct Tour {
    points: Vec<Point>,
    positions: HashMap<usize, usize>,
}

impl Tour {
    pub fn new(points: Vec<Point>) -> Self {
        let positions = points
            .iter()
            .enumerate()
            .map(|(idx, p)| (p.id, idx))
            .collect();
        Self { points, positions }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn get(&self, idx: usize) -> Point {
        self.points[idx]
    }

    /// Current tour position of the point with the given id.
    pub fn position_of(&self, id: usize) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    /// Total cyclic edge length. Zero for fewer than two points.
    pub fn length(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        (0..n)
            .map(|i| self.points[i].dist(&self.points[(i + 1) % n]))
            .sum()
    }

    /// Reverses the index range `[i, j]` in place.
    pub fn reverse_segment(&mut self, i: usize, j: usize) {
        self.points[i..=j].reverse();
        self.reindex_range(i, j);
    }

    /// Reverses whichever of the two cyclic arcs between `i` and `j` is
    /// shorter. When the wrap-around arc wins, the same cyclic edge set is
    /// produced by reversing the prefix, the suffix, and then the whole tour;
    /// the result differs from a direct reversal only by rotation.
    pub fn smart_reverse_segment(&mut self, i: usize, j: usize) {
        let n = self.points.len();
        let (i, j) = if i <= j { (i, j) } else { (j, i) };

        let direct = j - i + 1;
        let wrap = n - direct;
        if direct <= wrap {
            self.reverse_segment(i, j);
        } else {
            self.points[..i].reverse();
            self.points[j + 1..].reverse();
            self.points.reverse();
            self.reindex_range(0, n - 1);
        }
    }

    /// Applies the 2-opt move that replaces edges `(i, i+1)` and `(j, j+1)`
    /// with `(i, j)` and `(i+1, j+1)`, i.e. reverses the arc `[i+1, j]`.
    pub fn apply_two_opt_swap(&mut self, i: usize, j: usize) {
        let (i, j) = if i <= j { (i, j) } else { (j, i) };
        self.smart_reverse_segment(i + 1, j);
    }

    /// Length reduction achieved by [`Tour::apply_two_opt_swap`] at `(i, j)`.
    /// Positive means the swap strictly shortens the tour. Adjacent pairs and
    /// the whole-tour pair `(0, n-1)` yield zero: neither changes the cyclic
    /// edge set.
    pub fn two_opt_gain(&self, i: usize, j: usize) -> f64 {
        let n = self.points.len();
        let (i, j) = if i <= j { (i, j) } else { (j, i) };
        if j <= i + 1 || (i == 0 && j == n - 1) {
            return 0.0;
        }

        let i_next = (i + 1) % n;
        let j_next = (j + 1) % n;

        let removed =
            self.points[i].dist(&self.points[i_next]) + self.points[j].dist(&self.points[j_next]);
        let added =
            self.points[i].dist(&self.points[j]) + self.points[i_next].dist(&self.points[j_next]);

        removed - added
    }

    /// Squared-distance variant of [`Tour::two_opt_gain`]. A ranking proxy
    /// only: sums of squared distances are not monotone in sums of distances,
    /// so a positive value here does not imply a genuinely improving swap.
    pub fn two_opt_gain_squared(&self, i: usize, j: usize) -> f64 {
        let n = self.points.len();
        let (i, j) = if i <= j { (i, j) } else { (j, i) };
        if j <= i + 1 || (i == 0 && j == n - 1) {
            return 0.0;
        }

        let i_next = (i + 1) % n;
        let j_next = (j + 1) % n;

        let removed = self.points[i].dist_sq(&self.points[i_next])
            + self.points[j].dist_sq(&self.points[j_next]);
        let added = self.points[i].dist_sq(&self.points[j])
            + self.points[i_next].dist_sq(&self.points[j_next]);

        removed - added
    }

    /// True iff this tour is a permutation of `originals`: same size, every
    /// id present exactly once.
    pub fn is_valid_permutation_of(&self, originals: &[Point]) -> bool {
        if self.points.len() != originals.len() {
            return false;
        }

        let mut seen: HashSet<usize> = HashSet::with_capacity(self.points.len());
        for point in &self.points {
            if !seen.insert(point.id) {
                return false;
            }
        }
        originals.iter().all(|point| seen.contains(&point.id))
    }

    fn reindex_range(&mut self, i: usize, j: usize) {
        for idx in i..=j {
            self.positions.insert(self.points[idx].id, idx);
        }
    }
}
