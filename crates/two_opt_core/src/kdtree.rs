use std::cell::Cell;
use std::collections::BinaryHeap;

use crate::point::Point;

const ADAPTIVE_RADIUS_GROWTH: f64 = 1.5;
/// Default ceiling for adaptive radius growth, sized for unit-square
/// instances. Widen via [`KdTree::with_adaptive_radius_cap`] for other
/// coordinate domains.
const DEFAULT_ADAPTIVE_RADIUS_CAP: f64 = 2.0;

struct KdNode {
    point: Point,
    depth: usize,
    left: Option<Box<KdNode>>,
    right: Option<Box<KdNode>>,
}

/// Static 2D k-d tree over a snapshot of points.
///
/// Built once from a point set and never mutated; owners rebuild wholesale
/// when their data has drifted far enough. Even depths split on `x`, odd
/// depths on `y`, with the axis-median of each range at the subtree root.
pub struct KdTree {
    root: Option<Box<KdNode>>,
    size: usize,
    // Instrumentation only. Every public query resets it; accumulate across
    // queries on the caller side.
    visited: Cell<usize>,
    adaptive_radius_cap: f64,
}

impl KdTree {
    pub fn build(points: &[Point]) -> Self {
        let mut work = points.to_vec();
        let n = work.len();
        let root = build_node(&mut work, 0, 0, n);
        Self {
            root,
            size: n,
            visited: Cell::new(0),
            adaptive_radius_cap: DEFAULT_ADAPTIVE_RADIUS_CAP,
        }
    }

    pub fn with_adaptive_radius_cap(mut self, cap: f64) -> Self {
        self.adaptive_radius_cap = cap;
        self
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Nodes entered by the most recent query.
    pub fn nodes_visited(&self) -> usize {
        self.visited.get()
    }

    pub fn reset_nodes_visited(&self) {
        self.visited.set(0);
    }

    /// Fixed-radius near neighbors: every indexed point within `radius` of
    /// `query` (inclusive). Result order is unspecified.
    pub fn find_neighbors(&self, query: &Point, radius: f64) -> Vec<Point> {
        self.visited.set(0);
        let mut neighbors = Vec::new();
        if let Some(root) = &self.root {
            self.collect_in_radius(root, query, radius * radius, &mut neighbors);
        }
        neighbors
    }

    /// Closest indexed point to `query`, or a default point for an empty
    /// tree.
    pub fn find_nearest_neighbor(&self, query: &Point) -> Point {
        let Some(root) = &self.root else {
            return Point::default();
        };

        self.visited.set(0);
        let mut best = root.point;
        let mut best_dist_sq = query.dist_sq(&best);
        self.search_nearest(root, query, &mut best, &mut best_dist_sq);
        best
    }

    /// The `k` closest indexed points, ordered closest-first.
    pub fn find_k_nearest_neighbors(&self, query: &Point, k: usize) -> Vec<Point> {
        if k == 0 {
            return Vec::new();
        }

        self.visited.set(0);
        let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::with_capacity(k + 1);
        if let Some(root) = &self.root {
            self.search_k_nearest(root, query, k, &mut heap);
        }
        heap.into_sorted_vec()
            .into_iter()
            .map(|entry| entry.point)
            .collect()
    }

    /// FRNN with density-adaptive radius: grows the radius by 1.5x until at
    /// least `min_neighbors` points are found or the radius cap is reached,
    /// then returns the last result.
    pub fn find_neighbors_adaptive(
        &self,
        query: &Point,
        base_radius: f64,
        min_neighbors: usize,
    ) -> Vec<Point> {
        let mut radius = base_radius;
        let mut neighbors = self.find_neighbors(query, radius);
        while neighbors.len() < min_neighbors && radius < self.adaptive_radius_cap {
            radius *= ADAPTIVE_RADIUS_GROWTH;
            neighbors = self.find_neighbors(query, radius);
        }
        neighbors
    }

    fn enter(&self) {
        self.visited.set(self.visited.get() + 1);
    }

    fn collect_in_radius(
        &self,
        node: &KdNode,
        query: &Point,
        radius_sq: f64,
        out: &mut Vec<Point>,
    ) {
        self.enter();

        if node.point.dist_sq(query) <= radius_sq {
            out.push(node.point);
        }

        let diff = query.axis(node.depth) - node.point.axis(node.depth);
        let (near, far) = if diff <= 0.0 {
            (&node.left, &node.right)
        } else {
            (&node.right, &node.left)
        };

        if let Some(child) = near {
            self.collect_in_radius(child, query, radius_sq, out);
        }
        // The far side can only contribute if the splitting plane lies within
        // the search radius.
        if diff * diff <= radius_sq {
            if let Some(child) = far {
                self.collect_in_radius(child, query, radius_sq, out);
            }
        }
    }

    fn search_nearest(
        &self,
        node: &KdNode,
        query: &Point,
        best: &mut Point,
        best_dist_sq: &mut f64,
    ) {
        self.enter();

        let dist_sq = node.point.dist_sq(query);
        if dist_sq < *best_dist_sq {
            *best_dist_sq = dist_sq;
            *best = node.point;
        }

        let diff = query.axis(node.depth) - node.point.axis(node.depth);
        let (near, far) = if diff <= 0.0 {
            (&node.left, &node.right)
        } else {
            (&node.right, &node.left)
        };

        if let Some(child) = near {
            self.search_nearest(child, query, best, best_dist_sq);
        }
        if diff * diff < *best_dist_sq {
            if let Some(child) = far {
                self.search_nearest(child, query, best, best_dist_sq);
            }
        }
    }

    fn search_k_nearest(
        &self,
        node: &KdNode,
        query: &Point,
        k: usize,
        heap: &mut BinaryHeap<HeapEntry>,
    ) {
        self.enter();

        let dist_sq = node.point.dist_sq(query);
        if heap.len() < k {
            heap.push(HeapEntry {
                dist_sq,
                point: node.point,
            });
        } else if heap.peek().is_some_and(|worst| dist_sq < worst.dist_sq) {
            heap.pop();
            heap.push(HeapEntry {
                dist_sq,
                point: node.point,
            });
        }

        let diff = query.axis(node.depth) - node.point.axis(node.depth);
        let (near, far) = if diff <= 0.0 {
            (&node.left, &node.right)
        } else {
            (&node.right, &node.left)
        };

        if let Some(child) = near {
            self.search_k_nearest(child, query, k, heap);
        }
        if diff * diff < worst_dist_sq(heap, k) {
            if let Some(child) = far {
                self.search_k_nearest(child, query, k, heap);
            }
        }
    }
}

fn worst_dist_sq(heap: &BinaryHeap<HeapEntry>, k: usize) -> f64 {
    if heap.len() < k {
        f64::INFINITY
    } else {
        heap.peek().map_or(f64::INFINITY, |entry| entry.dist_sq)
    }
}

fn build_node(
    points: &mut [Point],
    depth: usize,
    start: usize,
    end: usize,
) -> Option<Box<KdNode>> {
    if start >= end {
        return None;
    }

    let mid = (start + end) / 2;
    points[start..end].select_nth_unstable_by(mid - start, |a, b| {
        a.axis(depth).total_cmp(&b.axis(depth))
    });

    let point = points[mid];
    let left = build_node(points, depth + 1, start, mid);
    let right = build_node(points, depth + 1, mid + 1, end);

    Some(Box::new(KdNode {
        point,
        depth,
        left,
        right,
    }))
}

/// Max-heap entry keyed by squared distance; the heap top is the worst of the
/// current k best.
struct HeapEntry {
    dist_sq: f64,
    point: Point,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.dist_sq.total_cmp(&other.dist_sq).is_eq()
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.dist_sq.total_cmp(&other.dist_sq)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::KdTree;
    use crate::instance::generate_random_points;
    use crate::point::Point;

    fn unit_square_corners() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0, 0),
            Point::new(1.0, 0.0, 1),
            Point::new(1.0, 1.0, 2),
            Point::new(0.0, 1.0, 3),
        ]
    }

    fn ids(points: &[Point]) -> HashSet<usize> {
        points.iter().map(|p| p.id).collect()
    }

    #[test]
    fn build_records_input_size() {
        let tree = KdTree::build(&unit_square_corners());
        assert_eq!(tree.size(), 4);
        assert!(!tree.is_empty());

        let empty = KdTree::build(&[]);
        assert_eq!(empty.size(), 0);
        assert!(empty.is_empty());
    }

    #[test]
    fn empty_tree_answers_queries_with_defaults() {
        let tree = KdTree::build(&[]);
        let query = Point::new(0.5, 0.5, 0);

        assert!(tree.find_neighbors(&query, 10.0).is_empty());
        assert!(tree.find_k_nearest_neighbors(&query, 3).is_empty());
        assert!(tree.find_neighbors_adaptive(&query, 0.1, 5).is_empty());
        assert_eq!(tree.find_nearest_neighbor(&query), Point::default());
    }

    #[test]
    fn corner_query_radius_straddles_half_diagonal() {
        let tree = KdTree::build(&unit_square_corners());
        let center = Point::new(0.5, 0.5, 99);

        // Corners sit sqrt(0.5) ~ 0.7071 away from the center.
        assert_eq!(tree.find_neighbors(&center, 0.71).len(), 4);
        assert!(tree.find_neighbors(&center, 0.70).is_empty());
    }

    #[test]
    fn frnn_matches_brute_force_on_random_instance() {
        let points = generate_random_points(200, 7);
        let tree = KdTree::build(&points);

        for (query_idx, radius) in [(3_usize, 0.1_f64), (57, 0.25), (111, 0.5)] {
            let query = points[query_idx];
            let found = ids(&tree.find_neighbors(&query, radius));
            let expected: HashSet<usize> = points
                .iter()
                .filter(|p| p.dist(&query) <= radius)
                .map(|p| p.id)
                .collect();
            assert_eq!(found, expected, "query {query_idx} radius {radius}");
        }
    }

    #[test]
    fn nearest_neighbor_matches_brute_force() {
        let points = generate_random_points(150, 11);
        let tree = KdTree::build(&points);

        for query in [
            Point::new(0.1, 0.9, 1000),
            Point::new(0.5, 0.5, 1001),
            Point::new(0.99, 0.01, 1002),
        ] {
            let found = tree.find_nearest_neighbor(&query);
            let expected = points
                .iter()
                .min_by(|a, b| a.dist_sq(&query).total_cmp(&b.dist_sq(&query)))
                .expect("non-empty instance");
            assert!((found.dist(&query) - expected.dist(&query)).abs() < 1e-12);
        }
    }

    #[test]
    fn k_nearest_on_grid_is_ordered_closest_first() {
        // 5x2 integer grid.
        let points: Vec<Point> = (0..10)
            .map(|i| Point::new((i % 5) as f64, (i / 5) as f64, i))
            .collect();
        let tree = KdTree::build(&points);
        let query = Point::new(1.2, 0.3, 100);

        let found = tree.find_k_nearest_neighbors(&query, 3);
        assert_eq!(found.len(), 3);
        for pair in found.windows(2) {
            assert!(pair[0].dist(&query) <= pair[1].dist(&query));
        }

        let mut by_dist = points.clone();
        by_dist.sort_by(|a, b| a.dist_sq(&query).total_cmp(&b.dist_sq(&query)));
        assert_eq!(ids(&found), ids(&by_dist[..3]));
    }

    #[test]
    fn k_nearest_with_oversized_k_returns_everything() {
        let points = unit_square_corners();
        let tree = KdTree::build(&points);
        let found = tree.find_k_nearest_neighbors(&Point::new(0.0, 0.1, 50), 10);
        assert_eq!(found.len(), 4);
        assert_eq!(found[0].id, 0);
    }

    #[test]
    fn adaptive_search_grows_radius_until_quota_is_met() {
        let points = generate_random_points(100, 13);
        let tree = KdTree::build(&points);
        let query = points[0];

        let neighbors = tree.find_neighbors_adaptive(&query, 1e-6, 8);
        assert!(neighbors.len() >= 8);
    }

    #[test]
    fn adaptive_search_respects_radius_cap() {
        let points = vec![Point::new(0.0, 0.0, 0), Point::new(10.0, 10.0, 1)];
        let tree = KdTree::build(&points).with_adaptive_radius_cap(0.5);

        // The far point can never enter the capped radius.
        let neighbors = tree.find_neighbors_adaptive(&Point::new(0.0, 0.0, 9), 0.1, 2);
        assert_eq!(neighbors.len(), 1);
    }

    #[test]
    fn visit_counter_resets_per_query() {
        let points = generate_random_points(64, 3);
        let tree = KdTree::build(&points);

        tree.find_neighbors(&points[0], 0.2);
        let first = tree.nodes_visited();
        assert!(first > 0);
        assert!(first <= points.len());

        tree.reset_nodes_visited();
        assert_eq!(tree.nodes_visited(), 0);

        tree.find_nearest_neighbor(&points[1]);
        assert!(tree.nodes_visited() > 0);
    }
}
