use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

use crate::error::{Error, Result};
use crate::point::Point;
use crate::tour::Tour;

const CLUSTER_CENTER_MIN: f64 = 0.1;
const CLUSTER_CENTER_MAX: f64 = 0.9;
const CLUSTER_STD_DEV: f64 = 0.05;

/// Uniform points in the unit square with ids `0..n`. Deterministic for a
/// given seed.
pub fn generate_random_points(n: usize, seed: u64) -> Vec<Point> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|id| {
            Point::new(
                rng.random_range(0.0..1.0),
                rng.random_range(0.0..1.0),
                id,
            )
        })
        .collect()
}

/// Clustered points in the unit square: `num_clusters` centers drawn
/// uniformly from the inner square, members scattered normally around a
/// uniformly chosen center and clamped to the domain.
pub fn generate_clustered_points(n: usize, num_clusters: usize, seed: u64) -> Result<Vec<Point>> {
    if num_clusters == 0 {
        return Err(Error::invalid_input("num_clusters must be > 0"));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let spread = Normal::new(0.0, CLUSTER_STD_DEV)
        .map_err(|e| Error::invalid_data(format!("cluster spread distribution: {e}")))?;

    let centers: Vec<(f64, f64)> = (0..num_clusters)
        .map(|_| {
            (
                rng.random_range(CLUSTER_CENTER_MIN..CLUSTER_CENTER_MAX),
                rng.random_range(CLUSTER_CENTER_MIN..CLUSTER_CENTER_MAX),
            )
        })
        .collect();

    Ok((0..n)
        .map(|id| {
            let (cx, cy) = centers[rng.random_range(0..num_clusters)];
            let x = (cx + spread.sample(&mut rng)).clamp(0.0, 1.0);
            let y = (cy + spread.sample(&mut rng)).clamp(0.0, 1.0);
            Point::new(x, y, id)
        })
        .collect())
}

/// Greedy nearest-neighbor tour starting from `points[start_idx]`.
/// `start_idx` must be in range for a non-empty input.
pub fn nearest_neighbor_tour(points: &[Point], start_idx: usize) -> Tour {
    if points.is_empty() {
        return Tour::new(Vec::new());
    }

    let n = points.len();
    let mut ordered = Vec::with_capacity(n);
    let mut visited = vec![false; n];

    let mut current = start_idx;
    ordered.push(points[current]);
    visited[current] = true;

    for _ in 1..n {
        let mut min_dist = f64::INFINITY;
        let mut next = current;
        for (idx, candidate) in points.iter().enumerate() {
            if !visited[idx] {
                let dist = points[current].dist(candidate);
                if dist < min_dist {
                    min_dist = dist;
                    next = idx;
                }
            }
        }
        ordered.push(points[next]);
        visited[next] = true;
        current = next;
    }

    Tour::new(ordered)
}

/// Best nearest-neighbor tour over the first `min(num_starts, n)` start
/// vertices.
pub fn best_nearest_neighbor_tour(points: &[Point], num_starts: usize) -> Tour {
    if points.is_empty() {
        return Tour::new(Vec::new());
    }

    let starts = num_starts.min(points.len()).max(1);
    let mut best: Option<(Tour, f64)> = None;

    for start in 0..starts {
        let tour = nearest_neighbor_tour(points, start);
        let length = tour.length();
        if best.as_ref().is_none_or(|(_, best_len)| length < *best_len) {
            best = Some((tour, length));
        }
    }

    match best {
        Some((tour, _)) => tour,
        None => Tour::new(Vec::new()),
    }
}
