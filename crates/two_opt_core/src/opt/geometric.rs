use std::time::Instant;

use crate::kdtree::KdTree;
use crate::stats::OptimizationStats;
use crate::tour::Tour;

use super::{MIN_TOUR_SIZE_FOR_SWAP, TwoOptTuning, degenerate_stats, log_progress, warn_if_capped};

/// FRNN-pruned best-improvement 2-opt. Candidates for each vertex come from a
/// k-d tree query whose radius scales with the local edge lengths, so swap
/// partners stay spatially plausible. The tree indexes a snapshot of the tour
/// and is rebuilt every `geometric_rebuild_interval` swaps; ids bridge stale
/// snapshots back to live positions.
pub fn geometric_2opt(tour: &mut Tour, tuning: &TwoOptTuning) -> OptimizationStats {
    let n = tour.len();
    log::info!("geometric: start n={n}");
    if n < MIN_TOUR_SIZE_FOR_SWAP {
        return degenerate_stats(tour);
    }

    let mut stats = OptimizationStats {
        initial_length: tour.length(),
        ..OptimizationStats::default()
    };
    let mut tree = KdTree::build(tour.points());
    let started = Instant::now();

    let mut improved = true;
    while improved && stats.iterations < tuning.max_iterations {
        improved = false;
        stats.iterations += 1;

        let mut best_gain = tuning.min_improvement;
        let mut best_pair: Option<(usize, usize)> = None;

        for i in 0..n - 2 {
            let here = tour.get(i);
            let prev = tour.get((i + n - 1) % n);
            let next = tour.get((i + 1) % n);
            let avg_edge = (prev.dist(&here) + here.dist(&next)) / 2.0;
            let mut radius =
                (avg_edge * tuning.geometric_radius_factor).max(tuning.geometric_radius_floor);

            let mut neighbors = tree.find_neighbors(&here, radius);
            stats.num_visited += tree.nodes_visited();

            // One enlargement when the local density is too thin.
            if neighbors.len() < tuning.geometric_min_neighbors {
                radius *= 2.0;
                neighbors = tree.find_neighbors(&here, radius);
                stats.num_visited += tree.nodes_visited();
            }

            for neighbor in &neighbors {
                let Some(j) = tour.position_of(neighbor.id) else {
                    continue;
                };
                if j > i + 1 && !(i == 0 && j == n - 1) {
                    let gain = tour.two_opt_gain(i, j);
                    stats.total_comparisons += 1;
                    if gain > best_gain {
                        best_gain = gain;
                        best_pair = Some((i, j));
                    }
                }
            }
        }

        if let Some((i, j)) = best_pair {
            tour.apply_two_opt_swap(i, j);
            stats.num_swaps += 1;
            improved = true;

            if stats.num_swaps % tuning.geometric_rebuild_interval == 0 {
                tree = KdTree::build(tour.points());
            }
        }

        log_progress("geometric", &stats, tour);
    }

    warn_if_capped("geometric", &stats, tuning);
    stats.cpu_time = started.elapsed().as_secs_f64();
    stats.final_length = tour.length();
    log::info!("geometric: complete {stats}");

    stats
}

#[cfg(test)]
mod tests {
    use super::geometric_2opt;
    use crate::instance::{generate_random_points, nearest_neighbor_tour};
    use crate::opt::TwoOptTuning;
    use crate::point::Point;
    use crate::tour::Tour;

    #[test]
    fn uncrosses_the_square() {
        let mut tour = Tour::new(vec![
            Point::new(0.0, 0.0, 0),
            Point::new(1.0, 1.0, 2),
            Point::new(1.0, 0.0, 1),
            Point::new(0.0, 1.0, 3),
        ]);
        let stats = geometric_2opt(&mut tour, &TwoOptTuning::default());

        assert!((stats.final_length - 4.0).abs() < 1e-9);
        assert_eq!(stats.num_swaps, 1);
    }

    #[test]
    fn accumulates_kd_tree_visits() {
        let points = generate_random_points(80, 42);
        let mut tour = nearest_neighbor_tour(&points, 0);
        let stats = geometric_2opt(&mut tour, &TwoOptTuning::default());

        assert!(stats.num_visited > 0);
        assert!(stats.num_swaps >= 1);
    }

    #[test]
    fn prunes_comparisons_relative_to_basic() {
        let points = generate_random_points(100, 42);
        let tuning = TwoOptTuning::default();

        let mut geometric_tour = nearest_neighbor_tour(&points, 0);
        let geometric_stats = geometric_2opt(&mut geometric_tour, &tuning);

        let mut basic_tour = nearest_neighbor_tour(&points, 0);
        let basic_stats = crate::opt::basic_2opt(&mut basic_tour, &tuning);

        let per_pass_geometric =
            geometric_stats.total_comparisons as f64 / geometric_stats.iterations.max(1) as f64;
        let per_pass_basic =
            basic_stats.total_comparisons as f64 / basic_stats.iterations.max(1) as f64;
        assert!(per_pass_geometric < per_pass_basic);
    }

    #[test]
    fn is_deterministic_for_a_fixed_input() {
        let points = generate_random_points(70, 8);
        let mut first = nearest_neighbor_tour(&points, 0);
        let mut second = nearest_neighbor_tour(&points, 0);

        geometric_2opt(&mut first, &TwoOptTuning::default());
        geometric_2opt(&mut second, &TwoOptTuning::default());

        let ids_first: Vec<usize> = first.points().iter().map(|p| p.id).collect();
        let ids_second: Vec<usize> = second.points().iter().map(|p| p.id).collect();
        assert_eq!(ids_first, ids_second);
    }

    #[test]
    fn survives_frequent_rebuilds() {
        let points = generate_random_points(64, 31);
        let mut tour = nearest_neighbor_tour(&points, 0);
        let tuning = TwoOptTuning {
            geometric_rebuild_interval: 1,
            ..TwoOptTuning::default()
        };
        let stats = geometric_2opt(&mut tour, &tuning);

        assert!(tour.is_valid_permutation_of(&points));
        assert!(stats.final_length <= stats.initial_length);
    }
}
