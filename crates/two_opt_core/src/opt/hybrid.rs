use std::time::Instant;

use crate::kdtree::KdTree;
use crate::stats::OptimizationStats;
use crate::tour::Tour;

use super::{
    MIN_TOUR_SIZE_FOR_SWAP, TwoOptTuning, activate_window, collect_active, degenerate_stats,
    log_progress, warn_if_capped,
};

/// Combined pruning: adaptive FRNN around each *active* vertex, with the
/// candidate's position required to be active as well. Swaps re-activate wide
/// (±`hybrid_activation_window`) neighborhoods; an empty pass gets one
/// deterministic escape that re-activates every second position before the
/// search is allowed to stop.
///
/// Candidate ranking uses the exact Euclidean gain unless
/// `squared_gain_ranking` is set, in which case the cheaper squared-distance
/// proxy decides and accepted swaps may occasionally lengthen the tour.
pub fn hybrid_2opt(tour: &mut Tour, tuning: &TwoOptTuning) -> OptimizationStats {
    let n = tour.len();
    log::info!("hybrid: start n={n}");
    if n < MIN_TOUR_SIZE_FOR_SWAP {
        return degenerate_stats(tour);
    }

    let mut stats = OptimizationStats {
        initial_length: tour.length(),
        ..OptimizationStats::default()
    };
    let mut tree = KdTree::build(tour.points()).with_adaptive_radius_cap(tuning.adaptive_radius_cap);
    let mut active = vec![true; n];
    let started = Instant::now();

    let mut improved = true;
    let mut escaped = false;
    while improved && stats.iterations < tuning.max_iterations {
        improved = false;
        stats.iterations += 1;

        let active_indices = collect_active(&active);
        stats.active_nodes = active_indices.len();

        let mut best_gain = tuning.min_improvement;
        let mut best_pair: Option<(usize, usize)> = None;

        for &i in &active_indices {
            if i >= n - 2 {
                continue;
            }

            let here = tour.get(i);
            let edge = here.dist(&tour.get((i + 1) % n));
            let radius = (edge * tuning.hybrid_radius_factor).max(tuning.hybrid_radius_floor);

            let neighbors =
                tree.find_neighbors_adaptive(&here, radius, tuning.hybrid_min_neighbors);
            stats.num_visited += tree.nodes_visited();

            for neighbor in &neighbors {
                let Some(j) = tour.position_of(neighbor.id) else {
                    continue;
                };
                if j > i + 1 && !(i == 0 && j == n - 1) && active[j] {
                    let gain = if tuning.squared_gain_ranking {
                        tour.two_opt_gain_squared(i, j)
                    } else {
                        tour.two_opt_gain(i, j)
                    };
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
            escaped = false;

            active.fill(false);
            activate_window(&mut active, i, tuning.hybrid_activation_window);
            activate_window(&mut active, j, tuning.hybrid_activation_window);

            if stats.num_swaps % tuning.hybrid_rebuild_interval == 0 {
                tree = KdTree::build(tour.points())
                    .with_adaptive_radius_cap(tuning.adaptive_radius_cap);
            }
        } else if !escaped {
            // One escape per dead end: re-activate every second position up
            // to a target well beyond the current active count.
            let target = (active_indices.len() + tuning.hybrid_top_up).max(n / 4).min(n);
            active.fill(false);
            let mut idx = 0;
            while idx < target {
                active[idx] = true;
                idx += 2;
            }
            escaped = true;
            improved = true;
        }

        log_progress("hybrid", &stats, tour);
    }

    warn_if_capped("hybrid", &stats, tuning);
    stats.cpu_time = started.elapsed().as_secs_f64();
    stats.final_length = tour.length();
    log::info!("hybrid: complete {stats}");

    stats
}

#[cfg(test)]
mod tests {
    use super::hybrid_2opt;
    use crate::instance::{generate_random_points, nearest_neighbor_tour};
    use crate::opt::TwoOptTuning;

    #[test]
    fn improves_the_seeded_instance() {
        let points = generate_random_points(100, 42);
        let mut tour = nearest_neighbor_tour(&points, 0);
        let stats = hybrid_2opt(&mut tour, &TwoOptTuning::default());

        assert!(tour.is_valid_permutation_of(&points));
        assert!(stats.final_length <= stats.initial_length);
        assert!(stats.num_swaps >= 1);
        assert!(stats.num_visited > 0);
    }

    #[test]
    fn exact_gain_ranking_never_lengthens_the_tour() {
        let points = generate_random_points(90, 5);
        let mut tour = nearest_neighbor_tour(&points, 0);
        let before = tour.length();
        let stats = hybrid_2opt(&mut tour, &TwoOptTuning::default());

        assert!(stats.final_length <= before + 1e-9);
    }

    #[test]
    fn squared_ranking_still_returns_a_valid_permutation() {
        let points = generate_random_points(90, 5);
        let mut tour = nearest_neighbor_tour(&points, 0);
        let tuning = TwoOptTuning {
            squared_gain_ranking: true,
            ..TwoOptTuning::default()
        };
        let stats = hybrid_2opt(&mut tour, &tuning);

        assert!(tour.is_valid_permutation_of(&points));
        assert!(stats.num_swaps >= 1);
    }

    #[test]
    fn runs_are_deterministic() {
        let points = generate_random_points(75, 19);
        let mut first = nearest_neighbor_tour(&points, 0);
        let mut second = nearest_neighbor_tour(&points, 0);

        let stats_first = hybrid_2opt(&mut first, &TwoOptTuning::default());
        let stats_second = hybrid_2opt(&mut second, &TwoOptTuning::default());

        assert_eq!(stats_first.num_swaps, stats_second.num_swaps);
        let ids_first: Vec<usize> = first.points().iter().map(|p| p.id).collect();
        let ids_second: Vec<usize> = second.points().iter().map(|p| p.id).collect();
        assert_eq!(ids_first, ids_second);
    }
}
