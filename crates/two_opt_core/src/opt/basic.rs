use std::time::Instant;

use crate::stats::OptimizationStats;
use crate::tour::Tour;

use super::{MIN_TOUR_SIZE_FOR_SWAP, TwoOptTuning, degenerate_stats, log_progress, warn_if_capped};

/// Exhaustive best-improvement 2-opt: every eligible `(i, j)` pair is scored
/// each pass. The returned tour is a true 2-opt local optimum.
pub fn basic_2opt(tour: &mut Tour, tuning: &TwoOptTuning) -> OptimizationStats {
    let n = tour.len();
    log::info!("basic: start n={n}");
    if n < MIN_TOUR_SIZE_FOR_SWAP {
        return degenerate_stats(tour);
    }

    let mut stats = OptimizationStats {
        initial_length: tour.length(),
        ..OptimizationStats::default()
    };
    let started = Instant::now();

    let mut improved = true;
    while improved && stats.iterations < tuning.max_iterations {
        improved = false;
        stats.iterations += 1;

        let mut best_gain = tuning.min_improvement;
        let mut best_pair: Option<(usize, usize)> = None;

        for i in 0..n - 2 {
            for j in (i + 2)..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                let gain = tour.two_opt_gain(i, j);
                stats.total_comparisons += 1;
                if gain > best_gain {
                    best_gain = gain;
                    best_pair = Some((i, j));
                }
            }
        }

        if let Some((i, j)) = best_pair {
            tour.apply_two_opt_swap(i, j);
            stats.num_swaps += 1;
            improved = true;
        }

        log_progress("basic", &stats, tour);
    }

    warn_if_capped("basic", &stats, tuning);
    stats.cpu_time = started.elapsed().as_secs_f64();
    stats.final_length = tour.length();
    log::info!("basic: complete {stats}");

    stats
}

#[cfg(test)]
mod tests {
    use super::basic_2opt;
    use crate::instance::{generate_random_points, nearest_neighbor_tour};
    use crate::opt::TwoOptTuning;
    use crate::point::Point;
    use crate::tour::Tour;

    #[test]
    fn uncrosses_the_square_in_exactly_one_swap() {
        let mut tour = Tour::new(vec![
            Point::new(0.0, 0.0, 0),
            Point::new(1.0, 1.0, 2),
            Point::new(1.0, 0.0, 1),
            Point::new(0.0, 1.0, 3),
        ]);
        let stats = basic_2opt(&mut tour, &TwoOptTuning::default());

        assert!((stats.initial_length - (2.0 + 2.0 * 2.0_f64.sqrt())).abs() < 1e-9);
        assert!((stats.final_length - 4.0).abs() < 1e-9);
        assert_eq!(stats.num_swaps, 1);
    }

    #[test]
    fn reduces_seeded_nn_tour_by_at_least_ten_percent() {
        let points = generate_random_points(100, 42);
        let mut tour = nearest_neighbor_tour(&points, 0);
        let stats = basic_2opt(&mut tour, &TwoOptTuning::default());

        assert!(stats.improvement_ratio() >= 0.10);
        assert!(stats.iterations < 1_000);
    }

    #[test]
    fn result_is_a_two_opt_local_optimum() {
        let points = generate_random_points(60, 17);
        let mut tour = nearest_neighbor_tour(&points, 0);
        let tuning = TwoOptTuning::default();
        basic_2opt(&mut tour, &tuning);

        let n = tour.len();
        for i in 0..n - 2 {
            for j in (i + 2)..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                assert!(
                    tour.two_opt_gain(i, j) <= tuning.min_improvement,
                    "pair ({i}, {j}) still improves"
                );
            }
        }
    }

    #[test]
    fn is_deterministic_for_a_fixed_input() {
        let points = generate_random_points(50, 23);
        let mut first = nearest_neighbor_tour(&points, 0);
        let mut second = nearest_neighbor_tour(&points, 0);

        let stats_first = basic_2opt(&mut first, &TwoOptTuning::default());
        let stats_second = basic_2opt(&mut second, &TwoOptTuning::default());

        assert_eq!(stats_first.num_swaps, stats_second.num_swaps);
        let ids_first: Vec<usize> = first.points().iter().map(|p| p.id).collect();
        let ids_second: Vec<usize> = second.points().iter().map(|p| p.id).collect();
        assert_eq!(ids_first, ids_second);
    }

    #[test]
    fn counts_one_comparison_per_candidate_pair() {
        // 5 points: pairs with j >= i+2 minus the wrap pair = 5 per pass.
        let points = generate_random_points(5, 2);
        let mut tour = Tour::new(points);
        let stats = basic_2opt(&mut tour, &TwoOptTuning::default());
        assert_eq!(stats.total_comparisons, 5 * stats.iterations);
    }
}
