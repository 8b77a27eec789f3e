use std::time::Instant;

use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::stats::OptimizationStats;
use crate::tour::Tour;

use super::{
    MIN_TOUR_SIZE_FOR_SWAP, TwoOptTuning, activate_window, collect_active, degenerate_stats,
    log_progress, warn_if_capped,
};

/// Activation-pruned best-improvement 2-opt. Only positions whose activation
/// bit is set participate in a pass; a swap re-activates the neighborhoods of
/// its two endpoints and deactivates everything else. A pass that finds
/// nothing tops the active set up with seeded-random positions and retries,
/// so the search can leave activation-induced dead ends; once every position
/// is active an empty pass is a genuine local optimum and the loop stops.
pub fn approximate_2opt(tour: &mut Tour, tuning: &TwoOptTuning) -> OptimizationStats {
    let n = tour.len();
    log::info!("approximate: start n={n} seed={}", tuning.rng_seed);
    if n < MIN_TOUR_SIZE_FOR_SWAP {
        return degenerate_stats(tour);
    }

    let mut stats = OptimizationStats {
        initial_length: tour.length(),
        ..OptimizationStats::default()
    };
    let mut rng = SmallRng::seed_from_u64(tuning.rng_seed);
    let mut active = vec![true; n];
    let started = Instant::now();

    let mut improved = true;
    while improved && stats.iterations < tuning.max_iterations {
        improved = false;
        stats.iterations += 1;

        let active_indices = collect_active(&active);
        stats.active_nodes = active_indices.len();

        let mut best_gain = tuning.min_improvement;
        let mut best_pair: Option<(usize, usize)> = None;

        for (rank, &i) in active_indices.iter().enumerate() {
            for &j in &active_indices[rank + 1..] {
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

            active.fill(false);
            activate_window(&mut active, i, tuning.approximate_activation_window);
            activate_window(&mut active, j, tuning.approximate_activation_window);
        } else if top_up_random(&mut active, &mut rng, tuning.approximate_top_up) > 0 {
            // Dead end: widen the active set and keep searching.
            improved = true;
        }

        log_progress("approximate", &stats, tour);
    }

    warn_if_capped("approximate", &stats, tuning);
    stats.cpu_time = started.elapsed().as_secs_f64();
    stats.final_length = tour.length();
    log::info!("approximate: complete {stats}");

    stats
}

/// Activates up to `count` randomly chosen inactive positions. Returns how
/// many were newly activated; zero means the set was already full.
fn top_up_random(active: &mut [bool], rng: &mut SmallRng, count: usize) -> usize {
    let inactive = active.iter().filter(|flag| !**flag).count();
    let target = count.min(inactive);

    let mut added = 0;
    while added < target {
        let idx = rng.random_range(0..active.len());
        if !active[idx] {
            active[idx] = true;
            added += 1;
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::SmallRng};

    use super::{approximate_2opt, top_up_random};
    use crate::instance::{generate_random_points, nearest_neighbor_tour};
    use crate::opt::TwoOptTuning;

    #[test]
    fn improves_the_seeded_instance_and_reports_active_counts() {
        let points = generate_random_points(100, 42);
        let mut tour = nearest_neighbor_tour(&points, 0);
        let stats = approximate_2opt(&mut tour, &TwoOptTuning::default());

        assert!(tour.is_valid_permutation_of(&points));
        assert!(stats.final_length <= stats.initial_length);
        assert!(stats.num_swaps >= 1);
        assert!(stats.active_nodes >= 1);
        assert!(stats.active_nodes <= points.len());
    }

    #[test]
    fn fixed_seed_makes_runs_identical() {
        let points = generate_random_points(80, 3);
        let tuning = TwoOptTuning {
            rng_seed: 7,
            ..TwoOptTuning::default()
        };

        let mut first = nearest_neighbor_tour(&points, 0);
        let mut second = nearest_neighbor_tour(&points, 0);
        let stats_first = approximate_2opt(&mut first, &tuning);
        let stats_second = approximate_2opt(&mut second, &tuning);

        assert_eq!(stats_first.num_swaps, stats_second.num_swaps);
        assert_eq!(stats_first.iterations, stats_second.iterations);
        let ids_first: Vec<usize> = first.points().iter().map(|p| p.id).collect();
        let ids_second: Vec<usize> = second.points().iter().map(|p| p.id).collect();
        assert_eq!(ids_first, ids_second);
    }

    #[test]
    fn top_up_adds_exactly_the_requested_count() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut active = vec![false; 20];
        active[3] = true;

        let added = top_up_random(&mut active, &mut rng, 10);
        assert_eq!(added, 10);
        assert_eq!(active.iter().filter(|flag| **flag).count(), 11);
    }

    #[test]
    fn top_up_saturates_on_a_full_set() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut active = vec![true; 8];
        assert_eq!(top_up_random(&mut active, &mut rng, 10), 0);

        let mut nearly_full = vec![true; 8];
        nearly_full[2] = false;
        assert_eq!(top_up_random(&mut nearly_full, &mut rng, 10), 1);
        assert!(nearly_full.iter().all(|flag| *flag));
    }
}
