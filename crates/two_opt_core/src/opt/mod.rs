//! Best-improvement 2-opt local search in four candidate-pruning flavors.
//!
//! All variants share one acceptance rule: scan the pass's candidate pairs,
//! keep the single best gain, apply it when it clears `min_improvement`, and
//! stop at the first pass that applies nothing (or at the iteration cap).
//! They differ only in which `(i, j)` pairs a pass considers.

mod approximate;
mod basic;
mod geometric;
mod hybrid;

pub use approximate::approximate_2opt;
pub use basic::basic_2opt;
pub use geometric::geometric_2opt;
pub use hybrid::hybrid_2opt;

use crate::stats::OptimizationStats;
use crate::tour::Tour;

/// A 2-opt swap needs two non-adjacent edges, so four distinct vertices.
pub(crate) const MIN_TOUR_SIZE_FOR_SWAP: usize = 4;
pub(crate) const PROGRESS_LOG_INTERVAL: usize = 100;

/// Knobs shared by the four optimizers. Defaults carry the reference
/// parameterization; everything a caller might reasonably want to vary is a
/// field rather than a buried constant.
#[derive(Clone, Copy, Debug)]
pub struct TwoOptTuning {
    /// Hard cap on optimization passes. Hitting it is a successful stop.
    pub max_iterations: usize,
    /// Smallest gain worth applying.
    pub min_improvement: f64,
    /// FRNN radius as a multiple of the local average edge length.
    pub geometric_radius_factor: f64,
    pub geometric_radius_floor: f64,
    /// Below this neighbor count the radius is doubled once and re-queried.
    pub geometric_min_neighbors: usize,
    /// Swaps between wholesale k-d tree rebuilds.
    pub geometric_rebuild_interval: usize,
    /// Half-width of the positions re-activated around a swap endpoint.
    pub approximate_activation_window: usize,
    /// Random positions added to the active set on a pass with no swap.
    pub approximate_top_up: usize,
    pub hybrid_radius_factor: f64,
    pub hybrid_radius_floor: f64,
    pub hybrid_min_neighbors: usize,
    pub hybrid_activation_window: usize,
    pub hybrid_rebuild_interval: usize,
    /// Extra active positions targeted by the hybrid escape pass.
    pub hybrid_top_up: usize,
    /// Ceiling for adaptive FRNN radius growth (unit-square default).
    pub adaptive_radius_cap: f64,
    /// Rank hybrid candidates by the squared-distance gain proxy instead of
    /// the exact Euclidean gain. Faster, but accepted swaps are no longer
    /// guaranteed to shorten the tour.
    pub squared_gain_ranking: bool,
    /// Seed for the approximate optimizer's activation top-up.
    pub rng_seed: u64,
}

impl Default for TwoOptTuning {
    fn default() -> Self {
        Self {
            max_iterations: 1_000,
            min_improvement: 1e-9,
            geometric_radius_factor: 3.0,
            geometric_radius_floor: 0.1,
            geometric_min_neighbors: 5,
            geometric_rebuild_interval: 25,
            approximate_activation_window: 2,
            approximate_top_up: 10,
            hybrid_radius_factor: 4.0,
            hybrid_radius_floor: 0.15,
            hybrid_min_neighbors: 8,
            hybrid_activation_window: 4,
            hybrid_rebuild_interval: 30,
            hybrid_top_up: 15,
            adaptive_radius_cap: 2.0,
            squared_gain_ranking: false,
            rng_seed: 12_345,
        }
    }
}

/// Stats for a tour too small to host any swap.
pub(crate) fn degenerate_stats(tour: &Tour) -> OptimizationStats {
    let length = tour.length();
    OptimizationStats {
        initial_length: length,
        final_length: length,
        ..OptimizationStats::default()
    }
}

pub(crate) fn collect_active(active: &[bool]) -> Vec<usize> {
    active
        .iter()
        .enumerate()
        .filter_map(|(idx, flag)| flag.then_some(idx))
        .collect()
}

/// Marks the cyclic window `center - window ..= center + window`.
pub(crate) fn activate_window(active: &mut [bool], center: usize, window: usize) {
    let n = active.len();
    for offset in 0..=2 * window {
        active[(center + n + offset - window) % n] = true;
    }
}

pub(crate) fn log_progress(name: &str, stats: &OptimizationStats, tour: &Tour) {
    if stats.iterations % PROGRESS_LOG_INTERVAL == 0 {
        log::debug!(
            "{name}: progress iter={} swaps={} tour_len={:.2}",
            stats.iterations,
            stats.num_swaps,
            tour.length()
        );
    }
}

pub(crate) fn warn_if_capped(name: &str, stats: &OptimizationStats, tuning: &TwoOptTuning) {
    if stats.iterations >= tuning.max_iterations {
        log::warn!(
            "{name}: iteration cap reached iterations={} swaps={}",
            stats.iterations,
            stats.num_swaps
        );
    }
}
