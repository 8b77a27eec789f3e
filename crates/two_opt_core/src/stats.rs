use two_opt_derive::KvDisplay;

/// Counters and timings reported by every optimizer run.
#[derive(Clone, Copy, Debug, Default, KvDisplay)]
pub struct OptimizationStats {
    #[kv(fmt = "fixed6")]
    pub initial_length: f64,
    #[kv(fmt = "fixed6")]
    pub final_length: f64,
    pub num_swaps: usize,
    pub iterations: usize,
    /// Gain evaluations performed.
    pub total_comparisons: usize,
    /// Accumulated k-d tree node visits (geometric/hybrid only).
    pub num_visited: usize,
    /// Active count observed in the last pass (approximate/hybrid only).
    pub active_nodes: usize,
    /// Wall-clock seconds spent inside the optimization loop.
    #[kv(name = "cpu_time_s", fmt = "fixed3")]
    pub cpu_time: f64,
}

impl OptimizationStats {
    /// Fractional length reduction relative to the initial tour.
    pub fn improvement_ratio(&self) -> f64 {
        if self.initial_length > 0.0 {
            (self.initial_length - self.final_length) / self.initial_length
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OptimizationStats;

    #[test]
    fn improvement_ratio_is_relative_reduction() {
        let stats = OptimizationStats {
            initial_length: 10.0,
            final_length: 8.0,
            ..OptimizationStats::default()
        };
        assert!((stats.improvement_ratio() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn improvement_ratio_of_empty_run_is_zero() {
        assert_eq!(OptimizationStats::default().improvement_ratio(), 0.0);
    }

    #[test]
    fn display_renders_a_single_log_record() {
        let stats = OptimizationStats {
            initial_length: 4.5,
            final_length: 4.0,
            num_swaps: 1,
            iterations: 2,
            total_comparisons: 3,
            ..OptimizationStats::default()
        };
        let line = stats.to_string();
        assert!(line.starts_with("initial_length=4.500000 final_length=4.000000"));
        assert!(line.contains("num_swaps=1"));
        assert!(line.contains("cpu_time_s=0.000"));
        assert!(!line.contains('\n'));
    }
}
