use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use two_opt_derive::New;

use crate::Result;
use crate::point::Point;
use crate::stats::OptimizationStats;
use crate::tour::Tour;

/// One benchmarked optimizer run.
#[derive(Clone, Debug, New)]
pub struct BenchRun {
    pub name: String,
    pub stats: OptimizationStats,
}

/// Indices of the notable runs in a benchmark batch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BenchSummary {
    pub best: usize,
    pub fastest: usize,
    pub most_swaps: usize,
}

/// Logs instance shape and initial-tour quality, including the pairwise
/// distance spread of the point set.
pub fn log_instance_summary(points: &[Point], initial: &Tour) {
    let n = points.len();
    if n < 2 {
        log::info!("instance: n={n} nothing to report");
        return;
    }

    let mut min_dist = f64::INFINITY;
    let mut max_dist = 0.0_f64;
    let mut sum = 0.0;
    let mut pairs = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            let d = points[i].dist(&points[j]);
            min_dist = min_dist.min(d);
            max_dist = max_dist.max(d);
            sum += d;
            pairs += 1;
        }
    }

    log::info!(
        "instance: n={n} initial_len={:.6} min_pair={:.4} max_pair={:.4} avg_pair={:.4}",
        initial.length(),
        min_dist,
        max_dist,
        sum / pairs as f64
    );
}

/// Logs one line per run plus the cross-run comparison: shortest tour,
/// fastest run, most swaps, and comparison-count reduction relative to the
/// exhaustive baseline when it was part of the batch.
pub fn log_comparison(runs: &[BenchRun]) {
    for run in runs {
        log::info!(
            "bench: run algo={} improvement_pct={:.2} swaps_per_s={:.1} {}",
            run.name,
            run.stats.improvement_ratio() * 100.0,
            swaps_per_second(&run.stats),
            run.stats
        );
    }

    let Some(summary) = summarize(runs) else {
        log::warn!("bench: no runs to compare");
        return;
    };

    log::info!(
        "bench: best algo={} final_len={:.6}",
        runs[summary.best].name,
        runs[summary.best].stats.final_length
    );
    log::info!(
        "bench: fastest algo={} secs={:.3}",
        runs[summary.fastest].name,
        runs[summary.fastest].stats.cpu_time
    );
    log::info!(
        "bench: most_swaps algo={} swaps={}",
        runs[summary.most_swaps].name,
        runs[summary.most_swaps].stats.num_swaps
    );

    if let Some(baseline) = runs.iter().find(|run| run.name == "basic") {
        if baseline.stats.total_comparisons > 0 {
            for run in runs.iter().filter(|run| run.name != "basic") {
                let reduction = 1.0
                    - run.stats.total_comparisons as f64
                        / baseline.stats.total_comparisons as f64;
                log::info!(
                    "bench: comparison_reduction algo={} pct={:.1}",
                    run.name,
                    reduction * 100.0
                );
            }
        }
    }
}

pub(crate) fn summarize(runs: &[BenchRun]) -> Option<BenchSummary> {
    if runs.is_empty() {
        return None;
    }

    let index_of = |key: fn(&OptimizationStats) -> f64, invert: bool| {
        runs.iter()
            .enumerate()
            .min_by(|(_, lhs), (_, rhs)| {
                let l = key(&lhs.stats);
                let r = key(&rhs.stats);
                if invert { r.total_cmp(&l) } else { l.total_cmp(&r) }
            })
            .map(|(idx, _)| idx)
            .unwrap_or(0)
    };

    Some(BenchSummary {
        best: index_of(|stats| stats.final_length, false),
        fastest: index_of(|stats| stats.cpu_time, false),
        most_swaps: index_of(|stats| stats.num_swaps as f64, true),
    })
}

fn swaps_per_second(stats: &OptimizationStats) -> f64 {
    if stats.cpu_time > 0.0 {
        stats.num_swaps as f64 / stats.cpu_time
    } else {
        0.0
    }
}

/// Writes the winning tour to a plain-text results file.
pub fn write_results_file(path: &Path, points: &[Point], best: &Tour) -> Result<()> {
    let mut contents = String::new();
    let _ = writeln!(contents, "TSP Optimization Results");
    let _ = writeln!(contents, "Points: {}", points.len());
    let _ = writeln!(contents, "Best Tour Length: {:.6}", best.length());
    let _ = writeln!(contents, "\nBest Tour Sequence:");
    for (idx, point) in best.points().iter().enumerate() {
        let _ = writeln!(
            contents,
            "{idx}: ({:.6}, {:.6}) ID:{}",
            point.x, point.y, point.id
        );
    }

    fs::write(path, contents)?;
    log::info!("report: results written path={}", path.display());
    Ok(())
}
