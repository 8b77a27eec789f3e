use log::info;

use two_opt_core::{
    Algorithm, BenchOptions, Error, InstanceKind, Result, Tour, approximate_2opt, basic_2opt,
    best_nearest_neighbor_tour, generate_clustered_points, generate_random_points, geometric_2opt,
    hybrid_2opt, logging, report,
};

fn main() -> Result<()> {
    let options = BenchOptions::from_args()?;
    logging::init_logger(&options)?;

    // We needed to init the logger before the timer macro
    main_inner(options)
}

#[two_opt_derive::timer("main")]
fn main_inner(options: BenchOptions) -> Result<()> {
    info!("options: {options}");

    let points = match options.instance {
        InstanceKind::Random => generate_random_points(options.n_points, options.seed),
        InstanceKind::Clustered => {
            generate_clustered_points(options.n_points, options.clusters, options.seed)?
        }
    };

    let initial = best_nearest_neighbor_tour(&points, options.nn_starts);
    if !initial.is_valid_permutation_of(&points) {
        return Err(Error::invalid_data(
            "initial nearest-neighbor tour is not a permutation of the instance",
        ));
    }
    report::log_instance_summary(&points, &initial);

    let tuning = options.tuning();
    let mut runs: Vec<report::BenchRun> = Vec::new();
    let mut best_tour: Option<Tour> = None;

    for algorithm in options.algorithms.enabled() {
        let mut tour = initial.clone();
        let stats = match algorithm {
            Algorithm::Basic => basic_2opt(&mut tour, &tuning),
            Algorithm::Geometric => geometric_2opt(&mut tour, &tuning),
            Algorithm::Approximate => approximate_2opt(&mut tour, &tuning),
            Algorithm::Hybrid => hybrid_2opt(&mut tour, &tuning),
        };

        if !tour.is_valid_permutation_of(&points) {
            return Err(Error::invalid_data(format!(
                "{} produced an invalid tour",
                algorithm.name()
            )));
        }
        if best_tour
            .as_ref()
            .is_none_or(|best| tour.length() < best.length())
        {
            best_tour = Some(tour);
        }
        runs.push(report::BenchRun::new(algorithm.name().to_string(), stats));
    }

    report::log_comparison(&runs);

    if let Some(best) = &best_tour {
        for point in best.points() {
            println!("{point}");
        }
        if let Some(path) = options.output_path() {
            report::write_results_file(&path, &points, best)?;
        }
    }

    Ok(())
}
