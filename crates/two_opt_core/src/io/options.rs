use std::{env, path::PathBuf};

use log::LevelFilter;
use two_opt_derive::KvDisplay;

use crate::opt::TwoOptTuning;
use crate::{Error, Result};

/// Runtime options for the benchmark driver.
#[derive(Clone, Debug, KvDisplay)]
pub struct BenchOptions {
    /// Instance size.
    pub n_points: usize,
    /// Seed for instance generation and the randomized optimizers.
    pub seed: u64,
    /// Instance sampler: `random` or `clustered`.
    pub instance: InstanceKind,
    /// Cluster count for clustered instances.
    pub clusters: usize,
    /// Start vertices tried by the nearest-neighbor constructor.
    pub nn_starts: usize,
    /// Which optimizers to benchmark.
    pub algorithms: AlgorithmSet,
    /// Pass cap applied to every optimizer.
    pub max_iterations: usize,
    /// Swaps between k-d tree rebuilds in the geometric optimizer.
    pub geometric_rebuild_interval: usize,
    /// Swaps between k-d tree rebuilds in the hybrid optimizer.
    pub hybrid_rebuild_interval: usize,
    /// Structured logging level.
    pub log_level: LogLevel,
    /// Logging output format.
    pub log_format: LogFormat,
    /// Include timestamps in log lines.
    pub log_timestamp: bool,
    /// Optional output file path for logs. Empty means stderr.
    pub log_output: String,
    /// Optional results file path. Empty means no results file.
    pub output: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InstanceKind {
    Random,
    Clustered,
}

impl InstanceKind {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "random" => Ok(Self::Random),
            "clustered" => Ok(Self::Clustered),
            _ => Err(Error::invalid_input(format!(
                "Invalid value for --instance: {raw} (expected random/clustered)"
            ))),
        }
    }
}

impl std::fmt::Display for InstanceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Random => write!(f, "random"),
            Self::Clustered => write!(f, "clustered"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
    Off,
}

impl LogLevel {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            "off" => Ok(Self::Off),
            _ => Err(Error::invalid_input(format!(
                "Invalid value for --log-level: {raw} (expected error/warn/info/debug/trace/off)"
            ))),
        }
    }

    pub fn to_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
            Self::Off => LevelFilter::Off,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
            Self::Off => "off",
        };
        write!(f, "{tag}")
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogFormat {
    Compact,
    Pretty,
}

impl LogFormat {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            _ => Err(Error::invalid_input(format!(
                "Invalid value for --log-format: {raw} (expected compact/pretty)"
            ))),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compact => write!(f, "compact"),
            Self::Pretty => write!(f, "pretty"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Algorithm {
    Basic,
    Geometric,
    Approximate,
    Hybrid,
}

impl Algorithm {
    pub fn name(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Geometric => "geometric",
            Self::Approximate => "approximate",
            Self::Hybrid => "hybrid",
        }
    }
}

/// Selection of optimizers to benchmark. Defaults to all four.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AlgorithmSet {
    pub basic: bool,
    pub geometric: bool,
    pub approximate: bool,
    pub hybrid: bool,
}

impl Default for AlgorithmSet {
    fn default() -> Self {
        Self {
            basic: true,
            geometric: true,
            approximate: true,
            hybrid: true,
        }
    }
}

impl AlgorithmSet {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut set = Self {
            basic: false,
            geometric: false,
            approximate: false,
            hybrid: false,
        };
        for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token {
                "basic" => set.basic = true,
                "geometric" => set.geometric = true,
                "approximate" => set.approximate = true,
                "hybrid" => set.hybrid = true,
                "all" => set = Self::default(),
                _ => {
                    return Err(Error::invalid_input(format!(
                        "Invalid value for --algorithms: {token} \
                         (expected basic/geometric/approximate/hybrid/all)"
                    )));
                }
            }
        }
        if set.enabled().is_empty() {
            return Err(Error::invalid_input(
                "--algorithms selected no optimizer to run",
            ));
        }
        Ok(set)
    }

    pub fn enabled(&self) -> Vec<Algorithm> {
        let mut algorithms = Vec::with_capacity(4);
        if self.basic {
            algorithms.push(Algorithm::Basic);
        }
        if self.geometric {
            algorithms.push(Algorithm::Geometric);
        }
        if self.approximate {
            algorithms.push(Algorithm::Approximate);
        }
        if self.hybrid {
            algorithms.push(Algorithm::Hybrid);
        }
        algorithms
    }
}

impl std::fmt::Display for AlgorithmSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.enabled().iter().map(|a| a.name()).collect();
        write!(f, "{}", names.join(","))
    }
}

impl Default for BenchOptions {
    fn default() -> Self {
        Self {
            n_points: 100,
            seed: 42,
            instance: InstanceKind::Random,
            clusters: 5,
            nn_starts: 10,
            algorithms: AlgorithmSet::default(),
            max_iterations: 1_000,
            geometric_rebuild_interval: 25,
            hybrid_rebuild_interval: 30,
            log_level: LogLevel::Info,
            log_format: LogFormat::Compact,
            log_timestamp: true,
            log_output: String::new(),
            output: String::new(),
        }
    }
}

impl BenchOptions {
    pub fn from_args() -> Result<Self> {
        Self::parse_from_iter(env::args().skip(1))
    }

    pub fn parse_from_iter<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = Self::default();
        let mut args = args
            .into_iter()
            .map(|arg| arg.as_ref().to_owned())
            .peekable();

        while let Some(arg) = args.next() {
            if arg == "--help" || arg == "-h" {
                return Err(Error::invalid_input(Self::usage()));
            }

            let Some(raw_name) = arg.strip_prefix("--") else {
                return Err(Error::invalid_input(format!(
                    "Unexpected argument: {arg}\n\n{}",
                    Self::usage()
                )));
            };

            if raw_name.is_empty() {
                return Err(Error::invalid_input(format!(
                    "Invalid option name: {arg}\n\n{}",
                    Self::usage()
                )));
            }

            let (name, value) = match raw_name.split_once('=') {
                Some((n, v)) => (n.to_string(), Some(v.to_string())),
                None => (raw_name.to_string(), None),
            };

            match name.as_str() {
                "points" => options.n_points = parse_usize(&name, require(&name, value, &mut args)?)?,
                "seed" => options.seed = parse_u64(&name, require(&name, value, &mut args)?)?,
                "instance" => {
                    options.instance = InstanceKind::parse(&require(&name, value, &mut args)?)?;
                }
                "clusters" => {
                    options.clusters = parse_usize(&name, require(&name, value, &mut args)?)?;
                }
                "nn-starts" => {
                    options.nn_starts = parse_usize(&name, require(&name, value, &mut args)?)?;
                }
                "algorithms" => {
                    options.algorithms = AlgorithmSet::parse(&require(&name, value, &mut args)?)?;
                }
                "max-iterations" => {
                    options.max_iterations = parse_usize(&name, require(&name, value, &mut args)?)?;
                }
                "geometric-rebuild-interval" => {
                    options.geometric_rebuild_interval =
                        parse_nonzero_usize(&name, require(&name, value, &mut args)?)?;
                }
                "hybrid-rebuild-interval" => {
                    options.hybrid_rebuild_interval =
                        parse_nonzero_usize(&name, require(&name, value, &mut args)?)?;
                }
                "log-level" => {
                    options.log_level = LogLevel::parse(&require(&name, value, &mut args)?)?;
                }
                "log-format" => {
                    options.log_format = LogFormat::parse(&require(&name, value, &mut args)?)?;
                }
                "log-timestamp" => {
                    options.log_timestamp = match value {
                        Some(v) => parse_bool(&name, &v)?,
                        None => true,
                    };
                }
                "no-log-timestamp" => {
                    if value.is_some() {
                        return Err(Error::invalid_input(format!(
                            "Flag --{name} does not take a value"
                        )));
                    }
                    options.log_timestamp = false;
                }
                "log-output" => options.log_output = require(&name, value, &mut args)?,
                "output" => options.output = require(&name, value, &mut args)?,
                _ => {
                    return Err(Error::invalid_input(format!(
                        "Unknown option: --{name}\n\n{}",
                        Self::usage()
                    )));
                }
            }
        }

        Ok(options)
    }

    pub fn usage() -> &'static str {
        concat!(
            "Usage:\n",
            "  tsp-2opt [options]\n\n",
            "Options:\n",
            "  --points <usize>\n",
            "  --seed <u64>\n",
            "  --instance <random|clustered>\n",
            "  --clusters <usize>\n",
            "  --nn-starts <usize>\n",
            "  --algorithms <basic,geometric,approximate,hybrid|all>\n",
            "  --max-iterations <usize>\n",
            "  --geometric-rebuild-interval <usize>\n",
            "  --hybrid-rebuild-interval <usize>\n",
            "  --log-level <error|warn|info|debug|trace|off>\n",
            "  --log-format <compact|pretty>\n",
            "  --log-timestamp[=<bool>]\n",
            "  --no-log-timestamp\n",
            "  --log-output <path>\n",
            "  --output <path>\n",
            "  --help\n",
            "\n",
            "Examples:\n",
            "  tsp-2opt --points 200 --seed 123 --instance clustered\n",
            "  tsp-2opt --algorithms basic,geometric --output results.txt\n",
            "  tsp-2opt --log-level=debug --log-format=pretty --no-log-timestamp\n",
        )
    }

    /// Optimizer tuning derived from the CLI-level knobs.
    pub fn tuning(&self) -> TwoOptTuning {
        TwoOptTuning {
            max_iterations: self.max_iterations,
            geometric_rebuild_interval: self.geometric_rebuild_interval,
            hybrid_rebuild_interval: self.hybrid_rebuild_interval,
            rng_seed: self.seed,
            ..TwoOptTuning::default()
        }
    }

    pub fn log_output_path(&self) -> Option<PathBuf> {
        check_path(&self.log_output)
    }

    pub fn output_path(&self) -> Option<PathBuf> {
        check_path(&self.output)
    }
}

fn require<I>(name: &str, value: Option<String>, args: &mut std::iter::Peekable<I>) -> Result<String>
where
    I: Iterator<Item = String>,
{
    if let Some(value) = value {
        return Ok(value);
    }
    args.next()
        .ok_or_else(|| Error::invalid_input(format!("Missing value for --{name}")))
}

fn parse_usize(name: &str, raw: String) -> Result<usize> {
    raw.parse::<usize>()
        .map_err(|e| Error::invalid_input(format!("Invalid value for --{name}: {raw} ({e})")))
}

fn parse_u64(name: &str, raw: String) -> Result<u64> {
    raw.parse::<u64>()
        .map_err(|e| Error::invalid_input(format!("Invalid value for --{name}: {raw} ({e})")))
}

fn parse_nonzero_usize(name: &str, raw: String) -> Result<usize> {
    let parsed = parse_usize(name, raw)?;
    if parsed == 0 {
        return Err(Error::invalid_input(format!(
            "Invalid value for --{name}: must be > 0"
        )));
    }
    Ok(parsed)
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value {
        "1" | "true" | "TRUE" | "True" | "yes" | "YES" | "on" | "ON" => Ok(true),
        "0" | "false" | "FALSE" | "False" | "no" | "NO" | "off" | "OFF" => Ok(false),
        _ => Err(Error::invalid_input(format!(
            "Invalid boolean for --{name}: {value} (expected true/false)"
        ))),
    }
}

fn check_path(path_str: &str) -> Option<PathBuf> {
    let path_str = path_str.trim();
    if path_str.is_empty() || path_str == "-" {
        None
    } else {
        std::path::absolute(path_str).ok()
    }
}
