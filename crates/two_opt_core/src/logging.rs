use std::fs::File;
use std::io::Write;
use std::time::Instant;

use env_logger::{Builder, Target};

use crate::Result;
use crate::options::{BenchOptions, LogFormat};

/// Initializes the process-wide logger for a benchmark run.
///
/// Lines are stamped with seconds elapsed since logger init rather than
/// wall-clock time: benchmark logs get read side by side, and relative
/// offsets are what the optimizer progress and `bench:` comparison lines are
/// judged against. Compact format carries the level tag only; pretty adds
/// the module target.
pub fn init_logger(options: &BenchOptions) -> Result<()> {
    let log_format = options.log_format;
    let show_elapsed = options.log_timestamp;
    let run_started = Instant::now();

    let mut builder = Builder::new();
    builder
        .filter_level(options.log_level.to_filter())
        .write_style(env_logger::WriteStyle::Never)
        .format(move |buf, record| {
            if show_elapsed {
                write!(buf, "[{:9.3}] ", run_started.elapsed().as_secs_f64())?;
            }

            match log_format {
                LogFormat::Compact => {
                    writeln!(buf, "{:5} {}", record.level(), record.args())
                }
                LogFormat::Pretty => {
                    writeln!(
                        buf,
                        "{:5} [{}] {}",
                        record.level(),
                        record.target(),
                        record.args()
                    )
                }
            }
        });

    match options.log_output_path() {
        Some(log_path) => {
            let log_file = File::create(&log_path).map_err(|e| {
                crate::Error::other(format!(
                    "failed to create log output file {}: {e}",
                    log_path.display()
                ))
            })?;
            builder.target(Target::Pipe(Box::new(log_file)));
        }
        None => {
            builder.target(Target::Stderr);
        }
    }

    builder
        .try_init()
        .map_err(|e| crate::Error::other(format!("logger init failed: {e}")))
}
