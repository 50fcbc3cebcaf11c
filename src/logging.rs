//! Logging and tracing configuration.
//!
//! Console output always goes to stdout. For `run`, a second plain-text layer
//! writes to a timestamped file in the configured output directory.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogLevel;

/// Prefix of log file names.
pub const LOG_FILE_PREFIX: &str = "caserun";

/// `caserun_<YYYYmmdd_HHMMSS>.log`.
pub fn log_file_name(now: DateTime<Local>) -> String {
    format!("{}_{}.log", LOG_FILE_PREFIX, now.format("%Y%m%d_%H%M%S"))
}

/// `RUST_LOG` when set, the configured level otherwise.
fn filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()))
}

fn console_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
}

/// Initialize console logging only.
pub fn init_console(level: LogLevel) {
    tracing_subscriber::registry()
        .with(filter(level))
        .with(console_layer())
        .init();
}

/// Initialize console logging plus a log file in `output_dir`.
///
/// Returns the log file path, or `None` when the file could not be created,
/// in which case only the console is used.
pub fn init_with_file(level: LogLevel, output_dir: &Path) -> Option<PathBuf> {
    let log_file = output_dir.join(log_file_name(Local::now()));

    let opened = std::fs::create_dir_all(output_dir).and_then(|_| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
    });

    match opened {
        Ok(file) => {
            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(false);

            tracing_subscriber::registry()
                .with(filter(level))
                .with(file_layer)
                .with(console_layer())
                .init();
            Some(log_file)
        }
        Err(e) => {
            eprintln!(
                "Warning: could not open log file {}: {}",
                log_file.display(),
                e
            );
            init_console(level);
            None
        }
    }
}
