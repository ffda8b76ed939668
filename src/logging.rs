//! Logging configuration for sheetquery.
//!
//! Logs go to stderr so stdout only carries the confirmation lines, or to a
//! file when one is requested. `RUST_LOG` overrides the verbosity flags.

use std::fs::{self, File};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Maps the number of `-v` flags to a default filter level.
pub fn level_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initializes logging to stderr.
pub fn init_stderr_logging(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .init();
}

/// Initializes logging to `path`, truncating it.
///
/// Falls back to stderr if the file cannot be created.
pub fn init_file_logging(path: &Path, default_level: &str) {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {e}");
            init_stderr_logging(default_level);
            return;
        }
    }

    let log_file = match File::create(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {e}");
            init_stderr_logging(default_level);
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(log_file)
        .with_ansi(false) // No ANSI colors in file output
        .init();
}

/// Initializes logging from the command-line settings.
pub fn init(verbose: u8, log_file: Option<&Path>) {
    let level = level_for_verbosity(verbose);
    match log_file {
        Some(path) => init_file_logging(path, level),
        None => init_stderr_logging(level),
    }
}
