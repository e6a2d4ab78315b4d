//! Logging initialization.
//!
//! Logs never go to stdout: under the stdio transport it carries the protocol.
//! They go to stderr, or to a file when one is configured.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initializes logging to `file` if given, otherwise to stderr.
pub fn init(file: Option<&Path>) {
    match file {
        Some(path) => init_file_logging(path),
        None => init_stderr_logging(),
    }
}

/// Initializes logging to stderr.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Initializes logging to an appended file, falling back to stderr if the
/// file cannot be opened.
pub fn init_file_logging(path: &Path) {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {e}");
            init_stderr_logging();
            return;
        }
    }

    let log_file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not open log file {}: {e}", path.display());
            init_stderr_logging();
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();
}
