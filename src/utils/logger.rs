//! Logging setup and the per-run log file
//!
//! Diagnostic output goes through the `log` facade to `env_logger`. The
//! [`Logger`] run log is separate: it records one line per processed unit
//! plus the final report in a plain text file.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use log::LevelFilter;

/// Per-run log file; a disabled logger discards every message
pub struct Logger {
    file: Mutex<Option<File>>,
}

impl Logger {
    /// Creates the run log at `log_file`, truncating an existing file
    pub fn new(log_file: &Path) -> io::Result<Self> {
        let file = File::create(log_file)?;
        Ok(Logger {
            file: Mutex::new(Some(file)),
        })
    }

    /// A logger that writes nothing
    pub fn disabled() -> Self {
        Logger {
            file: Mutex::new(None),
        }
    }

    pub fn is_enabled(&self) -> bool {
        match self.file.lock() {
            Ok(guard) => guard.is_some(),
            Err(poisoned) => poisoned.into_inner().is_some(),
        }
    }

    /// Appends one line to the run log
    pub fn log(&self, message: &str) -> io::Result<()> {
        let mut guard = match self.file.lock() {
            Ok(guard) => guard,
            // A panic while holding the lock leaves the file usable
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(file) = guard.as_mut() {
            writeln!(file, "{}", message)?;
            file.flush()?;
        }
        Ok(())
    }

    /// Initializes the global `env_logger` backend
    ///
    /// `RUST_LOG` takes precedence; otherwise `verbose` selects debug and
    /// `quiet` limits output to warnings.
    pub fn init_global_logger(verbose: bool, quiet: bool) {
        let level = if verbose {
            LevelFilter::Debug
        } else if quiet {
            LevelFilter::Warn
        } else {
            LevelFilter::Info
        };

        let mut builder = env_logger::Builder::new();
        builder.filter_level(level).format_timestamp_secs();
        if let Ok(spec) = std::env::var("RUST_LOG") {
            builder.parse_filters(&spec);
        }
        if builder.try_init().is_err() {
            eprintln!("Warning: global logger was already initialized");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_lines_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.log");
        let logger = Logger::new(&path).unwrap();
        assert!(logger.is_enabled());
        logger.log("first").unwrap();
        logger.log("second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn disabled_logger_is_silent() {
        let logger = Logger::disabled();
        assert!(!logger.is_enabled());
        assert!(logger.log("ignored").is_ok());
    }
}
