//! Logging setup for Palaver core.
//!
//! Built on the `tracing` ecosystem. [`init_logging`] installs the global
//! subscriber from a [`LoggingConfig`]; [`init_minimal_logging`] is the
//! stderr fallback used by tests and early startup.

use crate::config::LoggingConfig;
use crate::error::{CoreError, LoggingError};

use std::fs::{self, OpenOptions};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Initializes a minimal logging setup, directing messages to `stderr`.
///
/// Intended for tests and early startup before configuration is loaded.
/// Filters via `RUST_LOG`, defaulting to "info". Errors (e.g. a global
/// subscriber already being set) are ignored.
pub fn init_minimal_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    let _ = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Initializes the global logging system from the provided [`LoggingConfig`].
///
/// When `file_path` is set, log output goes to that file (append mode,
/// parent directories created as needed); otherwise to stdout. The format
/// is "text" or "json" per the configuration.
///
/// # Errors
///
/// Returns `CoreError::Logging` if the configured level is invalid, the log
/// file cannot be opened, or a global subscriber has already been installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), CoreError> {
    let level = parse_level(&config.level)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    let json = config.format.to_lowercase() == "json";

    let result = match &config.file_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    CoreError::Logging(LoggingError::InitializationFailure(format!(
                        "cannot open log file {:?}: {}",
                        path, e
                    )))
                })?;
            let writer = Arc::new(file);
            if json {
                fmt::Subscriber::builder()
                    .json()
                    .with_env_filter(filter)
                    .with_writer(writer)
                    .with_ansi(false)
                    .try_init()
            } else {
                fmt::Subscriber::builder()
                    .with_env_filter(filter)
                    .with_writer(writer)
                    .with_ansi(false)
                    .try_init()
            }
        }
        None => {
            if json {
                fmt::Subscriber::builder()
                    .json()
                    .with_env_filter(filter)
                    .with_ansi(false)
                    .try_init()
            } else {
                fmt::Subscriber::builder().with_env_filter(filter).try_init()
            }
        }
    };

    result.map_err(|e| {
        CoreError::Logging(LoggingError::InitializationFailure(format!(
            "failed to set global tracing subscriber: {}",
            e
        )))
    })
}

fn parse_level(raw: &str) -> Result<Level, CoreError> {
    match raw.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        invalid => Err(CoreError::Logging(LoggingError::InitializationFailure(
            format!("invalid log level in config: {}", invalid),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_minimal_logging_is_idempotent() {
        init_minimal_logging();
        // A second call must not panic; the error from the already-installed
        // subscriber is swallowed.
        init_minimal_logging();
        tracing::info!("minimal logging test message");
    }

    #[test]
    fn parse_level_accepts_known_levels() {
        assert_eq!(parse_level("trace").unwrap(), Level::TRACE);
        assert_eq!(parse_level("WARN").unwrap(), Level::WARN);
        assert!(parse_level("supertrace").is_err());
    }

    #[test]
    fn init_logging_rejects_invalid_level() {
        let config = LoggingConfig {
            level: "supertrace".to_string(),
            file_path: None,
            format: "text".to_string(),
        };
        let result = init_logging(&config);
        match result {
            Err(CoreError::Logging(LoggingError::InitializationFailure(msg))) => {
                assert!(msg.contains("supertrace"));
            }
            other => panic!("expected logging error, got {:?}", other),
        }
    }

    #[test]
    fn init_logging_creates_log_file_parent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("logs/palaver.log");
        let config = LoggingConfig {
            level: "info".to_string(),
            file_path: Some(path.clone()),
            format: "text".to_string(),
        };
        // May fail with "already installed" from a sibling test; the parent
        // directory must exist either way.
        let _ = init_logging(&config);
        assert!(path.parent().unwrap().exists());
    }
}
