//! Error handling for the Palaver core layer.
//!
//! This module defines the error types used throughout the core crate, built
//! with `thiserror`. The main error type is [`CoreError`], which wraps the
//! more specific [`ConfigError`] and [`LoggingError`].

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for the Palaver foundation layer.
///
/// This enum represents all possible errors that can occur in the core
/// layer. Higher layers typically wrap it in their own error types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Errors related to configuration loading, parsing, or validation.
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),

    /// Errors that occur during the initialization of the logging system.
    #[error("Logging Error: {0}")]
    Logging(#[from] LoggingError),

    /// General I/O errors not covered by more specific variants.
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for unexpected internal errors within the core library.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// Error type for configuration-related operations.
///
/// Typically wrapped by [`CoreError::Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An error occurred while attempting to read a configuration file.
    #[error("Failed to read configuration file from {path:?}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An error occurred while parsing a configuration file.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// The configuration parsed but contained invalid values.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// A required base directory (e.g. the XDG config home) could not be
    /// determined.
    #[error("Could not determine base directory for {dir_type}")]
    DirectoryUnavailable { dir_type: String },
}

/// Error type for logging-related operations.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Setting up the global `tracing` subscriber failed.
    #[error("Logging initialization failed: {0}")]
    InitializationFailure(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_wraps_into_core_error() {
        let err = ConfigError::ValidationError("minimal delay must be non-zero".to_string());
        let core: CoreError = err.into();
        assert!(matches!(core, CoreError::Config(_)));
        assert!(core.to_string().contains("minimal delay must be non-zero"));
    }

    #[test]
    fn io_error_wraps_into_core_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let core: CoreError = io.into();
        assert!(matches!(core, CoreError::Io(_)));
    }

    #[test]
    fn read_error_carries_path() {
        let err = ConfigError::ReadError {
            path: PathBuf::from("/etc/palaver/core.toml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/etc/palaver/core.toml"));
    }
}
