//! Configuration data structures for Palaver core.
//!
//! These structs are populated by deserializing a TOML configuration file.
//! Missing fields fall back to the values in [`super::defaults`]; unknown
//! fields are rejected via `#[serde(deny_unknown_fields)]`.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::defaults;
use crate::error::ConfigError;

/// Configuration settings for the logging subsystem.
///
/// Used by [`crate::logging::init_logging`] to set up the global `tracing`
/// subscriber.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// The minimum log level to record.
    /// Valid values (case-insensitive): "trace", "debug", "info", "warn",
    /// "error".
    #[serde(default = "defaults::default_log_level")]
    pub level: String,
    /// Optional path to a file where logs should be written. `None` disables
    /// file logging.
    #[serde(default)]
    pub file_path: Option<PathBuf>,
    /// Console log format: "text" or "json".
    #[serde(default = "defaults::default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::default_log_level(),
            file_path: None,
            format: defaults::default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        match self.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "invalid log level '{}'",
                    other
                )))
            }
        }
        match self.format.to_lowercase().as_str() {
            "text" | "json" => Ok(()),
            other => Err(ConfigError::ValidationError(format!(
                "invalid log format '{}'",
                other
            ))),
        }
    }
}

/// Timing policy for the notification scheduler.
///
/// All values are in milliseconds in the configuration file; accessors
/// return [`Duration`]s. The invariant `grouping_window <= max_group_delay`
/// is enforced by [`NotifyTimings::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotifyTimings {
    /// Floor delay before presenting a notification for a conversation with
    /// nothing pending.
    #[serde(default = "defaults::default_minimal_delay_ms")]
    pub minimal_delay_ms: u64,
    /// Grouping window, anchored at the first pending arrival.
    #[serde(default = "defaults::default_grouping_window_ms")]
    pub grouping_window_ms: u64,
    /// Upper bound on grouping latency relative to the first pending
    /// arrival.
    #[serde(default = "defaults::default_max_group_delay_ms")]
    pub max_group_delay_ms: u64,
    /// One-shot settle deferral applied when a batch comes due mid-burst.
    #[serde(default = "defaults::default_grouped_settle_ms")]
    pub grouped_settle_ms: u64,
}

impl Default for NotifyTimings {
    fn default() -> Self {
        Self {
            minimal_delay_ms: defaults::default_minimal_delay_ms(),
            grouping_window_ms: defaults::default_grouping_window_ms(),
            max_group_delay_ms: defaults::default_max_group_delay_ms(),
            grouped_settle_ms: defaults::default_grouped_settle_ms(),
        }
    }
}

impl NotifyTimings {
    pub fn minimal_delay(&self) -> Duration {
        Duration::from_millis(self.minimal_delay_ms)
    }

    pub fn grouping_window(&self) -> Duration {
        Duration::from_millis(self.grouping_window_ms)
    }

    pub fn max_group_delay(&self) -> Duration {
        Duration::from_millis(self.max_group_delay_ms)
    }

    pub fn grouped_settle(&self) -> Duration {
        Duration::from_millis(self.grouped_settle_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.minimal_delay_ms == 0 {
            return Err(ConfigError::ValidationError(
                "minimal_delay_ms must be non-zero".to_string(),
            ));
        }
        if self.grouping_window_ms > self.max_group_delay_ms {
            return Err(ConfigError::ValidationError(format!(
                "grouping_window_ms ({}) must not exceed max_group_delay_ms ({})",
                self.grouping_window_ms, self.max_group_delay_ms
            )));
        }
        Ok(())
    }
}

/// Root configuration structure for the Palaver core system.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreConfig {
    /// Configuration for the logging subsystem.
    #[serde(default = "defaults::default_logging_config")]
    pub logging: LoggingConfig,
    /// Notification scheduler timing policy.
    #[serde(default = "defaults::default_notify_timings")]
    pub notifications: NotifyTimings,
}

impl CoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logging.validate()?;
        self.notifications.validate()
    }
}
