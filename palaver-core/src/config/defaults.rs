//! Default values for the configuration structures.
//!
//! Referenced from the `#[serde(default = "...")]` attributes in
//! [`super::types`] so that partially-specified configuration files fall
//! back to the same values as [`Default`] implementations.

use super::types::{LoggingConfig, NotifyTimings};

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_log_format() -> String {
    "text".to_string()
}

pub(super) fn default_logging_config() -> LoggingConfig {
    LoggingConfig::default()
}

/// Floor delay before a notification for a previously-quiet conversation is
/// presented.
pub(super) fn default_minimal_delay_ms() -> u64 {
    200
}

/// Window, anchored at the first pending arrival, during which further
/// arrivals for the same conversation are folded into one presentation.
pub(super) fn default_grouping_window_ms() -> u64 {
    600
}

/// Hard cap on how long a conversation's first pending notification may be
/// held back by grouping.
pub(super) fn default_max_group_delay_ms() -> u64 {
    2500
}

/// Settle time: when a batch comes due while messages are still streaming
/// in, presentation is deferred by this much once to let the burst finish.
pub(super) fn default_grouped_settle_ms() -> u64 {
    100
}

pub(super) fn default_notify_timings() -> NotifyTimings {
    NotifyTimings::default()
}
