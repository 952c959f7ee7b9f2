//! Aggregated error type for the Palaver domain layer.

use thiserror::Error;

use crate::notifications::NotificationError;
use crate::settings::SettingsError;

/// Domain-level error, wrapping the module-specific error types.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Core error: {0}")]
    Core(#[from] palaver_core::CoreError),
}
