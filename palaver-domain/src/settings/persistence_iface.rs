//! Persistence interface for notification settings.

use async_trait::async_trait;

use super::errors::SettingsError;
use super::types::NotifySettings;

/// Storage backend for [`NotifySettings`].
///
/// Implementations must return defaults (not an error) when nothing has been
/// persisted yet.
#[async_trait]
pub trait SettingsPersistenceProvider: Send + Sync {
    async fn load_settings(&self) -> Result<NotifySettings, SettingsError>;
    async fn save_settings(&self, settings: &NotifySettings) -> Result<(), SettingsError>;
}
