//! Concrete persistence providers for notification settings.

use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::errors::SettingsError;
use super::persistence_iface::SettingsPersistenceProvider;
use super::types::NotifySettings;

/// TOML-file-backed settings provider.
///
/// A missing file yields defaults; parent directories are created on save.
pub struct FilesystemSettingsProvider {
    path: PathBuf,
}

impl FilesystemSettingsProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl SettingsPersistenceProvider for FilesystemSettingsProvider {
    async fn load_settings(&self) -> Result<NotifySettings, SettingsError> {
        if !self.path.exists() {
            debug!(path = ?self.path, "No settings file found, using defaults.");
            return Ok(NotifySettings::default());
        }
        let raw = fs::read_to_string(&self.path).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })?;
        let settings: NotifySettings = toml::from_str(&raw)?;
        settings.validate()?;
        Ok(settings)
    }

    async fn save_settings(&self, settings: &NotifySettings) -> Result<(), SettingsError> {
        let serialized = toml::to_string_pretty(settings)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        fs::write(&self.path, serialized).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// In-memory provider for tests and embedders without persistent settings.
#[derive(Default)]
pub struct InMemorySettingsProvider {
    stored: RwLock<Option<NotifySettings>>,
}

impl InMemorySettingsProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsPersistenceProvider for InMemorySettingsProvider {
    async fn load_settings(&self) -> Result<NotifySettings, SettingsError> {
        Ok(self.stored.read().await.clone().unwrap_or_default())
    }

    async fn save_settings(&self, settings: &NotifySettings) -> Result<(), SettingsError> {
        *self.stored.write().await = Some(settings.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::types::NotifyView;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[tokio::test]
    async fn filesystem_provider_round_trips() {
        let temp = TempDir::new().unwrap();
        let provider = FilesystemSettingsProvider::new(temp.path().join("notify.toml"));

        let mut settings = NotifySettings::default();
        settings.view = NotifyView::ShowNothing;
        settings.include_muted = true;
        provider.save_settings(&settings).await.unwrap();

        let loaded = provider.load_settings().await.unwrap();
        assert_eq!(loaded, settings);
    }

    #[tokio::test]
    async fn filesystem_provider_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let provider = FilesystemSettingsProvider::new(temp.path().join("absent.toml"));
        let loaded = provider.load_settings().await.unwrap();
        assert_eq!(loaded, NotifySettings::default());
    }

    #[tokio::test]
    async fn filesystem_provider_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let provider =
            FilesystemSettingsProvider::new(temp.path().join("nested/dir/notify.toml"));
        provider
            .save_settings(&NotifySettings::default())
            .await
            .unwrap();
        assert!(provider.path().exists());
    }

    #[tokio::test]
    async fn filesystem_provider_rejects_invalid_persisted_values() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notify.toml");
        fs::write(&path, "max_count = 99").unwrap();
        let provider = FilesystemSettingsProvider::new(path);
        assert!(matches!(
            provider.load_settings().await,
            Err(SettingsError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn in_memory_provider_round_trips() {
        let provider = InMemorySettingsProvider::new();
        assert_eq!(
            provider.load_settings().await.unwrap(),
            NotifySettings::default()
        );
        let mut settings = NotifySettings::default();
        settings.sound_enabled = false;
        provider.save_settings(&settings).await.unwrap();
        assert_eq!(provider.load_settings().await.unwrap(), settings);
    }
}
