//! The settings service trait and its default implementation.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error};

use super::errors::SettingsError;
use super::events::ChangeType;
use super::persistence_iface::SettingsPersistenceProvider;
use super::types::{NotifySettings, NotifyView, ScreenCorner};

/// A single typed settings mutation, carrying its new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingUpdate {
    DesktopEnabled(bool),
    SoundEnabled(bool),
    FlashBounceEnabled(bool),
    IncludeMuted(bool),
    CountMessages(bool),
    View(NotifyView),
    MaxCount(u32),
    Corner(ScreenCorner),
}

impl SettingUpdate {
    /// The change kind broadcast for this update.
    pub fn change_type(&self) -> ChangeType {
        match self {
            SettingUpdate::DesktopEnabled(_) => ChangeType::DesktopEnabled,
            SettingUpdate::SoundEnabled(_) => ChangeType::SoundEnabled,
            SettingUpdate::FlashBounceEnabled(_) => ChangeType::FlashBounceEnabled,
            SettingUpdate::IncludeMuted(_) => ChangeType::IncludeMuted,
            SettingUpdate::CountMessages(_) => ChangeType::CountMessages,
            SettingUpdate::View(_) => ChangeType::ViewParams,
            SettingUpdate::MaxCount(_) => ChangeType::MaxCount,
            SettingUpdate::Corner(_) => ChangeType::Corner,
        }
    }
}

// --- SettingsService Trait ---

/// Query-and-observe surface the notification scheduler depends on, plus the
/// mutation entry point the settings UI drives.
#[async_trait]
pub trait SettingsService: Send + Sync {
    async fn load_settings(&self) -> Result<(), SettingsError>;
    async fn save_settings(&self) -> Result<(), SettingsError>;
    async fn get_current_settings(&self) -> NotifySettings;
    async fn update_setting(&self, update: SettingUpdate) -> Result<(), SettingsError>;
    /// Broadcasts a change kind without mutating stored settings. Used for
    /// the demo popup bracket events.
    fn notify_changed(&self, kind: ChangeType);
    fn subscribe_to_changes(&self) -> broadcast::Receiver<ChangeType>;
}

// --- DefaultSettingsService Implementation ---

pub struct DefaultSettingsService {
    settings: Arc<RwLock<NotifySettings>>,
    persistence_provider: Arc<dyn SettingsPersistenceProvider>,
    event_sender: broadcast::Sender<ChangeType>,
}

impl DefaultSettingsService {
    pub fn new(
        persistence_provider: Arc<dyn SettingsPersistenceProvider>,
        broadcast_capacity: usize,
    ) -> Self {
        let (event_sender, _) = broadcast::channel(broadcast_capacity);
        Self {
            settings: Arc::new(RwLock::new(NotifySettings::default())),
            persistence_provider,
            event_sender,
        }
    }

    /// Convenience constructor with in-memory persistence, for tests and
    /// embedders without a settings file.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(super::providers::InMemorySettingsProvider::new()), 16)
    }

    fn publish(&self, kind: ChangeType) {
        if self.event_sender.send(kind).is_err() {
            debug!(?kind, "No settings-change subscribers.");
        }
    }
}

#[async_trait]
impl SettingsService for DefaultSettingsService {
    async fn load_settings(&self) -> Result<(), SettingsError> {
        let loaded = self.persistence_provider.load_settings().await?;
        let mut guard = self.settings.write().await;
        *guard = loaded;
        debug!("Notification settings loaded.");
        Ok(())
    }

    async fn save_settings(&self) -> Result<(), SettingsError> {
        let snapshot = self.settings.read().await.clone();
        self.persistence_provider.save_settings(&snapshot).await
    }

    async fn get_current_settings(&self) -> NotifySettings {
        self.settings.read().await.clone()
    }

    async fn update_setting(&self, update: SettingUpdate) -> Result<(), SettingsError> {
        let kind = update.change_type();
        {
            let mut guard = self.settings.write().await;
            let mut next = guard.clone();
            match update {
                SettingUpdate::DesktopEnabled(v) => next.desktop_enabled = v,
                SettingUpdate::SoundEnabled(v) => next.sound_enabled = v,
                SettingUpdate::FlashBounceEnabled(v) => next.flash_bounce_enabled = v,
                SettingUpdate::IncludeMuted(v) => next.include_muted = v,
                SettingUpdate::CountMessages(v) => next.count_messages = v,
                SettingUpdate::View(v) => next.view = v,
                SettingUpdate::MaxCount(v) => next.max_count = v,
                SettingUpdate::Corner(v) => next.corner = v,
            }
            next.validate()?;
            *guard = next;
        }
        self.publish(kind);
        if let Err(e) = self.save_settings().await {
            // The in-memory state is already updated; persistence failure is
            // reported but does not roll back.
            error!(error = %e, "Failed to persist settings after update.");
            return Err(e);
        }
        Ok(())
    }

    fn notify_changed(&self, kind: ChangeType) {
        self.publish(kind);
    }

    fn subscribe_to_changes(&self) -> broadcast::Receiver<ChangeType> {
        self.event_sender.subscribe()
    }
}
