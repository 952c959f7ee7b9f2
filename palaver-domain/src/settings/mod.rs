//! Notification settings service.
//!
//! Read-only from the scheduler's point of view: the notification system
//! queries a snapshot ([`NotifySettings`]) and observes changes through a
//! broadcast channel of [`ChangeType`] values. Mutation happens through
//! [`SettingsService::update_setting`] (driven by the settings UI), which
//! persists through a [`SettingsPersistenceProvider`].

pub mod errors;
pub mod events;
pub mod persistence_iface;
pub mod providers;
pub mod service;
pub mod types;

pub use errors::SettingsError;
pub use events::ChangeType;
pub use persistence_iface::SettingsPersistenceProvider;
pub use providers::{FilesystemSettingsProvider, InMemorySettingsProvider};
pub use service::{DefaultSettingsService, SettingUpdate, SettingsService};
pub use types::{NotifySettings, NotifyView, ScreenCorner};
