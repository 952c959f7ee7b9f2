//! Domain layer for the Palaver messenger.
//!
//! This crate decides *when* and *whether* a pending messaging event (an
//! incoming message, a reaction, a scheduled-message reveal) is surfaced to
//! the user as a notification. It deduplicates and groups related events and
//! hands fully-resolved display fields to a pluggable presentation backend.
//!
//! Rendering, platform notification APIs, sound decoding and user-settings
//! storage live outside this crate, behind the trait ports in [`ports`] and
//! [`settings`].

// Re-export core module
pub use palaver_core as core;

// Export domain modules
pub mod error;
pub mod notifications;
pub mod ports;
pub mod settings;

// Re-export common types and interfaces
pub use error::DomainError;
pub use notifications::{
    ActivationEvent, DisplayOptions, ItemNotification, ManagerKind, NotificationError,
    NotificationFields, NotificationKind, NotificationManager, NotificationSystem, SkipState,
    SkipVerdict,
};
pub use ports::{
    AudioBackend, AudioTrack, ConversationStore, InMemoryConversationStore, MessageSnapshot,
    NullAudioBackend, SoundSource, ThreadInfo,
};
pub use settings::{
    ChangeType, DefaultSettingsService, NotifySettings, NotifyView, ScreenCorner, SettingUpdate,
    SettingsError, SettingsService,
};
