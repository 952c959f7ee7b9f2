//! Presentation backend contract.
//!
//! A [`NotificationManager`] consumes fully-resolved display fields and maps
//! the scheduler's scope-based clears onto whatever platform handles it
//! maintains. Native notification centers typically cannot edit a shown
//! toast in place, so `update_all` and `clear_all` default to the fast
//! clear; backends that can do better override them.

use async_trait::async_trait;

use palaver_core::types::ids::{ContextId, FullItemId, PeerId, ReactionId, SessionId};

use crate::settings::types::{NotifySettings, NotifyView};

use super::types::{DisplayOptions, ManagerKind, NotificationFields, NotificationKind};

/// Capability set required of any presentation backend.
///
/// Backends must not re-derive suppression logic; every decision is already
/// baked into the [`NotificationFields`] they receive.
#[async_trait]
pub trait NotificationManager: Send + Sync {
    fn kind(&self) -> ManagerKind;

    /// Displays a notification. Failures are the backend's to absorb; the
    /// scheduler considers the candidate delivered once dispatched.
    async fn show_notification(&self, fields: NotificationFields);

    /// Removes everything without per-item ceremony. Used on shutdown.
    async fn clear_all_fast(&self);

    async fn clear_from_item(&self, session: SessionId, item: FullItemId);
    async fn clear_from_topic(&self, topic: ContextId);
    async fn clear_from_history(&self, session: SessionId, peer: PeerId);
    async fn clear_from_session(&self, session: SessionId);

    /// Re-renders currently-visible notifications after display settings
    /// changed.
    async fn update_all(&self) {
        self.clear_all_fast().await;
    }

    /// Graceful variant of [`Self::clear_all_fast`].
    async fn clear_all(&self) {
        self.clear_all_fast().await;
    }

    /// Whether the backend handles audio itself (the scheduler then does not
    /// play sounds).
    fn skip_audio(&self) -> bool {
        false
    }

    /// Whether the backend suppresses visual toasts (e.g. the platform is in
    /// a do-not-disturb presentation mode).
    fn skip_toast(&self) -> bool {
        false
    }

    /// Whether taskbar flash / dock bounce must be suppressed.
    fn skip_flash_bounce(&self) -> bool {
        false
    }

    /// Flashes the taskbar entry / bounces the dock icon. Invoked by the
    /// scheduler only when the setting allows it and
    /// [`Self::skip_flash_bounce`] is `false`.
    async fn flash_bounce(&self) {}

    /// Backends that cannot guarantee private display (e.g. lock-screen
    /// visible centers) force details hidden regardless of settings.
    fn force_hide_details(&self) -> bool {
        false
    }

    /// Derives display privacy flags from the user's settings combined with
    /// this backend's capability.
    fn notification_options(
        &self,
        settings: &NotifySettings,
        kind: NotificationKind,
    ) -> DisplayOptions {
        let hide_everything = self.force_hide_details() || settings.view == NotifyView::ShowNothing;
        let hide_text = hide_everything || settings.view != NotifyView::ShowPreview;
        let hide_mark_as_read = hide_text || kind != NotificationKind::Message;
        DisplayOptions {
            hide_name_and_photo: hide_everything,
            hide_message_text: hide_text,
            hide_mark_as_read,
            hide_reply_button: hide_mark_as_read,
        }
    }
}

/// Backend that drops everything on the floor. Installed by default until an
/// embedder provides a real one.
#[derive(Debug, Default, Clone, Copy)]
pub struct DummyManager;

#[async_trait]
impl NotificationManager for DummyManager {
    fn kind(&self) -> ManagerKind {
        ManagerKind::Dummy
    }

    async fn show_notification(&self, _fields: NotificationFields) {}

    async fn clear_all_fast(&self) {}

    async fn clear_from_item(&self, _session: SessionId, _item: FullItemId) {}

    async fn clear_from_topic(&self, _topic: ContextId) {}

    async fn clear_from_history(&self, _session: SessionId, _peer: PeerId) {}

    async fn clear_from_session(&self, _session: SessionId) {}
}

/// Body text for a reaction notification.
///
/// With content hidden the reacted-to message is not quoted.
pub fn compose_reaction_notification(
    author: &str,
    reaction: &ReactionId,
    item_preview: Option<&str>,
) -> String {
    match (reaction, item_preview) {
        (ReactionId::Emoji(emoji), Some(preview)) => {
            format!("{} reacted {} to \"{}\"", author, emoji, preview)
        }
        (ReactionId::Emoji(emoji), None) => {
            format!("{} reacted {} to your message", author, emoji)
        }
        (ReactionId::CustomEmoji(_), Some(preview)) => {
            format!("{} sent a custom reaction to \"{}\"", author, preview)
        }
        (ReactionId::CustomEmoji(_), None) => {
            format!("{} sent a custom reaction to your message", author)
        }
    }
}

/// Prefixes a scheduled-message reveal body so it is recognizable as one.
pub fn wrap_from_scheduled(text: &str) -> String {
    format!("\u{1F4C5} {}", text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use palaver_core::types::ids::DocumentId;
    use pretty_assertions::assert_eq;

    /// Probe backend: records nothing, but lets us exercise the provided
    /// trait methods, including a `force_hide_details` override.
    struct Probe {
        force_hide: bool,
    }

    #[async_trait]
    impl NotificationManager for Probe {
        fn kind(&self) -> ManagerKind {
            ManagerKind::Native
        }
        async fn show_notification(&self, _fields: NotificationFields) {}
        async fn clear_all_fast(&self) {}
        async fn clear_from_item(&self, _session: SessionId, _item: FullItemId) {}
        async fn clear_from_topic(&self, _topic: ContextId) {}
        async fn clear_from_history(&self, _session: SessionId, _peer: PeerId) {}
        async fn clear_from_session(&self, _session: SessionId) {}
        fn force_hide_details(&self) -> bool {
            self.force_hide
        }
    }

    #[test]
    fn options_show_everything_for_preview_view() {
        let probe = Probe { force_hide: false };
        let settings = NotifySettings::default();
        let options = probe.notification_options(&settings, NotificationKind::Message);
        assert_eq!(options, DisplayOptions::default());
    }

    #[test]
    fn options_hide_text_for_name_only_view() {
        let probe = Probe { force_hide: false };
        let mut settings = NotifySettings::default();
        settings.view = NotifyView::ShowName;
        let options = probe.notification_options(&settings, NotificationKind::Message);
        assert!(!options.hide_name_and_photo);
        assert!(options.hide_message_text);
        assert!(options.hide_mark_as_read);
        assert!(options.hide_reply_button);
    }

    #[test]
    fn options_hide_everything_for_show_nothing_view() {
        let probe = Probe { force_hide: false };
        let mut settings = NotifySettings::default();
        settings.view = NotifyView::ShowNothing;
        let options = probe.notification_options(&settings, NotificationKind::Message);
        assert!(options.hide_name_and_photo);
        assert!(options.hide_message_text);
    }

    #[test]
    fn force_hide_details_overrides_settings() {
        let probe = Probe { force_hide: true };
        let settings = NotifySettings::default();
        let options = probe.notification_options(&settings, NotificationKind::Message);
        assert!(options.hide_name_and_photo);
        assert!(options.hide_message_text);
    }

    #[test]
    fn reactions_never_offer_mark_as_read() {
        let probe = Probe { force_hide: false };
        let settings = NotifySettings::default();
        let options = probe.notification_options(&settings, NotificationKind::Reaction);
        assert!(!options.hide_message_text);
        assert!(options.hide_mark_as_read);
        assert!(options.hide_reply_button);
    }

    #[tokio::test]
    async fn dummy_manager_is_inert() {
        let dummy = DummyManager;
        assert_eq!(dummy.kind(), ManagerKind::Dummy);
        assert!(!dummy.skip_audio());
        assert!(!dummy.skip_toast());
        assert!(!dummy.skip_flash_bounce());
        dummy.clear_all().await;
        dummy.update_all().await;
        dummy.clear_from_session(SessionId(1)).await;
    }

    #[test]
    fn reaction_body_composition() {
        let emoji = ReactionId::Emoji("👍".to_string());
        assert_eq!(
            compose_reaction_notification("Ada", &emoji, Some("see you at 5")),
            "Ada reacted 👍 to \"see you at 5\""
        );
        assert_eq!(
            compose_reaction_notification("Ada", &emoji, None),
            "Ada reacted 👍 to your message"
        );
        let custom = ReactionId::CustomEmoji(DocumentId(7));
        assert_eq!(
            compose_reaction_notification("Ada", &custom, None),
            "Ada sent a custom reaction to your message"
        );
    }

    #[test]
    fn scheduled_wrap_prefixes_calendar_marker() {
        assert_eq!(wrap_from_scheduled("Happy birthday!"), "📅 Happy birthday!");
    }
}
