//! Notification settings data structures.

use serde::{Deserialize, Serialize};

/// How much of a message a notification is allowed to show.
///
/// Ordered from most to least revealing; privacy checks compare against this
/// order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum NotifyView {
    /// Sender name and message text.
    #[default]
    ShowPreview,
    /// Sender name only.
    ShowName,
    /// Neither name nor text.
    ShowNothing,
}

/// Screen corner where the backend places notification popups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ScreenCorner {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

/// Snapshot of every setting the notification subsystem consults.
///
/// The scheduler treats this as read-only; changes arrive via the
/// [`super::events::ChangeType`] broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifySettings {
    /// Master switch for desktop notifications.
    pub desktop_enabled: bool,
    /// Whether an audible alert accompanies notifications.
    pub sound_enabled: bool,
    /// Whether the taskbar/dock may flash or bounce on new notifications.
    pub flash_bounce_enabled: bool,
    /// Whether muted conversations still produce (silent) notifications.
    pub include_muted: bool,
    /// Count-only mode: show "N new messages" instead of message content.
    pub count_messages: bool,
    /// Privacy level for notification content.
    pub view: NotifyView,
    /// Maximum number of simultaneously visible notifications.
    pub max_count: u32,
    /// Popup placement.
    pub corner: ScreenCorner,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            desktop_enabled: true,
            sound_enabled: true,
            flash_bounce_enabled: true,
            include_muted: false,
            count_messages: false,
            view: NotifyView::ShowPreview,
            max_count: 3,
            corner: ScreenCorner::BottomRight,
        }
    }
}

impl NotifySettings {
    /// Bounds `max_count` to the range the presentation backends support.
    pub const MAX_COUNT_LIMIT: u32 = 5;

    pub fn validate(&self) -> Result<(), super::errors::SettingsError> {
        if self.max_count == 0 || self.max_count > Self::MAX_COUNT_LIMIT {
            return Err(super::errors::SettingsError::Validation(format!(
                "max_count must be within 1..={}, got {}",
                Self::MAX_COUNT_LIMIT,
                self.max_count
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_conservative_and_valid() {
        let settings = NotifySettings::default();
        assert!(settings.desktop_enabled);
        assert!(!settings.include_muted);
        assert!(!settings.count_messages);
        assert_eq!(settings.view, NotifyView::ShowPreview);
        assert_eq!(settings.max_count, 3);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn max_count_bounds_are_enforced() {
        let mut settings = NotifySettings::default();
        settings.max_count = 0;
        assert!(settings.validate().is_err());
        settings.max_count = 6;
        assert!(settings.validate().is_err());
        settings.max_count = 5;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn view_levels_order_by_privacy() {
        assert!(NotifyView::ShowPreview < NotifyView::ShowName);
        assert!(NotifyView::ShowName < NotifyView::ShowNothing);
    }

    #[test]
    fn settings_toml_round_trip() {
        let mut settings = NotifySettings::default();
        settings.view = NotifyView::ShowName;
        settings.corner = ScreenCorner::TopLeft;
        let serialized = toml::to_string(&settings).unwrap();
        assert!(serialized.contains("view = \"show-name\""));
        assert!(serialized.contains("corner = \"top-left\""));
        let back: NotifySettings = toml::from_str(&serialized).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let settings: NotifySettings = toml::from_str("desktop_enabled = false").unwrap();
        assert!(!settings.desktop_enabled);
        assert!(settings.sound_enabled);
        assert_eq!(settings.max_count, 3);
    }
}
