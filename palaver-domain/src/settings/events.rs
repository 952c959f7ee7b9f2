//! Settings change events.

use serde::{Deserialize, Serialize};

/// Kind of settings change, broadcast to subscribers whenever a notification
/// setting is updated.
///
/// The scheduler reacts per kind: disabling desktop notifications clears
/// everything visible, view/placement changes re-render, sound and flash
/// kinds are consulted lazily at alert time. The demo pair brackets the
/// settings UI showing its sample notification popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeType {
    SoundEnabled,
    FlashBounceEnabled,
    IncludeMuted,
    CountMessages,
    DesktopEnabled,
    ViewParams,
    MaxCount,
    Corner,
    DemoIsShown,
    DemoIsHidden,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_type_serde() {
        let ser = serde_json::to_string(&ChangeType::FlashBounceEnabled).unwrap();
        assert_eq!(ser, "\"flash-bounce-enabled\"");
        let back: ChangeType = serde_json::from_str(&ser).unwrap();
        assert_eq!(back, ChangeType::FlashBounceEnabled);
    }
}
