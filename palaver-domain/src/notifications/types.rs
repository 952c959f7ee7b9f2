//! Data types of the notification scheduling domain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

use palaver_core::types::ids::{
    ContextId, FullItemId, MsgId, NotificationId, PeerId, ReactionId, SessionId,
};

/// What kind of event a notification candidate represents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    /// A regular incoming message.
    #[default]
    Message,
    /// Someone reacted to one of the user's messages.
    Reaction,
    /// A scheduled message became visible.
    ScheduledReveal,
}

/// A candidate notification, created when an external event arrives and
/// consumed once scheduled or discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemNotification {
    /// The conversation or forum topic this event belongs to.
    pub context: ContextId,
    /// The message the event is about.
    pub msg_id: MsgId,
    pub kind: NotificationKind,
    /// Arrival time, set on construction.
    pub arrived: Instant,
    /// For reactions: who reacted.
    pub reaction_author: Option<PeerId>,
    /// For reactions: which reaction.
    pub reaction: Option<ReactionId>,
}

impl ItemNotification {
    pub fn new(context: ContextId, msg_id: MsgId, kind: NotificationKind) -> Self {
        Self {
            context,
            msg_id,
            kind,
            arrived: Instant::now(),
            reaction_author: None,
            reaction: None,
        }
    }

    /// Builds a reaction candidate.
    pub fn reaction(
        context: ContextId,
        msg_id: MsgId,
        author: PeerId,
        reaction: ReactionId,
    ) -> Self {
        Self {
            context,
            msg_id,
            kind: NotificationKind::Reaction,
            arrived: Instant::now(),
            reaction_author: Some(author),
            reaction: Some(reaction),
        }
    }

    /// Global identity of the message this candidate is about.
    pub fn item(&self) -> FullItemId {
        FullItemId::new(self.context.peer, self.msg_id)
    }

    /// Key into the per-context scheduling map.
    pub fn history_key(&self) -> HistoryKey {
        HistoryKey {
            msg_id: self.msg_id,
            kind: self.kind,
        }
    }

    /// Key into the sent-reactions ledger.
    pub fn reaction_key(&self) -> ReactionKey {
        ReactionKey {
            item: self.item(),
            session: self.context.session,
        }
    }
}

/// Per-context scheduling key: one entry per (message, kind) pair, so a
/// message and a reaction to it schedule independently but each at most
/// once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HistoryKey {
    pub msg_id: MsgId,
    pub kind: NotificationKind,
}

/// Key of the sent-reactions ledger: the reacted-to item plus the receiving
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReactionKey {
    pub item: FullItemId,
    pub session: SessionId,
}

/// Result of the timing policy: how long to wait, and the absolute deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub delay: Duration,
    pub when: Instant,
}

/// Per-context bookkeeping of pending notification timing.
///
/// At most one waiter exists per context; it is created with the first
/// pending entry and removed when the context's queue drains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Waiter {
    /// Scheduling key of the earliest pending entry.
    pub key: HistoryKey,
    /// Arrival time of the first pending entry (grouping anchor).
    pub first_pending: Instant,
    /// Arrival time of the most recent pending entry.
    pub latest_pending: Instant,
    /// Absolute fire deadline. Never moves earlier once set.
    pub when: Instant,
    /// Whether the one-shot settle deferral has been spent on this batch.
    pub waiting_for_grouping: bool,
    /// Peer responsible for the audible alert, when one applies.
    pub notify_by: Option<PeerId>,
}

/// Tri-state suppression verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkipVerdict {
    #[default]
    Unknown,
    Skip,
    DontSkip,
}

/// Suppression decision for a candidate, plus whether presentation must be
/// silent (count-only, no alert).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SkipState {
    pub value: SkipVerdict,
    pub silent: bool,
}

impl SkipState {
    pub fn skip() -> Self {
        Self {
            value: SkipVerdict::Skip,
            silent: false,
        }
    }

    pub fn dont_skip(silent: bool) -> Self {
        Self {
            value: SkipVerdict::DontSkip,
            silent,
        }
    }

    pub fn is_skip(&self) -> bool {
        self.value == SkipVerdict::Skip
    }
}

/// Which presentation backend variant is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManagerKind {
    /// No-op backend.
    Dummy,
    /// The embedder's in-app toast implementation.
    Default,
    /// Platform notification center.
    Native,
}

/// Display privacy flags, fully derived before the backend sees them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOptions {
    pub hide_name_and_photo: bool,
    pub hide_message_text: bool,
    pub hide_mark_as_read: bool,
    pub hide_reply_button: bool,
}

/// Fully-resolved display payload handed to the presentation backend.
///
/// Backends must render exactly this; all suppression and privacy decisions
/// have already been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationFields {
    pub id: NotificationId,
    pub kind: NotificationKind,
    /// Chat or topic title (or the application name when names are hidden).
    pub title: String,
    /// Sender name, absent for single-sender chats or when names are hidden.
    pub subtitle: Option<String>,
    pub body: String,
    /// Number of messages folded into this notification (1 for a single).
    pub group_count: u32,
    /// Forwarded-batch size carried through from the message snapshot.
    pub forwarded_count: u32,
    /// The reaction shown, for reaction notifications.
    pub reaction: Option<ReactionId>,
    pub options: DisplayOptions,
    /// Wall-clock time the fields were resolved.
    pub timestamp: DateTime<Utc>,
}

/// UI-bound events produced when the user interacts with a displayed
/// notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationEvent {
    /// The notification was clicked; the conversation should be opened,
    /// optionally pre-filling a draft.
    Activated {
        id: NotificationId,
        draft: Option<String>,
    },
    /// The user replied inline; the text should be sent to the conversation.
    Replied { id: NotificationId, text: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use palaver_core::types::ids::DocumentId;
    use pretty_assertions::assert_eq;

    #[test]
    fn candidate_derives_its_keys() {
        let ctx = ContextId::history(SessionId(3), PeerId(9));
        let candidate = ItemNotification::new(ctx, MsgId(21), NotificationKind::Message);

        assert_eq!(candidate.item(), FullItemId::new(PeerId(9), MsgId(21)));
        assert_eq!(
            candidate.history_key(),
            HistoryKey {
                msg_id: MsgId(21),
                kind: NotificationKind::Message
            }
        );
        assert_eq!(candidate.reaction_key().session, SessionId(3));
    }

    #[test]
    fn reaction_constructor_fills_reaction_fields() {
        let ctx = ContextId::history(SessionId(1), PeerId(2));
        let candidate = ItemNotification::reaction(
            ctx,
            MsgId(5),
            PeerId(77),
            ReactionId::Emoji("🔥".to_string()),
        );
        assert_eq!(candidate.kind, NotificationKind::Reaction);
        assert_eq!(candidate.reaction_author, Some(PeerId(77)));
        assert!(matches!(candidate.reaction, Some(ReactionId::Emoji(_))));
    }

    #[test]
    fn history_keys_distinguish_kinds_for_same_message() {
        let a = HistoryKey {
            msg_id: MsgId(5),
            kind: NotificationKind::Message,
        };
        let b = HistoryKey {
            msg_id: MsgId(5),
            kind: NotificationKind::Reaction,
        };
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn skip_state_helpers() {
        assert!(SkipState::skip().is_skip());
        assert!(!SkipState::dont_skip(true).is_skip());
        assert!(SkipState::dont_skip(true).silent);
        assert_eq!(SkipState::default().value, SkipVerdict::Unknown);
    }

    #[test]
    fn manager_kind_serde() {
        let ser = serde_json::to_string(&ManagerKind::Native).unwrap();
        assert_eq!(ser, "\"native\"");
    }

    #[test]
    fn notification_fields_serde_round_trip() {
        let fields = NotificationFields {
            id: NotificationId::new(ContextId::history(SessionId(1), PeerId(2)), MsgId(3)),
            kind: NotificationKind::Reaction,
            title: "chat".to_string(),
            subtitle: Some("sender".to_string()),
            body: "body".to_string(),
            group_count: 1,
            forwarded_count: 0,
            reaction: Some(ReactionId::CustomEmoji(DocumentId(4))),
            options: DisplayOptions::default(),
            timestamp: Utc::now(),
        };
        let ser = serde_json::to_string(&fields).unwrap();
        let back: NotificationFields = serde_json::from_str(&ser).unwrap();
        assert_eq!(back, fields);
    }
}
