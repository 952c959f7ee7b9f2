//! Identifier newtypes for the messaging data model.
//!
//! All identifiers are opaque handles minted by the conversation store (or
//! the server behind it); this crate never interprets their numeric values
//! beyond equality and ordering. The composites ([`ContextId`],
//! [`FullItemId`], [`NotificationId`]) are the addressing units the
//! notification subsystem keys its state by.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an account session. A multi-account client runs one session
/// per logged-in account.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(pub u64);

/// Identifier of a peer (user, group or channel) within a session.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PeerId(pub u64);

/// Identifier of a message within a conversation.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MsgId(pub i64);

impl MsgId {
    /// Sentinel for "no message". Used by [`ContextId::topic_root_id`] to
    /// address a whole conversation rather than a forum topic.
    pub const NONE: MsgId = MsgId(0);
}

/// Identifier of a stored document (used here for custom notification
/// sounds).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DocumentId(pub u64);

/// Address of a notification context: a conversation, or a forum topic
/// inside one.
///
/// A context is the unit of notification grouping. `topic_root_id` is
/// [`MsgId::NONE`] for plain conversations and the topic's root message id
/// for forum topics.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ContextId {
    pub session: SessionId,
    pub peer: PeerId,
    pub topic_root_id: MsgId,
}

impl ContextId {
    /// Addresses a whole conversation.
    pub fn history(session: SessionId, peer: PeerId) -> Self {
        Self {
            session,
            peer,
            topic_root_id: MsgId::NONE,
        }
    }

    /// Addresses a forum topic inside a conversation.
    pub fn topic(session: SessionId, peer: PeerId, topic_root_id: MsgId) -> Self {
        Self {
            session,
            peer,
            topic_root_id,
        }
    }

    /// Whether this context addresses a forum topic rather than a whole
    /// conversation.
    pub fn is_topic(&self) -> bool {
        self.topic_root_id != MsgId::NONE
    }

    /// The context addressing the enclosing conversation (identity for
    /// non-topic contexts).
    pub fn history_context(&self) -> ContextId {
        ContextId::history(self.session, self.peer)
    }
}

/// Global identity of a message: the peer it lives under plus its id.
///
/// The session is carried separately (see [`ContextId`] and the reaction
/// ledger key) because item ids are only unique per session.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct FullItemId {
    pub peer: PeerId,
    pub msg: MsgId,
}

impl FullItemId {
    pub fn new(peer: PeerId, msg: MsgId) -> Self {
        Self { peer, msg }
    }
}

/// Handle a presentation backend keeps per displayed notification.
///
/// Round-trips through the activation callbacks: the backend hands it back
/// when the user clicks or replies, and the scheduler resolves it to a
/// conversation.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NotificationId {
    pub context: ContextId,
    pub msg_id: MsgId,
}

impl NotificationId {
    pub fn new(context: ContextId, msg_id: MsgId) -> Self {
        Self { context, msg_id }
    }
}

/// Identity of a reaction: either a unicode emoji or a custom emoji
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReactionId {
    Emoji(String),
    CustomEmoji(DocumentId),
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MsgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn context_id_history_is_not_a_topic() {
        let ctx = ContextId::history(SessionId(1), PeerId(42));
        assert!(!ctx.is_topic());
        assert_eq!(ctx.topic_root_id, MsgId::NONE);
        assert_eq!(ctx.history_context(), ctx);
    }

    #[test]
    fn context_id_topic_round_trips_to_history() {
        let topic = ContextId::topic(SessionId(1), PeerId(42), MsgId(7));
        assert!(topic.is_topic());
        let history = topic.history_context();
        assert!(!history.is_topic());
        assert_eq!(history.peer, topic.peer);
        assert_eq!(history.session, topic.session);
    }

    #[test]
    fn ids_order_by_value() {
        assert!(MsgId(1) < MsgId(2));
        assert!(SessionId(9) > SessionId(3));
        let a = FullItemId::new(PeerId(1), MsgId(5));
        let b = FullItemId::new(PeerId(1), MsgId(6));
        let c = FullItemId::new(PeerId(2), MsgId(1));
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn ids_serialize_transparently() {
        let serialized = serde_json::to_string(&MsgId(17)).unwrap();
        assert_eq!(serialized, "17");
        let ctx = ContextId::topic(SessionId(1), PeerId(2), MsgId(3));
        let json = serde_json::to_string(&ctx).unwrap();
        assert_eq!(json, r#"{"session":1,"peer":2,"topic_root_id":3}"#);
        let back: ContextId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ctx);
    }

    #[test]
    fn reaction_id_serde() {
        let emoji = ReactionId::Emoji("👍".to_string());
        let ser = serde_json::to_string(&emoji).unwrap();
        assert_eq!(ser, r#"{"emoji":"👍"}"#);
        assert_eq!(serde_json::from_str::<ReactionId>(&ser).unwrap(), emoji);

        let custom = ReactionId::CustomEmoji(DocumentId(99));
        let ser = serde_json::to_string(&custom).unwrap();
        assert_eq!(ser, r#"{"custom-emoji":99}"#);
        assert_eq!(serde_json::from_str::<ReactionId>(&ser).unwrap(), custom);
    }
}
