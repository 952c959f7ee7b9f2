//! Core data types for the Palaver messenger.
//!
//! Everything in the messaging data model is addressed by opaque numeric
//! identifiers owned by the conversation store; this module defines the
//! newtypes and composites the rest of the workspace uses to refer to
//! sessions, peers, messages and documents without ever holding the data
//! itself.

pub mod ids;

pub use ids::{
    ContextId, DocumentId, FullItemId, MsgId, NotificationId, PeerId, ReactionId, SessionId,
};
