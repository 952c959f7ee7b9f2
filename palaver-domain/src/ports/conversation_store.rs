//! Conversation store port.
//!
//! The store is the source of truth for all display data; the scheduler
//! holds only opaque ids and asks for snapshots at presentation time. Every
//! lookup may legitimately fail (the data raced away between scheduling and
//! firing) and the scheduler treats `None` as a silent drop.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use palaver_core::types::ids::{ContextId, DocumentId, FullItemId, PeerId, SessionId};

/// Snapshot of the conversation (or forum topic) a context addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadInfo {
    /// Display title: chat name, or topic name for topics.
    pub title: String,
    /// Whether notifications for this thread are muted.
    pub muted: bool,
    /// Custom notification sound, if the user picked one for this thread.
    pub sound: Option<DocumentId>,
}

/// Snapshot of a single message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSnapshot {
    /// Display name of the sender.
    pub author_name: String,
    /// Short text preview for the notification body.
    pub preview: String,
    /// Whether the current user sent this message.
    pub outgoing: bool,
    /// Whether the message is still unread.
    pub unread: bool,
    /// For forwarded albums: how many messages arrived as one forward batch.
    pub forwarded_count: u32,
}

/// Read-only lookup surface over conversations, messages and peers.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn thread_info(&self, context: ContextId) -> Option<ThreadInfo>;
    async fn message(&self, session: SessionId, item: FullItemId) -> Option<MessageSnapshot>;
    async fn peer_name(&self, session: SessionId, peer: PeerId) -> Option<String>;
    async fn session_exists(&self, session: SessionId) -> bool;
    /// Emits the context of every forum topic that gets deleted, so pending
    /// notifications for it can be cancelled.
    fn subscribe_topic_removed(&self) -> broadcast::Receiver<ContextId>;
}

// --- InMemoryConversationStore ---

/// Hash-map-backed store used by the test suite and headless embedders.
pub struct InMemoryConversationStore {
    threads: RwLock<HashMap<ContextId, ThreadInfo>>,
    messages: RwLock<HashMap<(SessionId, FullItemId), MessageSnapshot>>,
    peers: RwLock<HashMap<(SessionId, PeerId), String>>,
    sessions: RwLock<HashSet<SessionId>>,
    topic_removed: broadcast::Sender<ContextId>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        let (topic_removed, _) = broadcast::channel(16);
        Self {
            threads: RwLock::new(HashMap::new()),
            messages: RwLock::new(HashMap::new()),
            peers: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashSet::new()),
            topic_removed,
        }
    }

    pub async fn insert_thread(&self, context: ContextId, info: ThreadInfo) {
        self.sessions.write().await.insert(context.session);
        self.threads.write().await.insert(context, info);
    }

    pub async fn insert_message(
        &self,
        session: SessionId,
        item: FullItemId,
        snapshot: MessageSnapshot,
    ) {
        self.sessions.write().await.insert(session);
        self.messages.write().await.insert((session, item), snapshot);
    }

    pub async fn insert_peer(&self, session: SessionId, peer: PeerId, name: impl Into<String>) {
        self.peers.write().await.insert((session, peer), name.into());
    }

    pub async fn set_muted(&self, context: ContextId, muted: bool) {
        if let Some(info) = self.threads.write().await.get_mut(&context) {
            info.muted = muted;
        }
    }

    pub async fn mark_read(&self, session: SessionId, item: FullItemId) {
        if let Some(snapshot) = self.messages.write().await.get_mut(&(session, item)) {
            snapshot.unread = false;
        }
    }

    pub async fn remove_message(&self, session: SessionId, item: FullItemId) {
        self.messages.write().await.remove(&(session, item));
    }

    /// Deletes a topic and announces the deletion to subscribers.
    pub async fn remove_topic(&self, context: ContextId) {
        self.threads.write().await.remove(&context);
        let _ = self.topic_removed.send(context);
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn thread_info(&self, context: ContextId) -> Option<ThreadInfo> {
        self.threads.read().await.get(&context).cloned()
    }

    async fn message(&self, session: SessionId, item: FullItemId) -> Option<MessageSnapshot> {
        self.messages.read().await.get(&(session, item)).cloned()
    }

    async fn peer_name(&self, session: SessionId, peer: PeerId) -> Option<String> {
        self.peers.read().await.get(&(session, peer)).cloned()
    }

    async fn session_exists(&self, session: SessionId) -> bool {
        self.sessions.read().await.contains(&session)
    }

    fn subscribe_topic_removed(&self) -> broadcast::Receiver<ContextId> {
        self.topic_removed.subscribe()
    }
}
