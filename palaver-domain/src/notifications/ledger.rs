//! Sent-reactions ledger.
//!
//! Records every reaction notification that was actually delivered, keyed by
//! (item, session), so the same reaction event never fires twice. Entries
//! are advisory and never expire on their own; scoped clears reclaim the
//! slices that go away with their session or item.

use std::collections::HashMap;
use tokio::time::Instant;

use palaver_core::types::ids::{FullItemId, SessionId};

use super::types::ReactionKey;

/// Ledger of delivered reaction notifications.
#[derive(Debug, Default)]
pub struct ReactionLedger {
    sent: HashMap<ReactionKey, Instant>,
}

impl ReactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a reaction notification was already delivered for this pair.
    /// Time elapsed does not matter: recorded pairs never re-fire.
    pub fn contains(&self, key: &ReactionKey) -> bool {
        self.sent.contains_key(key)
    }

    /// Records a delivery.
    pub fn record(&mut self, key: ReactionKey, at: Instant) {
        self.sent.insert(key, at);
    }

    /// Drops all entries for one session.
    pub fn remove_session(&mut self, session: SessionId) {
        self.sent.retain(|key, _| key.session != session);
    }

    /// Drops all entries for one item (any session).
    pub fn remove_item(&mut self, item: FullItemId) {
        self.sent.retain(|key, _| key.item != item);
    }

    pub fn clear(&mut self) {
        self.sent.clear();
    }

    pub fn len(&self) -> usize {
        self.sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palaver_core::types::ids::{MsgId, PeerId};
    use pretty_assertions::assert_eq;

    fn key(session: u64, peer: u64, msg: i64) -> ReactionKey {
        ReactionKey {
            item: FullItemId::new(PeerId(peer), MsgId(msg)),
            session: SessionId(session),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn recorded_pairs_never_refire_regardless_of_elapsed_time() {
        let mut ledger = ReactionLedger::new();
        let k = key(1, 2, 3);
        assert!(!ledger.contains(&k));

        ledger.record(k, Instant::now());
        assert!(ledger.contains(&k));

        tokio::time::advance(std::time::Duration::from_secs(60 * 60 * 24)).await;
        assert!(ledger.contains(&k), "no expiry, ever");
    }

    #[test]
    fn distinct_sessions_and_items_are_independent() {
        let mut ledger = ReactionLedger::new();
        let now = Instant::now();
        ledger.record(key(1, 2, 3), now);

        assert!(!ledger.contains(&key(2, 2, 3)), "other session");
        assert!(!ledger.contains(&key(1, 2, 4)), "other message");
        assert!(!ledger.contains(&key(1, 3, 3)), "other peer");
    }

    #[test]
    fn remove_session_drops_only_that_session() {
        let mut ledger = ReactionLedger::new();
        let now = Instant::now();
        ledger.record(key(1, 2, 3), now);
        ledger.record(key(1, 2, 4), now);
        ledger.record(key(2, 2, 3), now);

        ledger.remove_session(SessionId(1));

        assert_eq!(ledger.len(), 1);
        assert!(ledger.contains(&key(2, 2, 3)));
    }

    #[test]
    fn remove_item_drops_across_sessions() {
        let mut ledger = ReactionLedger::new();
        let now = Instant::now();
        ledger.record(key(1, 2, 3), now);
        ledger.record(key(2, 2, 3), now);
        ledger.record(key(1, 2, 4), now);

        ledger.remove_item(FullItemId::new(PeerId(2), MsgId(3)));

        assert_eq!(ledger.len(), 1);
        assert!(ledger.contains(&key(1, 2, 4)));
    }

    #[test]
    fn clear_empties_the_ledger() {
        let mut ledger = ReactionLedger::new();
        ledger.record(key(1, 2, 3), Instant::now());
        ledger.clear();
        assert!(ledger.is_empty());
    }
}
