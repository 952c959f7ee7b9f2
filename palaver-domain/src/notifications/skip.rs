//! Skip-state evaluation: should a candidate notification be suppressed?
//!
//! The rule order is a policy contract, not an implementation detail:
//! desktop master switch, then mute, then message state, then reaction
//! dedup, then count-only mode. First matching rule wins. Missing data
//! always resolves to the suppressing side.

use tracing::trace;

use super::types::{NotificationKind, SkipState};

/// Resolved inputs to the skip decision, snapshotted by the scheduler from
/// the settings service, the conversation store and the reaction ledger.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipContext {
    pub kind: NotificationKind,
    pub desktop_enabled: bool,
    pub include_muted: bool,
    pub count_messages: bool,
    /// Whether the thread could be resolved at all.
    pub thread_known: bool,
    pub thread_muted: bool,
    /// Whether the message could be resolved at all.
    pub message_known: bool,
    pub outgoing: bool,
    pub unread: bool,
    /// Whether this reaction's (item, session) pair is already in the sent
    /// ledger.
    pub reaction_already_sent: bool,
}

/// Full skip evaluation, rules in contract order.
pub fn compute_skip_state(ctx: &SkipContext) -> SkipState {
    // (a) master switch
    if !ctx.desktop_enabled {
        trace!("skip: desktop notifications disabled");
        return SkipState::skip();
    }
    // (b) mute, unless muted chats are explicitly included
    if !ctx.thread_known {
        trace!("skip: thread unknown");
        return SkipState::skip();
    }
    if ctx.thread_muted && !ctx.include_muted {
        trace!("skip: thread muted");
        return SkipState::skip();
    }
    // (c) message state; reactions target the user's own (read, often
    // outgoing) messages and are exempt
    if !ctx.message_known {
        trace!("skip: message unknown");
        return SkipState::skip();
    }
    if ctx.kind != NotificationKind::Reaction && (ctx.outgoing || !ctx.unread) {
        trace!("skip: message outgoing or already read");
        return SkipState::skip();
    }
    // (d) reaction dedup
    if ctx.kind == NotificationKind::Reaction && ctx.reaction_already_sent {
        trace!("skip: reaction already notified");
        return SkipState::skip();
    }
    // (e) count-only mode shows the notification but without content or
    // sound
    if ctx.count_messages {
        return SkipState::dont_skip(true);
    }
    SkipState::dont_skip(false)
}
