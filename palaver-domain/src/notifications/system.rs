//! The notification scheduler.
//!
//! [`NotificationSystem`] owns all scheduling state and the timers that
//! drive it. Candidates arrive through [`NotificationSystem::schedule`];
//! a single driver task multiplexes the wait timer (earliest deadline
//! across all waiters), per-context grouping settle deadlines, the
//! settings-change broadcast and topic-removal events. Presentation goes
//! through the installed [`NotificationManager`].
//!
//! All state mutation passes through one async mutex, so timer callbacks
//! and externally-triggered calls interleave without overlapping mutation.
//! `show_next`
//! re-reads live state around the (unlocked) backend call and removes only
//! the entries it actually presented, so a `schedule` racing with a
//! presentation pass is never lost.

use std::collections::{hash_map::Entry, BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, Mutex, Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, trace, warn};

use palaver_core::config::NotifyTimings;
use palaver_core::types::ids::{
    ContextId, DocumentId, FullItemId, NotificationId, PeerId, ReactionId, SessionId,
};

use crate::ports::audio::AudioBackend;
use crate::ports::conversation_store::{ConversationStore, MessageSnapshot, ThreadInfo};
use crate::settings::events::ChangeType;
use crate::settings::service::SettingsService;
use crate::settings::types::NotifySettings;

use super::ledger::ReactionLedger;
use super::manager::{
    compose_reaction_notification, wrap_from_scheduled, DummyManager, NotificationManager,
};
use super::skip::{compute_skip_state, SkipContext};
use super::sound::SoundCache;
use super::timing::count_timing;
use super::types::{
    ActivationEvent, DisplayOptions, HistoryKey, ItemNotification, NotificationFields,
    NotificationKind, ReactionKey, SkipState, Waiter,
};

/// Title used when the sender's name must be hidden.
const APP_TITLE: &str = "Palaver";

/// One scheduled notification: its fire deadline plus the reaction payload
/// needed at presentation time.
#[derive(Debug, Clone)]
struct ScheduledEntry {
    when: Instant,
    reaction_author: Option<PeerId>,
    reaction: Option<ReactionId>,
}

/// A batch of entries for one context that came due together.
#[derive(Debug, Clone)]
struct DueBatch {
    keys: Vec<HistoryKey>,
    count: u32,
    last_key: HistoryKey,
    last_entry: ScheduledEntry,
    any_alert: bool,
}

#[derive(Default)]
struct SchedulerState {
    /// Per-context map of scheduled entries; entries never move earlier and
    /// are removed once presented or cleared.
    when_maps: HashMap<ContextId, BTreeMap<HistoryKey, ScheduledEntry>>,
    /// At most one waiter per context.
    waiters: HashMap<ContextId, Waiter>,
    /// Per-context alert slots (fire time -> originating peer); sound is
    /// deduped per slot, separately from visual notifications.
    when_alerts: HashMap<ContextId, BTreeMap<Instant, Option<PeerId>>>,
    sent_reactions: ReactionLedger,
    /// Forum topics with pending notifications; topic deletion cancels them.
    watched_topics: HashSet<ContextId>,
    /// Contexts whose batch is between pick and cleanup. A concurrent
    /// due-pass (`check_delayed` racing the driver) must not pick them again.
    in_flight: HashSet<ContextId>,
    sounds: SoundCache,
}

impl SchedulerState {
    fn new() -> Self {
        Self {
            sounds: SoundCache::new(),
            ..Default::default()
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.waiters.values().map(|w| w.when).min()
    }
}

/// Counters over the scheduler's internal state, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemDiagnostics {
    pub waiters: usize,
    pub scheduled_entries: usize,
    pub alert_slots: usize,
    pub ledger_entries: usize,
    pub watched_topics: usize,
}

struct SystemInner {
    state: Mutex<SchedulerState>,
    manager: RwLock<Arc<dyn NotificationManager>>,
    store: Arc<dyn ConversationStore>,
    settings: Arc<dyn SettingsService>,
    audio: Arc<dyn AudioBackend>,
    timings: NotifyTimings,
    /// Poked whenever deadlines may have changed, so the driver re-arms.
    rearm: Notify,
    activations: broadcast::Sender<ActivationEvent>,
}

/// The notification scheduling system.
///
/// Construction spawns the driver task, so a Tokio runtime must be current.
/// Dropping the system aborts the driver.
pub struct NotificationSystem {
    inner: Arc<SystemInner>,
    driver: JoinHandle<()>,
}

impl NotificationSystem {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        settings: Arc<dyn SettingsService>,
        audio: Arc<dyn AudioBackend>,
        timings: NotifyTimings,
    ) -> Self {
        let (activations, _) = broadcast::channel(32);
        // Subscribe before the driver is spawned so no change events
        // published between construction and the task's first poll are lost.
        let settings_rx = settings.subscribe_to_changes();
        let topics_rx = store.subscribe_topic_removed();
        let inner = Arc::new(SystemInner {
            state: Mutex::new(SchedulerState::new()),
            manager: RwLock::new(Arc::new(DummyManager) as Arc<dyn NotificationManager>),
            store,
            settings,
            audio,
            timings,
            rearm: Notify::new(),
            activations,
        });
        let driver = spawn_driver(inner.clone(), settings_rx, topics_rx);
        Self { inner, driver }
    }

    /// Installs the presentation backend. Swappable at runtime; pending
    /// scheduling state is unaffected.
    pub async fn set_manager(&self, manager: Arc<dyn NotificationManager>) {
        *self.inner.manager.write().await = manager;
    }

    /// The currently-installed presentation backend.
    pub async fn manager(&self) -> Arc<dyn NotificationManager> {
        self.inner.manager.read().await.clone()
    }

    /// Installs the default (no-op) backend.
    pub async fn create_manager(&self) {
        self.set_manager(Arc::new(DummyManager)).await;
    }

    /// Submits a candidate notification for scheduling.
    pub async fn schedule(&self, notification: ItemNotification) {
        self.inner.schedule(notification).await;
    }

    /// Runs a due-pass immediately instead of waiting for the timer. Used by
    /// embedders after focus or data changes that may have made pending
    /// entries presentable.
    pub async fn check_delayed(&self) {
        self.inner.show_next().await;
    }

    /// Cancels pending and visible notifications for one forum topic.
    pub async fn clear_from_topic(&self, topic: ContextId) {
        self.inner.clear_for_context_if(|c| *c == topic).await;
        self.inner.manager.read().await.clear_from_topic(topic).await;
    }

    /// Cancels only the pending (not yet shown) notifications for a topic.
    pub async fn clear_incoming_from_topic(&self, topic: ContextId) {
        self.inner.clear_for_context_if(|c| *c == topic).await;
    }

    /// Cancels pending and visible notifications for a whole conversation,
    /// including its topics.
    pub async fn clear_from_history(&self, session: SessionId, peer: PeerId) {
        self.inner
            .clear_for_context_if(|c| c.session == session && c.peer == peer)
            .await;
        self.inner
            .manager
            .read()
            .await
            .clear_from_history(session, peer)
            .await;
    }

    /// Cancels only the pending notifications for a conversation.
    pub async fn clear_incoming_from_history(&self, session: SessionId, peer: PeerId) {
        self.inner
            .clear_for_context_if(|c| c.session == session && c.peer == peer)
            .await;
    }

    /// Cancels everything belonging to one account session, including its
    /// slice of the reaction ledger.
    pub async fn clear_from_session(&self, session: SessionId) {
        self.inner
            .clear_for_context_if(|c| c.session == session)
            .await;
        {
            let mut state = self.inner.state.lock().await;
            state.sent_reactions.remove_session(session);
        }
        self.inner
            .manager
            .read()
            .await
            .clear_from_session(session)
            .await;
    }

    /// Cancels everything referring to one message (pending entries, ledger
    /// entries and whatever the backend shows for it).
    pub async fn clear_from_item(&self, session: SessionId, item: FullItemId) {
        self.inner.clear_from_item(session, item).await;
        self.inner
            .manager
            .read()
            .await
            .clear_from_item(session, item)
            .await;
    }

    /// Flushes all state and clears the backend gracefully.
    pub async fn clear_all(&self) {
        self.inner.flush_state().await;
        self.inner.manager.read().await.clear_all().await;
    }

    /// Shutdown path: flushes all state and fast-clears the backend. Leaves
    /// zero residual waiters, scheduled entries or ledger entries and parks
    /// both timers.
    pub async fn clear_all_fast(&self) {
        self.inner.flush_state().await;
        self.inner.manager.read().await.clear_all_fast().await;
    }

    /// Asks the backend to re-render everything visible. Scheduling state is
    /// untouched.
    pub async fn update_all(&self) {
        self.inner.manager.read().await.update_all().await;
    }

    /// Plays a thread's notification sound; `None` plays the default track.
    /// Best-effort: failures are logged and swallowed.
    pub async fn play_sound(&self, session: SessionId, document: Option<DocumentId>) {
        self.inner.play_sound(session, document).await;
    }

    /// Re-broadcasts a settings change kind to all observers (including the
    /// scheduler's own driver).
    pub fn notify_settings_changed(&self, kind: ChangeType) {
        self.inner.settings.notify_changed(kind);
    }

    /// The settings-change broadcast this system reacts to.
    pub fn settings_changed(&self) -> broadcast::Receiver<ChangeType> {
        self.inner.settings.subscribe_to_changes()
    }

    /// UI-bound activation/reply events produced by
    /// [`Self::notification_activated`] and [`Self::notification_replied`].
    pub fn subscribe_activations(&self) -> broadcast::Receiver<ActivationEvent> {
        self.inner.activations.subscribe()
    }

    /// Whether an account session is still alive in the conversation store.
    pub async fn find_session(&self, session: SessionId) -> bool {
        self.inner.store.session_exists(session).await
    }

    /// Inbound from the backend: the user clicked a notification. Stale ids
    /// are dropped silently.
    pub async fn notification_activated(&self, id: NotificationId, draft: Option<String>) {
        if !self.find_session(id.context.session).await {
            debug!(?id, "Activation for a vanished session dropped.");
            return;
        }
        if self.inner.store.thread_info(id.context).await.is_none() {
            debug!(?id, "Activation for a vanished thread dropped.");
            return;
        }
        let _ = self
            .inner
            .activations
            .send(ActivationEvent::Activated { id, draft });
    }

    /// Inbound from the backend: the user replied inline.
    pub async fn notification_replied(&self, id: NotificationId, text: String) {
        if text.is_empty() {
            return;
        }
        if self.inner.store.thread_info(id.context).await.is_none() {
            debug!(?id, "Reply for a vanished thread dropped.");
            return;
        }
        let _ = self
            .inner
            .activations
            .send(ActivationEvent::Replied { id, text });
    }

    /// Whether any notification is still pending presentation.
    pub async fn has_pending(&self) -> bool {
        let state = self.inner.state.lock().await;
        !state.when_maps.is_empty() || !state.waiters.is_empty()
    }

    /// Counters over internal state, for tests and debugging.
    pub async fn diagnostics(&self) -> SystemDiagnostics {
        let state = self.inner.state.lock().await;
        SystemDiagnostics {
            waiters: state.waiters.len(),
            scheduled_entries: state.when_maps.values().map(|m| m.len()).sum(),
            alert_slots: state.when_alerts.values().map(|m| m.len()).sum(),
            ledger_entries: state.sent_reactions.len(),
            watched_topics: state.watched_topics.len(),
        }
    }
}

impl Drop for NotificationSystem {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

// --- Driver task ---

fn spawn_driver(
    inner: Arc<SystemInner>,
    mut settings_rx: broadcast::Receiver<ChangeType>,
    mut topics_rx: broadcast::Receiver<ContextId>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut settings_open = true;
        let mut topics_open = true;
        loop {
            let deadline = inner.state.lock().await.next_deadline();
            tokio::select! {
                _ = inner.rearm.notified() => {}
                _ = sleep_until_or_park(deadline) => {
                    inner.show_next().await;
                }
                result = settings_rx.recv(), if settings_open => match result {
                    Ok(kind) => inner.on_settings_changed(kind).await,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "Settings-change stream lagged; re-syncing.");
                        inner.resync_after_settings_lag().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => settings_open = false,
                },
                result = topics_rx.recv(), if topics_open => match result {
                    Ok(topic) => {
                        inner.clear_for_context_if(|c| *c == topic).await;
                        inner.manager.read().await.clear_from_topic(topic).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => topics_open = false,
                },
            }
        }
    })
}

async fn sleep_until_or_park(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

// --- Scheduling internals ---

impl SystemInner {
    async fn schedule(&self, notification: ItemNotification) {
        let (skip, alert_ok) = self.resolve_skip(&notification).await;
        if skip.is_skip() {
            debug!(
                context = ?notification.context,
                msg = %notification.msg_id,
                kind = ?notification.kind,
                "Notification suppressed."
            );
            return;
        }

        let now = Instant::now();
        let mut state = self.state.lock().await;

        // The cheap skip phase ran unlocked; re-check the ledger here so two
        // interleaved schedules of the same reaction cannot both pass.
        if notification.kind == NotificationKind::Reaction
            && state.sent_reactions.contains(&notification.reaction_key())
        {
            return;
        }

        let ctx = notification.context;
        let key = notification.history_key();
        if state
            .when_maps
            .get(&ctx)
            .map_or(false, |map| map.contains_key(&key))
        {
            // Already scheduled; entries are never moved earlier, and a
            // duplicate arrival must not create a second one.
            trace!(?ctx, msg = %notification.msg_id, "Entry already scheduled.");
            return;
        }

        let timing = count_timing(
            state.waiters.get(&ctx),
            self.timings.minimal_delay(),
            &self.timings,
            now,
        );
        state.when_maps.entry(ctx).or_default().insert(
            key,
            ScheduledEntry {
                when: timing.when,
                reaction_author: notification.reaction_author,
                reaction: notification.reaction.clone(),
            },
        );
        match state.waiters.entry(ctx) {
            Entry::Occupied(mut occupied) => {
                let waiter = occupied.get_mut();
                waiter.latest_pending = notification.arrived;
                waiter.when = timing.when;
                if notification.reaction_author.is_some() {
                    waiter.notify_by = notification.reaction_author;
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Waiter {
                    key,
                    first_pending: notification.arrived,
                    latest_pending: notification.arrived,
                    when: timing.when,
                    waiting_for_grouping: false,
                    notify_by: notification.reaction_author,
                });
            }
        }
        if alert_ok {
            state
                .when_alerts
                .entry(ctx)
                .or_default()
                .insert(timing.when, notification.reaction_author);
        }
        if ctx.is_topic() {
            state.watched_topics.insert(ctx);
        }
        drop(state);
        self.rearm.notify_one();
    }

    /// Two-phase skip evaluation. Returns the decision plus whether an
    /// audible alert slot should accompany the notification.
    async fn resolve_skip(&self, notification: &ItemNotification) -> (SkipState, bool) {
        // Cheap phase: decisions already cached for this session.
        if notification.kind == NotificationKind::Reaction {
            let state = self.state.lock().await;
            if state.sent_reactions.contains(&notification.reaction_key()) {
                return (SkipState::skip(), false);
            }
        }

        let settings = self.settings.get_current_settings().await;
        let thread = self.store.thread_info(notification.context).await;
        let message = self
            .store
            .message(notification.context.session, notification.item())
            .await;

        let skip_ctx = SkipContext {
            kind: notification.kind,
            desktop_enabled: settings.desktop_enabled,
            include_muted: settings.include_muted,
            count_messages: settings.count_messages,
            thread_known: thread.is_some(),
            thread_muted: thread.as_ref().map_or(true, |t| t.muted),
            message_known: message.is_some(),
            outgoing: message.as_ref().map_or(false, |m| m.outgoing),
            unread: message.as_ref().map_or(false, |m| m.unread),
            reaction_already_sent: false,
        };
        let skip = compute_skip_state(&skip_ctx);
        // Muted-but-included threads show without sound.
        let alert_ok =
            !skip.is_skip() && !skip.silent && settings.sound_enabled && !skip_ctx.thread_muted;
        (skip, alert_ok)
    }

    /// Presents every context whose deadline passed. One batch per context
    /// per pass; state is re-read between batches.
    async fn show_next(&self) {
        loop {
            let now = Instant::now();
            let due = {
                let mut state = self.state.lock().await;
                self.pick_due(&mut state, now)
            };
            let Some((ctx, batch)) = due else { break };
            let delivered = self.present(ctx, &batch).await;
            self.cleanup_after_present(ctx, &batch, delivered).await;
        }
        self.rearm.notify_one();
    }

    /// Selects one due context and extracts its batch, arming the grouping
    /// settle window where a burst is still in flight.
    fn pick_due(
        &self,
        state: &mut SchedulerState,
        now: Instant,
    ) -> Option<(ContextId, DueBatch)> {
        loop {
            let ctx = state
                .waiters
                .iter()
                .find(|(ctx, waiter)| waiter.when <= now && !state.in_flight.contains(*ctx))
                .map(|(ctx, _)| *ctx)?;

            let entries: Vec<(HistoryKey, ScheduledEntry)> = match state.when_maps.get(&ctx) {
                Some(map) if !map.is_empty() => {
                    map.iter().map(|(k, e)| (*k, e.clone())).collect()
                }
                _ => {
                    // Stray waiter without entries (cleared mid-flight).
                    state.waiters.remove(&ctx);
                    state.when_alerts.remove(&ctx);
                    continue;
                }
            };

            if entries.len() > 1 {
                let waiter = state.waiters.get_mut(&ctx).expect("waiter exists for due ctx");
                if !waiter.waiting_for_grouping {
                    let settle = waiter.latest_pending + self.timings.grouped_settle();
                    if settle > now {
                        // The burst is still streaming in; defer once. The
                        // settle window is a soft timeout: when it elapses
                        // the batch is shown as-is.
                        waiter.waiting_for_grouping = true;
                        waiter.when = waiter.when.max(settle);
                        continue;
                    }
                }
            }

            let mut any_alert = false;
            if let Some(alerts) = state.when_alerts.get_mut(&ctx) {
                let due_slots: Vec<Instant> = alerts.range(..=now).map(|(t, _)| *t).collect();
                any_alert = !due_slots.is_empty();
                for slot in due_slots {
                    alerts.remove(&slot);
                }
                if alerts.is_empty() {
                    state.when_alerts.remove(&ctx);
                }
            }

            let keys: Vec<HistoryKey> = entries.iter().map(|(k, _)| *k).collect();
            let (last_key, last_entry) = entries
                .iter()
                .max_by_key(|(key, entry)| (entry.when, key.msg_id))
                .map(|(key, entry)| (*key, entry.clone()))
                .expect("entries are non-empty");
            let count = entries.len() as u32;
            state.in_flight.insert(ctx);
            return Some((
                ctx,
                DueBatch {
                    keys,
                    count,
                    last_key,
                    last_entry,
                    any_alert,
                },
            ));
        }
    }

    /// Resolves display data and dispatches the batch to the backend.
    /// Returns whether anything was dispatched.
    async fn present(&self, ctx: ContextId, batch: &DueBatch) -> bool {
        let settings = self.settings.get_current_settings().await;
        let manager = self.manager.read().await.clone();

        let Some(thread) = self.store.thread_info(ctx).await else {
            debug!(?ctx, "Thread vanished before presentation; batch dropped.");
            return false;
        };

        // Sound and flash side effects happen before the toast, and are
        // independently skippable by the backend.
        if batch.any_alert && settings.sound_enabled && !manager.skip_audio() {
            self.play_sound(ctx.session, thread.sound).await;
        }
        if batch.any_alert && settings.flash_bounce_enabled && !manager.skip_flash_bounce() {
            manager.flash_bounce().await;
        }
        if manager.skip_toast() {
            return true;
        }

        let last_item = FullItemId::new(ctx.peer, batch.last_key.msg_id);
        let Some(message) = self.store.message(ctx.session, last_item).await else {
            debug!(?ctx, msg = %batch.last_key.msg_id, "Message vanished before presentation; batch dropped.");
            return false;
        };

        let options = manager.notification_options(&settings, batch.last_key.kind);
        let fields = if batch.count > 1 {
            self.show_grouped(ctx, batch, &thread, &message, &settings, options)
        } else {
            self.show_single(ctx, batch, &thread, &message, &settings, options)
                .await
        };
        manager.show_notification(fields).await;
        true
    }

    /// Builds the combined presentation for a multi-message batch: count
    /// plus last sender, never per-message bodies.
    fn show_grouped(
        &self,
        ctx: ContextId,
        batch: &DueBatch,
        thread: &ThreadInfo,
        message: &MessageSnapshot,
        _settings: &NotifySettings,
        options: DisplayOptions,
    ) -> NotificationFields {
        let title = if options.hide_name_and_photo {
            APP_TITLE.to_string()
        } else {
            thread.title.clone()
        };
        let subtitle = (!options.hide_name_and_photo && message.author_name != thread.title)
            .then(|| message.author_name.clone());
        NotificationFields {
            id: NotificationId::new(ctx, batch.last_key.msg_id),
            kind: batch.last_key.kind,
            title,
            subtitle,
            body: format!("{} new messages", batch.count),
            group_count: batch.count,
            forwarded_count: message.forwarded_count,
            reaction: None,
            options,
            timestamp: Utc::now(),
        }
    }

    /// Builds the presentation for a single pending entry.
    async fn show_single(
        &self,
        ctx: ContextId,
        batch: &DueBatch,
        thread: &ThreadInfo,
        message: &MessageSnapshot,
        settings: &NotifySettings,
        options: DisplayOptions,
    ) -> NotificationFields {
        let kind = batch.last_key.kind;
        let hide_content = options.hide_message_text || settings.count_messages;

        let title = if options.hide_name_and_photo {
            APP_TITLE.to_string()
        } else {
            thread.title.clone()
        };

        let (subtitle, body, reaction) = match kind {
            NotificationKind::Reaction => {
                let author = match batch.last_entry.reaction_author {
                    Some(peer) => self
                        .store
                        .peer_name(ctx.session, peer)
                        .await
                        .unwrap_or_else(|| "Someone".to_string()),
                    None => "Someone".to_string(),
                };
                let reaction = batch
                    .last_entry
                    .reaction
                    .clone()
                    .unwrap_or_else(|| ReactionId::Emoji("❤".to_string()));
                let preview = (!hide_content).then_some(message.preview.as_str());
                let body = compose_reaction_notification(&author, &reaction, preview);
                (None, body, Some(reaction))
            }
            NotificationKind::Message | NotificationKind::ScheduledReveal => {
                let subtitle = (!options.hide_name_and_photo
                    && message.author_name != thread.title)
                    .then(|| message.author_name.clone());
                let body = if hide_content {
                    "New message".to_string()
                } else if message.forwarded_count > 1 {
                    format!("Forwarded {} messages", message.forwarded_count)
                } else if kind == NotificationKind::ScheduledReveal {
                    wrap_from_scheduled(&message.preview)
                } else {
                    message.preview.clone()
                };
                (subtitle, body, None)
            }
        };

        NotificationFields {
            id: NotificationId::new(ctx, batch.last_key.msg_id),
            kind,
            title,
            subtitle,
            body,
            group_count: 1,
            forwarded_count: message.forwarded_count,
            reaction,
            options,
            timestamp: Utc::now(),
        }
    }

    /// Removes the presented entries, records delivered reactions and
    /// re-anchors the waiter for entries that raced in meanwhile.
    async fn cleanup_after_present(&self, ctx: ContextId, batch: &DueBatch, delivered: bool) {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        state.in_flight.remove(&ctx);
        if delivered {
            for key in &batch.keys {
                if key.kind == NotificationKind::Reaction {
                    state.sent_reactions.record(
                        ReactionKey {
                            item: FullItemId::new(ctx.peer, key.msg_id),
                            session: ctx.session,
                        },
                        now,
                    );
                }
            }
        }

        let SchedulerState {
            when_maps,
            waiters,
            when_alerts,
            watched_topics,
            ..
        } = &mut *state;
        match when_maps.get_mut(&ctx) {
            Some(map) => {
                for key in &batch.keys {
                    map.remove(key);
                }
                if map.is_empty() {
                    when_maps.remove(&ctx);
                    waiters.remove(&ctx);
                    when_alerts.remove(&ctx);
                    watched_topics.remove(&ctx);
                } else if let Some(waiter) = waiters.get_mut(&ctx) {
                    // Entries that arrived during presentation form the next
                    // batch.
                    if let Some((key, entry)) = map
                        .iter()
                        .min_by_key(|(_, entry)| entry.when)
                        .map(|(key, entry)| (*key, entry.clone()))
                    {
                        waiter.key = key;
                        waiter.when = entry.when;
                        waiter.first_pending = waiter.latest_pending;
                        waiter.waiting_for_grouping = false;
                    }
                }
            }
            None => {
                waiters.remove(&ctx);
                when_alerts.remove(&ctx);
            }
        }
    }

    /// Shared eviction primitive: drops all scheduling state for matching
    /// contexts and wakes the driver to re-derive its deadline.
    async fn clear_for_context_if<F>(&self, predicate: F)
    where
        F: Fn(&ContextId) -> bool,
    {
        let mut state = self.state.lock().await;
        state.when_maps.retain(|ctx, _| !predicate(ctx));
        state.waiters.retain(|ctx, _| !predicate(ctx));
        state.when_alerts.retain(|ctx, _| !predicate(ctx));
        state.watched_topics.retain(|ctx| !predicate(ctx));
        drop(state);
        self.rearm.notify_one();
    }

    async fn clear_from_item(&self, session: SessionId, item: FullItemId) {
        let mut state = self.state.lock().await;
        let SchedulerState {
            when_maps,
            waiters,
            when_alerts,
            watched_topics,
            sent_reactions,
            ..
        } = &mut *state;

        let affected: Vec<ContextId> = when_maps
            .keys()
            .filter(|ctx| ctx.session == session && ctx.peer == item.peer)
            .copied()
            .collect();
        for ctx in affected {
            let emptied = {
                let map = when_maps.get_mut(&ctx).expect("affected ctx present");
                map.retain(|key, _| key.msg_id != item.msg);
                map.is_empty()
            };
            if emptied {
                when_maps.remove(&ctx);
                waiters.remove(&ctx);
                when_alerts.remove(&ctx);
                watched_topics.remove(&ctx);
            } else if let Some(waiter) = waiters.get_mut(&ctx) {
                let map = when_maps.get(&ctx).expect("non-empty map");
                if let Some((key, entry)) = map
                    .iter()
                    .min_by_key(|(_, entry)| entry.when)
                    .map(|(key, entry)| (*key, entry.clone()))
                {
                    waiter.key = key;
                    waiter.when = entry.when;
                }
            }
        }
        sent_reactions.remove_item(item);
        drop(state);
        self.rearm.notify_one();
    }

    async fn flush_state(&self) {
        let mut state = self.state.lock().await;
        state.when_maps.clear();
        state.waiters.clear();
        state.when_alerts.clear();
        state.watched_topics.clear();
        state.in_flight.clear();
        state.sent_reactions.clear();
        drop(state);
        self.rearm.notify_one();
    }

    async fn play_sound(&self, session: SessionId, document: Option<DocumentId>) {
        let track = {
            let mut state = self.state.lock().await;
            state.sounds.lookup(self.audio.as_ref(), session, document)
        };
        match track {
            Ok(track) => track.play(),
            Err(e) => warn!(error = %e, "Notification sound unavailable."),
        }
    }

    async fn on_settings_changed(&self, kind: ChangeType) {
        let manager = self.manager.read().await.clone();
        match kind {
            ChangeType::DesktopEnabled => {
                let settings = self.settings.get_current_settings().await;
                if !settings.desktop_enabled {
                    self.flush_state().await;
                    manager.clear_all().await;
                }
            }
            ChangeType::ViewParams
            | ChangeType::MaxCount
            | ChangeType::Corner
            | ChangeType::IncludeMuted
            | ChangeType::CountMessages
            | ChangeType::DemoIsHidden => {
                manager.update_all().await;
            }
            ChangeType::DemoIsShown => {
                // The settings demo popup replaces live notifications while
                // it is visible.
                manager.clear_all().await;
            }
            ChangeType::SoundEnabled | ChangeType::FlashBounceEnabled => {
                // Consulted lazily at alert time.
            }
        }
    }

    /// After a lagged settings stream, re-apply the strongest reactions.
    async fn resync_after_settings_lag(&self) {
        let settings = self.settings.get_current_settings().await;
        let manager = self.manager.read().await.clone();
        if !settings.desktop_enabled {
            self.flush_state().await;
            manager.clear_all().await;
        } else {
            manager.update_all().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::audio::NullAudioBackend;
    use crate::ports::conversation_store::InMemoryConversationStore;
    use crate::settings::service::DefaultSettingsService;
    use palaver_core::types::ids::MsgId;
    use pretty_assertions::assert_eq;

    fn timings() -> NotifyTimings {
        NotifyTimings {
            minimal_delay_ms: 100,
            grouping_window_ms: 150,
            max_group_delay_ms: 1000,
            grouped_settle_ms: 100,
        }
    }

    async fn system_with_thread(ctx: ContextId) -> (NotificationSystem, Arc<InMemoryConversationStore>) {
        let store = Arc::new(InMemoryConversationStore::new());
        store
            .insert_thread(
                ctx,
                ThreadInfo {
                    title: "general".to_string(),
                    muted: false,
                    sound: None,
                },
            )
            .await;
        let settings = Arc::new(DefaultSettingsService::in_memory());
        let system = NotificationSystem::new(
            store.clone(),
            settings,
            Arc::new(NullAudioBackend),
            timings(),
        );
        (system, store)
    }

    async fn insert_incoming(
        store: &InMemoryConversationStore,
        ctx: ContextId,
        msg: i64,
        preview: &str,
    ) {
        store
            .insert_message(
                ctx.session,
                FullItemId::new(ctx.peer, MsgId(msg)),
                MessageSnapshot {
                    author_name: "ada".to_string(),
                    preview: preview.to_string(),
                    outgoing: false,
                    unread: true,
                    forwarded_count: 0,
                },
            )
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn schedule_creates_at_most_one_waiter_per_context() {
        let ctx = ContextId::history(SessionId(1), PeerId(2));
        let (system, store) = system_with_thread(ctx).await;
        insert_incoming(&store, ctx, 1, "a").await;
        insert_incoming(&store, ctx, 2, "b").await;

        system
            .schedule(ItemNotification::new(ctx, MsgId(1), NotificationKind::Message))
            .await;
        system
            .schedule(ItemNotification::new(ctx, MsgId(2), NotificationKind::Message))
            .await;

        let diag = system.diagnostics().await;
        assert_eq!(diag.waiters, 1);
        assert_eq!(diag.scheduled_entries, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_schedule_is_a_single_entry() {
        let ctx = ContextId::history(SessionId(1), PeerId(2));
        let (system, store) = system_with_thread(ctx).await;
        insert_incoming(&store, ctx, 1, "a").await;

        let candidate = ItemNotification::new(ctx, MsgId(1), NotificationKind::Message);
        system.schedule(candidate.clone()).await;
        system.schedule(candidate).await;

        let diag = system.diagnostics().await;
        assert_eq!(diag.scheduled_entries, 1);
        assert_eq!(diag.waiters, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn skipped_candidates_leave_no_state() {
        let ctx = ContextId::history(SessionId(1), PeerId(2));
        let (system, store) = system_with_thread(ctx).await;
        insert_incoming(&store, ctx, 1, "a").await;
        store.set_muted(ctx, true).await;

        system
            .schedule(ItemNotification::new(ctx, MsgId(1), NotificationKind::Message))
            .await;

        assert!(!system.has_pending().await);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_all_fast_leaves_zero_residue() {
        let ctx = ContextId::history(SessionId(1), PeerId(2));
        let (system, store) = system_with_thread(ctx).await;
        insert_incoming(&store, ctx, 1, "a").await;
        insert_incoming(&store, ctx, 2, "b").await;

        system
            .schedule(ItemNotification::new(ctx, MsgId(1), NotificationKind::Message))
            .await;
        system
            .schedule(ItemNotification::new(ctx, MsgId(2), NotificationKind::Message))
            .await;
        system.clear_all_fast().await;

        let diag = system.diagnostics().await;
        assert_eq!(
            diag,
            SystemDiagnostics {
                waiters: 0,
                scheduled_entries: 0,
                alert_slots: 0,
                ledger_entries: 0,
                watched_topics: 0,
            }
        );
        assert!(!system.has_pending().await);
    }

    #[tokio::test(start_paused = true)]
    async fn topic_candidates_are_lifetime_tracked() {
        let topic = ContextId::topic(SessionId(1), PeerId(2), MsgId(50));
        let (system, store) = system_with_thread(topic).await;
        insert_incoming(&store, topic, 1, "a").await;

        system
            .schedule(ItemNotification::new(topic, MsgId(1), NotificationKind::Message))
            .await;
        assert_eq!(system.diagnostics().await.watched_topics, 1);

        system.clear_from_topic(topic).await;
        let diag = system.diagnostics().await;
        assert_eq!(diag.watched_topics, 0);
        assert_eq!(diag.waiters, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_from_item_prunes_entry_and_keeps_siblings() {
        let ctx = ContextId::history(SessionId(1), PeerId(2));
        let (system, store) = system_with_thread(ctx).await;
        insert_incoming(&store, ctx, 1, "a").await;
        insert_incoming(&store, ctx, 2, "b").await;

        system
            .schedule(ItemNotification::new(ctx, MsgId(1), NotificationKind::Message))
            .await;
        system
            .schedule(ItemNotification::new(ctx, MsgId(2), NotificationKind::Message))
            .await;

        system
            .clear_from_item(SessionId(1), FullItemId::new(PeerId(2), MsgId(1)))
            .await;

        let diag = system.diagnostics().await;
        assert_eq!(diag.scheduled_entries, 1);
        assert_eq!(diag.waiters, 1);
    }
}
