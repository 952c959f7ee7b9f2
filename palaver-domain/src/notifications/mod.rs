//! The notification scheduling domain.
//!
//! [`NotificationSystem`] is the orchestrator: it accepts candidate events
//! ([`ItemNotification`]), decides whether they are suppressed
//! ([`skip`]), when they fire ([`timing`]), coalesces bursts per
//! conversation, deduplicates reaction notifications ([`ledger`]) and hands
//! resolved display fields to the active [`NotificationManager`] backend.

pub mod errors;
pub mod ledger;
pub mod manager;
pub mod skip;
pub mod sound;
pub mod system;
pub mod timing;
pub mod types;

pub use errors::NotificationError;
pub use ledger::ReactionLedger;
pub use manager::{
    compose_reaction_notification, wrap_from_scheduled, DummyManager, NotificationManager,
};
pub use system::{NotificationSystem, SystemDiagnostics};
pub use types::{
    ActivationEvent, DisplayOptions, HistoryKey, ItemNotification, ManagerKind,
    NotificationFields, NotificationKind, ReactionKey, SkipState, SkipVerdict, Timing, Waiter,
};
