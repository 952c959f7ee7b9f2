//! Errors for the notification domain.
//!
//! Deliberately small: per the subsystem's error model, stale-data lookups
//! are silent no-ops rather than errors, and backend failures are absorbed
//! by the backend. What remains is the best-effort ambient machinery.

use thiserror::Error;

use palaver_core::types::ids::DocumentId;

#[derive(Debug, Error)]
pub enum NotificationError {
    /// The audio backend could not produce a playable track.
    #[error("Failed to create audio track for {source_desc}: {reason}")]
    AudioTrackCreation {
        source_desc: String,
        reason: String,
    },

    /// A custom sound document was requested but is not available.
    #[error("Sound document {0} is unavailable")]
    SoundUnavailable(DocumentId),
}
