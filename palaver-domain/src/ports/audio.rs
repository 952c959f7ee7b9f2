//! Audio capability port.
//!
//! The scheduler only needs "play a sound by id"; decoding and device
//! handling are someone else's problem. Track creation may lazily load data
//! and is best-effort: a failure is logged by the caller and the
//! notification is still shown.

use std::sync::Arc;

use palaver_core::types::ids::{DocumentId, SessionId};

use crate::notifications::errors::NotificationError;

/// What to play: the stock notification sound or a custom sound document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundSource {
    Default,
    Document { session: SessionId, id: DocumentId },
}

/// A loaded, playable sound. Cheap to clone via `Arc`; playback must not
/// block.
pub trait AudioTrack: Send + Sync {
    fn play(&self);
}

/// Factory for [`AudioTrack`]s.
pub trait AudioBackend: Send + Sync {
    fn create_track(&self, source: SoundSource) -> Result<Arc<dyn AudioTrack>, NotificationError>;
}

/// Backend that produces silent tracks. Used in tests and headless builds.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudioBackend;

struct NullTrack;

impl AudioTrack for NullTrack {
    fn play(&self) {}
}

impl AudioBackend for NullAudioBackend {
    fn create_track(
        &self,
        _source: SoundSource,
    ) -> Result<Arc<dyn AudioTrack>, NotificationError> {
        Ok(Arc::new(NullTrack))
    }
}
