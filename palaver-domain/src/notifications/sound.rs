//! Notification sound cache.
//!
//! The default notification sound is created once and shared; custom
//! per-chat sounds are cached by document id in a bounded map, created on
//! first use and reused thereafter. Creation goes through the audio port and
//! is best-effort.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use palaver_core::types::ids::{DocumentId, SessionId};

use crate::ports::audio::{AudioBackend, AudioTrack, SoundSource};

use super::errors::NotificationError;

/// How many custom sound tracks are kept alive at once.
const CUSTOM_TRACK_CAPACITY: usize = 16;

/// Cache of loaded audio tracks, owned by the notification system.
pub(crate) struct SoundCache {
    default_track: Option<Arc<dyn AudioTrack>>,
    custom: HashMap<DocumentId, Arc<dyn AudioTrack>>,
    /// Insertion order of `custom`, oldest first, for eviction.
    custom_order: VecDeque<DocumentId>,
    capacity: usize,
}

impl Default for SoundCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundCache {
    pub(crate) fn new() -> Self {
        Self::with_capacity(CUSTOM_TRACK_CAPACITY)
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            default_track: None,
            custom: HashMap::new(),
            custom_order: VecDeque::new(),
            capacity,
        }
    }

    /// Returns the track for a thread's sound choice, creating it on first
    /// use. `None` means the default notification sound.
    pub(crate) fn lookup(
        &mut self,
        audio: &dyn AudioBackend,
        session: SessionId,
        sound: Option<DocumentId>,
    ) -> Result<Arc<dyn AudioTrack>, NotificationError> {
        match sound {
            None => self.ensure_default(audio),
            Some(id) => self.lookup_custom(audio, session, id),
        }
    }

    fn ensure_default(
        &mut self,
        audio: &dyn AudioBackend,
    ) -> Result<Arc<dyn AudioTrack>, NotificationError> {
        if let Some(track) = &self.default_track {
            return Ok(track.clone());
        }
        let track = audio.create_track(SoundSource::Default)?;
        self.default_track = Some(track.clone());
        Ok(track)
    }

    fn lookup_custom(
        &mut self,
        audio: &dyn AudioBackend,
        session: SessionId,
        id: DocumentId,
    ) -> Result<Arc<dyn AudioTrack>, NotificationError> {
        if let Some(track) = self.custom.get(&id) {
            return Ok(track.clone());
        }
        let track = audio.create_track(SoundSource::Document { session, id })?;
        if self.custom.len() >= self.capacity {
            if let Some(oldest) = self.custom_order.pop_front() {
                self.custom.remove(&oldest);
            }
        }
        self.custom.insert(id, track.clone());
        self.custom_order.push_back(id);
        Ok(track)
    }

    pub(crate) fn clear(&mut self) {
        self.default_track = None;
        self.custom.clear();
        self.custom_order.clear();
    }

    #[cfg(test)]
    fn custom_len(&self) -> usize {
        self.custom.len()
    }
}
