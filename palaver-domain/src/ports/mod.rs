//! Trait ports to external collaborators.
//!
//! The notification scheduler never owns conversation data or audio
//! hardware; it reaches both through the interfaces defined here. Reference
//! implementations ([`InMemoryConversationStore`], [`NullAudioBackend`]) back
//! the test suite and headless embedders.

pub mod audio;
pub mod conversation_store;

pub use audio::{AudioBackend, AudioTrack, NullAudioBackend, SoundSource};
pub use conversation_store::{
    ConversationStore, InMemoryConversationStore, MessageSnapshot, ThreadInfo,
};
