//! # Palaver Core Library (`palaver-core`)
//!
//! `palaver-core` is the foundational library for the Palaver messenger
//! project. It provides the data types and utilities the higher layers build
//! on:
//!
//! - **Error Handling**: A unified error system through the [`CoreError`]
//!   enum and its specific error types [`ConfigError`] and [`LoggingError`].
//! - **Core Data Types**: The identifier newtypes the messaging data model
//!   is addressed by (`SessionId`, `PeerId`, `MsgId`, `DocumentId`) and their
//!   composites (`ContextId`, `FullItemId`, `NotificationId`, `ReactionId`).
//! - **Configuration Management**: TOML-based configuration loading with
//!   default fallbacks and validation, through [`ConfigLoader`] and
//!   [`CoreConfig`].
//! - **Logging**: Structured logging built on the `tracing` crate,
//!   initialized from the loaded configuration.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use palaver_core::config::ConfigLoader;
//! use palaver_core::logging::init_logging;
//! use palaver_core::error::CoreError;
//!
//! fn main() -> Result<(), CoreError> {
//!     let config = ConfigLoader::load()?;
//!     init_logging(&config.logging)?;
//!     tracing::info!("Palaver core initialized.");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

// Re-export key types for convenience
pub use config::{ConfigLoader, CoreConfig, LoggingConfig, NotifyTimings};
pub use error::{ConfigError, CoreError, LoggingError};
pub use logging::{init_logging, init_minimal_logging};
pub use types::ids::{
    ContextId, DocumentId, FullItemId, MsgId, NotificationId, PeerId, ReactionId, SessionId,
};
