//! Configuration management for Palaver core.
//!
//! Configuration is TOML-based and validated after parsing. The root
//! structure is [`CoreConfig`], which currently carries the logging setup
//! ([`LoggingConfig`]) and the notification timing policy
//! ([`NotifyTimings`]). Loading goes through [`ConfigLoader`], which checks
//! an explicit path or the platform config directory.

mod defaults;
mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{CoreConfig, LoggingConfig, NotifyTimings};
