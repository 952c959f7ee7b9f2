//! Errors for the settings service.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    /// Reading or writing the settings file failed.
    #[error("Settings I/O error at {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for [`super::NotifySettings`].
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// Serializing settings for persistence failed.
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A proposed settings value is out of range.
    #[error("Invalid settings value: {0}")]
    Validation(String),
}
