//! Configuration file loading.
//!
//! [`ConfigLoader`] resolves and parses the `core.toml` configuration file.
//! Lookup order: an explicitly supplied path, then the platform config
//! directory (`$XDG_CONFIG_HOME/palaver/core.toml` on Linux). A missing file
//! is not an error; defaults apply.

use std::fs;
use std::path::{Path, PathBuf};

use directories_next::ProjectDirs;
use tracing::debug;

use super::types::CoreConfig;
use crate::error::ConfigError;

const CONFIG_FILE_NAME: &str = "core.toml";

/// Loads [`CoreConfig`] from disk.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads the configuration from the platform config directory, falling
    /// back to defaults when no file exists.
    pub fn load() -> Result<CoreConfig, ConfigError> {
        match Self::default_config_path()? {
            Some(path) if path.exists() => Self::load_from_path(&path),
            _ => {
                debug!("No configuration file found, using defaults.");
                Ok(CoreConfig::default())
            }
        }
    }

    /// Loads and validates the configuration from an explicit path.
    pub fn load_from_path(path: &Path) -> Result<CoreConfig, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(raw: &str) -> Result<CoreConfig, ConfigError> {
        let config: CoreConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// The per-user configuration file path, if a config directory can be
    /// determined on this platform.
    pub fn default_config_path() -> Result<Option<PathBuf>, ConfigError> {
        let dirs = ProjectDirs::from("org", "palaver", "palaver").ok_or_else(|| {
            ConfigError::DirectoryUnavailable {
                dir_type: "user config".to_string(),
            }
        })?;
        Ok(Some(dirs.config_dir().join(CONFIG_FILE_NAME)))
    }
}
