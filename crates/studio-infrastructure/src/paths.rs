//! Path management for style studio configuration and stored data.
//!
//! Locations follow the platform conventions reported by the `dirs` crate.
//!
//! ```text
//! ~/.config/style-studio/         # Config directory
//! ├── config.toml                 # Application configuration
//! └── secret.json                 # API keys
//!
//! ~/.local/share/style-studio/    # Data directory
//! └── store/                      # Key-value store, one <key>.json per key
//! ```

use std::path::PathBuf;

const APP_DIR: &str = "style-studio";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

pub struct StudioPaths;

impl StudioPaths {
    /// Returns the configuration directory (e.g. `~/.config/style-studio/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the data directory (e.g. `~/.local/share/style-studio/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the secrets file.
    ///
    /// The file holds plaintext API keys and should be readable only by its owner.
    pub fn secret_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("secret.json"))
    }

    /// Default directory of the persistent key-value store.
    pub fn store_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("store"))
    }
}
