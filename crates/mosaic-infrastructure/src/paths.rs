//! Unified path management for mosaic configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/mosaic/            # Config directory (platform default)
//! ├── config.toml              # Client configuration
//! └── logs/                    # Rolling log files
//!     └── mosaic.log.YYYY-MM-DD
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

const APP_DIR: &str = "mosaic";

/// Path resolution for mosaic files.
pub struct MosaicPaths;

impl MosaicPaths {
    /// Returns the mosaic configuration directory (e.g. `~/.config/mosaic/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the default log directory.
    pub fn log_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("logs"))
    }
}
