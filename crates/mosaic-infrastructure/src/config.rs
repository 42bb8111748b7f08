//! Client configuration.
//!
//! Loaded from `~/.config/mosaic/config.toml`. Every key is optional; a
//! missing file yields the defaults.
//!
//! ```toml
//! [server]
//! base_url = "http://localhost:8080"
//! ws_url = "ws://localhost:8080/ws"
//! request_timeout_secs = 30
//!
//! [history]
//! page_size = 10000
//!
//! [surfaces]
//! max_alive = 8
//!
//! [logging]
//! filter = "info,mosaic=debug"
//! directory = "/var/log/mosaic"
//! ```

use crate::paths::MosaicPaths;
use mosaic_core::error::{MosaicError, Result};
use mosaic_core::history::FULL_HISTORY_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_BASE_URL: &str = "MOSAIC_BASE_URL";
pub const ENV_WS_URL: &str = "MOSAIC_WS_URL";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MosaicConfig {
    pub server: ServerConfig,
    pub history: HistoryConfig,
    pub surfaces: SurfaceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    pub ws_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            ws_url: "ws://localhost:8080/ws".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub page_size: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            page_size: FULL_HISTORY_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Chat surfaces kept alive by a multi-session view.
    pub max_alive: usize,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self { max_alive: 8 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Directory for daily rolling log files; stderr only when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            directory: None,
        }
    }
}

impl MosaicConfig {
    /// Loads the default config file, applies environment overrides and validates.
    pub fn load() -> Result<Self> {
        let path = MosaicPaths::config_file().map_err(|e| MosaicError::config(e.to_string()))?;
        Self::load_from(&path)
    }

    /// Loads `path` (defaults if it does not exist), applies environment
    /// overrides and validates.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = Self::read_file(path)?.with_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file; using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&raw)?;
        tracing::debug!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| MosaicError::Serialization {
            format: "TOML".to_string(),
            message: e.to_string(),
        })
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| MosaicError::Serialization {
            format: "TOML".to_string(),
            message: e.to_string(),
        })
    }

    /// Applies `MOSAIC_BASE_URL` / `MOSAIC_WS_URL` from `lookup`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            self.server.base_url = base_url;
        }
        if let Some(ws_url) = lookup(ENV_WS_URL).filter(|v| !v.is_empty()) {
            self.server.ws_url = ws_url;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !has_scheme(&self.server.base_url, &["http://", "https://"]) {
            return Err(MosaicError::config(format!(
                "server.base_url must be an http(s) URL, got '{}'",
                self.server.base_url
            )));
        }
        if !has_scheme(&self.server.ws_url, &["ws://", "wss://"]) {
            return Err(MosaicError::config(format!(
                "server.ws_url must be a ws(s) URL, got '{}'",
                self.server.ws_url
            )));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(MosaicError::config("server.request_timeout_secs must be > 0"));
        }
        if self.history.page_size == 0 {
            return Err(MosaicError::config("history.page_size must be > 0"));
        }
        if self.surfaces.max_alive == 0 {
            return Err(MosaicError::config("surfaces.max_alive must be > 0"));
        }
        Ok(())
    }
}

fn has_scheme(url: &str, schemes: &[&str]) -> bool {
    schemes
        .iter()
        .any(|scheme| url.len() > scheme.len() && url.starts_with(scheme))
}
