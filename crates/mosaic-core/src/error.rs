//! Error types for the Mosaic client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Mosaic client.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MosaicError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Network transport error (connection refused, socket closed, ...)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Remote API answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A live item violated the envelope contract (e.g. missing message id)
    #[error("Malformed live item: {0}")]
    MalformedItem(String),

    /// The session no longer accepts input
    #[error("Session '{0}' is closed")]
    SessionClosed(String),

    /// The session is processing and the composer is disabled
    #[error("Session '{0}' is busy")]
    SessionBusy(String),

    /// No session is bound to the surface
    #[error("No session selected")]
    NoSessionSelected,

    /// Blank message submitted to the composer
    #[error("Message is empty")]
    EmptyMessage,

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MosaicError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates an Http error
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a MalformedItem error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedItem(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Http { status: 404, .. })
    }

    /// Check if this is a serialization error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Whether retrying the same request later could succeed.
    ///
    /// Returns true for transport failures and 5xx / 429 responses.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Check if the error comes from composer gating rather than a failure
    pub fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            Self::SessionClosed(_) | Self::SessionBusy(_) | Self::EmptyMessage
        )
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for MosaicError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for MosaicError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from String (for error messages)
impl From<String> for MosaicError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, MosaicError>`.
pub type Result<T> = std::result::Result<T, MosaicError>;
