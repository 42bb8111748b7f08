//! Session domain model.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a session as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionLifecycle {
    #[default]
    Active,
    Closed,
    Archived,
}

/// Live runtime indicator pushed asynchronously by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeStatus {
    #[default]
    #[serde(alias = "ready")]
    Idle,
    #[serde(alias = "running")]
    Busy,
}

/// What the composer of a chat view currently allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerState {
    /// Input accepted.
    Ready,
    /// The node is working on the session; sends are disabled, interrupt is not.
    Busy,
    /// The session is closed or archived; no more input.
    Closed,
}

impl ComposerState {
    pub fn derive(lifecycle: SessionLifecycle, runtime: RuntimeStatus) -> Self {
        match (lifecycle, runtime) {
            (SessionLifecycle::Closed | SessionLifecycle::Archived, _) => Self::Closed,
            (SessionLifecycle::Active, RuntimeStatus::Busy) => Self::Busy,
            (SessionLifecycle::Active, RuntimeStatus::Idle) => Self::Ready,
        }
    }
}

/// Full address of a session: conversation scope, node, and session id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub scope_id: String,
    pub node_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(
        scope_id: impl Into<String>,
        node_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            scope_id: scope_id.into(),
            node_id: node_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.scope_id, self.node_id, self.session_id)
    }
}

/// A conversation between a user and the assistant running on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub scope_id: String,
    pub node_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub lifecycle: SessionLifecycle,
    #[serde(default)]
    pub runtime: RuntimeStatus,
}

impl Session {
    pub fn key(&self) -> SessionKey {
        SessionKey::new(&self.scope_id, &self.node_id, &self.id)
    }

    pub fn composer_state(&self) -> ComposerState {
        ComposerState::derive(self.lifecycle, self.runtime)
    }
}
