//! Outbound session commands.

use super::model::SessionKey;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A user message handed to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub content: String,
    /// Client-generated id so the backend can drop resubmissions.
    pub client_message_id: String,
}

/// Actions that ultimately produce the messages the live feed later delivers.
///
/// Decouples chat surfaces from the concrete transport (HTTP, test doubles).
#[async_trait]
pub trait SessionCommands: Send + Sync {
    /// Submits a user message to the session.
    async fn send_message(&self, key: &SessionKey, message: &OutgoingMessage) -> Result<()>;

    /// Asks the node to stop the turn currently running in the session.
    async fn interrupt(&self, key: &SessionKey) -> Result<()>;
}
