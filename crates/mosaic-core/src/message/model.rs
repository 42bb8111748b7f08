use super::body::MessageBody;
use super::kind::{MessageRole, MessageType};
use crate::error::{MosaicError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single message in a session's log.
///
/// Immutable once created. Within one session `sequence` is unique and the
/// reconciled view is sorted by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Opaque identifier, unique per conversation.
    pub id: String,
    /// Session the message belongs to.
    pub session_id: String,
    /// Per-session sequence number assigned by the backend.
    pub sequence: u64,
    pub role: MessageRole,
    pub kind: MessageType,
    /// Payload decoded for `kind`.
    pub body: MessageBody,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Whether the view should render this message collapsed at first.
    pub fn is_collapsed_by_default(&self) -> bool {
        self.kind.is_collapsed_by_default()
    }
}

/// A persisted message row as returned by the history API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(default, alias = "message_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    pub sequence: u64,
    pub role: MessageRole,
    #[serde(alias = "type")]
    pub message_type: MessageType,
    #[serde(default)]
    pub payload: Value,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl WireMessage {
    /// Decodes the row for `session_id`.
    ///
    /// Rows without an id are rejected. A row whose own session id disagrees
    /// with `session_id` is rejected as well.
    pub fn into_message(self, session_id: &str) -> Result<Message> {
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| MosaicError::malformed(format!("row #{} has no id", self.sequence)))?;

        if let Some(owner) = &self.session_id {
            if owner != session_id {
                return Err(MosaicError::malformed(format!(
                    "row '{id}' belongs to session '{owner}'"
                )));
            }
        }

        Ok(Message {
            id,
            session_id: session_id.to_string(),
            sequence: self.sequence,
            role: self.role,
            kind: self.message_type,
            body: MessageBody::decode(self.message_type, self.payload),
            created_at: self.created_at,
        })
    }
}
