//! Live feed envelopes as delivered by the push transport.

use crate::error::{MosaicError, Result};
use crate::message::{Message, MessageBody, MessageRole, MessageType, normalize_payload};
use crate::session::{RuntimeStatus, SessionLifecycle};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One item pushed by the live transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LiveItem {
    /// A chat message for a session.
    Message(LiveMessage),
    /// A status or lifecycle signal; never part of the message log.
    Notification(LiveNotification),
    /// Transport-level error, not bound to any session.
    Error { message: String },
}

impl LiveItem {
    /// The session the item is addressed to, `None` for error envelopes.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::Message(m) => Some(&m.session_id),
            Self::Notification(n) => Some(&n.session_id),
            Self::Error { .. } => None,
        }
    }

    pub fn sequence(&self) -> Option<u64> {
        match self {
            Self::Message(m) => m.sequence,
            Self::Notification(n) => n.sequence,
            Self::Error { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveMessage {
    pub session_id: String,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub sequence: Option<u64>,
    pub role: MessageRole,
    pub message_type: MessageType,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl LiveMessage {
    /// Decodes the envelope into a log message.
    ///
    /// Fails when the message id or the sequence number is missing.
    pub fn into_message(self) -> Result<Message> {
        let id = self
            .message_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                MosaicError::malformed(format!(
                    "{} message in session '{}' has no message id",
                    self.message_type, self.session_id
                ))
            })?;
        let sequence = self.sequence.ok_or_else(|| {
            MosaicError::malformed(format!("message '{id}' has no sequence number"))
        })?;

        Ok(Message {
            id,
            session_id: self.session_id,
            sequence,
            role: self.role,
            kind: self.message_type,
            body: MessageBody::decode(self.message_type, self.payload),
            created_at: self.created_at.unwrap_or_else(Utc::now),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveNotification {
    pub session_id: String,
    pub message_type: MessageType,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub sequence: Option<u64>,
}

impl LiveNotification {
    /// The status change carried by this notification, if any.
    ///
    /// Accepts `{"status": ...}`, `{"state": ...}` or a bare status string,
    /// structured or serialized.
    pub fn signal(&self) -> Option<SessionSignal> {
        let payload = normalize_payload(self.payload.clone());
        match self.message_type {
            MessageType::RuntimeStatusChanged => {
                status_field(&payload).map(SessionSignal::RuntimeStatus)
            }
            MessageType::SessionStatusChanged => status_field(&payload).map(SessionSignal::Lifecycle),
            _ => None,
        }
    }
}

/// Status change carried by a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    RuntimeStatus(RuntimeStatus),
    Lifecycle(SessionLifecycle),
}

fn status_field<T: serde::de::DeserializeOwned>(payload: &Value) -> Option<T> {
    let raw = match payload {
        Value::Object(map) => map.get("status").or_else(|| map.get("state"))?,
        other => other,
    };
    serde_json::from_value(raw.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_message_envelope() {
        let item: LiveItem = serde_json::from_value(json!({
            "kind": "message",
            "session_id": "s-1",
            "message_id": "m-4",
            "sequence": 4,
            "role": "assistant",
            "message_type": "text",
            "payload": {"text": "done"}
        }))
        .unwrap();

        assert_eq!(item.session_id(), Some("s-1"));
        assert_eq!(item.sequence(), Some(4));
        let LiveItem::Message(live) = item else {
            panic!("expected message envelope");
        };
        let message = live.into_message().unwrap();
        assert_eq!(message.body.preview(), "done");
    }

    #[test]
    fn test_parse_error_envelope() {
        let item: LiveItem =
            serde_json::from_str(r#"{"kind":"error","message":"socket reset"}"#).unwrap();
        assert_eq!(item.session_id(), None);
    }

    #[test]
    fn test_notification_signal() {
        let busy = LiveNotification {
            session_id: "s-1".to_string(),
            message_type: MessageType::RuntimeStatusChanged,
            payload: json!({"status": "running"}),
            sequence: None,
        };
        assert_eq!(
            busy.signal(),
            Some(SessionSignal::RuntimeStatus(RuntimeStatus::Busy))
        );

        let archived = LiveNotification {
            message_type: MessageType::SessionStatusChanged,
            payload: json!("archived"),
            ..busy.clone()
        };
        assert_eq!(
            archived.signal(),
            Some(SessionSignal::Lifecycle(SessionLifecycle::Archived))
        );

        let other = LiveNotification {
            message_type: MessageType::Text,
            ..busy
        };
        assert_eq!(other.signal(), None);
    }

    #[test]
    fn test_message_without_id_is_malformed() {
        let live = LiveMessage {
            session_id: "s-1".to_string(),
            message_id: None,
            sequence: Some(1),
            role: MessageRole::Assistant,
            message_type: MessageType::Text,
            payload: json!("x"),
            created_at: None,
        };
        assert!(matches!(
            live.into_message(),
            Err(MosaicError::MalformedItem(_))
        ));
    }
}
