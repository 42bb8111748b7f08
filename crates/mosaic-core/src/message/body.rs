//! Decoded message payloads.
//!
//! Payloads arrive either as structured JSON or as a string holding
//! serialized JSON. They are normalised and decoded into [`MessageBody`]
//! once, at ingestion, so view code never re-interprets raw JSON.

use super::kind::MessageType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A payload decoded according to its message type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "body", rename_all = "snake_case")]
pub enum MessageBody {
    Text {
        text: String,
    },
    Thinking {
        text: String,
    },
    ToolUse {
        tool_use_id: Option<String>,
        name: String,
        input: Value,
    },
    ToolOutput {
        tool_use_id: Option<String>,
        output: Value,
        is_error: bool,
    },
    SystemNotice {
        text: String,
    },
    Compaction {
        summary: Option<String>,
        trigger: Option<String>,
    },
    /// Any payload without a dedicated shape (unknown tags, unexpected layouts).
    Opaque {
        value: Value,
    },
}

/// Normalises a wire payload.
///
/// A string holding a serialized JSON object or array is replaced by the
/// parsed value. Any other value, including plain strings, is returned as is.
pub fn normalize_payload(payload: Value) -> Value {
    match payload {
        Value::String(raw) => {
            let trimmed = raw.trim_start();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                match serde_json::from_str::<Value>(&raw) {
                    Ok(parsed) => parsed,
                    Err(_) => Value::String(raw),
                }
            } else {
                Value::String(raw)
            }
        }
        other => other,
    }
}

impl MessageBody {
    /// Normalises `payload` and decodes it for `kind`.
    ///
    /// Never fails: shapes that do not match the type fall back to `Opaque`.
    pub fn decode(kind: MessageType, payload: Value) -> Self {
        let payload = normalize_payload(payload);
        match kind {
            MessageType::Text => match text_of(&payload) {
                Some(text) => Self::Text { text },
                None => Self::Opaque { value: payload },
            },
            MessageType::Thinking => match text_of(&payload) {
                Some(text) => Self::Thinking { text },
                None => Self::Opaque { value: payload },
            },
            MessageType::SystemMessage => match text_of(&payload) {
                Some(text) => Self::SystemNotice { text },
                None => Self::Opaque { value: payload },
            },
            MessageType::ToolUse => {
                let name = str_field(&payload, &["name", "tool_name"]);
                match name {
                    Some(name) => Self::ToolUse {
                        tool_use_id: str_field(&payload, &["id", "tool_use_id"]),
                        name,
                        input: payload.get("input").cloned().unwrap_or(Value::Null),
                    },
                    None => Self::Opaque { value: payload },
                }
            }
            MessageType::ToolOutput => match &payload {
                Value::Object(map) => Self::ToolOutput {
                    tool_use_id: str_field(&payload, &["tool_use_id", "id"]),
                    output: map
                        .get("output")
                        .or_else(|| map.get("content"))
                        .cloned()
                        .unwrap_or(Value::Null),
                    is_error: map
                        .get("is_error")
                        .and_then(Value::as_bool)
                        .unwrap_or(false),
                },
                _ => Self::ToolOutput {
                    tool_use_id: None,
                    output: payload,
                    is_error: false,
                },
            },
            MessageType::PreCompact => match &payload {
                Value::String(summary) => Self::Compaction {
                    summary: Some(summary.clone()),
                    trigger: None,
                },
                Value::Object(_) => Self::Compaction {
                    summary: str_field(&payload, &["summary", "text"]),
                    trigger: str_field(&payload, &["trigger"]),
                },
                _ => Self::Compaction {
                    summary: None,
                    trigger: None,
                },
            },
            _ => Self::Opaque { value: payload },
        }
    }

    /// Short human-readable rendering, used by log lines and the CLI.
    pub fn preview(&self) -> String {
        match self {
            Self::Text { text } | Self::Thinking { text } | Self::SystemNotice { text } => {
                text.clone()
            }
            Self::ToolUse { name, input, .. } => format!("{name}({input})"),
            Self::ToolOutput {
                output, is_error, ..
            } => {
                let rendered = match output {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                if *is_error {
                    format!("error: {rendered}")
                } else {
                    rendered
                }
            }
            Self::Compaction { summary, .. } => summary
                .clone()
                .unwrap_or_else(|| "context compacted".to_string()),
            Self::Opaque { value } => value.to_string(),
        }
    }
}

fn text_of(payload: &Value) -> Option<String> {
    match payload {
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => str_field(payload, &["text", "content", "message"]),
        _ => None,
    }
}

fn str_field(payload: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
