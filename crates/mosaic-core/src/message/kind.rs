//! Message role and type tags.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{AsRefStr, Display, EnumString};

/// Represents the originator of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the assistant running on a node.
    Assistant,
    /// System-generated message.
    System,
}

/// The type tag carried by every message and notification.
///
/// Unknown tags decode to [`MessageType::Unknown`] instead of failing, so a
/// newer backend cannot break ingestion by introducing a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum MessageType {
    Text,
    Thinking,
    ToolUse,
    ToolOutput,
    SystemMessage,
    PreCompact,
    TerminalOutput,
    StreamDelta,
    Diagnostic,
    RuntimeStatusChanged,
    SessionStatusChanged,
    Unknown,
}

impl MessageType {
    /// Types rendered collapsed until the user expands them.
    pub fn is_collapsed_by_default(self) -> bool {
        matches!(
            self,
            Self::Thinking
                | Self::SystemMessage
                | Self::ToolUse
                | Self::ToolOutput
                | Self::PreCompact
        )
    }

    /// Transport-level output that belongs to a terminal surface, not the log.
    pub fn is_transport_output(self) -> bool {
        matches!(
            self,
            Self::TerminalOutput | Self::StreamDelta | Self::Diagnostic
        )
    }

    /// Parses a wire tag, falling back to `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        tag.parse().unwrap_or(Self::Unknown)
    }
}

impl Serialize for MessageType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_ref())
    }
}

impl<'de> Deserialize<'de> for MessageType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&tag))
    }
}
