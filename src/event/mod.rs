use serde::{Deserialize, Deserializer};
use std::fmt;

// ===================================================================
// Event kinds
// ===================================================================

/// Which lifecycle event fired, taken from `hook_event_name`.
///
/// Unknown names are kept verbatim in `Other` so they can still be logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    PreToolUse,
    PostToolUse,
    Stop,
    UserPromptSubmit,
    Notification,
    SessionEnd,
    Other(String),
}

impl From<&str> for EventKind {
    fn from(name: &str) -> Self {
        match name {
            "PreToolUse" => Self::PreToolUse,
            "PostToolUse" => Self::PostToolUse,
            "Stop" => Self::Stop,
            "UserPromptSubmit" => Self::UserPromptSubmit,
            "Notification" => Self::Notification,
            "SessionEnd" => Self::SessionEnd,
            other => Self::Other(other.to_string()),
        }
    }
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::PreToolUse => "PreToolUse",
            Self::PostToolUse => "PostToolUse",
            Self::Stop => "Stop",
            Self::UserPromptSubmit => "UserPromptSubmit",
            Self::Notification => "Notification",
            Self::SessionEnd => "SessionEnd",
            Self::Other(name) => name,
        }
    }

    /// Events that wait on the user and warrant an at-mention.
    pub fn is_important(&self) -> bool {
        matches!(self, Self::Stop | Self::Notification)
    }

    /// Decoration shown in front of chat messages.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::PreToolUse => "🔵",
            Self::PostToolUse => "🟢",
            Self::Stop => "🟡",
            Self::Notification => "🔔",
            Self::UserPromptSubmit => "💬",
            Self::SessionEnd => "⚫",
            Self::Other(_) => "⚪",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ===================================================================
// Hook input (received via stdin, snake_case JSON)
// ===================================================================

/// JSON payload received from the host on stdin.
///
/// Every field is optional on the wire: a bare `{"hook_event_name": "..."}`
/// is a valid event. Tool fields only appear on tool events, `prompt` on
/// UserPromptSubmit and `message` on Notification.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HookEvent {
    #[serde(deserialize_with = "null_as_empty")]
    pub hook_event_name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub session_id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub transcript_path: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub cwd: String,
    pub tool_name: Option<String>,
    pub tool_input: Option<serde_json::Value>,
    pub prompt: Option<String>,
    pub message: Option<String>,
}

/// An explicit `null` reads the same as an absent field.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl HookEvent {
    pub fn kind(&self) -> EventKind {
        EventKind::from(self.hook_event_name.as_str())
    }

    /// Parse `tool_name` + `tool_input` into a typed `ToolCall`.
    pub fn tool_call(&self) -> ToolCall {
        ToolCall::parse(
            self.tool_name.as_deref().unwrap_or("unknown"),
            self.tool_input.as_ref(),
        )
    }

    /// The transcript path, if the host supplied a non-empty one.
    pub fn transcript(&self) -> Option<&str> {
        Some(self.transcript_path.as_str()).filter(|p| !p.is_empty())
    }
}

// ===================================================================
// Tool calls
// ===================================================================

/// The tools whose arguments show up in descriptions. Everything else is
/// reported by name only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    Write(FileToolInput),
    Edit(FileToolInput),
    Bash(BashToolInput),
    Other { tool_name: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileToolInput {
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BashToolInput {
    pub command: Option<String>,
    pub description: Option<String>,
}

impl ToolCall {
    /// Arguments that fail to deserialize are treated as absent rather than
    /// rejecting the event.
    pub fn parse(tool_name: &str, tool_input: Option<&serde_json::Value>) -> Self {
        fn fields<T: serde::de::DeserializeOwned + Default>(v: Option<&serde_json::Value>) -> T {
            v.and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default()
        }
        match tool_name {
            "Write" => Self::Write(fields(tool_input)),
            "Edit" | "MultiEdit" => Self::Edit(fields(tool_input)),
            "Bash" => Self::Bash(fields(tool_input)),
            other => Self::Other {
                tool_name: other.to_string(),
            },
        }
    }
}

impl FileToolInput {
    pub fn path_or_default(&self) -> &str {
        self.file_path.as_deref().unwrap_or("a file")
    }
}

impl BashToolInput {
    pub fn command_or_default(&self) -> &str {
        self.command.as_deref().unwrap_or("a command")
    }
}
