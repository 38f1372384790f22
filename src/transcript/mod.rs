use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::text::{ellipsize, truncate_chars};

/// How many trailing lines of the transcript are scanned.
pub const SCAN_LINES: usize = 20;

/// Shown when there is no assistant turn to report.
pub const NO_ACTIVITY: &str = "Claude is waiting for your input";

const HEADLINE_CHARS: usize = 150;
const ERROR_CHARS: usize = 50;

// ===================================================================
// Transcript lines
// ===================================================================

/// A single transcript line. Two shapes exist: the host's native one
/// (`type` carries the role, text lives under `message.content`) and a
/// flat one (`role` + `content` at the top level). Both are accepted.
#[derive(Debug, Deserialize)]
struct TranscriptLine {
    #[serde(default, rename = "type")]
    entry_type: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    message: Option<Message>,
    #[serde(default)]
    content: Option<MessageContent>,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Option<MessageContent>,
}

/// `content` is either a plain string or an array of typed blocks.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text(TextBlock),
    /// thinking, tool_use, tool_result, images...
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub text: String,
}

impl TranscriptLine {
    fn role(&self) -> Option<&str> {
        let typed = self
            .entry_type
            .as_deref()
            .filter(|t| *t == "user" || *t == "assistant");
        typed
            .or(self.role.as_deref())
            .or_else(|| self.message.as_ref().and_then(|m| m.role.as_deref()))
    }

    fn content(&self) -> Option<&MessageContent> {
        self.message
            .as_ref()
            .and_then(|m| m.content.as_ref())
            .or(self.content.as_ref())
    }
}

impl MessageContent {
    /// The first non-blank text: the string itself, or the first text
    /// block. Blocks are never concatenated.
    pub fn first_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(s) => Some(s.trim()).filter(|s| !s.is_empty()),
            MessageContent::Blocks(blocks) => blocks.iter().find_map(|b| match b {
                ContentBlock::Text(t) => Some(t.text.trim()).filter(|s| !s.is_empty()),
                ContentBlock::Other => None,
            }),
        }
    }
}

// ===================================================================
// Roles
// ===================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

// ===================================================================
// Reading the last turn
// ===================================================================

/// Result of looking up the most recent turn for a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastTurn {
    Text(String),
    /// No file yet, or no matching turn in the scanned window.
    NoActivity,
    /// The file exists but could not be read.
    Unreadable(String),
}

impl LastTurn {
    pub fn text(&self) -> Option<&str> {
        match self {
            LastTurn::Text(t) => Some(t),
            _ => None,
        }
    }

    /// One-line rendering: the turn's headline, or a sentinel sentence.
    pub fn headline(&self) -> String {
        match self {
            LastTurn::Text(t) => headline(t),
            LastTurn::NoActivity => NO_ACTIVITY.to_string(),
            LastTurn::Unreadable(err) => format!(
                "Claude finished (error reading transcript: {})",
                truncate_chars(err, ERROR_CHARS)
            ),
        }
    }
}

/// Expand a leading `~/` the way a shell would.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|h| h.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

/// Find the most recent turn by `role` among the last `SCAN_LINES` lines
/// of the file.
///
/// Blank lines and lines that are not valid UTF-8 or JSON count towards
/// the window but are otherwise skipped. Never fails: I/O problems come
/// back as `LastTurn::Unreadable`.
pub fn extract_last_turn(path: &Path, role: Role) -> LastTurn {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return LastTurn::NoActivity,
        Err(e) => {
            tracing::debug!("reading transcript {}: {e}", path.display());
            return LastTurn::Unreadable(e.to_string());
        }
    };

    let body = bytes.strip_suffix(b"\n").unwrap_or(&bytes[..]);
    let lines: Vec<&[u8]> = body.split(|b| *b == b'\n').collect();
    let start = lines.len().saturating_sub(SCAN_LINES);

    for (offset, raw) in lines[start..].iter().enumerate().rev() {
        let Some(line) = std::str::from_utf8(raw)
            .ok()
            .map(str::trim)
            .filter(|l| !l.is_empty())
        else {
            continue;
        };
        let entry: TranscriptLine = match serde_json::from_str(line) {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!("skipping transcript line {}: {e}", start + offset + 1);
                continue;
            }
        };
        if entry.role() != Some(role.as_str()) {
            continue;
        }
        if let Some(text) = entry.content().and_then(MessageContent::first_text) {
            return LastTurn::Text(text.to_string());
        }
    }

    LastTurn::NoActivity
}

/// First line, then first sentence, capped with an ellipsis.
pub fn headline(text: &str) -> String {
    let line = text.trim().lines().next().unwrap_or("");
    let sentence = match line.find(". ") {
        Some(idx) => &line[..idx],
        None => line.strip_suffix('.').unwrap_or(line),
    };
    ellipsize(sentence, HEADLINE_CHARS)
}

#[cfg(test)]
mod tests;
