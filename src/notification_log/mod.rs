use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// One line of the notification log. Field names are read by whatever
/// tails the file, so they stay as they are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub timestamp: String,
    pub code_session_path: String,
    pub session_id: String,
    pub task: String,
    pub event: String,
    pub transcript_path: String,
}

/// Written instead of a `NotificationRecord` when the event could not be
/// processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub timestamp: String,
    pub error: String,
    pub code_session_path: String,
}

impl ErrorRecord {
    pub fn new(message: &str, cwd: &str) -> Self {
        Self {
            timestamp: now_timestamp(),
            error: format!("Hook error: {message}"),
            code_session_path: cwd.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LogRecord {
    Notification(NotificationRecord),
    Error(ErrorRecord),
}

/// ISO-8601 UTC timestamp.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// Append `record` as one JSON line, creating the parent directory first.
///
/// The line and its newline go out in a single write so concurrent hooks
/// interleave whole lines.
pub fn append(path: &Path, record: &LogRecord) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut line = serde_json::to_string(record).context("serializing log record")?;
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    file.write_all(line.as_bytes())
        .with_context(|| format!("appending to {}", path.display()))?;
    Ok(())
}
