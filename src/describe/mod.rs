use crate::condense::{Condenser, TextGenerator};
use crate::event::{EventKind, HookEvent, ToolCall};
use crate::text::{char_len, ellipsize, truncate_chars};
use crate::transcript::{self, LastTurn, NO_ACTIVITY, Role, expand_home};

/// Target length for condensed descriptions.
pub const DESCRIPTION_CHARS: usize = 150;
pub const PROMPT_CHARS: usize = 500;
const PRE_TOOL_COMMAND_CHARS: usize = 50;
const POST_TOOL_COMMAND_CHARS: usize = 100;

/// Chat text at or under this length is sent verbatim.
pub const CHAT_PASSTHROUGH_CHARS: usize = 500;
/// Target for condensing longer chat text.
pub const CHAT_CONDENSED_CHARS: usize = 300;
/// Hard cap on anything sent to chat.
pub const CHAT_MAX_CHARS: usize = 1000;

pub const NEEDS_APPROVAL: &str = "Claude needs your approval";
pub const SESSION_ENDED: &str = "Session ended";
const APPROVAL_SUFFIX: &str = "(needs approval)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolPhase {
    Requested,
    Completed,
}

/// Short human-readable description of an event. Never fails.
pub async fn describe<G: TextGenerator>(event: &HookEvent, condenser: &Condenser<G>) -> String {
    match event.kind() {
        EventKind::PreToolUse => describe_tool(&event.tool_call(), ToolPhase::Requested),
        EventKind::PostToolUse => describe_tool(&event.tool_call(), ToolPhase::Completed),
        EventKind::UserPromptSubmit => describe_prompt(event.prompt.as_deref().unwrap_or("")),
        EventKind::Stop => match event.transcript() {
            Some(path) => latest_activity(path, condenser)
                .await
                .unwrap_or_else(|| NO_ACTIVITY.to_string()),
            None => NO_ACTIVITY.to_string(),
        },
        EventKind::Notification => match event.transcript() {
            Some(path) => {
                let activity = latest_activity(path, condenser)
                    .await
                    .unwrap_or_else(|| NO_ACTIVITY.to_string());
                format!("{activity} {APPROVAL_SUFFIX}")
            }
            None => event
                .message
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .unwrap_or(NEEDS_APPROVAL)
                .to_string(),
        },
        EventKind::SessionEnd => SESSION_ENDED.to_string(),
        EventKind::Other(name) => format!("Claude event: {name}"),
    }
}

/// Condensed summary of the last assistant turn, else its headline.
/// `None` when the transcript shows no activity.
async fn latest_activity<G: TextGenerator>(path: &str, condenser: &Condenser<G>) -> Option<String> {
    let path = expand_home(path);
    if let Some(summary) = condenser.condense(&path, DESCRIPTION_CHARS).await {
        tracing::debug!("using condensed description");
        return Some(summary);
    }
    match transcript::extract_last_turn(&path, Role::Assistant) {
        LastTurn::NoActivity => None,
        turn => Some(turn.headline()),
    }
}

pub fn describe_tool(call: &ToolCall, phase: ToolPhase) -> String {
    match (phase, call) {
        (ToolPhase::Requested, ToolCall::Write(f)) => {
            format!("Claude wants to write to {}", f.path_or_default())
        }
        (ToolPhase::Requested, ToolCall::Edit(f)) => {
            format!("Claude wants to edit {}", f.path_or_default())
        }
        (ToolPhase::Requested, ToolCall::Bash(b)) => format!(
            "Claude wants to run: {}",
            truncate_chars(b.command_or_default(), PRE_TOOL_COMMAND_CHARS)
        ),
        (ToolPhase::Requested, ToolCall::Other { tool_name }) => {
            format!("Claude wants to use {tool_name} (needs approval)")
        }
        (ToolPhase::Completed, ToolCall::Write(f)) => {
            format!("✅ Claude wrote to {}", f.path_or_default())
        }
        (ToolPhase::Completed, ToolCall::Edit(f)) => {
            format!("✅ Claude edited {}", f.path_or_default())
        }
        (ToolPhase::Completed, ToolCall::Bash(b)) => format!(
            "✅ Claude ran: {}",
            truncate_chars(b.command_or_default(), POST_TOOL_COMMAND_CHARS)
        ),
        (ToolPhase::Completed, ToolCall::Other { tool_name }) => {
            format!("✅ Claude used {tool_name}")
        }
    }
}

fn describe_prompt(prompt: &str) -> String {
    if prompt.trim().is_empty() {
        return "User submitted an empty prompt".to_string();
    }
    ellipsize(prompt, PROMPT_CHARS)
}

/// Text to send to a chat channel before length shaping. Events that wait
/// on the user carry the whole last assistant turn rather than its
/// headline. With no readable turn, a transcript-backed Notification reads
/// as waiting for input; otherwise `description` is used.
pub fn full_message(event: &HookEvent, description: &str) -> String {
    let kind = event.kind();
    let Some(path) = event.transcript().filter(|_| kind.is_important()) else {
        return description.to_string();
    };
    let turn = transcript::extract_last_turn(&expand_home(path), Role::Assistant);
    match (kind, turn.text()) {
        (EventKind::Notification, Some(text)) => format!("{text} {APPROVAL_SUFFIX}"),
        (EventKind::Notification, None) if turn == LastTurn::NoActivity => {
            format!("{NO_ACTIVITY} {APPROVAL_SUFFIX}")
        }
        (_, Some(text)) => text.to_string(),
        _ => description.to_string(),
    }
}

/// Length-adaptive shaping for chat: short text passes through untouched
/// (no remote call), long text is condensed or cut, and the result never
/// exceeds `CHAT_MAX_CHARS`.
pub async fn chat_text<G: TextGenerator>(full: &str, condenser: &Condenser<G>) -> String {
    let shaped = if char_len(full) <= CHAT_PASSTHROUGH_CHARS {
        full.to_string()
    } else {
        match condenser.condense_text(full, CHAT_CONDENSED_CHARS).await {
            Some(summary) => summary,
            None => ellipsize(full, CHAT_PASSTHROUGH_CHARS),
        }
    };
    truncate_chars(&shaped, CHAT_MAX_CHARS).to_string()
}
