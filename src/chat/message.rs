use chrono::{DateTime, Local};
use minijinja::{Environment, context};
use serde_json::json;

use crate::event::EventKind;
use crate::notification_log::NotificationRecord;
use crate::text::truncate_chars;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━";

/// Block Kit payload for a direct message to `recipient`.
pub fn direct_message(
    record: &NotificationRecord,
    kind: &EventKind,
    recipient: &str,
) -> serde_json::Value {
    let marker = kind.marker();
    let path = non_empty_or(&record.code_session_path, "Unknown");
    let session = truncate_chars(non_empty_or(&record.session_id, "Unknown"), 8);
    let task = non_empty_or(&record.task, "No description");
    let time = local_time(&record.timestamp);

    json!({
        "channel": recipient,
        "text": format!("{marker} Claude: {task}"),
        "blocks": [
            {
                "type": "section",
                "text": { "type": "mrkdwn", "text": format!("{marker} *Claude Notification*\n{RULE}") }
            },
            {
                "type": "section",
                "fields": [
                    { "type": "mrkdwn", "text": format!("📁 *Path:*\n`{path}`") },
                    { "type": "mrkdwn", "text": format!("🆔 *Session:*\n`{session}`") }
                ]
            },
            {
                "type": "section",
                "fields": [
                    { "type": "mrkdwn", "text": format!("📝 *Task:*\n{task}") },
                    { "type": "mrkdwn", "text": format!("⏰ *Time:*\n{time}") }
                ]
            }
        ]
    })
}

/// Test message sent by the doctor.
pub fn test_message(recipient: &str) -> serde_json::Value {
    json!({
        "channel": recipient,
        "text": "Test message from Claude Notifier",
        "blocks": [
            {
                "type": "section",
                "text": { "type": "mrkdwn", "text": format!("🧪 *Test Message from Claude Notifier*\n{RULE}") }
            },
            {
                "type": "section",
                "text": { "type": "mrkdwn", "text": "If you see this message, your Slack integration is working! ✅" }
            }
        ]
    })
}

/// Render the channel message template. `mention` is a user id to
/// at-mention, if any.
pub fn render_channel_text(
    template: &str,
    marker: &str,
    mention: Option<&str>,
    text: &str,
) -> Result<String, minijinja::Error> {
    let env = Environment::new();
    let tmpl = env.template_from_str(template)?;
    tmpl.render(context! { marker, mention, text })
}

/// `HH:MM:SS` in local time, or `Unknown` for an unparseable timestamp.
pub fn local_time(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|_| "Unknown".to_string())
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}
