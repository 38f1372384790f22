use std::path::Path;

use anyhow::{Context, Result};

use crate::chat::client::ChatTransport;
use crate::chat::{ChatNotifier, Delivery};
use crate::condense::{Condenser, TextGenerator};
use crate::describe;
use crate::event::HookEvent;
use crate::notification_log::{self, ErrorRecord, LogRecord, NotificationRecord, now_timestamp};
use crate::settings::Settings;

/// What one hook invocation did.
#[derive(Debug)]
pub struct Outcome {
    pub record: LogRecord,
    /// Whether `record` reached the notification log.
    pub logged: bool,
    /// `None` when the event never got as far as chat delivery.
    pub delivery: Option<Delivery>,
}

/// Handle one hook payload: describe it, log it, relay it to chat.
///
/// Nothing here fails. Unparseable input becomes an error record, and
/// logging or delivery problems are reported in the `Outcome`.
pub async fn run<G: TextGenerator, T: ChatTransport>(
    input: &str,
    settings: &Settings,
    condenser: &Condenser<G>,
    chat: &ChatNotifier<T>,
) -> Outcome {
    let event = match parse_event(input) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("rejecting hook input: {e:#}");
            return record_failure(settings, &format!("{e:#}"), &best_effort_cwd(input));
        }
    };
    tracing::debug!(
        event = %event.kind(),
        session = %event.session_id,
        cwd = %event.cwd,
        condensing = condenser.is_enabled(),
        "handling hook event"
    );

    let record = NotificationRecord {
        timestamp: now_timestamp(),
        code_session_path: event.cwd.clone(),
        session_id: event.session_id.clone(),
        task: describe::describe(&event, condenser).await,
        event: event.hook_event_name.clone(),
        transcript_path: event.transcript_path.clone(),
    };
    tracing::info!("{}: {}", record.event, record.task);

    let entry = LogRecord::Notification(record.clone());
    let logged = write(&settings.log_file, &entry);

    let delivery = chat.notify(&record, &event, condenser).await;
    if let Delivery::Skipped(reason) = &delivery {
        tracing::debug!("chat skipped: {reason}");
    }

    Outcome {
        record: entry,
        logged,
        delivery: Some(delivery),
    }
}

/// Log an error record in place of a notification.
pub fn record_failure(settings: &Settings, message: &str, cwd: &str) -> Outcome {
    let record = LogRecord::Error(ErrorRecord::new(message, cwd));
    let logged = write(&settings.log_file, &record);
    Outcome {
        record,
        logged,
        delivery: None,
    }
}

fn parse_event(input: &str) -> Result<HookEvent> {
    serde_json::from_str(input).context("parsing hook input")
}

/// The `cwd` field if the input is at least a JSON object carrying one,
/// else the process's own working directory.
fn best_effort_cwd(input: &str) -> String {
    serde_json::from_str::<serde_json::Value>(input)
        .ok()
        .and_then(|v| v.get("cwd").and_then(|c| c.as_str()).map(str::to_string))
        .or_else(|| {
            std::env::current_dir()
                .ok()
                .map(|d| d.display().to_string())
        })
        .unwrap_or_default()
}

fn write(path: &Path, record: &LogRecord) -> bool {
    match notification_log::append(path, record) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("notification log: {e:#}");
            false
        }
    }
}
