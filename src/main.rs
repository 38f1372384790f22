mod chat;
mod condense;
mod describe;
mod doctor;
mod event;
mod hook;
mod notification_log;
mod settings;
mod text;
mod transcript;

#[cfg(test)]
mod testing;

use std::fs::OpenOptions;
use std::io::{self, Read};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use chat::ChatNotifier;
use condense::Condenser;
use settings::Settings;

const LOG_FILTER_ENV: &str = "CLAUDE_NOTIFIER_LOG";
const DEFAULT_FILTER: &str = "claude_notifier=debug";

/// Notification hook for Claude Code. With no subcommand, reads one hook
/// event from stdin, appends it to the notification log and relays it to
/// Slack.
#[derive(Parser)]
#[command(name = "claude-notifier", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Check the Slack bot token and optionally send a test message.
    Doctor {
        /// Only verify the token; do not send a test direct message.
        #[arg(long)]
        no_message: bool,
    },
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Settings from the config file and environment. A broken config file
/// falls back to defaults; the error is returned for logging once tracing
/// is up.
fn resolve_settings() -> (Settings, Option<anyhow::Error>) {
    let loaded = match Settings::locate(env_lookup) {
        Some(path) => Settings::load(&path),
        None => Ok(Settings::default()),
    };
    let (settings, error) = match loaded {
        Ok(s) => (s, None),
        Err(e) => (Settings::default(), Some(e)),
    };
    (settings.with_env(env_lookup), error)
}

/// Send diagnostics to the debug log. Without a writable log file no
/// subscriber is installed.
fn init_tracing(path: &Path) {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        let _ = std::fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

/// Hook mode. Always succeeds: a failing hook would block the host.
fn run_hook(settings: &Settings) -> ExitCode {
    let input = match read_stdin() {
        Ok(input) => input,
        Err(e) => {
            tracing::warn!("reading stdin: {e}");
            let cwd = std::env::current_dir()
                .map(|d| d.display().to_string())
                .unwrap_or_default();
            hook::record_failure(settings, &format!("reading stdin: {e}"), &cwd);
            return ExitCode::SUCCESS;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::warn!("starting runtime: {e}");
            hook::record_failure(settings, &format!("starting runtime: {e}"), "");
            return ExitCode::SUCCESS;
        }
    };

    let outcome = runtime.block_on(async {
        let condenser = Condenser::from_settings(settings);
        let chat = ChatNotifier::from_settings(settings);
        hook::run(&input, settings, &condenser, &chat).await
    });
    tracing::debug!(
        error = matches!(outcome.record, notification_log::LogRecord::Error(_)),
        logged = outcome.logged,
        delivered = outcome.delivery.as_ref().is_some_and(chat::Delivery::delivered),
        "hook finished"
    );
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let (settings, config_error) = resolve_settings();
    init_tracing(&settings.debug_log_file);
    if let Some(e) = config_error {
        tracing::warn!("ignoring config file: {e:#}");
    }
    tracing::debug!(credentials = ?settings.credentials, "settings resolved");

    match cli.command {
        None => run_hook(&settings),
        Some(Command::Doctor { no_message }) => doctor::main(&settings, !no_message),
    }
}
