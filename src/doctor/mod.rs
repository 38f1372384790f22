use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::chat::client::{ChatClient, ChatTransport, SlackTransport};
use crate::chat::message;
use crate::settings::{SLACK_TOKEN_ENV, SLACK_USER_ENV, Settings};
use crate::text::truncate_chars;

const TIMEOUT: Duration = Duration::from_secs(10);
const BANNER: &str = "============================================================";

/// Entry point for `claude-notifier doctor`.
pub fn main(settings: &Settings, send_message: bool) -> ExitCode {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("claude-notifier: starting runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let token = settings.credentials.slack_bot_token.as_deref().unwrap_or("");
    let client = ChatClient::new(SlackTransport::new(&settings.chat.base_url, token, TIMEOUT));
    let mut out = io::stdout().lock();
    match runtime.block_on(run(&client, settings, send_message, &mut out)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("claude-notifier: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Check the chat credentials and report to `out`. Returns whether the
/// bot token works; a failed test message is reported but not fatal.
pub async fn run<T: ChatTransport>(
    client: &ChatClient<T>,
    settings: &Settings,
    send_message: bool,
    out: &mut impl Write,
) -> Result<bool> {
    writeln!(out, "{BANNER}\n  Claude Notifier - Slack Configuration Check\n{BANNER}\n")
        .context("writing report")?;

    let Some(token) = settings.credentials.slack_bot_token.as_deref() else {
        writeln!(out, "❌ ERROR: {SLACK_TOKEN_ENV} environment variable not set")?;
        writeln!(out, "\nSet it with: export {SLACK_TOKEN_ENV}=xoxb-...")?;
        return Ok(false);
    };

    if !token.starts_with("xoxb-") {
        writeln!(out, "⚠️  WARNING: Token should start with 'xoxb-'")?;
        writeln!(out, "   Your token starts with: {}...", truncate_chars(token, 10))?;
    }

    if !check_auth(client, out).await? {
        return Ok(false);
    }

    match settings.recipient() {
        Some(user) if send_message => send_test_message(client, user, out).await?,
        Some(_) => writeln!(out, "\nℹ️  Skipping test message (--no-message)")?,
        None => writeln!(out, "\nℹ️  To test sending a message, set {SLACK_USER_ENV}")?,
    }

    writeln!(out, "\n{BANNER}\n  Configuration Summary\n{BANNER}\n")?;
    writeln!(out, "{SLACK_TOKEN_ENV}: set")?;
    writeln!(out, "{SLACK_USER_ENV}: {}", settings.recipient().unwrap_or("❌ not set"))?;
    writeln!(out, "Chat mode: {:?}", settings.chat.mode)?;
    let condensing = if settings.credentials.anthropic_api_key.is_some() {
        "enabled"
    } else {
        "disabled (no ANTHROPIC_API_KEY)"
    };
    writeln!(out, "Condensation: {condensing}")?;
    writeln!(out, "Notification log: {}", settings.log_file.display())?;
    Ok(true)
}

async fn check_auth<T: ChatTransport>(client: &ChatClient<T>, out: &mut impl Write) -> Result<bool> {
    match client.auth_test().await {
        Ok(info) => {
            let unknown = "Unknown".to_string();
            writeln!(out, "✅ Bot connected successfully!\n")?;
            writeln!(out, "📛 Bot name: {}", info.user.as_ref().unwrap_or(&unknown))?;
            writeln!(out, "🏢 Workspace: {}", info.team.as_ref().unwrap_or(&unknown))?;
            writeln!(out, "🆔 Bot user ID: {}", info.user_id.as_ref().unwrap_or(&unknown))?;
            writeln!(out, "\nNOTE: this is the bot's user ID. {SLACK_USER_ENV} must be yours")?;
            writeln!(out, "(Slack profile > ... > Copy member ID).")?;
            Ok(true)
        }
        Err(e) => {
            writeln!(out, "❌ Error: {e}")?;
            match e.code() {
                Some("invalid_auth") => {
                    writeln!(out, "\n💡 Tip: Check that your token is correct and hasn't expired")?
                }
                Some("missing_scope") => {
                    writeln!(out, "\n💡 Tip: Add required scopes: chat:write, users:read")?
                }
                _ => {}
            }
            Ok(false)
        }
    }
}

async fn send_test_message<T: ChatTransport>(
    client: &ChatClient<T>,
    user: &str,
    out: &mut impl Write,
) -> Result<()> {
    writeln!(out, "\n📤 Testing message send to user: {user}")?;
    match client.post_message(message::test_message(user)).await {
        Ok(()) => {
            writeln!(out, "✅ Test message sent successfully!")?;
            writeln!(out, "   Check your Slack DMs for the test message.")?;
        }
        Err(e) => {
            writeln!(out, "❌ Failed to send message: {e}")?;
            match e.code() {
                Some("channel_not_found") => writeln!(
                    out,
                    "\n💡 Tip: Check that {SLACK_USER_ENV} is correct (starts with U)"
                )?,
                Some("not_in_channel") => {
                    writeln!(out, "\n💡 Tip: The bot needs permission to message you")?
                }
                _ => {}
            }
        }
    }
    Ok(())
}
