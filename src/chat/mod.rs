pub mod channel;
pub mod client;
pub mod message;

use std::time::Duration;

use crate::condense::{Condenser, TextGenerator};
use crate::describe;
use crate::event::HookEvent;
use crate::notification_log::NotificationRecord;
use crate::settings::{ChatMode, DEFAULT_TEMPLATE, Settings};
use client::{ChatClient, ChatError, ChatTransport, SlackTransport};

/// What happened to a chat notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Not attempted, usually because a credential is missing.
    Skipped(String),
    Failed(String),
}

impl Delivery {
    pub fn delivered(&self) -> bool {
        matches!(self, Delivery::Delivered)
    }
}

/// Best-effort relay of notifications to the chat service.
pub struct ChatNotifier<T> {
    client: ChatClient<T>,
    has_token: bool,
    recipient: Option<String>,
    mode: ChatMode,
    channel_prefix: String,
    page_size: u32,
    template: String,
}

impl ChatNotifier<SlackTransport> {
    pub fn from_settings(settings: &Settings) -> Self {
        let token = settings.credentials.slack_bot_token.as_deref().unwrap_or("");
        let transport = SlackTransport::new(
            &settings.chat.base_url,
            token,
            Duration::from_secs(settings.chat.timeout_secs),
        );
        ChatNotifier::new(transport, settings)
    }
}

impl<T: ChatTransport> ChatNotifier<T> {
    pub fn new(transport: T, settings: &Settings) -> Self {
        let template = settings
            .chat
            .message_template
            .source(&settings.base_dir)
            .unwrap_or_else(|e| {
                tracing::warn!("using default chat template: {e:#}");
                DEFAULT_TEMPLATE.to_string()
            });
        Self {
            client: ChatClient::new(transport),
            has_token: settings.credentials.slack_bot_token.is_some(),
            recipient: settings.credentials.slack_user_id.clone(),
            mode: settings.chat.mode,
            channel_prefix: settings.chat.channel_prefix.clone(),
            page_size: settings.chat.list_page_size,
            template,
        }
    }

    /// Send `record` to chat. Never fails; the outcome says what happened.
    pub async fn notify<G: TextGenerator>(
        &self,
        record: &NotificationRecord,
        event: &HookEvent,
        condenser: &Condenser<G>,
    ) -> Delivery {
        if !self.has_token {
            return Delivery::Skipped("no SLACK_BOT_TOKEN".into());
        }
        let Some(recipient) = self.recipient.as_deref() else {
            return Delivery::Skipped("no SLACK_USER_ID".into());
        };

        let result = match self.mode {
            ChatMode::Direct => self.send_direct(record, event, recipient).await,
            ChatMode::Channel => {
                self.send_to_channel(record, event, recipient, condenser)
                    .await
            }
        };
        match result {
            Ok(()) => {
                tracing::debug!("chat notification delivered ({:?} mode)", self.mode);
                Delivery::Delivered
            }
            Err(e) => {
                tracing::warn!("chat notification failed: {e}");
                Delivery::Failed(e.to_string())
            }
        }
    }

    async fn send_direct(
        &self,
        record: &NotificationRecord,
        event: &HookEvent,
        recipient: &str,
    ) -> Result<(), ChatError> {
        let payload = message::direct_message(record, &event.kind(), recipient);
        self.client.post_message(payload).await
    }

    async fn send_to_channel<G: TextGenerator>(
        &self,
        record: &NotificationRecord,
        event: &HookEvent,
        recipient: &str,
        condenser: &Condenser<G>,
    ) -> Result<(), ChatError> {
        let name = channel::channel_name(&self.channel_prefix, &record.code_session_path, recipient);
        let target = self.ensure_channel(&name, recipient).await?;

        let kind = event.kind();
        let full = describe::full_message(event, &record.task);
        let text = describe::chat_text(&full, condenser).await;
        let mention = kind.is_important().then_some(recipient);
        let rendered = message::render_channel_text(&self.template, kind.marker(), mention, &text)
            .unwrap_or_else(|e| {
                tracing::warn!("rendering chat template: {e}");
                format!("{} {text}", kind.marker())
            });

        let payload = serde_json::json!({ "channel": target, "text": rendered });
        self.client.post_message(payload).await
    }

    /// Find or create the private channel `name` and return what to post
    /// to. A `name_taken` race counts as success and yields the name
    /// itself, without confirming the bot is a member.
    async fn ensure_channel(&self, name: &str, recipient: &str) -> Result<String, ChatError> {
        let channels = self.client.list_private_channels(self.page_size).await?;
        if let Some(existing) = channels.into_iter().find(|c| c.name == name) {
            return Ok(existing.id);
        }

        let created = match self.client.create_private_channel(name).await {
            Ok(c) => c,
            Err(e) if e.code() == Some("name_taken") => {
                tracing::info!("channel #{name} already exists, posting by name");
                return Ok(name.to_string());
            }
            Err(e) => return Err(e),
        };
        tracing::info!("created channel #{name} ({})", created.id);

        match self.client.invite(&created.id, recipient).await {
            Ok(()) => tracing::debug!("invited {recipient} to #{name}"),
            Err(e) if e.code() == Some("already_in_channel") => {}
            Err(e) => tracing::warn!("inviting {recipient} to #{name}: {e}"),
        }
        Ok(created.id)
    }
}
