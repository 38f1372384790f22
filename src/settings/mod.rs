use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const DIRNAME: &str = "claude-notifier";
const FILENAME: &str = "config.toml";

pub const CONFIG_ENV: &str = "CLAUDE_NOTIFIER_CONFIG";
pub const LOG_FILE_ENV: &str = "CLAUDE_NOTIFIER_LOG_FILE";
pub const DEBUG_LOG_ENV: &str = "CLAUDE_NOTIFIER_DEBUG_LOG";
pub const ANTHROPIC_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const SLACK_TOKEN_ENV: &str = "SLACK_BOT_TOKEN";
pub const SLACK_USER_ENV: &str = "SLACK_USER_ID";

pub const DEFAULT_TEMPLATE: &str =
    "{{ marker }} {% if mention %}<@{{ mention }}> {% endif %}{{ text }}";

/// Channel message template: either an inline Jinja2 string or a path to a
/// template file (relative to the config file's directory).
///
/// ```toml
/// [chat]
/// message_template = { inline = "{{ marker }} {{ text }}" }
///
/// # or
///
/// [chat.message_template]
/// file = "message.tmpl"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum MessageTemplate {
    Inline(String),
    File(PathBuf),
}

impl Default for MessageTemplate {
    fn default() -> Self {
        MessageTemplate::Inline(DEFAULT_TEMPLATE.into())
    }
}

impl MessageTemplate {
    /// Resolve the template to its source text.
    pub fn source(&self, base_dir: &Path) -> Result<String> {
        match self {
            MessageTemplate::Inline(s) => Ok(s.clone()),
            MessageTemplate::File(rel) => {
                let path = base_dir.join(rel);
                fs::read_to_string(&path)
                    .with_context(|| format!("reading template {}", path.display()))
            }
        }
    }
}

/// How chat notifications are addressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// One private channel per project, recipient invited on creation.
    #[default]
    Channel,
    /// Direct message to the recipient.
    Direct,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CondenserSettings {
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

impl Default for CondenserSettings {
    fn default() -> Self {
        Self {
            model: "claude-3-5-haiku-20241022".into(),
            base_url: "https://api.anthropic.com".into(),
            timeout_secs: 3,
            max_tokens: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    pub mode: ChatMode,
    pub base_url: String,
    pub timeout_secs: u64,
    pub channel_prefix: String,
    pub list_page_size: u32,
    pub message_template: MessageTemplate,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            mode: ChatMode::default(),
            base_url: "https://slack.com/api".into(),
            timeout_secs: 5,
            channel_prefix: "claude".into(),
            list_page_size: 200,
            message_template: MessageTemplate::default(),
        }
    }
}

/// Secrets taken from the environment. `Debug` only reports presence.
#[derive(Clone, Default)]
pub struct Credentials {
    pub anthropic_api_key: Option<String>,
    pub slack_bot_token: Option<String>,
    pub slack_user_id: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn presence(v: &Option<String>) -> &'static str {
            if v.is_some() { "set" } else { "unset" }
        }
        f.debug_struct("Credentials")
            .field("anthropic_api_key", &presence(&self.anthropic_api_key))
            .field("slack_bot_token", &presence(&self.slack_bot_token))
            .field("slack_user_id", &self.slack_user_id)
            .finish()
    }
}

impl Credentials {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            anthropic_api_key: get(ANTHROPIC_KEY_ENV),
            slack_bot_token: get(SLACK_TOKEN_ENV),
            slack_user_id: get(SLACK_USER_ENV),
        }
    }
}

/// Everything the hook needs, resolved once at start-up.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log_file: PathBuf,
    pub debug_log_file: PathBuf,
    pub condenser: CondenserSettings,
    pub chat: ChatSettings,

    #[serde(skip)]
    pub credentials: Credentials,
    /// Directory of the config file; relative template paths resolve here.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("/tmp/claude-notifications.jsonl"),
            debug_log_file: PathBuf::from("/tmp/claude-notification-debug.log"),
            condenser: CondenserSettings::default(),
            chat: ChatSettings::default(),
            credentials: Credentials::default(),
            base_dir: PathBuf::new(),
        }
    }
}

impl Settings {
    /// Where the config file lives: `$CLAUDE_NOTIFIER_CONFIG`, else
    /// `<config_dir>/claude-notifier/config.toml`.
    pub fn locate(lookup: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
        lookup(CONFIG_ENV)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|d| d.join(DIRNAME).join(FILENAME)))
    }

    /// Load settings from a TOML file. A missing file yields defaults; the
    /// file is never created.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let mut settings: Settings = toml::from_str(&contents)
                    .with_context(|| format!("parsing {}", path.display()))?;
                settings.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
                Ok(settings)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    /// Apply environment overrides and pick up credentials.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(p) = lookup(LOG_FILE_ENV).filter(|p| !p.is_empty()) {
            self.log_file = PathBuf::from(p);
        }
        if let Some(p) = lookup(DEBUG_LOG_ENV).filter(|p| !p.is_empty()) {
            self.debug_log_file = PathBuf::from(p);
        }
        self.credentials = Credentials::from_lookup(&lookup);
        self
    }

    /// The chat recipient, if any.
    pub fn recipient(&self) -> Option<&str> {
        self.credentials.slack_user_id.as_deref()
    }
}

#[cfg(test)]
mod tests;
