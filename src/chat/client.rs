use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("chat service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("chat API error: {0}")]
    Api(String),
    #[error("malformed chat response: {0}")]
    Malformed(String),
    #[error("invalid chat API URL: {0}")]
    Url(String),
}

impl ChatError {
    /// The service's error code, for `ok: false` responses.
    pub fn code(&self) -> Option<&str> {
        match self {
            ChatError::Api(code) => Some(code),
            _ => None,
        }
    }
}

/// How a method's arguments travel: read methods take query parameters,
/// write methods a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiRequest {
    Query(Vec<(String, String)>),
    Json(serde_json::Value),
}

/// Raw access to the chat service's JSON-over-HTTP API.
pub trait ChatTransport {
    async fn call(&self, method: &str, request: ApiRequest)
    -> Result<serde_json::Value, ChatError>;
}

// ===================================================================
// Slack Web API
// ===================================================================

pub struct SlackTransport {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for SlackTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackTransport")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl SlackTransport {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("building chat client: {e}");
                reqwest::Client::new()
            });
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }
}

impl ChatTransport for SlackTransport {
    async fn call(
        &self,
        method: &str,
        request: ApiRequest,
    ) -> Result<serde_json::Value, ChatError> {
        let url = format!("{}/{method}", self.base_url);
        let builder = match request {
            ApiRequest::Query(params) => {
                let url = reqwest::Url::parse_with_params(&url, &params)
                    .map_err(|e| ChatError::Url(e.to_string()))?;
                self.client.get(url)
            }
            ApiRequest::Json(body) => self.client.post(&url).json(&body),
        };

        let resp = builder.bearer_auth(&self.token).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ChatError::Status { status, body });
        }

        resp.json()
            .await
            .map_err(|e| ChatError::Malformed(e.to_string()))
    }
}

// ===================================================================
// Typed client
// ===================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
}

/// Identity behind the bot token, from `auth.test`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthInfo {
    pub user: Option<String>,
    pub user_id: Option<String>,
    pub team: Option<String>,
}

/// Wraps a transport and turns `{"ok": false, "error": ...}` envelopes
/// into `ChatError::Api`.
pub struct ChatClient<T> {
    transport: T,
}

impl<T: ChatTransport> ChatClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    async fn invoke(
        &self,
        method: &str,
        request: ApiRequest,
    ) -> Result<serde_json::Value, ChatError> {
        let value = self.transport.call(method, request).await?;
        if value["ok"].as_bool() == Some(true) {
            Ok(value)
        } else {
            let code = value["error"].as_str().unwrap_or("unknown_error");
            Err(ChatError::Api(code.to_string()))
        }
    }

    pub async fn auth_test(&self) -> Result<AuthInfo, ChatError> {
        let value = self.invoke("auth.test", ApiRequest::Query(Vec::new())).await?;
        serde_json::from_value(value).map_err(|e| ChatError::Malformed(e.to_string()))
    }

    /// `chat.postMessage` with a prepared payload (`channel` plus `text`
    /// and/or `blocks`).
    pub async fn post_message(&self, payload: serde_json::Value) -> Result<(), ChatError> {
        self.invoke("chat.postMessage", ApiRequest::Json(payload))
            .await
            .map(|_| ())
    }

    /// One page of the private channels visible to the bot.
    pub async fn list_private_channels(&self, limit: u32) -> Result<Vec<Channel>, ChatError> {
        let params = vec![
            ("types".to_string(), "private_channel".to_string()),
            ("exclude_archived".to_string(), "true".to_string()),
            ("limit".to_string(), limit.to_string()),
        ];
        let value = self
            .invoke("conversations.list", ApiRequest::Query(params))
            .await?;
        serde_json::from_value::<Option<Vec<Channel>>>(value["channels"].clone())
            .map(Option::unwrap_or_default)
            .map_err(|e| ChatError::Malformed(format!("channels: {e}")))
    }

    pub async fn create_private_channel(&self, name: &str) -> Result<Channel, ChatError> {
        let body = serde_json::json!({ "name": name, "is_private": true });
        let value = self
            .invoke("conversations.create", ApiRequest::Json(body))
            .await?;
        serde_json::from_value(value["channel"].clone())
            .map_err(|e| ChatError::Malformed(format!("channel: {e}")))
    }

    pub async fn invite(&self, channel_id: &str, user_id: &str) -> Result<(), ChatError> {
        let body = serde_json::json!({ "channel": channel_id, "users": user_id });
        self.invoke("conversations.invite", ApiRequest::Json(body))
            .await
            .map(|_| ())
    }
}
