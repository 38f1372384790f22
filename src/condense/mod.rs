use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::settings::{CondenserSettings, Settings};
use crate::text::truncate_chars;
use crate::transcript::{self, LastTurn, Role};

/// Assistant text beyond this is not sent for condensation.
const SOURCE_CHARS: usize = 800;

#[derive(Debug, Error)]
pub enum CondenseError {
    #[error("summarization request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("summarization service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed summarization response: {0}")]
    Malformed(String),
    #[error("summarization returned no text")]
    Empty,
}

/// A remote text-generation service.
pub trait TextGenerator {
    async fn generate(
        &self,
        api_key: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, CondenseError>;
}

// ===================================================================
// Anthropic Messages API
// ===================================================================

pub struct AnthropicGenerator {
    client: reqwest::Client,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for AnthropicGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicGenerator")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AnthropicGenerator {
    pub fn new(settings: &CondenserSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("building summarization client: {e}");
                reqwest::Client::new()
            });
        Self {
            client,
            model: settings.model.clone(),
            base_url: settings.base_url.clone(),
        }
    }
}

impl TextGenerator for AnthropicGenerator {
    /// POST {base_url}/v1/messages
    async fn generate(
        &self,
        api_key: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, CondenseError> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "temperature": 0,
            "messages": [{"role": "user", "content": prompt}],
        });

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(CondenseError::Status { status, body });
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| CondenseError::Malformed(e.to_string()))?;

        // {"content": [{"type": "text", "text": "..."}]}
        match json["content"][0]["text"].as_str() {
            Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
            Some(_) => Err(CondenseError::Empty),
            None => Err(CondenseError::Malformed("missing content[0].text".into())),
        }
    }
}

// ===================================================================
// Condenser
// ===================================================================

/// Best-effort summarization. Every failure, including a missing API key,
/// comes back as `None`.
pub struct Condenser<G> {
    generator: G,
    api_key: Option<String>,
    timeout: Duration,
    max_tokens: u32,
}

impl Condenser<AnthropicGenerator> {
    pub fn from_settings(settings: &Settings) -> Self {
        Condenser::new(
            AnthropicGenerator::new(&settings.condenser),
            settings.credentials.anthropic_api_key.clone(),
            &settings.condenser,
        )
    }
}

impl<G: TextGenerator> Condenser<G> {
    pub fn new(generator: G, api_key: Option<String>, settings: &CondenserSettings) -> Self {
        Self {
            generator,
            api_key,
            timeout: Duration::from_secs(settings.timeout_secs),
            max_tokens: settings.max_tokens,
        }
    }

    #[cfg(test)]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Restate the most recent assistant turn in `transcript_path` as one
    /// past-tense sentence of at most `target_chars` characters.
    pub async fn condense(&self, transcript_path: &Path, target_chars: usize) -> Option<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::debug!("no ANTHROPIC_API_KEY, skipping condensation");
            return None;
        };

        let source = match transcript::extract_last_turn(transcript_path, Role::Assistant) {
            LastTurn::Text(text) => truncate_chars(&text, SOURCE_CHARS).to_string(),
            other => {
                tracing::debug!("nothing to condense in {}: {other:?}", transcript_path.display());
                return None;
            }
        };
        tracing::debug!("condensing assistant turn ({} chars)", source.chars().count());

        self.summarize(api_key, &turn_prompt(&source, target_chars), target_chars)
            .await
    }

    /// Shorten arbitrary message text to at most `target_chars` characters.
    pub async fn condense_text(&self, text: &str, target_chars: usize) -> Option<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::debug!("no ANTHROPIC_API_KEY, skipping condensation");
            return None;
        };
        self.summarize(api_key, &text_prompt(text, target_chars), target_chars)
            .await
    }

    async fn summarize(&self, api_key: &str, prompt: &str, target_chars: usize) -> Option<String> {
        let max_tokens = self.max_tokens.max((target_chars / 3) as u32);
        let call = self.generator.generate(api_key, prompt, max_tokens);
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(reply)) => {
                let cleaned = clean_reply(&reply, target_chars);
                match &cleaned {
                    Some(s) => tracing::debug!("condensed to: {s}"),
                    None => tracing::debug!("condensation came back blank"),
                }
                cleaned
            }
            Ok(Err(e)) => {
                tracing::debug!("condensation failed: {e}");
                None
            }
            Err(_) => {
                tracing::debug!("condensation timed out after {:?}", self.timeout);
                None
            }
        }
    }
}

/// Strip whitespace and surrounding quotes, then cap the length.
fn clean_reply(reply: &str, target_chars: usize) -> Option<String> {
    let stripped = reply.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if stripped.is_empty() {
        return None;
    }
    Some(truncate_chars(stripped, target_chars).to_string())
}

fn turn_prompt(message: &str, target_chars: usize) -> String {
    let words = (target_chars / 10).max(5);
    format!(
        "Below is Claude's most recent message to the user. What action did Claude JUST \
complete in THIS message?

Reply with ONE past-tense sentence of at most {words} words stating that immediate action.
Never apologize, never list earlier steps, and describe what Claude did rather than what \
the user asked.

Good replies look like:
- \"Updated README documentation with new features\"
- \"Refactored the parser for better error messages\"
- \"Waiting for user approval to proceed\"

Claude's message:
{message}"
    )
}

fn text_prompt(text: &str, target_chars: usize) -> String {
    format!(
        "Condense the following status message to at most {target_chars} characters. \
Keep file names, commands and any question for the user. Reply with the condensed text only.

Message:
{text}"
    )
}
