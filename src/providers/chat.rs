//! Conversational replies from an OpenAI-compatible `/v1/chat/completions`
//! endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ChatConfig;
use crate::providers::{endpoint, http_client, read_credential, ProviderError};

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

// ---------------------------------------------------------------------------
// ConversationProvider trait
// ---------------------------------------------------------------------------

/// Produces the assistant's next message for a conversation.
///
/// `history` is ordered oldest first and ends with the user's latest turn.
#[async_trait]
pub trait ConversationProvider: Send + Sync {
    async fn reply(&self, history: &[ChatMessage]) -> Result<String, ProviderError>;
}

// ---------------------------------------------------------------------------
// OpenAiChat
// ---------------------------------------------------------------------------

pub struct OpenAiChat {
    client: reqwest::Client,
    config: ChatConfig,
}

impl OpenAiChat {
    pub fn from_config(config: &ChatConfig) -> Self {
        Self {
            client: http_client(config.timeout_secs),
            config: config.clone(),
        }
    }

    /// JSON body for one request.  The configured system prompt, if any,
    /// goes first and is never part of `history`.
    pub fn request_body(&self, history: &[ChatMessage]) -> serde_json::Value {
        let mut messages: Vec<ChatMessage> = Vec::with_capacity(history.len() + 1);
        if let Some(prompt) = self.config.system_prompt.as_deref().filter(|p| !p.trim().is_empty()) {
            messages.push(ChatMessage::system(prompt));
        }
        messages.extend_from_slice(history);

        serde_json::json!({
            "model":       self.config.model,
            "messages":    messages,
            "temperature": self.config.temperature,
            "max_tokens":  self.config.max_tokens,
        })
    }
}

#[async_trait]
impl ConversationProvider for OpenAiChat {
    async fn reply(&self, history: &[ChatMessage]) -> Result<String, ProviderError> {
        let key = read_credential(&self.config.api_key_env)?;
        let url = endpoint(&self.config.base_url, "v1/chat/completions");

        let response = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(&self.request_body(history))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: json["error"]["message"]
                    .as_str()
                    .unwrap_or("unknown error")
                    .to_string(),
            });
        }

        log::debug!("chat: usage {}", json["usage"]);
        parse_chat_response(&json)
    }
}

/// Extract the first choice's message text.
pub fn parse_chat_response(json: &serde_json::Value) -> Result<String, ProviderError> {
    let text = json["choices"][0]["message"]["content"]
        .as_str()
        .ok_or(ProviderError::EmptyResponse)?
        .trim()
        .to_string();

    if text.is_empty() {
        return Err(ProviderError::EmptyResponse);
    }
    Ok(text)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
