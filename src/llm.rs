//! Text-generation client abstraction — one trait, two backends
//! (hosted OpenAI API and a local Ollama server), selected once from
//! configuration.
//!
//! Calls are blocking on purpose: a chat turn is strictly sequential
//! (translate, then execute each command in order), so there is
//! nothing to overlap. Request building and response parsing are
//! separate functions so they can be tested without a network.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{ChatConfig, Provider};
use crate::error::ChatError;

pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Model the local Ollama backend runs. The configured `model` field
/// applies to the hosted provider only.
pub const OLLAMA_MODEL: &str = "llama2";

/// One role-tagged message in a chat exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Capability contract for a text-generation backend.
pub trait LlmClient {
    /// Send an ordered message list, return the assistant reply text.
    fn chat(&self, messages: &[ChatMessage]) -> Result<String, ChatError>;

    /// Whether the backend accepts image input.
    fn supports_vision(&self) -> bool;
}

// ── Hosted OpenAI API ────────────────────────────────────────────

pub struct OpenAiClient {
    api_key: String,
    model: String,
    http: OnceLock<reqwest::blocking::Client>,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            http: OnceLock::new(),
        }
    }

    /// HTTP client, constructed on first use and cached for the session.
    fn http(&self) -> &reqwest::blocking::Client {
        self.http.get_or_init(reqwest::blocking::Client::new)
    }
}

impl LlmClient for OpenAiClient {
    fn chat(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let body = build_openai_body(&self.model, messages);
        let response = self
            .http()
            .post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| ChatError::Api {
                message: format!("request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(ChatError::Api {
                message: format!("{status}: {text}"),
            });
        }

        let json: Value = response.json().map_err(|e| ChatError::Api {
            message: format!("invalid response body: {e}"),
        })?;
        parse_openai_reply(&json)
    }

    fn supports_vision(&self) -> bool {
        true
    }
}

pub(crate) fn build_openai_body(model: &str, messages: &[ChatMessage]) -> Value {
    serde_json::json!({
        "model": model,
        "messages": messages,
    })
}

pub(crate) fn parse_openai_reply(json: &Value) -> Result<String, ChatError> {
    json.get("choices")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ChatError::Api {
            message: "no message content in response".to_string(),
        })
}

// ── Local Ollama server ──────────────────────────────────────────

pub struct OllamaClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::blocking::Client::new(),
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }
}

impl LlmClient for OllamaClient {
    fn chat(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let body = build_ollama_body(messages);
        let response = self
            .http
            .post(self.chat_url())
            .json(&body)
            .send()
            .map_err(|e| ChatError::Api {
                message: format!("request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(ChatError::Api {
                message: format!("{status}: {text}"),
            });
        }

        let json: Value = response.json().map_err(|e| ChatError::Api {
            message: format!("invalid response body: {e}"),
        })?;
        parse_ollama_reply(&json)
    }

    fn supports_vision(&self) -> bool {
        false
    }
}

pub(crate) fn build_ollama_body(messages: &[ChatMessage]) -> Value {
    serde_json::json!({
        "model": OLLAMA_MODEL,
        "messages": messages,
        "stream": false,
    })
}

pub(crate) fn parse_ollama_reply(json: &Value) -> Result<String, ChatError> {
    json.get("message")
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ChatError::Api {
            message: "no message content in response".to_string(),
        })
}

// ── Factory ──────────────────────────────────────────────────────

/// Build the client the configuration selects.
///
/// # Errors
/// `MissingApiKey` when the hosted provider has no key configured
/// (raised before any network attempt); `UnsupportedProvider` for
/// provider names without a client implementation.
pub fn client_from_config(config: &ChatConfig) -> Result<Box<dyn LlmClient>, ChatError> {
    match config.provider {
        Provider::OpenAi => {
            let api_key = config.api_key(Provider::OpenAi);
            if api_key.is_empty() {
                return Err(ChatError::MissingApiKey {
                    provider: "OpenAI".to_string(),
                });
            }
            Ok(Box::new(OpenAiClient::new(api_key, config.model.clone())))
        }
        Provider::Ollama => Ok(Box::new(OllamaClient::new(config.ollama_base_url.clone()))),
        Provider::Anthropic => Err(ChatError::UnsupportedProvider {
            provider: config.provider.to_string(),
        }),
    }
}
