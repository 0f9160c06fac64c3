use std::fmt;

use serde::Serialize;

/// Structured error type for the chat pipeline. Replaces stringly-typed
/// errors so callers can match on the failure kind (e.g. surface a
/// missing-key error as a settings hint instead of a generic failure).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "code", content = "detail")]
pub enum ChatError {
    /// The selected provider needs an API key and none is configured.
    MissingApiKey { provider: String },
    /// The configured provider name has no client implementation.
    UnsupportedProvider { provider: String },
    /// The text-generation endpoint failed (HTTP error, bad payload).
    Api { message: String },
    /// The visualization host refused or failed a request.
    Host { message: String },
    /// Configuration could not be read or written.
    Config { message: String },
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::MissingApiKey { provider } => write!(
                f,
                "{provider} API key is not set. Please configure it in the MoleculeChat settings."
            ),
            ChatError::UnsupportedProvider { provider } => {
                write!(f, "Unsupported LLM provider: {provider}")
            }
            ChatError::Api { message } => write!(f, "API error: {message}"),
            ChatError::Host { message } => write!(f, "Host error: {message}"),
            ChatError::Config { message } => write!(f, "Config error: {message}"),
        }
    }
}

impl std::error::Error for ChatError {}

impl From<crate::config::ConfigError> for ChatError {
    fn from(e: crate::config::ConfigError) -> Self {
        ChatError::Config {
            message: e.to_string(),
        }
    }
}
