//! Plugin configuration: which LLM provider to use, per-provider API
//! keys, and screenshot defaults.
//!
//! Load/save are pure functions of a file path so tests can point them
//! at a temp directory. The on-disk format is indented JSON, field for
//! field the same layout the plugin has always written, so existing
//! `molecule_chat_config.json` files keep loading.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const CONFIG_DIR: &str = ".pymol";
pub const CONFIG_FILE: &str = "molecule_chat_config.json";

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_SCREENSHOT_DPI: u32 = 150;

// ── Error type ──────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "I/O error: {e}"),
            ConfigError::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

impl std::error::Error for ConfigError {}

// ── Provider ────────────────────────────────────────────────────────

/// Which text-generation backend the translator talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Ollama,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Ollama => "ollama",
        }
    }

    /// Parse a provider name as it appears in the config file.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "openai" => Some(Provider::OpenAi),
            "anthropic" => Some(Provider::Anthropic),
            "ollama" => Some(Provider::Ollama),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Config ──────────────────────────────────────────────────────────

/// Full plugin configuration, persisted as indented JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_provider")]
    pub provider: Provider,
    #[serde(default = "default_api_keys")]
    pub api_keys: IndexMap<Provider, String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_ollama_base_url")]
    pub ollama_base_url: String,
    #[serde(default = "default_screenshot_dpi")]
    pub screenshot_dpi: u32,
    #[serde(default)]
    pub setup_complete: bool,
}

fn default_provider() -> Provider {
    Provider::OpenAi
}

fn default_api_keys() -> IndexMap<Provider, String> {
    IndexMap::from([
        (Provider::OpenAi, String::new()),
        (Provider::Anthropic, String::new()),
        (Provider::Ollama, String::new()),
    ])
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_ollama_base_url() -> String {
    DEFAULT_OLLAMA_BASE_URL.to_string()
}

fn default_screenshot_dpi() -> u32 {
    DEFAULT_SCREENSHOT_DPI
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_keys: default_api_keys(),
            model: default_model(),
            ollama_base_url: default_ollama_base_url(),
            screenshot_dpi: default_screenshot_dpi(),
            setup_complete: false,
        }
    }
}

impl ChatConfig {
    /// API key for the given provider. Empty string if none is stored.
    pub fn api_key(&self, provider: Provider) -> &str {
        self.api_keys.get(&provider).map_or("", String::as_str)
    }

    pub fn set_api_key(&mut self, provider: Provider, key: impl Into<String>) {
        self.api_keys.insert(provider, key.into());
    }
}

// ── Paths ───────────────────────────────────────────────────────────

/// Default per-user config path: `~/.pymol/molecule_chat_config.json`.
/// Falls back to a relative path when no home directory is resolvable.
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

// ── Load / Save ─────────────────────────────────────────────────────

/// Load configuration from `path`. A missing file yields defaults;
/// a present-but-corrupt file is an error the caller must surface.
pub fn load_config(path: &Path) -> Result<ChatConfig, ConfigError> {
    if !path.exists() {
        return Ok(ChatConfig::default());
    }
    let data = fs::read_to_string(path)?;
    let config = serde_json::from_str(&data)?;
    Ok(config)
}

/// Save configuration to `path`, creating parent directories as needed.
pub fn save_config(path: &Path, config: &ChatConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    atomic_write(path, json.as_bytes())
}

/// Write bytes via write-to-temp-then-rename so a crash mid-write never
/// leaves a truncated config behind.
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), ConfigError> {
    let file_name = path.file_name().unwrap_or_default();
    let mut tmp_name = OsString::from(file_name);
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(&tmp_name);

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, path)?;
    Ok(())
}
