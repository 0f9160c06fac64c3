// CLI binary — panicking on unrecoverable errors is standard for CLI tools.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use molecule_chat::config::{self, ChatConfig, Provider};
use molecule_chat::executor::classify_error;
use molecule_chat::llm::client_from_config;
use molecule_chat::session::ChatSession;
use molecule_chat::translator::translate;

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "moleculechat-cli", about = "MoleculeChat headless CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file override (default: ~/.pymol/molecule_chat_config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Translate a natural-language request and print the commands
    Translate { message: String },
    /// Run a raw error message through the classifier
    Classify { message: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current configuration (keys redacted)
    Show,
    /// Select the provider (openai, anthropic, ollama)
    SetProvider { provider: String },
    /// Store the API key for a provider
    SetKey { provider: String, key: String },
    /// Set the model used by the hosted provider
    SetModel { model: String },
    /// Set the Ollama base URL
    SetBaseUrl { url: String },
    /// Set the default screenshot DPI
    SetDpi { dpi: u32 },
}

// ── Config helpers ───────────────────────────────────────────────

fn config_path(cli: &Cli) -> PathBuf {
    cli.config
        .clone()
        .unwrap_or_else(config::default_config_path)
}

fn load_or_exit(path: &PathBuf) -> ChatConfig {
    config::load_config(path).unwrap_or_else(|e| {
        eprintln!("[MoleculeChat] Failed to load config {}: {e}", path.display());
        process::exit(1);
    })
}

fn save_or_exit(path: &PathBuf, cfg: &ChatConfig) {
    config::save_config(path, cfg).unwrap_or_else(|e| {
        eprintln!("[MoleculeChat] Failed to save config {}: {e}", path.display());
        process::exit(1);
    });
    eprintln!("[MoleculeChat] Saved {}", path.display());
}

fn parse_provider(name: &str) -> Provider {
    Provider::parse(name).unwrap_or_else(|| {
        eprintln!("[MoleculeChat] Unknown provider '{name}' (expected openai, anthropic, or ollama)");
        process::exit(1);
    })
}

fn redact(key: &str) -> String {
    if key.is_empty() {
        "(not set)".to_string()
    } else {
        format!("****{}", &key[key.len().saturating_sub(4)..])
    }
}

// ── Subcommand handlers ──────────────────────────────────────────

fn run_config(path: &PathBuf, action: &ConfigAction) {
    let mut cfg = load_or_exit(path);
    match action {
        ConfigAction::Show => {
            println!("provider:        {}", cfg.provider);
            println!("model:           {}", cfg.model);
            println!("ollama_base_url: {}", cfg.ollama_base_url);
            println!("screenshot_dpi:  {}", cfg.screenshot_dpi);
            println!("setup_complete:  {}", cfg.setup_complete);
            for p in [Provider::OpenAi, Provider::Anthropic, Provider::Ollama] {
                println!("api_keys.{:<9} {}", format!("{p}:"), redact(cfg.api_key(p)));
            }
        }
        ConfigAction::SetProvider { provider } => {
            cfg.provider = parse_provider(provider);
            save_or_exit(path, &cfg);
        }
        ConfigAction::SetKey { provider, key } => {
            let provider = parse_provider(provider);
            cfg.set_api_key(provider, key.trim());
            cfg.setup_complete = !key.trim().is_empty();
            save_or_exit(path, &cfg);
        }
        ConfigAction::SetModel { model } => {
            cfg.model = model.clone();
            save_or_exit(path, &cfg);
        }
        ConfigAction::SetBaseUrl { url } => {
            cfg.ollama_base_url = url.clone();
            save_or_exit(path, &cfg);
        }
        ConfigAction::SetDpi { dpi } => {
            cfg.screenshot_dpi = *dpi;
            save_or_exit(path, &cfg);
        }
    }
}

fn run_translate(path: &PathBuf, message: &str) {
    let cfg = load_or_exit(path);
    let client = client_from_config(&cfg).unwrap_or_else(|e| {
        eprintln!("[MoleculeChat] {e}");
        process::exit(1);
    });

    // No host attached: a fresh session reports the no-objects
    // context, exactly like a chat panel with nothing loaded.
    let session = ChatSession::new();
    match translate(message, &session.context_prompt(), client.as_ref()) {
        Ok(commands) if commands.is_empty() => {
            eprintln!("[MoleculeChat] No commands generated.");
        }
        Ok(commands) => {
            for command in commands {
                println!("{command}");
            }
        }
        Err(e) => {
            eprintln!("[MoleculeChat] {e}");
            process::exit(1);
        }
    }
}

// ── Main ─────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    let path = config_path(&cli);

    match &cli.command {
        Commands::Config { action } => run_config(&path, action),
        Commands::Translate { message } => run_translate(&path, message),
        Commands::Classify { message } => println!("{}", classify_error(message)),
    }
}
