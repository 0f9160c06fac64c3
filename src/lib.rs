//! MoleculeChat — a chat assistant pipeline for a molecular
//! visualization host.
//!
//! The host engine, the GUI panel, and the text-generation backend all
//! sit behind capability traits ([`host::HostCapability`],
//! [`sink::MessageSink`], [`llm::LlmClient`]); this crate owns the
//! pipeline between them: session context, prompt composition, reply
//! parsing, sequential command execution, and error classification.

pub mod chat;
pub mod config;
pub mod error;
pub mod executor;
pub mod host;
pub mod llm;
pub mod screenshot;
pub mod session;
pub mod sink;
pub mod translator;
