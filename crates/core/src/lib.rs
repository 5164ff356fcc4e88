//! # DocChat Core
//!
//! Domain types, traits, and error definitions for DocChat.
//! This crate has **no framework dependencies** — it defines the domain model
//! that the other crates implement against.
//!
//! The two external collaborators of a chat turn are traits here:
//! - [`Provider`] — the model-serving backend (Ollama in practice)
//! - [`KnowledgeSource`] — the lookup consulted when an answer is weak
//!
//! Implementations live in `docchat-providers` and `docchat-tools`, so the
//! orchestrator can be tested with scripted stand-ins.

pub mod error;
pub mod knowledge;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ErrorKind, Result};
pub use knowledge::KnowledgeSource;
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
