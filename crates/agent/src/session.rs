//! Chat sessions and the actions a user can take on one.
//!
//! A [`ChatSession`] owns all state of one conversation: the active model,
//! the loaded document, the message history and the conversation memory.
//! Every action is a single request/response step; presentation layers get
//! a [`SessionView`] snapshot back instead of reaching into the session.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use docchat_config::AppConfig;
use docchat_core::error::{Error, ExtractError, Result};
use docchat_core::message::Message;
use docchat_core::provider::Provider;
use docchat_document::{DocumentExtractor, word_count};
use docchat_memory::ConversationMemory;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::history::HistoryStore;
use crate::orchestrator::{AnswerResult, Orchestrator};

/// Text of the currently loaded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentContext {
    pub name: String,
    pub text: String,
    pub word_count: usize,
}

impl DocumentContext {
    /// Run the extractor over an upload. The size checked is the length
    /// of `bytes`.
    pub fn extract(
        extractor: &DocumentExtractor,
        name: impl Into<String>,
        bytes: &[u8],
    ) -> std::result::Result<Self, ExtractError> {
        let text = extractor.extract_bytes(bytes)?;
        Ok(Self::from_text(name, text))
    }

    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            name: name.into(),
            word_count: word_count(&text),
            text,
        }
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            name: self.name.clone(),
            word_count: self.word_count,
        }
    }
}

/// What a presentation layer shows about the loaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub name: String,
    pub word_count: usize,
}

/// Immutable snapshot of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: String,
    pub model: String,
    pub supported_models: Vec<String>,
    pub document: Option<DocumentSummary>,
    pub messages: Vec<Message>,
    pub memory_turns: usize,
    pub created_at: DateTime<Utc>,
}

/// State of one conversation.
#[derive(Debug, Clone)]
pub struct ChatSession {
    id: String,
    model: String,
    default_model: String,
    document: Option<DocumentContext>,
    history: HistoryStore,
    memory: ConversationMemory,
    created_at: DateTime<Utc>,
}

impl ChatSession {
    /// A fresh session using `default_model` and a memory of `window` turns.
    pub fn new(default_model: impl Into<String>, window: usize) -> Self {
        let default_model = default_model.into();
        Self {
            id: Uuid::new_v4().to_string(),
            model: default_model.clone(),
            default_model,
            document: None,
            history: HistoryStore::new(),
            memory: ConversationMemory::new(window),
            created_at: Utc::now(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.default_model, config.memory.window)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The active model.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn document(&self) -> Option<&DocumentContext> {
        self.document.as_ref()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Run one chat turn with the active model and loaded document.
    ///
    /// Both messages are recorded only when the turn succeeds.
    pub async fn send(&mut self, orchestrator: &Orchestrator, input: &str) -> Result<AnswerResult> {
        let document = self.document.as_ref().map(|d| d.text.as_str()).unwrap_or("");
        let result = orchestrator
            .respond(&self.model, input, document, &mut self.memory)
            .await?;

        self.history.push(result.user_message.clone());
        self.history.push(result.assistant_message.clone());
        Ok(result)
    }

    /// Extract `bytes` and make it the loaded document.
    ///
    /// A failed upload keeps the previous document.
    pub fn upload_document(
        &mut self,
        extractor: &DocumentExtractor,
        name: impl Into<String>,
        bytes: &[u8],
    ) -> Result<&DocumentContext> {
        let name = name.into();
        match DocumentContext::extract(extractor, name.clone(), bytes) {
            Ok(document) => Ok(self.set_document(document)),
            Err(e) => {
                warn!(session = %self.id, document = %name, error = %e, "Upload rejected");
                Err(Error::Extract(e))
            }
        }
    }

    /// Replace the loaded document with one extracted elsewhere.
    pub fn set_document(&mut self, document: DocumentContext) -> &DocumentContext {
        info!(
            session = %self.id,
            document = %document.name,
            words = document.word_count,
            "Document loaded"
        );
        self.document.insert(document)
    }

    /// Switch the active model.
    ///
    /// The model must be one of `supported` and the provider must be able to
    /// load it; otherwise the previous model stays active. Memory and the
    /// loaded document are not touched.
    pub async fn select_model(
        &mut self,
        provider: &dyn Provider,
        supported: &[String],
        name: &str,
    ) -> Result<()> {
        if !supported.iter().any(|m| m == name) {
            return Err(Error::UnsupportedModel {
                model: name.to_string(),
                supported: supported.join(", "),
            });
        }
        if name == self.model {
            return Ok(());
        }

        provider
            .load_model(name)
            .await
            .map_err(|source| Error::ModelUnavailable {
                model: name.to_string(),
                source,
            })?;

        info!(session = %self.id, from = %self.model, to = name, "Model switched");
        self.model = name.to_string();
        Ok(())
    }

    /// Forget the conversation; keep the document and model.
    pub fn clear_chat(&mut self) {
        self.history.clear();
        self.memory.clear();
        info!(session = %self.id, "Chat cleared");
    }

    /// Back to a fresh session: no document, no conversation, default model.
    pub fn clear_all(&mut self) {
        self.history.clear();
        self.memory.clear();
        self.document = None;
        self.model = self.default_model.clone();
        info!(session = %self.id, "Session reset");
    }

    /// Plain-text transcript of the history.
    pub fn export(&self) -> String {
        self.history.export()
    }

    /// Write the transcript into `dir`, named after the current local time.
    pub fn save_transcript(&self, dir: &Path) -> Result<PathBuf> {
        Ok(self.history.write_transcript(dir, Local::now())?)
    }

    pub fn view(&self, supported_models: &[String]) -> SessionView {
        SessionView {
            id: self.id.clone(),
            model: self.model.clone(),
            supported_models: supported_models.to_vec(),
            document: self.document.as_ref().map(DocumentContext::summary),
            messages: self.history.messages().to_vec(),
            memory_turns: self.memory.len(),
            created_at: self.created_at,
        }
    }
}
