//! Scripted stand-ins for the provider and the knowledge source.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docchat_core::error::{KnowledgeError, ProviderError};
use docchat_core::knowledge::KnowledgeSource;
use docchat_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};

/// Returns scripted replies in order and records every request.
///
/// Panics if more calls are made than replies provided.
pub struct ScriptedProvider {
    replies: Mutex<Vec<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
    called_at: Mutex<Vec<DateTime<Utc>>>,
    delay: Option<Duration>,
    loaded: Mutex<Vec<String>>,
    unavailable: Vec<String>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
            called_at: Mutex::new(Vec::new()),
            delay: None,
            loaded: Mutex::new(Vec::new()),
            unavailable: Vec::new(),
        }
    }

    pub fn answers(answers: &[&str]) -> Self {
        Self::new(answers.iter().map(|a| Ok(a.to_string())).collect())
    }

    pub fn failing() -> Self {
        Self::new(vec![Err(ProviderError::Network("connection refused".into()))])
    }

    /// Models whose `load_model` fails.
    pub fn with_unavailable(mut self, models: &[&str]) -> Self {
        self.unavailable = models.iter().map(|m| m.to_string()).collect();
        self
    }

    /// Sleep for `delay` before every reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// When each `complete` call arrived.
    pub fn called_at(&self) -> Vec<DateTime<Utc>> {
        self.called_at.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn loaded(&self) -> Vec<String> {
        self.loaded.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.called_at.lock().unwrap().push(Utc::now());
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut replies = self.replies.lock().unwrap();
        assert!(!replies.is_empty(), "ScriptedProvider: no more replies");
        let text = replies.remove(0)?;

        Ok(ProviderResponse {
            text,
            model,
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
        })
    }

    async fn load_model(&self, model: &str) -> Result<(), ProviderError> {
        if self.unavailable.iter().any(|m| m == model) {
            return Err(ProviderError::ModelNotFound(model.to_string()));
        }
        self.loaded.lock().unwrap().push(model.to_string());
        Ok(())
    }
}

/// Returns one fixed lookup outcome and records every query.
pub struct ScriptedKnowledge {
    outcome: Result<Option<String>, KnowledgeError>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedKnowledge {
    pub fn found(text: &str) -> Self {
        Self::with_outcome(Ok(Some(text.to_string())))
    }

    pub fn nothing() -> Self {
        Self::with_outcome(Ok(None))
    }

    pub fn failing() -> Self {
        Self::with_outcome(Err(KnowledgeError::Network("dns failure".into())))
    }

    fn with_outcome(outcome: Result<Option<String>, KnowledgeError>) -> Self {
        Self {
            outcome,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl KnowledgeSource for ScriptedKnowledge {
    fn name(&self) -> &str {
        "scripted_knowledge"
    }

    async fn lookup(&self, query: &str) -> Result<Option<String>, KnowledgeError> {
        self.queries.lock().unwrap().push(query.to_string());
        match &self.outcome {
            Ok(found) => Ok(found.clone()),
            Err(e) => Err(KnowledgeError::Network(e.to_string())),
        }
    }
}
