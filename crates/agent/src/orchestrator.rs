//! The answer orchestrator: one chat turn from user input to final answer.

use std::sync::Arc;

use docchat_core::error::{Error, Result};
use docchat_core::knowledge::KnowledgeSource;
use docchat_core::message::Message;
use docchat_core::provider::{Provider, ProviderRequest};
use docchat_memory::{ConversationMemory, Turn};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::prompt::{build_prompt, is_weak_answer};

/// Prefix of an answer that came from the knowledge fallback.
pub const FALLBACK_PREFIX: &str = "Wikipedia says:\n\n";

/// Where the final answer of a turn came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    Model,
    Knowledge,
}

/// Outcome of a completed turn.
#[derive(Debug, Clone)]
pub struct AnswerResult {
    pub answer: String,
    pub source: AnswerSource,
    /// The model that was asked.
    pub model: String,
    pub user_message: Message,
    pub assistant_message: Message,
}

/// Runs chat turns against a provider, with an optional knowledge fallback.
pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    knowledge: Option<Arc<dyn KnowledgeSource>>,
    temperature: Option<f32>,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            knowledge: None,
            temperature: None,
        }
    }

    /// Consult `knowledge` when the model's answer is weak.
    pub fn with_knowledge(mut self, knowledge: Arc<dyn KnowledgeSource>) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }

    /// Answer `user_input` with `model`.
    ///
    /// `document` is the text of the loaded document, or empty. On success
    /// the turn is appended to `memory`; on failure `memory` is untouched.
    pub async fn respond(
        &self,
        model: &str,
        user_input: &str,
        document: &str,
        memory: &mut ConversationMemory,
    ) -> Result<AnswerResult> {
        if user_input.trim().is_empty() {
            return Err(Error::EmptyInput);
        }
        let user_message = Message::user(user_input);

        let prompt = build_prompt(&memory.render(), document, user_input);
        debug!(
            model,
            prompt_chars = prompt.len(),
            history_turns = memory.len(),
            has_document = !document.is_empty(),
            "Prompt assembled"
        );

        let request = ProviderRequest::new(model, prompt).with_temperature(self.temperature);
        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|source| {
                warn!(model, error = %source, "Model call failed");
                Error::ModelUnavailable {
                    model: model.to_string(),
                    source,
                }
            })?;

        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Model usage"
            );
        }

        let mut answer = response.text;
        let mut source = AnswerSource::Model;

        if is_weak_answer(&answer) {
            if let Some(fallback) = self.fallback(user_input).await {
                answer = format!("{FALLBACK_PREFIX}{fallback}");
                source = AnswerSource::Knowledge;
            }
        }

        memory.append(Turn::new(user_input, answer.clone()));
        info!(model, source = ?source, answer_chars = answer.len(), "Turn completed");

        Ok(AnswerResult {
            user_message,
            assistant_message: Message::assistant(answer.clone()),
            answer,
            source,
            model: model.to_string(),
        })
    }

    /// Look up the raw user input. Errors and empty results yield `None`.
    async fn fallback(&self, user_input: &str) -> Option<String> {
        let knowledge = self.knowledge.as_ref()?;
        info!(source = knowledge.name(), "Weak answer, consulting knowledge source");

        match knowledge.lookup(user_input).await {
            Ok(Some(text)) if !text.trim().is_empty() => Some(text),
            Ok(_) => {
                debug!(source = knowledge.name(), "Knowledge source found nothing");
                None
            }
            Err(e) => {
                warn!(source = knowledge.name(), error = %e, "Knowledge lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedKnowledge, ScriptedProvider};
    use docchat_core::ErrorKind;

    const STRONG: &str = "Rust is a systems programming language.";

    fn orchestrator(
        provider: &Arc<ScriptedProvider>,
        knowledge: Option<&Arc<ScriptedKnowledge>>,
    ) -> Orchestrator {
        let orch = Orchestrator::new(provider.clone());
        match knowledge {
            Some(k) => orch.with_knowledge(k.clone()),
            None => orch,
        }
    }

    #[tokio::test]
    async fn strong_answer_is_kept() {
        let provider = Arc::new(ScriptedProvider::answers(&[STRONG]));
        let knowledge = Arc::new(ScriptedKnowledge::found("unused"));
        let orch = orchestrator(&provider, Some(&knowledge));
        let mut memory = ConversationMemory::default();

        let result = orch
            .respond("mistral", "What is Rust?", "", &mut memory)
            .await
            .unwrap();

        assert_eq!(result.answer, STRONG);
        assert_eq!(result.source, AnswerSource::Model);
        assert_eq!(result.model, "mistral");
        assert!(knowledge.queries().is_empty());
        assert_eq!(memory.render(), format!("User: What is Rust?\nAI: {STRONG}"));
    }

    #[tokio::test]
    async fn weak_answer_falls_back_on_raw_input() {
        let provider = Arc::new(ScriptedProvider::answers(&["I don't know."]));
        let knowledge = Arc::new(ScriptedKnowledge::found("Page: Rust\nSummary: A language."));
        let orch = orchestrator(&provider, Some(&knowledge));
        let mut memory = ConversationMemory::default();

        let result = orch
            .respond("mistral", "What is Rust?", "Some document text", &mut memory)
            .await
            .unwrap();

        assert_eq!(
            result.answer,
            "Wikipedia says:\n\nPage: Rust\nSummary: A language."
        );
        assert_eq!(result.source, AnswerSource::Knowledge);
        // Raw input, not the document-augmented one.
        assert_eq!(knowledge.queries(), vec!["What is Rust?"]);
        assert_eq!(result.assistant_message.content, result.answer);
        assert_eq!(
            memory.turns().next().unwrap().assistant,
            "Wikipedia says:\n\nPage: Rust\nSummary: A language."
        );
    }

    #[tokio::test]
    async fn fallback_failure_keeps_weak_answer() {
        for knowledge in [ScriptedKnowledge::failing(), ScriptedKnowledge::nothing()] {
            let provider = Arc::new(ScriptedProvider::answers(&["No idea."]));
            let knowledge = Arc::new(knowledge);
            let orch = orchestrator(&provider, Some(&knowledge));
            let mut memory = ConversationMemory::default();

            let result = orch.respond("mistral", "Who?", "", &mut memory).await.unwrap();
            assert_eq!(result.answer, "No idea.");
            assert_eq!(result.source, AnswerSource::Model);
            assert_eq!(knowledge.queries().len(), 1);
            assert_eq!(memory.len(), 1);
        }
    }

    #[tokio::test]
    async fn blank_lookup_result_is_ignored() {
        let provider = Arc::new(ScriptedProvider::answers(&["Hmm."]));
        let knowledge = Arc::new(ScriptedKnowledge::found("   \n"));
        let orch = orchestrator(&provider, Some(&knowledge));
        let mut memory = ConversationMemory::default();

        let result = orch.respond("mistral", "Q", "", &mut memory).await.unwrap();
        assert_eq!(result.answer, "Hmm.");
    }

    #[tokio::test]
    async fn weak_answer_without_knowledge_source() {
        let provider = Arc::new(ScriptedProvider::answers(&["Hmm."]));
        let orch = orchestrator(&provider, None);
        let mut memory = ConversationMemory::default();

        let result = orch.respond("mistral", "Q", "", &mut memory).await.unwrap();
        assert_eq!(result.answer, "Hmm.");
        assert_eq!(result.source, AnswerSource::Model);
    }

    #[tokio::test]
    async fn model_failure_leaves_memory_untouched() {
        let provider = Arc::new(ScriptedProvider::failing());
        let knowledge = Arc::new(ScriptedKnowledge::found("unused"));
        let orch = orchestrator(&provider, Some(&knowledge));
        let mut memory = ConversationMemory::default();
        memory.append(Turn::new("earlier", "reply"));

        let err = orch
            .respond("llama3", "hello", "", &mut memory)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
        assert!(err.to_string().contains("llama3"));
        assert_eq!(memory.len(), 1);
        assert!(knowledge.queries().is_empty());
    }

    #[tokio::test]
    async fn user_message_is_stamped_before_the_model_call() {
        let provider = Arc::new(
            ScriptedProvider::answers(&[STRONG]).with_delay(std::time::Duration::from_millis(50)),
        );
        let orch = orchestrator(&provider, None);
        let mut memory = ConversationMemory::default();

        let result = orch.respond("mistral", "hello", "", &mut memory).await.unwrap();

        let called_at = provider.called_at()[0];
        assert!(result.user_message.timestamp <= called_at);
        assert!(result.assistant_message.timestamp > called_at);
    }

    #[tokio::test]
    async fn empty_input_is_rejected_before_any_call() {
        let provider = Arc::new(ScriptedProvider::answers(&[]));
        let orch = orchestrator(&provider, None);
        let mut memory = ConversationMemory::default();

        let err = orch.respond("mistral", "  \n ", "", &mut memory).await.unwrap_err();
        assert!(matches!(err, Error::EmptyInput));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn prompt_carries_history_document_and_temperature() {
        let provider = Arc::new(ScriptedProvider::answers(&[STRONG, STRONG]));
        let orch = orchestrator(&provider, None).with_temperature(Some(0.3));
        let mut memory = ConversationMemory::default();

        orch.respond("mistral", "first", "", &mut memory).await.unwrap();
        orch.respond("mistral", "second", "The doc.", &mut memory)
            .await
            .unwrap();

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].temperature, Some(0.3));
        let prompt = &requests[1].prompt;
        assert!(prompt.contains(&format!("Conversation history:\nUser: first\nAI: {STRONG}\n\n")));
        assert!(prompt.ends_with("User: Document: The doc.\n\nsecond\nAI:"));
    }

    #[tokio::test]
    async fn memory_window_is_respected_across_turns() {
        let answers: Vec<&str> = vec![STRONG; 4];
        let provider = Arc::new(ScriptedProvider::answers(&answers));
        let orch = orchestrator(&provider, None);
        let mut memory = ConversationMemory::new(2);

        for q in ["q1", "q2", "q3", "q4"] {
            orch.respond("mistral", q, "", &mut memory).await.unwrap();
        }
        let users: Vec<&str> = memory.turns().map(|t| t.user.as_str()).collect();
        assert_eq!(users, vec!["q3", "q4"]);
    }
}
