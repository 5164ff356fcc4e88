//! KnowledgeSource trait — the external lookup behind weak-answer fallback.
//!
//! Given a plain-text query a source returns a text summary, or nothing.
//! Retry and timeout behavior is the implementation's business; callers treat
//! an error and an empty result the same way.

use async_trait::async_trait;
use crate::error::KnowledgeError;

#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Short name used in logs and in the answer attribution (e.g. "wikipedia").
    fn name(&self) -> &str;

    /// Look up `query`. `Ok(None)` means nothing relevant was found.
    async fn lookup(&self, query: &str) -> Result<Option<String>, KnowledgeError>;
}
