//! Answer orchestration and chat sessions for DocChat.
//!
//! A chat turn goes through the [`Orchestrator`]:
//!
//! 1. **Build the prompt** from the fixed template, the rendered memory and
//!    (when a document is loaded) the document text
//! 2. **Ask the model** through the configured provider
//! 3. **Check the answer**: a weak answer is replaced by a knowledge lookup
//!    on the raw user input, when that lookup finds something
//! 4. **Remember** the exchanged turn
//!
//! [`ChatSession`] owns everything one conversation needs and exposes the
//! user-facing actions (send, upload, switch model, clear, save).

pub mod history;
pub mod orchestrator;
pub mod prompt;
pub mod session;

#[cfg(test)]
mod test_helpers;

pub use history::{HistoryStore, default_file_name};
pub use orchestrator::{AnswerResult, AnswerSource, Orchestrator};
pub use prompt::{build_prompt, is_weak_answer};
pub use session::{ChatSession, DocumentContext, DocumentSummary, SessionView};
