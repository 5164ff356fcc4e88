//! Prompt template and weak-answer heuristic.

/// Answers with fewer characters than this (after trimming) are weak.
pub const WEAK_ANSWER_MIN_CHARS: usize = 15;

/// An answer containing this phrase (any case) is weak.
pub const WEAK_ANSWER_MARKER: &str = "i don't know";

const SYSTEM_LINE: &str = "You are a helpful AI assistant. Be concise and accurate.";

/// Fill the fixed prompt template.
///
/// `history` is the rendered conversation memory. When `document` is
/// non-empty it is prepended to the user input as `Document: ...`. The
/// document is never truncated.
pub fn build_prompt(history: &str, document: &str, user_input: &str) -> String {
    let input = if document.is_empty() {
        user_input.to_string()
    } else {
        format!("Document: {document}\n\n{user_input}")
    };

    format!("{SYSTEM_LINE}\n\nConversation history:\n{history}\n\nUser: {input}\nAI:")
}

/// Whether an answer is too short or admits ignorance.
pub fn is_weak_answer(answer: &str) -> bool {
    answer.trim().chars().count() < WEAK_ANSWER_MIN_CHARS
        || answer.to_lowercase().contains(WEAK_ANSWER_MARKER)
}
