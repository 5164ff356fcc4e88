//! Conversation memory for DocChat.
//!
//! Holds the most recent turns of a session and renders them into the
//! prompt. Memory lives only as long as its session.

pub mod window;

pub use window::{ConversationMemory, DEFAULT_WINDOW, Turn};
