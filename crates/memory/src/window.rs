//! Sliding-window memory of exchanged turns.
//!
//! Keeps at most `window` turns. Appending past the bound evicts from the
//! front, so the retained turns are always the most recent ones in arrival
//! order.

use std::collections::VecDeque;

use docchat_core::message::Role;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default number of turns kept.
pub const DEFAULT_WINDOW: usize = 5;

/// One user message and the reply it received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub user: String,
    pub assistant: String,
}

impl Turn {
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }
}

/// Size-bounded, FIFO-evicting record of past turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "StoredMemory")]
pub struct ConversationMemory {
    turns: VecDeque<Turn>,
    window: usize,
}

/// Wire shape of [`ConversationMemory`]; rebuilt through `new` and `append`
/// so a stored window still obeys the bounds.
#[derive(Deserialize)]
struct StoredMemory {
    turns: VecDeque<Turn>,
    window: usize,
}

impl From<StoredMemory> for ConversationMemory {
    fn from(stored: StoredMemory) -> Self {
        let mut memory = Self::new(stored.window);
        for turn in stored.turns {
            memory.append(turn);
        }
        memory
    }
}

impl ConversationMemory {
    /// Create an empty memory holding at most `window` turns (minimum 1).
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            turns: VecDeque::with_capacity(window),
            window,
        }
    }

    /// Record a completed turn, evicting the oldest turns beyond the window.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        while self.turns.len() > self.window {
            self.turns.pop_front();
            debug!(window = self.window, "Evicted oldest turn from memory");
        }
    }

    /// Render the retained turns for the prompt template.
    ///
    /// Each turn becomes a `User: ...` line followed by an `AI: ...` line,
    /// oldest first. An empty memory renders as an empty string.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|turn| {
                format!(
                    "{}: {}\n{}: {}",
                    Role::User.label(),
                    turn.user,
                    Role::Assistant.label(),
                    turn.assistant
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
