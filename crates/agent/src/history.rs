//! Ordered message history and plain-text transcripts.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use docchat_core::error::TranscriptError;
use docchat_core::message::Message;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Every message of a session in the order it was produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryStore {
    messages: Vec<Message>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Render the transcript: one `User: ...` or `AI: ...` line per
    /// message, each terminated by a newline.
    pub fn export(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}\n", m.transcript_line()))
            .collect()
    }

    /// Write the transcript to `dir` under the default file name for `now`
    /// and return the written path.
    pub fn write_transcript(
        &self,
        dir: &Path,
        now: DateTime<Local>,
    ) -> Result<PathBuf, TranscriptError> {
        let path = dir.join(default_file_name(now));
        std::fs::write(&path, self.export()).map_err(|source| TranscriptError::Io {
            path: path.clone(),
            source,
        })?;

        info!(path = %path.display(), messages = self.messages.len(), "Saved chat history");
        Ok(path)
    }
}

/// `chat_history_<YYYYMMDD-HHMMSS>.txt` for the given local time.
pub fn default_file_name(now: DateTime<Local>) -> String {
    format!("chat_history_{}.txt", now.format("%Y%m%d-%H%M%S"))
}
