//! Size-checked, page-ordered text extraction.

use std::path::Path;

use docchat_core::error::ExtractError;
use tracing::{debug, info};

use crate::pdf::PdfDocument;

/// 10 MiB; matches the config default.
pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// A parsed document that can report its text page by page.
pub trait PagedText {
    /// Text of every page in page order. `None` marks a page without
    /// extractable text.
    fn page_texts(&self) -> Vec<Option<String>>;
}

/// Extracts plain text from uploaded PDF bytes.
///
/// The extractor is a pure function of its input; it holds only the size
/// limit and can be shared freely.
#[derive(Debug, Clone, Copy)]
pub struct DocumentExtractor {
    max_bytes: u64,
}

impl DocumentExtractor {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Extract the text of `bytes`, whose declared length is `size_bytes`.
    ///
    /// The size check runs before any parsing.
    pub fn extract(&self, bytes: &[u8], size_bytes: u64) -> Result<String, ExtractError> {
        self.check_size(size_bytes)?;

        let document = PdfDocument::parse(bytes)?;
        let text = join_pages(document.page_texts())?;

        info!(
            pages = document.page_count(),
            chars = text.len(),
            "Extracted document text"
        );
        Ok(text)
    }

    /// Extract from an in-memory upload, using its length as the size.
    pub fn extract_bytes(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        self.extract(bytes, bytes.len() as u64)
    }

    /// Extract from a file on disk. The size limit is checked against the
    /// file's metadata before the file is read.
    pub fn extract_file(&self, path: &Path) -> Result<String, ExtractError> {
        let metadata = std::fs::metadata(path)
            .map_err(|e| ExtractError::Malformed(format!("cannot read {}: {e}", path.display())))?;
        self.check_size(metadata.len())?;

        let bytes = std::fs::read(path)
            .map_err(|e| ExtractError::Malformed(format!("cannot read {}: {e}", path.display())))?;
        self.extract(&bytes, bytes.len() as u64)
    }

    fn check_size(&self, size_bytes: u64) -> Result<(), ExtractError> {
        if size_bytes > self.max_bytes {
            debug!(size_bytes, limit = self.max_bytes, "Rejecting oversized document");
            return Err(ExtractError::TooLarge {
                size: size_bytes,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

impl Default for DocumentExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BYTES)
    }
}

/// Join page texts with newlines, skipping pages that have no text.
///
/// Fails with [`ExtractError::NoExtractableText`] when nothing but
/// whitespace remains.
pub fn join_pages<I>(pages: I) -> Result<String, ExtractError>
where
    I: IntoIterator<Item = Option<String>>,
{
    let text = pages
        .into_iter()
        .flatten()
        .filter(|page| !page.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if text.trim().is_empty() {
        return Err(ExtractError::NoExtractableText);
    }
    Ok(text)
}

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
