//! `lopdf`-backed PDF parsing.

use docchat_core::error::ExtractError;
use lopdf::Document;
use tracing::debug;

use crate::extractor::PagedText;

/// A parsed PDF.
pub struct PdfDocument {
    inner: Document,
}

impl PdfDocument {
    /// Parse a PDF from memory.
    pub fn parse(bytes: &[u8]) -> Result<Self, ExtractError> {
        let inner = Document::load_mem(bytes).map_err(|e| ExtractError::Malformed(e.to_string()))?;
        Ok(Self { inner })
    }

    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Text of a single page (1-based page number as PDF numbers them).
    ///
    /// A page whose content cannot be decoded counts as having no text.
    fn page_text(&self, page_number: u32) -> Option<String> {
        match self.inner.extract_text(&[page_number]) {
            Ok(text) => {
                // lopdf closes every text object with a line break
                let text = text.trim_end_matches(['\r', '\n']);
                if text.trim().is_empty() {
                    None
                } else {
                    Some(text.to_string())
                }
            }
            Err(e) => {
                debug!(page = page_number, error = %e, "Skipping page without extractable text");
                None
            }
        }
    }
}

impl PagedText for PdfDocument {
    fn page_texts(&self) -> Vec<Option<String>> {
        // get_pages is a BTreeMap keyed by page number, so iteration is in page order
        self.inner
            .get_pages()
            .keys()
            .map(|&number| self.page_text(number))
            .collect()
    }
}
