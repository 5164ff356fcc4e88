//! Document text extraction for DocChat.
//!
//! Turns an uploaded file into the plain text that is injected into prompts.
//! Only PDF is supported; parsing is delegated to `lopdf`.

pub mod extractor;
pub mod pdf;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use extractor::{DEFAULT_MAX_BYTES, DocumentExtractor, PagedText, join_pages, word_count};
pub use pdf::PdfDocument;
