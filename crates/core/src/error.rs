//! Error types for the DocChat domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] is what session
//! actions return to a presentation layer.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all DocChat session actions.
#[derive(Debug, Error)]
pub enum Error {
    // --- Document errors ---
    #[error("{0}")]
    Extract(#[from] ExtractError),

    // --- Orchestration errors ---
    #[error("Model '{model}' is unavailable: {source}")]
    ModelUnavailable {
        model: String,
        #[source]
        source: ProviderError,
    },

    #[error("Unsupported model '{model}' (supported: {supported})")]
    UnsupportedModel { model: String, supported: String },

    #[error("Message is empty")]
    EmptyInput,

    // --- Transcript errors ---
    #[error("Failed to save chat history: {0}")]
    Transcript(#[from] TranscriptError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Flat classification of [`Error`], used by boundaries that map errors
/// onto user-facing messages or status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TooLarge,
    Malformed,
    NoExtractableText,
    ModelUnavailable,
    UnsupportedModel,
    EmptyInput,
    Transcript,
    Config,
    Internal,
}

impl ErrorKind {
    /// Stable snake_case name for wire formats.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::TooLarge => "too_large",
            ErrorKind::Malformed => "malformed",
            ErrorKind::NoExtractableText => "no_extractable_text",
            ErrorKind::ModelUnavailable => "model_unavailable",
            ErrorKind::UnsupportedModel => "unsupported_model",
            ErrorKind::EmptyInput => "empty_input",
            ErrorKind::Transcript => "transcript",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Extract(ExtractError::TooLarge { .. }) => ErrorKind::TooLarge,
            Error::Extract(ExtractError::Malformed(_)) => ErrorKind::Malformed,
            Error::Extract(ExtractError::NoExtractableText) => ErrorKind::NoExtractableText,
            Error::ModelUnavailable { .. } => ErrorKind::ModelUnavailable,
            Error::UnsupportedModel { .. } => ErrorKind::UnsupportedModel,
            Error::EmptyInput => ErrorKind::EmptyInput,
            Error::Transcript(_) => ErrorKind::Transcript,
            Error::Config { .. } => ErrorKind::Config,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }
}

// --- Bounded context errors ---

/// Failures of the document extractor. All are validation errors the user
/// can fix by uploading a different file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("File too large ({size} bytes). Maximum {limit} bytes allowed.")]
    TooLarge { size: u64, limit: u64 },

    #[error("Invalid PDF file. Please upload a valid PDF. ({0})")]
    Malformed(String),

    #[error("PDF contains no extractable text.")]
    NoExtractableText,
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum KnowledgeError {
    #[error("Lookup request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Invalid lookup response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
