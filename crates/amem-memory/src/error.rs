//! Error types for the memory crate.

use thiserror::Error;

/// Errors that can occur in the memory crate.
///
/// Most graph operations degrade gracefully (unknown ids are no-ops), so the
/// surface here is small: bad input, bad tunables, and extractor failures
/// that had no fallback.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Keyword/tag extraction failed and no fallback was available.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Caller supplied unusable input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A note that should exist was not found.
    #[error("Note not found: {0}")]
    NotFound(String),

    /// A tunable parameter is outside its legal range.
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for memory operations.
pub type Result<T> = std::result::Result<T, MemoryError>;
