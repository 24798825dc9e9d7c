//! # Error Types
//!
//! Every stage of the embedding pipeline fails fast with one of these variants
//! and forwards the original cause as text. Nothing here retries.

use thiserror::Error;

/// Failure kinds surfaced by the pipeline and its storage plumbing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmbedError {
    /// The referenced object does not exist in storage.
    #[error("not found: {0}")]
    NotFound(String),

    /// The audio could not be decoded or resampled.
    #[error("decode error: {0}")]
    Decode(String),

    /// The inference backend rejected the batch or failed while running it.
    #[error("inference error: {0}")]
    Inference(String),

    /// Reading or writing bytes failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl EmbedError {
    /// True for failures the caller should surface as "not found" rather than a server error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EmbedError::NotFound(_))
    }
}

impl From<std::io::Error> for EmbedError {
    fn from(err: std::io::Error) -> Self {
        EmbedError::Storage(err.to_string())
    }
}

pub type EmbedResult<T> = std::result::Result<T, EmbedError>;
