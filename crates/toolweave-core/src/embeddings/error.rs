//! Embedding error types

use thiserror::Error;

/// Errors from embedding generators
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// API request failed
    #[error("{provider} embeddings API error ({status}): {message}")]
    ApiError {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The generator returned a different number of vectors than inputs
    #[error("Expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("Embedding request timed out after {0}ms")]
    Timeout(u64),

    #[error("Request cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl EmbeddingError {
    pub fn api_error(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, EmbeddingError::Cancelled)
    }
}

pub type EmbeddingResult<T> = Result<T, EmbeddingError>;
