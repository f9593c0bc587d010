//! Chat provider error types

use thiserror::Error;

/// Errors from chat completion providers
#[derive(Error, Debug)]
pub enum ProviderError {
    /// API request failed
    #[error("{provider} API error ({status}): {message}")]
    ApiError {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    pub fn api_error(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProviderError::Cancelled)
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
