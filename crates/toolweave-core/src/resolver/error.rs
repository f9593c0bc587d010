//! Capability resolver error types

use thiserror::Error;

use crate::embeddings::EmbeddingError;
use crate::mcp::McpError;

/// Errors inside capability resolution
///
/// Only `Cancelled` escapes [`CapabilityResolver::resolve`](super::CapabilityResolver::resolve);
/// everything else is logged and turned into an empty result.
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("Resolution cancelled")]
    Cancelled,

    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Catalog unavailable: {0}")]
    Catalog(#[from] McpError),
}

impl ResolverError {
    pub fn is_cancelled(&self) -> bool {
        match self {
            ResolverError::Cancelled => true,
            ResolverError::Embedding(e) => e.is_cancelled(),
            ResolverError::Catalog(e) => e.is_cancelled(),
        }
    }
}

pub type ResolverResult<T> = Result<T, ResolverError>;
