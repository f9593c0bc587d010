//! Embedding generator traits

use std::sync::Arc;

use async_trait::async_trait;

use crate::types::CancellationToken;

use super::error::EmbeddingResult;

/// Turns texts into dense vectors
///
/// Implementations return one vector per input, in input order. Vectors need
/// not be normalized; callers normalize before comparing.
#[async_trait]
pub trait EmbeddingGenerator: Send + Sync {
    /// Generator name, for logging
    fn name(&self) -> &str;

    async fn embed(&self, texts: &[String], cancel: &CancellationToken) -> EmbeddingResult<Vec<Vec<f32>>>;
}

/// Finds the embedding generator for a chat provider/connection pair
///
/// Returning `None` means semantic scoring is unavailable and callers fall
/// back to lexical scoring alone.
pub trait EmbeddingResolver: Send + Sync {
    fn resolve(&self, provider_name: &str, connection_name: Option<&str>) -> Option<Arc<dyn EmbeddingGenerator>>;
}
