//! Capability provider trait

use async_trait::async_trait;

use crate::types::{CancellationToken, RequestContext};

use super::entry::CapabilityEntry;
use super::error::ToolError;

/// A source of capability entries for a request
///
/// An empty context yields an empty list. Errors are reserved for genuine
/// failures; the registry contains them.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Provider name, for logging
    fn name(&self) -> &str;

    async fn get_tools(
        &self,
        context: &RequestContext,
        cancel: &CancellationToken,
    ) -> Result<Vec<CapabilityEntry>, ToolError>;
}
