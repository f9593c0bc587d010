//! Always-on tools gated by request capabilities

use std::sync::Arc;

use async_trait::async_trait;

use crate::types::{CancellationToken, RequestContext};

use super::definitions::ToolDefinitionRegistry;
use super::entry::CapabilityEntry;
use super::error::ToolError;
use super::provider::ToolProvider;

pub struct SystemToolProvider {
    definitions: Arc<ToolDefinitionRegistry>,
}

impl SystemToolProvider {
    pub fn new(definitions: Arc<ToolDefinitionRegistry>) -> Self {
        Self { definitions }
    }
}

#[async_trait]
impl ToolProvider for SystemToolProvider {
    fn name(&self) -> &str {
        "system"
    }

    async fn get_tools(
        &self,
        context: &RequestContext,
        _cancel: &CancellationToken,
    ) -> Result<Vec<CapabilityEntry>, ToolError> {
        Ok(self
            .definitions
            .system_tools()
            .into_iter()
            .filter(|d| d.is_available(context))
            .map(|d| {
                CapabilityEntry::system(
                    &d.name,
                    d.display_description(),
                    d.input_schema.clone(),
                    Arc::clone(&d.handler),
                )
            })
            .collect())
    }
}
