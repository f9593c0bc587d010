//! Explicitly configured tools

use std::sync::Arc;

use async_trait::async_trait;

use crate::types::{CancellationToken, RequestContext};

use super::definitions::ToolDefinitionRegistry;
use super::entry::CapabilityEntry;
use super::error::ToolError;
use super::provider::ToolProvider;

/// Offers the tools named in `RequestContext::configured_tool_names`
///
/// Unknown names are skipped. System tools are left to
/// [`SystemToolProvider`](super::SystemToolProvider).
pub struct LocalToolProvider {
    definitions: Arc<ToolDefinitionRegistry>,
}

impl LocalToolProvider {
    pub fn new(definitions: Arc<ToolDefinitionRegistry>) -> Self {
        Self { definitions }
    }
}

#[async_trait]
impl ToolProvider for LocalToolProvider {
    fn name(&self) -> &str {
        "local"
    }

    async fn get_tools(
        &self,
        context: &RequestContext,
        _cancel: &CancellationToken,
    ) -> Result<Vec<CapabilityEntry>, ToolError> {
        let mut entries: Vec<CapabilityEntry> = Vec::new();
        for name in &context.configured_tool_names {
            let Some(definition) = self.definitions.get(name) else {
                continue;
            };
            if definition.is_system || entries.iter().any(|e| &e.name == name) {
                continue;
            }
            entries.push(CapabilityEntry::local(
                &definition.name,
                definition.display_description(),
                definition.input_schema.clone(),
                Arc::clone(&definition.handler),
            ));
        }
        Ok(entries)
    }
}
