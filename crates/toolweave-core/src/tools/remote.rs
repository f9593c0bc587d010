//! Capabilities proxied from remote servers

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{join_all, FutureExt};

use crate::logging::Logger;
use crate::mcp::{CatalogProvider, McpConnector, McpToolProxy};
use crate::types::{CancellationToken, RequestContext};

use super::entry::{display_description, CapabilityEntry, CapabilityFactory, CapabilityTool};
use super::error::ToolError;
use super::provider::ToolProvider;
use crate::log_warn;

/// Offers the tools of every remote connection in the request
///
/// Catalogs come from the cache. A connection whose catalog cannot be
/// fetched is logged and skipped. Entry factories capture identifiers and
/// the connector only; a session is opened when the tool is invoked.
pub struct RemoteToolProvider {
    catalogs: Arc<dyn CatalogProvider>,
    connector: Arc<McpConnector>,
    logger: Arc<dyn Logger>,
}

impl RemoteToolProvider {
    pub fn new(catalogs: Arc<dyn CatalogProvider>, connector: Arc<McpConnector>, logger: Arc<dyn Logger>) -> Self {
        Self {
            catalogs,
            connector,
            logger,
        }
    }

    fn proxy_factory(&self, connection_id: &str, tool_name: &str, input_schema: serde_json::Value) -> CapabilityFactory {
        let connector = Arc::clone(&self.connector);
        let logger = Arc::clone(&self.logger);
        let connection_id = connection_id.to_string();
        let tool_name = tool_name.to_string();
        Arc::new(move || {
            let proxy: Arc<dyn CapabilityTool> = Arc::new(McpToolProxy::new(
                Arc::clone(&connector),
                connection_id.clone(),
                tool_name.clone(),
                input_schema.clone(),
                Arc::clone(&logger),
            ));
            async move { Ok::<_, ToolError>(proxy) }.boxed()
        })
    }
}

#[async_trait]
impl ToolProvider for RemoteToolProvider {
    fn name(&self) -> &str {
        "mcp"
    }

    async fn get_tools(
        &self,
        context: &RequestContext,
        cancel: &CancellationToken,
    ) -> Result<Vec<CapabilityEntry>, ToolError> {
        let fetches = context
            .remote_connection_ids
            .iter()
            .map(|id| async move { (id, self.catalogs.get_capabilities(id, cancel).await) });

        let mut entries = Vec::new();
        for (connection_id, result) in join_all(fetches).await {
            let catalog = match result {
                Ok(catalog) => catalog,
                Err(e) if e.is_cancelled() => return Err(ToolError::Cancelled),
                Err(e) => {
                    log_warn!(
                        self.logger,
                        "[RemoteToolProvider] Skipping connection {}: {}",
                        connection_id, e
                    );
                    continue;
                }
            };

            for tool in &catalog.tools {
                let schema = (!tool.input_schema.is_null()).then(|| tool.input_schema.clone());
                entries.push(CapabilityEntry::remote(
                    connection_id,
                    &tool.name,
                    display_description(tool.description.as_deref(), tool.title.as_deref(), &tool.name),
                    schema,
                    self.proxy_factory(connection_id, &tool.name, tool.input_schema.clone()),
                ));
            }
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::logging::{LogLevel, MemoryLogger};
    use crate::mcp::transport::testing::{connector, StaticTransport};
    use crate::mcp::{CachedCatalogProvider, McpCatalog, McpToolInfo};
    use serde_json::json;

    fn provider(transport: Arc<StaticTransport>, logger: Arc<MemoryLogger>) -> RemoteToolProvider {
        let connector = connector(transport, &["jira", "slack", "down"]);
        let catalogs = Arc::new(CachedCatalogProvider::new(
            Arc::clone(&connector),
            Duration::from_secs(60),
            logger.clone(),
        ));
        RemoteToolProvider::new(catalogs, connector, logger)
    }

    fn transport() -> Arc<StaticTransport> {
        Arc::new(
            StaticTransport::new()
                .with_catalog(
                    "jira",
                    McpCatalog::with_tools(vec![
                        McpToolInfo::new("createIssue", "Create a Jira issue"),
                        McpToolInfo::new("searchIssues", "Search Jira issues"),
                    ]),
                )
                .with_catalog(
                    "slack",
                    McpCatalog::with_tools(vec![McpToolInfo::new("sendMessage", "Send a Slack message")]),
                )
                .failing("down"),
        )
    }

    #[tokio::test]
    async fn test_failed_connection_skipped() {
        let logger = Arc::new(MemoryLogger::new());
        let transport = transport();
        let provider = provider(Arc::clone(&transport), Arc::clone(&logger));
        let context = RequestContext::new("openai").with_remote_connections(["jira", "down", "slack"]);

        let entries = provider.get_tools(&context, &CancellationToken::new()).await.unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["mcp:jira:createIssue", "mcp:jira:searchIssues", "mcp:slack:sendMessage"]);
        assert!(logger.contains(LogLevel::Warn, "down"));
    }

    #[tokio::test]
    async fn test_factory_opens_session_only_on_invoke() {
        let logger = Arc::new(MemoryLogger::new());
        let transport = transport();
        let provider = provider(Arc::clone(&transport), logger);
        let context = RequestContext::new("openai").with_remote_connections(["slack"]);
        let cancel = CancellationToken::new();

        let entries = provider.get_tools(&context, &cancel).await.unwrap();
        let after_listing = transport.open_count();

        let tool = entries[0].build().await.unwrap();
        assert_eq!(transport.open_count(), after_listing);

        let out = tool.invoke(json!({"text": "hi"}), &cancel).await.unwrap();
        assert_eq!(out, "sendMessage ok");
        assert_eq!(transport.open_count(), after_listing + 1);
    }

    #[tokio::test]
    async fn test_no_connections() {
        let provider = provider(transport(), Arc::new(MemoryLogger::new()));
        let entries = provider
            .get_tools(&RequestContext::new("openai"), &CancellationToken::new())
            .await
            .unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_propagates() {
        let provider = provider(transport(), Arc::new(MemoryLogger::new()));
        let context = RequestContext::new("openai").with_remote_connections(["jira"]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = provider.get_tools(&context, &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
