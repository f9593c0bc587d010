//! Callable standing in for a remote tool

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::logging::Logger;
use crate::tools::{CapabilityTool, ToolError};
use crate::types::CancellationToken;

use super::error::McpError;
use super::transport::McpConnector;
use crate::log_debug;

/// Invokes one remote tool, opening a session per call
pub struct McpToolProxy {
    connector: Arc<McpConnector>,
    connection_id: String,
    tool_name: String,
    input_schema: Value,
    logger: Arc<dyn Logger>,
}

impl McpToolProxy {
    pub fn new(
        connector: Arc<McpConnector>,
        connection_id: impl Into<String>,
        tool_name: impl Into<String>,
        input_schema: Value,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            connector,
            connection_id: connection_id.into(),
            tool_name: tool_name.into(),
            input_schema,
            logger,
        }
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// Check the properties the schema marks as required
    fn check_required(&self, arguments: &Value) -> Result<(), ToolError> {
        let Some(required) = self.input_schema.get("required").and_then(Value::as_array) else {
            return Ok(());
        };
        let missing: Vec<&str> = required
            .iter()
            .filter_map(Value::as_str)
            .filter(|key| arguments.get(*key).map_or(true, Value::is_null))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ToolError::invalid_arguments(
                &self.tool_name,
                format!("missing required arguments: {}", missing.join(", ")),
            ))
        }
    }
}

#[async_trait]
impl CapabilityTool for McpToolProxy {
    async fn invoke(&self, arguments: Value, cancel: &CancellationToken) -> Result<String, ToolError> {
        self.check_required(&arguments)?;

        let session = self.connector.open(&self.connection_id, cancel).await?;
        let result = cancel
            .run_until_cancelled(session.call_tool(&self.tool_name, arguments))
            .await
            .unwrap_or(Err(McpError::Cancelled));

        if let Err(e) = session.close().await {
            log_debug!(
                self.logger,
                "[McpToolProxy] Closing {} failed: {}",
                self.connection_id, e
            );
        }

        let result = result?;
        if result.is_error {
            return Err(ToolError::execution_failed(&self.tool_name, result.text));
        }
        Ok(result.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::mcp::transport::testing::{connector, StaticTransport};
    use serde_json::json;

    fn proxy(transport: Arc<StaticTransport>, tool: &str, schema: Value) -> McpToolProxy {
        McpToolProxy::new(connector(transport, &["jira"]), "jira", tool, schema, Arc::new(NoOpLogger))
    }

    #[tokio::test]
    async fn test_invoke_forwards_arguments() {
        let transport = Arc::new(StaticTransport::new());
        let proxy = proxy(Arc::clone(&transport), "createIssue", json!({}));

        let out = proxy
            .invoke(json!({"summary": "Login broken"}), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out, "createIssue ok");

        let calls = transport.calls.lock();
        assert_eq!(calls[0].0, "jira");
        assert_eq!(calls[0].2["summary"], "Login broken");
    }

    #[tokio::test]
    async fn test_remote_error_becomes_tool_error() {
        let proxy = proxy(Arc::new(StaticTransport::new()), "failHard", json!({}));
        let err = proxy.invoke(json!({}), &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { ref message, .. } if message == "failHard exploded"));
    }

    #[tokio::test]
    async fn test_missing_required_argument() {
        let transport = Arc::new(StaticTransport::new());
        let proxy = proxy(
            Arc::clone(&transport),
            "createIssue",
            json!({"type": "object", "required": ["summary"]}),
        );
        let err = proxy.invoke(json!({}), &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
        assert_eq!(transport.open_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_open() {
        let proxy = proxy(Arc::new(StaticTransport::new()), "createIssue", json!({}));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = proxy.invoke(json!({}), &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
