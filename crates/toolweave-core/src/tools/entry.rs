//! Capability entries and the callables behind them

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{CancellationToken, Tool};

use super::error::ToolError;

/// Where a capability comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Explicitly configured for the request
    Local,
    /// Always-on tool gated by request capabilities
    System,
    /// Proxied from a remote capability server
    Remote,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Local => write!(f, "local"),
            SourceKind::System => write!(f, "system"),
            SourceKind::Remote => write!(f, "mcp"),
        }
    }
}

/// A callable capability
#[async_trait]
pub trait CapabilityTool: Send + Sync {
    /// Run the capability and return its text output
    async fn invoke(&self, arguments: Value, cancel: &CancellationToken) -> Result<String, ToolError>;
}

/// Deferred constructor of a capability's callable
///
/// May do I/O when called. Scoring never calls it.
pub type CapabilityFactory =
    Arc<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn CapabilityTool>, ToolError>> + Send + Sync>;

/// Factory that hands out an already-built callable
pub fn ready_factory(tool: Arc<dyn CapabilityTool>) -> CapabilityFactory {
    Arc::new(move || {
        let tool = Arc::clone(&tool);
        async move { Ok::<_, ToolError>(tool) }.boxed()
    })
}

/// Callable backed by a synchronous closure
pub struct FnTool<F> {
    name: String,
    func: F,
}

impl<F> FnTool<F>
where
    F: Fn(Value) -> Result<String, ToolError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F> CapabilityTool for FnTool<F>
where
    F: Fn(Value) -> Result<String, ToolError> + Send + Sync,
{
    async fn invoke(&self, arguments: Value, cancel: &CancellationToken) -> Result<String, ToolError> {
        if cancel.is_cancelled() {
            return Err(ToolError::Cancelled);
        }
        (self.func)(arguments).map_err(|e| match e {
            ToolError::ExecutionFailed { .. } | ToolError::Cancelled => e,
            other => ToolError::execution_failed(&self.name, other.to_string()),
        })
    }
}

/// First non-blank of description and title, else the name
pub fn display_description(description: Option<&str>, title: Option<&str>, name: &str) -> String {
    [description, title]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(name)
        .to_string()
}

/// One capability offered for a request
#[derive(Clone)]
pub struct CapabilityEntry {
    /// Unique within a request (`local:x`, `system:x`, `mcp:conn:x`)
    pub id: String,
    pub name: String,
    /// Never empty
    pub description: String,
    pub source_kind: SourceKind,
    /// Connection id for remote entries
    pub source_id: Option<String>,
    pub input_schema: Option<Value>,
    pub factory: CapabilityFactory,
}

impl CapabilityEntry {
    pub fn local(name: &str, description: String, input_schema: Option<Value>, tool: Arc<dyn CapabilityTool>) -> Self {
        Self {
            id: format!("local:{}", name),
            name: name.to_string(),
            description,
            source_kind: SourceKind::Local,
            source_id: None,
            input_schema,
            factory: ready_factory(tool),
        }
    }

    pub fn system(name: &str, description: String, input_schema: Option<Value>, tool: Arc<dyn CapabilityTool>) -> Self {
        Self {
            id: format!("system:{}", name),
            source_kind: SourceKind::System,
            ..Self::local(name, description, input_schema, tool)
        }
    }

    pub fn remote(
        connection_id: &str,
        name: &str,
        description: String,
        input_schema: Option<Value>,
        factory: CapabilityFactory,
    ) -> Self {
        Self {
            id: format!("mcp:{}:{}", connection_id, name),
            name: name.to_string(),
            description,
            source_kind: SourceKind::Remote,
            source_id: Some(connection_id.to_string()),
            input_schema,
            factory,
        }
    }

    /// Merge/dedup identity
    pub fn identity(&self) -> (Option<&str>, &str) {
        (self.source_id.as_deref(), &self.name)
    }

    pub fn is_local(&self) -> bool {
        self.source_kind == SourceKind::Local
    }

    pub fn is_remote(&self) -> bool {
        self.source_kind == SourceKind::Remote
    }

    /// Construct the callable
    pub async fn build(&self) -> Result<Arc<dyn CapabilityTool>, ToolError> {
        (self.factory)().await
    }

    /// Tool declaration sent to the model under `exposed_name`
    pub fn to_tool(&self, exposed_name: &str) -> Tool {
        Tool {
            name: exposed_name.to_string(),
            description: self.description.clone(),
            input_schema: Some(
                self.input_schema
                    .clone()
                    .unwrap_or_else(|| serde_json::json!({ "type": "object", "properties": {} })),
            ),
        }
    }
}

impl fmt::Debug for CapabilityEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityEntry")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("source_kind", &self.source_kind)
            .field("source_id", &self.source_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo() -> Arc<dyn CapabilityTool> {
        Arc::new(FnTool::new("echo", |args: Value| Ok(args.to_string())))
    }

    #[test]
    fn test_ids_and_identity() {
        let local = CapabilityEntry::local("echo", "Echo".to_string(), None, echo());
        let system = CapabilityEntry::system("echo", "Echo".to_string(), None, echo());
        let remote = CapabilityEntry::remote("jira", "createIssue", "Create".to_string(), None, ready_factory(echo()));

        assert_eq!(local.id, "local:echo");
        assert_eq!(system.id, "system:echo");
        assert_eq!(system.source_kind, SourceKind::System);
        assert_eq!(remote.id, "mcp:jira:createIssue");
        assert_eq!(remote.identity(), (Some("jira"), "createIssue"));
        assert!(remote.is_remote() && !remote.is_local());
    }

    #[test]
    fn test_display_description_fallback() {
        assert_eq!(display_description(Some("Does it"), Some("T"), "n"), "Does it");
        assert_eq!(display_description(Some("  "), Some("Title"), "n"), "Title");
        assert_eq!(display_description(None, None, "name"), "name");
    }

    #[tokio::test]
    async fn test_build_and_invoke() {
        let entry = CapabilityEntry::local("echo", "Echo".to_string(), None, echo());
        let tool = entry.build().await.unwrap();
        let out = tool.invoke(json!({"a": 1}), &CancellationToken::new()).await.unwrap();
        assert_eq!(out, r#"{"a":1}"#);

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(tool.invoke(json!({}), &cancel).await.unwrap_err().is_cancelled());
    }

    #[test]
    fn test_to_tool_default_schema() {
        let entry = CapabilityEntry::local("echo", "Echo".to_string(), None, echo());
        let tool = entry.to_tool("echo");
        assert_eq!(tool.input_schema.unwrap()["type"], "object");
    }
}
