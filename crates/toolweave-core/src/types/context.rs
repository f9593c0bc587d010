//! Per-request context passed explicitly through every component call

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Property key set when documents are attached to the conversation
pub const DOCUMENTS_PRESENT: &str = "documents.present";

/// Property key holding the identifier of an attached data source
pub const DATA_SOURCE_ID: &str = "dataSource.id";

/// Read-only description of one chat turn
///
/// Built by the caller for each request and borrowed by providers, the
/// registry, the resolver and the orchestrator. Nothing in this crate keeps a
/// reference to it after a call returns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    /// Chat provider name (e.g. "openai")
    pub provider_name: String,
    /// Named connection within the provider
    #[serde(default)]
    pub connection_name: Option<String>,
    /// Deployment or model name
    #[serde(default)]
    pub deployment_name: Option<String>,
    /// Tool names the user or profile explicitly selected
    #[serde(default)]
    pub configured_tool_names: Vec<String>,
    /// Remote connection ids in scope for this turn
    #[serde(default)]
    pub remote_connection_ids: Vec<String>,
    /// Open-ended flags used to gate optional tools
    #[serde(default)]
    pub properties: HashMap<String, Value>,
}

impl RequestContext {
    /// Create a context for the given chat provider
    pub fn new(provider_name: impl Into<String>) -> Self {
        Self {
            provider_name: provider_name.into(),
            ..Default::default()
        }
    }

    /// Set the connection name
    pub fn with_connection(mut self, name: impl Into<String>) -> Self {
        self.connection_name = Some(name.into());
        self
    }

    /// Set the deployment/model name
    pub fn with_deployment(mut self, name: impl Into<String>) -> Self {
        self.deployment_name = Some(name.into());
        self
    }

    /// Set the explicitly configured tool names
    pub fn with_tools<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.configured_tool_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the remote connections in scope
    pub fn with_remote_connections<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.remote_connection_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Set a property
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Mark documents as attached
    pub fn with_documents(self) -> Self {
        self.with_property(DOCUMENTS_PRESENT, Value::Bool(true))
    }

    /// Attach a data source
    pub fn with_data_source(self, id: impl Into<String>) -> Self {
        self.with_property(DATA_SOURCE_ID, Value::String(id.into()))
    }

    /// Get a property
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Whether a property is present and truthy
    ///
    /// `false`, `null`, `0`, empty strings and empty collections are falsy.
    pub fn flag(&self, key: &str) -> bool {
        match self.properties.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
        }
    }

    /// Whether documents are attached
    pub fn has_documents(&self) -> bool {
        self.flag(DOCUMENTS_PRESENT)
    }

    /// Identifier of the attached data source, if any
    pub fn data_source_id(&self) -> Option<&str> {
        self.properties
            .get(DATA_SOURCE_ID)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let ctx = RequestContext::new("openai")
            .with_connection("default")
            .with_deployment("gpt-4o")
            .with_tools(["createJiraTicket"])
            .with_remote_connections(vec!["jira".to_string()]);

        assert_eq!(ctx.provider_name, "openai");
        assert_eq!(ctx.connection_name.as_deref(), Some("default"));
        assert_eq!(ctx.configured_tool_names, vec!["createJiraTicket"]);
        assert_eq!(ctx.remote_connection_ids, vec!["jira"]);
    }

    #[test]
    fn test_flags() {
        let ctx = RequestContext::new("openai")
            .with_property("a", json!(true))
            .with_property("b", json!(0))
            .with_property("c", json!(""))
            .with_property("d", json!(["x"]));

        assert!(ctx.flag("a"));
        assert!(!ctx.flag("b"));
        assert!(!ctx.flag("c"));
        assert!(ctx.flag("d"));
        assert!(!ctx.flag("missing"));
    }

    #[test]
    fn test_documents_and_data_source() {
        let ctx = RequestContext::new("openai");
        assert!(!ctx.has_documents());
        assert!(ctx.data_source_id().is_none());

        let ctx = ctx.with_documents().with_data_source("kb-1");
        assert!(ctx.has_documents());
        assert_eq!(ctx.data_source_id(), Some("kb-1"));
    }
}
