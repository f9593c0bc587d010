//! Static tool definitions registered at startup

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde_json::Value;

use crate::types::RequestContext;

use super::entry::{display_description, CapabilityTool};

/// Capability a tool needs from the request before it may be offered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolPurpose {
    /// Needs an attached data source
    DataSourceSearch,
    /// Needs attached documents
    DocumentProcessing,
    /// Needs the context property of this name to be truthy
    Custom(String),
}

impl ToolPurpose {
    pub fn is_granted(&self, context: &RequestContext) -> bool {
        match self {
            ToolPurpose::DataSourceSearch => context.data_source_id().is_some(),
            ToolPurpose::DocumentProcessing => context.has_documents(),
            ToolPurpose::Custom(flag) => context.flag(flag),
        }
    }
}

/// A tool known to the process
pub struct ToolDefinition {
    pub name: String,
    /// Tool type, usually "function"
    pub kind: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub purpose: Option<ToolPurpose>,
    /// Offered on every request (subject to `purpose`) without configuration
    pub is_system: bool,
    pub input_schema: Option<Value>,
    pub handler: Arc<dyn CapabilityTool>,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, handler: Arc<dyn CapabilityTool>) -> Self {
        Self {
            name: name.into(),
            kind: "function".to_string(),
            title: None,
            description: None,
            purpose: None,
            is_system: false,
            input_schema: None,
            handler,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_purpose(mut self, purpose: ToolPurpose) -> Self {
        self.purpose = Some(purpose);
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Mark as a system tool
    pub fn system(mut self) -> Self {
        self.is_system = true;
        self
    }

    /// Description shown to the model and used for scoring
    pub fn display_description(&self) -> String {
        display_description(self.description.as_deref(), self.title.as_deref(), &self.name)
    }

    /// Whether the request grants what this tool needs
    pub fn is_available(&self, context: &RequestContext) -> bool {
        self.purpose.as_ref().map_or(true, |p| p.is_granted(context))
    }
}

impl std::fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("purpose", &self.purpose)
            .field("is_system", &self.is_system)
            .finish()
    }
}

/// Name-keyed table of tool definitions, in registration order
#[derive(Default)]
pub struct ToolDefinitionRegistry {
    definitions: RwLock<Vec<Arc<ToolDefinition>>>,
}

impl ToolDefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition, replacing any with the same name in place
    pub fn register(&self, definition: ToolDefinition) {
        let mut definitions = self.definitions.write();
        let definition = Arc::new(definition);
        match definitions.iter_mut().find(|d| d.name == definition.name) {
            Some(existing) => *existing = definition,
            None => definitions.push(definition),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<ToolDefinition>> {
        self.definitions.read().iter().find(|d| d.name == name).cloned()
    }

    pub fn all(&self) -> Vec<Arc<ToolDefinition>> {
        self.definitions.read().clone()
    }

    pub fn system_tools(&self) -> Vec<Arc<ToolDefinition>> {
        self.definitions
            .read()
            .iter()
            .filter(|d| d.is_system)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.read().is_empty()
    }
}

static GLOBAL_DEFINITIONS: Lazy<Arc<ToolDefinitionRegistry>> =
    Lazy::new(|| Arc::new(ToolDefinitionRegistry::new()));

/// Process-wide definitions, filled during startup
pub fn global_definitions() -> Arc<ToolDefinitionRegistry> {
    Arc::clone(&GLOBAL_DEFINITIONS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::FnTool;

    fn noop() -> Arc<dyn CapabilityTool> {
        Arc::new(FnTool::new("noop", |_| Ok(String::new())))
    }

    #[test]
    fn test_purpose_gating() {
        let plain = RequestContext::new("openai");
        let with_docs = RequestContext::new("openai").with_documents();
        let with_source = RequestContext::new("openai").with_data_source("ds-1");
        let with_flag = RequestContext::new("openai").with_property("web", serde_json::json!(true));

        assert!(!ToolPurpose::DocumentProcessing.is_granted(&plain));
        assert!(ToolPurpose::DocumentProcessing.is_granted(&with_docs));
        assert!(ToolPurpose::DataSourceSearch.is_granted(&with_source));
        assert!(!ToolPurpose::DataSourceSearch.is_granted(&with_docs));
        assert!(ToolPurpose::Custom("web".to_string()).is_granted(&with_flag));
        assert!(!ToolPurpose::Custom("web".to_string()).is_granted(&plain));
    }

    #[test]
    fn test_register_replaces_in_place() {
        let registry = ToolDefinitionRegistry::new();
        registry.register(ToolDefinition::new("a", noop()));
        registry.register(ToolDefinition::new("b", noop()).system());
        registry.register(ToolDefinition::new("a", noop()).with_title("Alpha"));

        let names: Vec<_> = registry.all().iter().map(|d| d.name.clone()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(registry.get("a").unwrap().display_description(), "Alpha");
        assert_eq!(registry.system_tools().len(), 1);
    }

    #[test]
    fn test_global_definitions_shared() {
        assert!(Arc::ptr_eq(&global_definitions(), &global_definitions()));
    }
}
