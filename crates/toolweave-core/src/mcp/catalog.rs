//! Capability catalog of a remote connection

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of remote capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityType {
    Tool,
    Prompt,
    Resource,
    ResourceTemplate,
}

impl std::fmt::Display for CapabilityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapabilityType::Tool => write!(f, "tool"),
            CapabilityType::Prompt => write!(f, "prompt"),
            CapabilityType::Resource => write!(f, "resource"),
            CapabilityType::ResourceTemplate => write!(f, "resource-template"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpToolInfo {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: Value,
}

impl McpToolInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: Some(description.into()),
            input_schema: Value::Object(Default::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpPromptInfo {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpResourceInfo {
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpResourceTemplateInfo {
    pub name: String,
    pub uri_template: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Result of invoking a remote tool, flattened to text
#[derive(Debug, Clone, PartialEq)]
pub struct McpCallResult {
    pub text: String,
    pub is_error: bool,
}

/// Everything a connection exposes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpCatalog {
    #[serde(default)]
    pub tools: Vec<McpToolInfo>,
    #[serde(default)]
    pub prompts: Vec<McpPromptInfo>,
    #[serde(default)]
    pub resources: Vec<McpResourceInfo>,
    #[serde(default)]
    pub resource_templates: Vec<McpResourceTemplateInfo>,
}

/// One catalog item reduced to what scoring needs
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogCapability {
    pub kind: CapabilityType,
    pub name: String,
    /// Description, falling back to title then name
    pub description: String,
}

fn describe(description: &Option<String>, title: &Option<String>, name: &str) -> String {
    [description, title]
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| name.to_string())
}

impl McpCatalog {
    /// Catalog with only tools
    pub fn with_tools(tools: Vec<McpToolInfo>) -> Self {
        Self {
            tools,
            ..Default::default()
        }
    }

    /// Total number of capabilities of every kind
    pub fn len(&self) -> usize {
        self.tools.len() + self.prompts.len() + self.resources.len() + self.resource_templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten every capability, tools first, in catalog order
    pub fn capabilities(&self) -> Vec<CatalogCapability> {
        let tools = self.tools.iter().map(|t| CatalogCapability {
            kind: CapabilityType::Tool,
            name: t.name.clone(),
            description: describe(&t.description, &t.title, &t.name),
        });
        let prompts = self.prompts.iter().map(|p| CatalogCapability {
            kind: CapabilityType::Prompt,
            name: p.name.clone(),
            description: describe(&p.description, &p.title, &p.name),
        });
        let resources = self.resources.iter().map(|r| CatalogCapability {
            kind: CapabilityType::Resource,
            name: r.name.clone(),
            description: describe(&r.description, &None, &r.name),
        });
        let templates = self.resource_templates.iter().map(|t| CatalogCapability {
            kind: CapabilityType::ResourceTemplate,
            name: t.name.clone(),
            description: describe(&t.description, &None, &t.name),
        });

        tools.chain(prompts).chain(resources).chain(templates).collect()
    }
}
