//! Chat provider metadata types

use serde::{Deserialize, Serialize};

/// Model capabilities
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelCapabilities {
    /// Whether the model supports tool/function calling
    #[serde(default)]
    pub tool_calling: bool,
    /// Whether the model supports streaming
    #[serde(default)]
    pub streaming: bool,
}

impl ModelCapabilities {
    /// Create capabilities with all features enabled
    pub fn full() -> Self {
        Self {
            tool_calling: true,
            streaming: true,
        }
    }
}

/// A model a provider offers out of the box
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultModel {
    pub id: String,
    pub name: String,
    pub context_length: u32,
    pub capabilities: ModelCapabilities,
}

/// Static information about a chat provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMetadata {
    /// Provider identifier (e.g. "openai", "mock")
    pub id: String,
    /// Display name
    pub display_name: String,
    /// Whether an API key must be supplied
    pub requires_api_key: bool,
    /// Models known to work with this provider
    pub default_models: Vec<DefaultModel>,
}
