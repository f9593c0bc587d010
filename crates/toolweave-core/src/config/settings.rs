//! Tunable thresholds and their defaults

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::mcp::{McpConnection, MemoryConnectionStore};

use super::error::{ConfigError, ConfigResult};

/// Orchestrator thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// At or below this many entries, and with no remote entry, skip planning and scoping
    pub scoping_threshold: usize,
    /// Above this many entries, plan before scoping
    pub planning_threshold: usize,
    /// Non-local entries must score strictly above this to be scoped in
    pub relevance_cutoff: f32,
    /// Capacity budget for the scoped set, local entries included
    pub max_scoped_tools: usize,
    pub planning_timeout_ms: u64,
    pub planning_max_tokens: u32,
    /// Model calls allowed per turn while the model keeps requesting tools
    pub max_tool_rounds: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            scoping_threshold: 10,
            planning_threshold: 20,
            relevance_cutoff: 0.1,
            max_scoped_tools: 24,
            planning_timeout_ms: 10_000,
            planning_max_tokens: 256,
            max_tool_rounds: 8,
        }
    }
}

impl OrchestratorSettings {
    pub fn planning_timeout(&self) -> Duration {
        Duration::from_millis(self.planning_timeout_ms)
    }
}

/// Capability resolver thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// At or below this many remote capabilities, return them all with score 1.0
    pub include_all_threshold: usize,
    /// Minimum cosine similarity on the embedding path
    pub similarity_threshold: f32,
    /// Minimum overlap score on the lexical path
    pub keyword_threshold: f32,
    pub top_k: usize,
    pub embedding_timeout_ms: u64,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            include_all_threshold: 8,
            similarity_threshold: 0.35,
            keyword_threshold: 0.2,
            top_k: 10,
            embedding_timeout_ms: 5_000,
        }
    }
}

impl ResolverSettings {
    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_millis(self.embedding_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Lifetime of cached catalogs and embeddings
    pub catalog_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { catalog_ttl_secs: 300 }
    }
}

impl CacheSettings {
    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_ttl_secs)
    }
}

/// Effective configuration after merging every file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolweaveConfig {
    pub orchestrator: OrchestratorSettings,
    pub resolver: ResolverSettings,
    pub cache: CacheSettings,
    pub connections: Vec<McpConnection>,
}

fn check_unit(name: &str, value: f32) -> ConfigResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{} must be within [0, 1], got {}", name, value)))
    }
}

impl ToolweaveConfig {
    /// Reject values the components cannot work with
    pub fn validate(&self) -> ConfigResult<()> {
        check_unit("orchestrator.relevance_cutoff", self.orchestrator.relevance_cutoff)?;
        check_unit("resolver.similarity_threshold", self.resolver.similarity_threshold)?;
        check_unit("resolver.keyword_threshold", self.resolver.keyword_threshold)?;
        if self.orchestrator.max_tool_rounds == 0 {
            return Err(ConfigError::Invalid("orchestrator.max_tool_rounds must be at least 1".to_string()));
        }

        let mut seen = std::collections::HashSet::new();
        for connection in &self.connections {
            if !seen.insert(connection.id.as_str()) {
                return Err(ConfigError::ConnectionExists(connection.id.clone()));
            }
        }
        Ok(())
    }

    /// Connection store holding every configured connection
    pub fn connection_store(&self) -> MemoryConnectionStore {
        MemoryConnectionStore::with_connections(self.connections.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "orchestrator:\n  scoping_threshold: 4\nresolver:\n  top_k: 3\n";
        let config: ToolweaveConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.orchestrator.scoping_threshold, 4);
        assert_eq!(config.orchestrator.planning_threshold, 20);
        assert_eq!(config.resolver.top_k, 3);
        assert_eq!(config.resolver.include_all_threshold, 8);
        assert_eq!(config.cache.catalog_ttl(), Duration::from_secs(300));
        assert!(config.connections.is_empty());
    }

    #[test]
    fn test_validate() {
        let mut config = ToolweaveConfig::default();
        assert!(config.validate().is_ok());

        config.resolver.keyword_threshold = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ToolweaveConfig::default();
        config.connections = vec![
            McpConnection::http("jira", "https://a"),
            McpConnection::http("jira", "https://b"),
        ];
        assert!(matches!(config.validate(), Err(ConfigError::ConnectionExists(id)) if id == "jira"));
    }
}
