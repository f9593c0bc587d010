//! File-based configuration (YAML)
//!
//! Supports user-level (`~/.config/toolweave/config.yaml`) and
//! workspace-level (`.config/toolweave/config.yaml`) files.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::mcp::McpConnection;

use super::error::{ConfigError, ConfigResult};
use super::settings::{CacheSettings, OrchestratorSettings, ResolverSettings, ToolweaveConfig};

/// Contents of one configuration file
///
/// Sections are optional so a file only overrides what it names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orchestrator: Option<OrchestratorSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolver: Option<ResolverSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<Vec<McpConnection>>,
}

impl ConfigFile {
    /// Overlay `other` on top of `self`, section by section
    pub fn merged_with(self, other: ConfigFile) -> ConfigFile {
        ConfigFile {
            orchestrator: other.orchestrator.or(self.orchestrator),
            resolver: other.resolver.or(self.resolver),
            cache: other.cache.or(self.cache),
            connections: other.connections.or(self.connections),
        }
    }

    pub fn into_config(self) -> ToolweaveConfig {
        ToolweaveConfig {
            orchestrator: self.orchestrator.unwrap_or_default(),
            resolver: self.resolver.unwrap_or_default(),
            cache: self.cache.unwrap_or_default(),
            connections: self.connections.unwrap_or_default(),
        }
    }
}

/// Config level (user or workspace)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLevel {
    /// User-level config (~/.config/toolweave/config.yaml)
    User,
    /// Workspace-level config (.config/toolweave/config.yaml in workspace root)
    Workspace,
}

impl ConfigLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLevel::User => "user",
            ConfigLevel::Workspace => "workspace",
        }
    }
}

/// One YAML configuration file, cached after first read
pub struct FileConfigProvider {
    path: PathBuf,
    level: ConfigLevel,
    cache: RwLock<Option<ConfigFile>>,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>, level: ConfigLevel) -> Self {
        Self {
            path: path.into(),
            level,
            cache: RwLock::new(None),
        }
    }

    /// User-level file under the platform config directory
    pub fn user() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        Self::new(config_dir.join("toolweave").join("config.yaml"), ConfigLevel::User)
    }

    /// Workspace-level file under `<root>/.config/toolweave`
    pub fn workspace(workspace_root: impl AsRef<Path>) -> Self {
        let path = workspace_root.as_ref().join(".config").join("toolweave").join("config.yaml");
        Self::new(path, ConfigLevel::Workspace)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn level(&self) -> ConfigLevel {
        self.level
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn load(&self) -> ConfigResult<ConfigFile> {
        if !self.path.exists() {
            return Ok(ConfigFile::default());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(ConfigFile::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    fn save(&self, config: &ConfigFile) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_yaml::to_string(config)?)?;
        *self.cache.write() = Some(config.clone());
        Ok(())
    }

    /// Cached contents, reading the file on first use
    pub fn get(&self) -> ConfigResult<ConfigFile> {
        if let Some(config) = self.cache.read().as_ref() {
            return Ok(config.clone());
        }
        self.reload()
    }

    /// Re-read the file, replacing the cached contents
    pub fn reload(&self) -> ConfigResult<ConfigFile> {
        let config = self.load()?;
        *self.cache.write() = Some(config.clone());
        Ok(config)
    }

    pub fn connections(&self) -> ConfigResult<Vec<McpConnection>> {
        Ok(self.get()?.connections.unwrap_or_default())
    }

    pub fn add_connection(&self, connection: McpConnection) -> ConfigResult<()> {
        let mut config = self.get()?;
        let connections = config.connections.get_or_insert_with(Vec::new);
        if connections.iter().any(|c| c.id == connection.id) {
            return Err(ConfigError::ConnectionExists(connection.id));
        }
        connections.push(connection);
        self.save(&config)
    }

    pub fn update_connection(&self, connection: McpConnection) -> ConfigResult<()> {
        let mut config = self.get()?;
        let existing = config
            .connections
            .iter_mut()
            .flatten()
            .find(|c| c.id == connection.id)
            .ok_or_else(|| ConfigError::ConnectionNotFound(connection.id.clone()))?;
        *existing = connection;
        self.save(&config)
    }

    pub fn remove_connection(&self, id: &str) -> ConfigResult<()> {
        let mut config = self.get()?;
        let connections = config.connections.get_or_insert_with(Vec::new);
        let before = connections.len();
        connections.retain(|c| c.id != id);
        if connections.len() == before {
            return Err(ConfigError::ConnectionNotFound(id.to_string()));
        }
        self.save(&config)
    }

    /// Copy the file next to itself before a destructive edit
    pub fn backup(&self) -> ConfigResult<Option<PathBuf>> {
        if !self.exists() {
            return Ok(None);
        }
        let backup_path = self.path.with_extension("yaml.backup");
        fs::copy(&self.path, &backup_path)?;
        Ok(Some(backup_path))
    }
}

impl std::fmt::Debug for FileConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigProvider")
            .field("path", &self.path)
            .field("level", &self.level)
            .field("exists", &self.exists())
            .finish()
    }
}

/// Merges user and workspace files into the effective configuration
///
/// Workspace sections replace user sections wholesale; missing files
/// contribute nothing.
#[derive(Debug)]
pub struct FileConfigLoader {
    user: FileConfigProvider,
    workspace: Option<FileConfigProvider>,
}

impl FileConfigLoader {
    pub fn new(user: FileConfigProvider, workspace: Option<FileConfigProvider>) -> Self {
        Self { user, workspace }
    }

    /// Standard locations: the user file plus, if given, the workspace file
    pub fn standard(workspace_root: Option<&Path>) -> Self {
        Self::new(FileConfigProvider::user(), workspace_root.map(FileConfigProvider::workspace))
    }

    pub fn load(&self) -> ConfigResult<ToolweaveConfig> {
        let mut merged = self.user.get()?;
        if let Some(workspace) = &self.workspace {
            merged = merged.merged_with(workspace.get()?);
        }
        let config = merged.into_config();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_files_give_defaults() {
        let dir = tempdir().unwrap();
        let loader = FileConfigLoader::new(
            FileConfigProvider::new(dir.path().join("user.yaml"), ConfigLevel::User),
            Some(FileConfigProvider::workspace(dir.path())),
        );
        assert_eq!(loader.load().unwrap(), ToolweaveConfig::default());
    }

    #[test]
    fn test_workspace_wins_per_section() {
        let dir = tempdir().unwrap();
        let user_path = dir.path().join("user.yaml");
        fs::write(
            &user_path,
            "orchestrator:\n  scoping_threshold: 5\nresolver:\n  top_k: 4\n",
        )
        .unwrap();

        let workspace = FileConfigProvider::workspace(dir.path());
        fs::create_dir_all(workspace.path().parent().unwrap()).unwrap();
        fs::write(workspace.path(), "orchestrator:\n  planning_threshold: 12\n").unwrap();

        let config = FileConfigLoader::new(FileConfigProvider::new(&user_path, ConfigLevel::User), Some(workspace))
            .load()
            .unwrap();

        // The workspace orchestrator section replaces the user one entirely
        assert_eq!(config.orchestrator.planning_threshold, 12);
        assert_eq!(config.orchestrator.scoping_threshold, 10);
        assert_eq!(config.resolver.top_k, 4);
    }

    #[test]
    fn test_connection_management() {
        let dir = tempdir().unwrap();
        let provider = FileConfigProvider::new(dir.path().join("config.yaml"), ConfigLevel::User);
        assert!(!provider.exists());

        provider
            .add_connection(McpConnection::http("jira", "https://mcp.example.com/jira"))
            .unwrap();
        assert!(provider.exists());
        assert!(matches!(
            provider.add_connection(McpConnection::http("jira", "https://other")),
            Err(ConfigError::ConnectionExists(_))
        ));

        provider
            .update_connection(McpConnection::http("jira", "https://mcp.example.com/v2").with_display_name("Jira"))
            .unwrap();
        let reloaded = provider.reload().unwrap();
        let connections = reloaded.connections.unwrap();
        assert_eq!(connections[0].endpoint, "https://mcp.example.com/v2");

        provider.remove_connection("jira").unwrap();
        assert!(provider.connections().unwrap().is_empty());
        assert!(matches!(
            provider.remove_connection("jira"),
            Err(ConfigError::ConnectionNotFound(_))
        ));

        let content = fs::read_to_string(provider.path()).unwrap();
        assert!(content.contains("connections"));
    }

    #[test]
    fn test_invalid_yaml_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "orchestrator: [not, a, map]").unwrap();
        let provider = FileConfigProvider::new(&path, ConfigLevel::User);
        assert!(matches!(provider.get(), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let provider = FileConfigProvider::new(&path, ConfigLevel::User);
        assert!(provider.backup().unwrap().is_none());

        fs::write(&path, "connections: []").unwrap();
        let backup_path = provider.backup().unwrap().unwrap();
        assert!(backup_path.exists());
    }
}
