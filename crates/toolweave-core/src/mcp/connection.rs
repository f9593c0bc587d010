//! Remote connection definitions

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Transport key for the streamable HTTP transport
pub const STREAMABLE_HTTP: &str = "streamable-http";

/// Transport key for a local Unix socket
pub const UNIX_SOCKET: &str = "unix";

fn default_transport() -> String {
    STREAMABLE_HTTP.to_string()
}

/// Credentials used when opening a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum McpAuth {
    #[default]
    None,
    ApiKey {
        #[serde(default = "default_api_key_header")]
        header: String,
        key: String,
    },
    Basic {
        username: String,
        password: String,
    },
    Bearer {
        token: String,
    },
    #[serde(rename = "oauth2_client_credentials")]
    OAuth2ClientCredentials {
        token_url: String,
        client_id: String,
        client_secret: String,
        #[serde(default)]
        scopes: Vec<String>,
    },
    PrivateKeyJwt {
        token_url: String,
        client_id: String,
        key_path: String,
    },
    MutualTls {
        cert_path: String,
        key_path: String,
    },
}

fn default_api_key_header() -> String {
    "X-API-Key".to_string()
}

impl McpAuth {
    /// Short name used in logs (never includes secrets)
    pub fn kind(&self) -> &'static str {
        match self {
            McpAuth::None => "none",
            McpAuth::ApiKey { .. } => "api_key",
            McpAuth::Basic { .. } => "basic",
            McpAuth::Bearer { .. } => "bearer",
            McpAuth::OAuth2ClientCredentials { .. } => "oauth2_client_credentials",
            McpAuth::PrivateKeyJwt { .. } => "private_key_jwt",
            McpAuth::MutualTls { .. } => "mutual_tls",
        }
    }
}

/// A configured remote capability server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpConnection {
    /// Stable identifier; cache key for catalogs and embeddings
    pub id: String,
    /// Human-readable label
    #[serde(default)]
    pub display_name: Option<String>,
    /// Transport key (see `TransportRegistry`)
    #[serde(default = "default_transport")]
    pub transport: String,
    /// URL for HTTP transports, socket path for `unix`
    pub endpoint: String,
    #[serde(default)]
    pub auth: McpAuth,
    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl McpConnection {
    /// Create a streamable-HTTP connection without credentials
    pub fn http(id: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            transport: default_transport(),
            endpoint: endpoint.into(),
            auth: McpAuth::None,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_transport(mut self, transport: impl Into<String>) -> Self {
        self.transport = transport.into();
        self
    }

    pub fn with_auth(mut self, auth: McpAuth) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Label shown next to capabilities from this connection
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

/// Lookup of connections by id
pub trait McpConnectionStore: Send + Sync {
    fn get(&self, id: &str) -> Option<McpConnection>;

    fn list(&self) -> Vec<McpConnection>;
}

/// In-memory connection store, usually filled from configuration at startup
#[derive(Debug, Default)]
pub struct MemoryConnectionStore {
    connections: RwLock<HashMap<String, McpConnection>>,
}

impl MemoryConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connections(connections: impl IntoIterator<Item = McpConnection>) -> Self {
        let store = Self::new();
        for connection in connections {
            store.upsert(connection);
        }
        store
    }

    /// Insert or replace a connection
    pub fn upsert(&self, connection: McpConnection) {
        self.connections.write().insert(connection.id.clone(), connection);
    }

    pub fn remove(&self, id: &str) -> Option<McpConnection> {
        self.connections.write().remove(id)
    }
}

impl McpConnectionStore for MemoryConnectionStore {
    fn get(&self, id: &str) -> Option<McpConnection> {
        self.connections.read().get(id).cloned()
    }

    fn list(&self) -> Vec<McpConnection> {
        let mut all: Vec<_> = self.connections.read().values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_deserialization() {
        let yaml = r#"
id: jira
endpoint: https://mcp.example.com/jira
auth:
  type: oauth2_client_credentials
  token_url: https://auth.example.com/token
  client_id: toolweave
  client_secret: s3cret
"#;
        let conn: McpConnection = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(conn.transport, STREAMABLE_HTTP);
        assert_eq!(conn.auth.kind(), "oauth2_client_credentials");
        assert_eq!(conn.label(), "jira");
    }

    #[test]
    fn test_api_key_default_header() {
        let yaml = "type: api_key\nkey: abc";
        let auth: McpAuth = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            auth,
            McpAuth::ApiKey {
                header: "X-API-Key".to_string(),
                key: "abc".to_string()
            }
        );
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryConnectionStore::with_connections([
            McpConnection::http("slack", "https://mcp.example.com/slack"),
            McpConnection::http("jira", "https://mcp.example.com/jira").with_display_name("Jira"),
        ]);

        assert_eq!(store.get("jira").unwrap().label(), "Jira");
        assert!(store.get("github").is_none());
        let ids: Vec<_> = store.list().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["jira", "slack"]);

        assert!(store.remove("slack").is_some());
        assert!(store.get("slack").is_none());
    }
}
