//! MCP client using the official rmcp SDK
//!
//! Connects to remote capability servers over streamable HTTP or a Unix
//! socket and exposes them as an [`McpSession`].

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::{
    ServiceExt,
    model::{CallToolRequestParams, ClientCapabilities, ClientInfo, Implementation, RawContent},
    service::{Peer, RunningService},
    transport::{StreamableHttpClientTransport, streamable_http_client::StreamableHttpClientTransportConfig},
    RoleClient,
};
use serde_json::Value;
use tokio::sync::Mutex;

#[cfg(unix)]
use tokio::net::UnixStream;

use crate::logging::Logger;

use super::auth::connection_headers;
use super::catalog::{McpCallResult, McpPromptInfo, McpResourceInfo, McpResourceTemplateInfo, McpToolInfo};
use super::connection::McpConnection;
use super::error::{McpError, McpResult};
use super::transport::{McpSession, McpTransport};
use crate::{log_debug, log_info};

fn client_info() -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "toolweave-core".to_string(),
            title: Some("Toolweave".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            website_url: None,
            icons: None,
        },
    }
}

/// Session with one remote capability server
pub struct McpClient {
    /// Connection id, for log messages
    connection_id: String,
    /// The running rmcp service, taken on close
    service: Mutex<Option<RunningService<RoleClient, ClientInfo>>>,
    /// Request handle shared with the running service
    peer: Peer<RoleClient>,
    logger: Arc<dyn Logger>,
}

impl McpClient {
    fn from_service(
        connection_id: &str,
        service: RunningService<RoleClient, ClientInfo>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let peer = service.peer().clone();
        Self {
            connection_id: connection_id.to_string(),
            service: Mutex::new(Some(service)),
            peer,
            logger,
        }
    }

    /// Connect over streamable HTTP, applying the connection's credentials
    pub async fn connect_http(connection: &McpConnection, logger: Arc<dyn Logger>) -> McpResult<Self> {
        log_info!(
            logger,
            "[McpClient] Connecting to {} over HTTP (auth: {})",
            connection.id,
            connection.auth.kind()
        );

        let token_client = reqwest::Client::new();
        let headers = connection_headers(connection, &token_client).await?;
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| McpError::ConnectionFailed(e.to_string()))?;

        let transport = StreamableHttpClientTransport::with_client(
            http,
            StreamableHttpClientTransportConfig::with_uri(connection.endpoint.clone()),
        );

        let service = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        log_debug!(logger, "[McpClient] Session with {} initialized", connection.id);

        Ok(Self::from_service(&connection.id, service, logger))
    }

    /// Connect over a Unix socket; `endpoint` is the socket path
    #[cfg(unix)]
    pub async fn connect_unix(connection: &McpConnection, logger: Arc<dyn Logger>) -> McpResult<Self> {
        log_info!(
            logger,
            "[McpClient] Connecting to {} over Unix socket: {}",
            connection.id, connection.endpoint
        );

        let stream = UnixStream::connect(&connection.endpoint)
            .await
            .map_err(|e| McpError::ConnectionFailed(e.to_string()))?;

        let service = client_info()
            .serve(stream)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        Ok(Self::from_service(&connection.id, service, logger))
    }
}

#[async_trait]
impl McpSession for McpClient {
    async fn list_tools(&self) -> McpResult<Vec<McpToolInfo>> {
        let result = self
            .peer
            .list_tools(Default::default())
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;

        log_debug!(
            self.logger,
            "[McpClient] {} listed {} tools",
            self.connection_id,
            result.tools.len()
        );

        Ok(result
            .tools
            .into_iter()
            .map(|t| McpToolInfo {
                name: t.name.to_string(),
                title: t.title.clone(),
                description: t.description.as_ref().map(|d| d.to_string()),
                input_schema: serde_json::to_value(t.input_schema.as_ref()).unwrap_or_default(),
            })
            .collect())
    }

    async fn list_prompts(&self) -> McpResult<Vec<McpPromptInfo>> {
        let result = self
            .peer
            .list_prompts(Default::default())
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;

        Ok(result
            .prompts
            .into_iter()
            .map(|p| McpPromptInfo {
                name: p.name,
                title: p.title,
                description: p.description,
            })
            .collect())
    }

    async fn list_resources(&self) -> McpResult<Vec<McpResourceInfo>> {
        let result = self
            .peer
            .list_resources(Default::default())
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;

        Ok(result
            .resources
            .into_iter()
            .map(|r| McpResourceInfo {
                name: r.raw.name,
                uri: r.raw.uri,
                description: r.raw.description,
            })
            .collect())
    }

    async fn list_resource_templates(&self) -> McpResult<Vec<McpResourceTemplateInfo>> {
        let result = self
            .peer
            .list_resource_templates(Default::default())
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;

        Ok(result
            .resource_templates
            .into_iter()
            .map(|t| McpResourceTemplateInfo {
                name: t.raw.name,
                uri_template: t.raw.uri_template,
                description: t.raw.description,
            })
            .collect())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<McpCallResult> {
        log_info!(
            self.logger,
            "[McpClient] Calling tool {} on {}",
            name, self.connection_id
        );

        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: arguments.as_object().cloned(),
            task: None,
        };

        let result = self
            .peer
            .call_tool(params)
            .await
            .map_err(|e| McpError::ToolCallFailed(e.to_string()))?;

        // Content is Annotated<RawContent>; only text parts are forwarded
        let text = result
            .content
            .iter()
            .filter_map(|c| match &c.raw {
                RawContent::Text(t) => Some(t.text.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        Ok(McpCallResult {
            text,
            is_error: result.is_error.unwrap_or(false),
        })
    }

    async fn close(&self) -> McpResult<()> {
        if let Some(service) = self.service.lock().await.take() {
            log_debug!(self.logger, "[McpClient] Closing session with {}", self.connection_id);
            service
                .cancel()
                .await
                .map_err(|e| McpError::Protocol(e.to_string()))?;
        }
        Ok(())
    }
}

/// Streamable HTTP transport backed by [`McpClient`]
pub struct HttpTransport {
    logger: Arc<dyn Logger>,
}

impl HttpTransport {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl McpTransport for HttpTransport {
    async fn open(&self, connection: &McpConnection) -> McpResult<Arc<dyn McpSession>> {
        let client = McpClient::connect_http(connection, Arc::clone(&self.logger)).await?;
        Ok(Arc::new(client))
    }
}

/// Unix socket transport backed by [`McpClient`]
#[cfg(unix)]
pub struct UnixSocketTransport {
    logger: Arc<dyn Logger>,
}

#[cfg(unix)]
impl UnixSocketTransport {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

#[cfg(unix)]
#[async_trait]
impl McpTransport for UnixSocketTransport {
    async fn open(&self, connection: &McpConnection) -> McpResult<Arc<dyn McpSession>> {
        let client = McpClient::connect_unix(connection, Arc::clone(&self.logger)).await?;
        Ok(Arc::new(client))
    }
}
