//! MCP error types

use thiserror::Error;

/// Errors from remote capability servers and the catalog cache
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Unknown connection: {0}")]
    UnknownConnection(String),

    #[error("No transport registered for '{0}'")]
    UnknownTransport(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Unsupported authentication method: {0}")]
    UnsupportedAuth(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl McpError {
    /// Whether this error is a cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, McpError::Cancelled)
    }
}

pub type McpResult<T> = Result<T, McpError>;
