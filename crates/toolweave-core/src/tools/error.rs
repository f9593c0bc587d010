//! Capability error types

use thiserror::Error;

use crate::mcp::McpError;

/// Errors from capability providers, factories and invocations
#[derive(Error, Debug)]
pub enum ToolError {
    /// A capability provider could not produce its entries
    #[error("Capability provider '{provider}' failed: {message}")]
    ProviderFailed { provider: String, message: String },

    /// Remote transport or catalog error
    #[error("Remote capability error: {0}")]
    Remote(#[from] McpError),

    #[error("Tool '{0}' not found")]
    NotFound(String),

    #[error("Invalid arguments for '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    /// The tool ran and reported failure
    #[error("Tool '{tool}' failed: {message}")]
    ExecutionFailed { tool: String, message: String },

    #[error("Operation cancelled")]
    Cancelled,
}

impl ToolError {
    pub fn provider_failed(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderFailed {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn execution_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn invalid_arguments(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Whether this error is a cancellation, including one raised by the transport
    pub fn is_cancelled(&self) -> bool {
        match self {
            ToolError::Cancelled => true,
            ToolError::Remote(e) => e.is_cancelled(),
            _ => false,
        }
    }
}
