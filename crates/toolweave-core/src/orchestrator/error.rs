//! Orchestrator error types

use thiserror::Error;

use crate::providers::ProviderError;
use crate::tools::ToolError;

/// Errors that end a chat turn
///
/// Recoverable failures (a provider dropping out, a failed plan, a tool
/// erroring) never show up here. Conversions fold any cancellation into
/// `Cancelled`.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Turn cancelled")]
    Cancelled,

    #[error("Completion failed: {0}")]
    Provider(#[source] ProviderError),

    #[error("Capability aggregation failed: {0}")]
    Tools(#[source] ToolError),
}

impl OrchestratorError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, OrchestratorError::Cancelled)
    }
}

impl From<ProviderError> for OrchestratorError {
    fn from(e: ProviderError) -> Self {
        if e.is_cancelled() {
            OrchestratorError::Cancelled
        } else {
            OrchestratorError::Provider(e)
        }
    }
}

impl From<ToolError> for OrchestratorError {
    fn from(e: ToolError) -> Self {
        if e.is_cancelled() {
            OrchestratorError::Cancelled
        } else {
            OrchestratorError::Tools(e)
        }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
