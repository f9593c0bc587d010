//! Logger that forwards to the `tracing` crate
//!
//! Hosts that already run a `tracing-subscriber` pipeline get orchestration
//! events as regular tracing events under the `toolweave` target.

use super::traits::Logger;

/// Forwards every message to `tracing` at the matching level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "toolweave", "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "toolweave", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "toolweave", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "toolweave", "{}", message);
    }
}
