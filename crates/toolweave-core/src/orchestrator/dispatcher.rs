//! Routing model tool calls to scoped capabilities

use std::collections::HashMap;
use std::sync::Arc;

use crate::logging::Logger;
use crate::tools::{CapabilityEntry, CapabilityTool, ToolError};
use crate::types::{CancellationToken, Tool, ToolCall, ToolResult};
use crate::{log_debug, log_warn};

/// Longest tool name most chat APIs accept
const MAX_TOOL_NAME_LEN: usize = 64;

/// Turn an entry id into a name chat APIs accept (`[A-Za-z0-9_-]`)
pub fn sanitize_tool_name(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .take(MAX_TOOL_NAME_LEN)
        .collect()
}

/// The scoped capabilities of one turn, keyed by capability id
///
/// Each entry is exposed to the model under its own name unless several
/// scoped entries share it, in which case each of them is exposed under its
/// sanitized id. A tool call resolves its exposed name to the entry id and
/// is routed by that id. Callables are built on first use and reused for the
/// rest of the turn.
pub struct ToolDispatcher {
    entries: Vec<(String, CapabilityEntry)>,
    by_id: HashMap<String, usize>,
    id_by_name: HashMap<String, String>,
    built: HashMap<String, Arc<dyn CapabilityTool>>,
    logger: Arc<dyn Logger>,
}

impl ToolDispatcher {
    pub fn new(entries: Vec<CapabilityEntry>, logger: Arc<dyn Logger>) -> Self {
        let mut name_counts: HashMap<&str, usize> = HashMap::new();
        for entry in &entries {
            *name_counts.entry(entry.name.as_str()).or_insert(0) += 1;
        }
        let exposed: Vec<String> = entries
            .iter()
            .map(|e| {
                if name_counts.get(e.name.as_str()).copied().unwrap_or(0) > 1 {
                    sanitize_tool_name(&e.id)
                } else {
                    e.name.clone()
                }
            })
            .collect();

        let mut dispatcher = Self {
            entries: Vec::with_capacity(entries.len()),
            by_id: HashMap::new(),
            id_by_name: HashMap::new(),
            built: HashMap::new(),
            logger,
        };
        for (mut name, entry) in exposed.into_iter().zip(entries) {
            if dispatcher.by_id.contains_key(&entry.id) {
                continue;
            }
            if dispatcher.id_by_name.contains_key(&name) {
                name = format!("{}_{}", name, dispatcher.entries.len());
            }
            dispatcher.id_by_name.insert(name.clone(), entry.id.clone());
            dispatcher.by_id.insert(entry.id.clone(), dispatcher.entries.len());
            dispatcher.entries.push((name, entry));
        }
        dispatcher
    }

    /// Names offered to the model, in scoped order
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Tool declarations for the completion request
    pub fn tools(&self) -> Vec<Tool> {
        self.entries.iter().map(|(name, entry)| entry.to_tool(name)).collect()
    }

    /// Capability id behind a name offered to the model
    pub fn entry_id(&self, exposed_name: &str) -> Option<&str> {
        self.id_by_name.get(exposed_name).map(String::as_str)
    }

    pub fn entry_by_id(&self, id: &str) -> Option<&CapabilityEntry> {
        self.by_id.get(id).map(|&i| &self.entries[i].1)
    }

    pub fn entry(&self, exposed_name: &str) -> Option<&CapabilityEntry> {
        self.entry_id(exposed_name).and_then(|id| self.entry_by_id(id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    async fn callable(&mut self, entry: &CapabilityEntry) -> Result<Arc<dyn CapabilityTool>, ToolError> {
        if let Some(tool) = self.built.get(&entry.id) {
            return Ok(Arc::clone(tool));
        }
        let tool = entry.build().await?;
        self.built.insert(entry.id.clone(), Arc::clone(&tool));
        Ok(tool)
    }

    /// Run one tool call
    ///
    /// Failures become error results for the model. Only cancellation is
    /// returned as `Err`.
    pub async fn dispatch(&mut self, call: &ToolCall, cancel: &CancellationToken) -> Result<ToolResult, ToolError> {
        let entry = self
            .entry_id(&call.name)
            .and_then(|id| self.entry_by_id(id))
            .cloned();
        let Some(entry) = entry else {
            log_warn!(self.logger, "[ToolDispatcher] Model called unknown tool {}", call.name);
            return Ok(ToolResult::error(&call.id, format!("Unknown tool: {}", call.name)));
        };

        log_debug!(self.logger, "[ToolDispatcher] Dispatching {} to {}", call.name, entry.id);

        let outcome = match self.callable(&entry).await {
            Ok(tool) => tool.invoke(call.input.clone(), cancel).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(content) => Ok(ToolResult::success(&call.id, content)),
            Err(e) if e.is_cancelled() => Err(ToolError::Cancelled),
            Err(e) => {
                log_warn!(self.logger, "[ToolDispatcher] {} failed: {}", entry.id, e);
                Ok(ToolResult::error(&call.id, e.to_string()))
            }
        }
    }
}
