//! Capability providers and the registry that aggregates them
//!
//! ```text
//! ToolRegistry ── LocalToolProvider   (configured names → ToolDefinitionRegistry)
//!              ├─ SystemToolProvider  (system definitions gated by ToolPurpose)
//!              └─ RemoteToolProvider  (cached remote catalogs → McpToolProxy)
//! ```

mod error;
mod entry;
mod definitions;
mod provider;
mod local;
mod system;
mod remote;
mod registry;

pub use error::ToolError;
pub use entry::{
    display_description, ready_factory, CapabilityEntry, CapabilityFactory, CapabilityTool, FnTool, SourceKind,
};
pub use definitions::{global_definitions, ToolDefinition, ToolDefinitionRegistry, ToolPurpose};
pub use provider::ToolProvider;
pub use local::LocalToolProvider;
pub use system::SystemToolProvider;
pub use remote::RemoteToolProvider;
pub use registry::{rank_entries, ToolRegistry};
