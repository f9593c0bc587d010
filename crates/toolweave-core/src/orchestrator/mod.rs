//! Progressive orchestration of a chat turn
//!
//! ```text
//! Start ─┬─ PlanningSkipped ─┬──────────── Streaming ── Done
//!        │                   └─ Scoping ─┘
//!        └─ Planning ─────────── Scoping ─┘
//! ```
//!
//! `Failed` can be reached from any state.

mod error;
mod state;
mod scoping;
mod dispatcher;
mod streaming;
mod progressive;

pub use error::{OrchestratorError, OrchestratorResult};
pub use state::{decide_route, OrchestrationState, Route};
pub use scoping::scope_entries;
pub use dispatcher::{sanitize_tool_name, ToolDispatcher};
pub use streaming::OrchestrationStream;
pub use progressive::{
    capability_block, inject_system_context, planning_prompt, OrchestrationOutput, Orchestrator,
};
