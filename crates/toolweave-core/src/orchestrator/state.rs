//! Turn states and the plan-or-skip decision

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::OrchestratorSettings;
use crate::tools::CapabilityEntry;

/// States a chat turn passes through
///
/// `Start → (PlanningSkipped | Planning) → Scoping → Streaming → Done`, with
/// `Scoping` left out when the full set is small enough to send as is.
/// `Failed` is reachable from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationState {
    Start,
    PlanningSkipped,
    Planning,
    Scoping,
    Streaming,
    Done,
    Failed,
}

impl fmt::Display for OrchestrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrchestrationState::Start => "start",
            OrchestrationState::PlanningSkipped => "planning-skipped",
            OrchestrationState::Planning => "planning",
            OrchestrationState::Scoping => "scoping",
            OrchestrationState::Streaming => "streaming",
            OrchestrationState::Done => "done",
            OrchestrationState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Path a turn takes after aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Stream with every entry
    Direct,
    /// Scope against the conversation without asking for a plan
    ScopeOnly,
    /// Ask the model for a plan, then scope against it
    PlanThenScope,
}

/// Choose how much work the entry set warrants
///
/// Small local-only sets go straight to streaming. Remote capabilities or a
/// large set call for a plan; anything in between is scoped directly.
pub fn decide_route(entries: &[CapabilityEntry], settings: &OrchestratorSettings) -> Route {
    let has_remote = entries.iter().any(|e| e.is_remote());
    if entries.len() <= settings.scoping_threshold && !has_remote {
        Route::Direct
    } else if entries.len() > settings.planning_threshold || has_remote {
        Route::PlanThenScope
    } else {
        Route::ScopeOnly
    }
}
