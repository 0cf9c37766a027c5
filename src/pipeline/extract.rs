//! Lookups over a [`PipelineState`] snapshot.
//!
//! Names are matched exactly. A missing stage or action is a structural
//! error; an action that exists but has no latest execution is reported
//! separately so the poller can wait for the service to catch up.

use crate::error::{GateError, GateResult};
use crate::pipeline::types::{ActionExecution, PipelineState, StageState};

/// Find a stage by name.
pub fn find_stage<'a>(state: &'a PipelineState, stage_name: &str) -> GateResult<&'a StageState> {
    state
        .stage_states
        .iter()
        .find(|s| s.stage_name == stage_name)
        .ok_or_else(|| GateError::StageNotFound(stage_name.to_string()))
}

/// Find an action's latest execution within a stage.
pub fn find_action<'a>(
    stage: &'a StageState,
    action_name: &str,
) -> GateResult<&'a ActionExecution> {
    let action = stage
        .action_states
        .iter()
        .find(|a| a.action_name == action_name)
        .ok_or_else(|| GateError::ActionNotFound(action_name.to_string()))?;

    // The notification can arrive before the state API lists the execution.
    action
        .latest_execution
        .as_ref()
        .ok_or_else(|| GateError::MissingExecutionData(action_name.to_string()))
}
