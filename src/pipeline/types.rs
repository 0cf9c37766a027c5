//! Pipeline state as seen through the CodePipeline state API.
//!
//! These mirror the `GetPipelineState` response shape (camelCase JSON), so
//! recorded API responses can be loaded directly in tests. The state is a
//! read-only snapshot; a fresh one is fetched on every poll attempt.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A snapshot of a pipeline: its stages in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_name: Option<String>,
    #[serde(default)]
    pub stage_states: Vec<StageState>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageState {
    pub stage_name: String,
    #[serde(default)]
    pub action_states: Vec<ActionState>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionState {
    pub action_name: String,
    /// Absent until the service has recorded an execution for the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_execution: Option<ActionExecution>,
}

/// The latest execution record of an action.
/// Every field is optional: the service omits what it hasn't recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionExecution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ExecutionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Status of an action execution. Statuses this crate doesn't know about
/// are kept verbatim so they can still be logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExecutionStatus {
    InProgress,
    Abandoned,
    Succeeded,
    Failed,
    Other(String),
}

impl From<&str> for ExecutionStatus {
    fn from(s: &str) -> Self {
        match s {
            "InProgress" => ExecutionStatus::InProgress,
            "Abandoned" => ExecutionStatus::Abandoned,
            "Succeeded" => ExecutionStatus::Succeeded,
            "Failed" => ExecutionStatus::Failed,
            other => ExecutionStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for ExecutionStatus {
    fn from(s: String) -> Self {
        ExecutionStatus::from(s.as_str())
    }
}

impl From<ExecutionStatus> for String {
    fn from(status: ExecutionStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::InProgress => write!(f, "InProgress"),
            ExecutionStatus::Abandoned => write!(f, "Abandoned"),
            ExecutionStatus::Succeeded => write!(f, "Succeeded"),
            ExecutionStatus::Failed => write!(f, "Failed"),
            ExecutionStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Result status sent with an approval decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalStatus {
    Approved,
    Rejected,
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalStatus::Approved => write!(f, "Approved"),
            ApprovalStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalResult {
    pub status: ApprovalStatus,
    pub summary: String,
}

/// A write call answering a pending manual approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalSubmission {
    pub pipeline_name: String,
    pub stage_name: String,
    pub action_name: String,
    pub token: String,
    pub result: ApprovalResult,
}
