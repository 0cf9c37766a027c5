//! Types for the inbound approval notification.
//!
//! CodePipeline publishes a manual-approval request to an SNS topic, and SNS
//! delivers it to the handler wrapped in a `Records` envelope. The approval
//! itself is a JSON document embedded as a string in `Sns.Message`.

use serde::{Deserialize, Serialize};

/// The SNS delivery envelope. Only the first record is ever read.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<NotificationRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationRecord {
    #[serde(rename = "Sns")]
    pub sns: SnsPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnsPayload {
    /// JSON-encoded [`ApprovalMessage`]
    #[serde(rename = "Message")]
    pub message: String,
}

/// The decoded body of `Sns.Message`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApprovalMessage {
    pub approval: ApprovalDetails,
}

/// The `approval` object CodePipeline sends with a manual approval request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalDetails {
    pub token: String,
    pub pipeline_name: String,
    pub stage_name: String,
    /// Name of the manual approval action awaiting a decision
    pub action_name: String,
    /// Free text configured on the approval action
    #[serde(default)]
    pub custom_data: Option<String>,
}

/// Everything one invocation needs to know about the pending approval.
/// Built once from the notification and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub token: String,
    pub pipeline_name: String,
    pub stage_name: String,
    pub approval_action_name: String,
    /// The action whose outcome decides the approval (from `ActionToCheck=`)
    pub target_action_name: String,
}
