//! Notification parser.
//!
//! Turns an SNS-delivered approval notification into an [`ApprovalRequest`].
//! The action to check comes from the approval action's customData, which
//! must be exactly `ActionToCheck=<ActionName>`:
//!
//! ```text
//! ActionToCheck=CreateChangeSetDev     -> Some("CreateChangeSetDev")
//! ActionToCheck=                       -> None
//! check CreateChangeSetDev please      -> None
//! ```

use crate::error::{GateError, GateResult};
use crate::notification::types::*;
use once_cell::sync::Lazy;
use regex::Regex;

static ACTION_TO_CHECK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ActionToCheck=(\w+)$").unwrap());

/// Extract the action name from an approval's customData.
/// Returns None when the field is absent, empty, or not of the exact form.
pub fn action_to_check(custom_data: Option<&str>) -> Option<String> {
    let custom_data = custom_data.filter(|s| !s.is_empty())?;
    ACTION_TO_CHECK
        .captures(custom_data)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parse a raw event (as delivered by the host runtime) into a request.
pub fn parse_event(event: &serde_json::Value) -> GateResult<ApprovalRequest> {
    let envelope: NotificationEvent = serde_json::from_value(event.clone())
        .map_err(|e| GateError::InvalidNotification(format!("bad envelope: {}", e)))?;
    parse_envelope(envelope)
}

/// Parse a raw event from its JSON text.
pub fn parse_event_str(event: &str) -> GateResult<ApprovalRequest> {
    let envelope: NotificationEvent = serde_json::from_str(event)
        .map_err(|e| GateError::InvalidNotification(format!("bad envelope: {}", e)))?;
    parse_envelope(envelope)
}

fn parse_envelope(envelope: NotificationEvent) -> GateResult<ApprovalRequest> {
    let record = envelope
        .records
        .into_iter()
        .next()
        .ok_or_else(|| GateError::InvalidNotification("event has no records".to_string()))?;

    let message: ApprovalMessage = serde_json::from_str(&record.sns.message)
        .map_err(|e| GateError::InvalidNotification(format!("bad message body: {}", e)))?;
    let approval = message.approval;

    let target_action_name =
        action_to_check(approval.custom_data.as_deref()).ok_or(GateError::MissingActionToCheck)?;

    Ok(ApprovalRequest {
        token: approval.token,
        pipeline_name: approval.pipeline_name,
        stage_name: approval.stage_name,
        approval_action_name: approval.action_name,
        target_action_name,
    })
}
