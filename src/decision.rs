//! Approval decision.
//!
//! A pure check over the polled execution states. The checks run in order
//! and the first failure rejects:
//!
//! 1. the approval action has a token
//! 2. that token equals the notification's token (not a stale notification)
//! 3. the target action's status is exactly `Succeeded`
//! 4. the target action's summary ends with "was created with no changes."
//!
//! Only a request that passes all four is approved.

use crate::notification::ApprovalRequest;
use crate::pipeline::{ApprovalResult, ApprovalStatus, ApprovalSubmission, ExecutionStatus};
use crate::poller::ExecutionStates;
use serde::Serialize;
use std::fmt;

/// Suffix CloudFormation puts on a change set summary when it is empty.
pub const NO_CHANGES_SUFFIX: &str = "was created with no changes.";

/// Summary recorded on the pipeline with an automatic approval.
pub const APPROVAL_SUMMARY: &str = "Automatically approved by Lambda.";

/// Outcome of evaluating a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Approve(ApprovalSubmission),
    Reject(RejectReason),
}

impl Verdict {
    pub fn is_approved(&self) -> bool {
        matches!(self, Verdict::Approve(_))
    }
}

/// Why a request was not approved. These are expected outcomes, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum RejectReason {
    /// The approval action's execution carries no token
    MissingToken,
    /// The pending approval is a different one than the notification's
    TokenMismatch,
    /// The target action didn't succeed
    NotSucceeded {
        action: String,
        status: Option<String>,
    },
    /// The change set has changes
    ChangesDetected { summary: Option<String> },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingToken => {
                write!(f, "Response did not include an approval token")
            }
            RejectReason::TokenMismatch => {
                write!(f, "Token in notification does not match token in response")
            }
            RejectReason::NotSucceeded { action, status } => write!(
                f,
                "{} does not have a successful status ({})",
                action,
                status.as_deref().unwrap_or("no status")
            ),
            RejectReason::ChangesDetected { .. } => {
                write!(f, "There seem to be changes in the change set")
            }
        }
    }
}

/// Decide whether to approve the request.
pub fn evaluate(request: &ApprovalRequest, states: &ExecutionStates) -> Verdict {
    let token = match states.approval.token.as_deref() {
        Some(token) if !token.is_empty() => token,
        _ => return Verdict::Reject(RejectReason::MissingToken),
    };

    if token != request.token {
        return Verdict::Reject(RejectReason::TokenMismatch);
    }

    if states.target.status != Some(ExecutionStatus::Succeeded) {
        return Verdict::Reject(RejectReason::NotSucceeded {
            action: request.target_action_name.clone(),
            status: states.target.status.as_ref().map(|s| s.to_string()),
        });
    }

    let summary = states.target.summary.as_deref().unwrap_or("");
    if !summary.ends_with(NO_CHANGES_SUFFIX) {
        return Verdict::Reject(RejectReason::ChangesDetected {
            summary: states.target.summary.clone(),
        });
    }

    Verdict::Approve(ApprovalSubmission {
        pipeline_name: request.pipeline_name.clone(),
        stage_name: request.stage_name.clone(),
        action_name: request.approval_action_name.clone(),
        token: request.token.clone(),
        result: ApprovalResult {
            status: ApprovalStatus::Approved,
            summary: APPROVAL_SUMMARY.to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ActionExecution;

    fn request() -> ApprovalRequest {
        ApprovalRequest {
            token: "tok-1".into(),
            pipeline_name: "my-pipeline".into(),
            stage_name: "Deploy".into(),
            approval_action_name: "Approve".into(),
            target_action_name: "CreateChangeSet".into(),
        }
    }

    fn states(token: Option<&str>, status: Option<ExecutionStatus>, summary: &str) -> ExecutionStates {
        ExecutionStates {
            approval: ActionExecution {
                token: token.map(str::to_string),
                status: Some(ExecutionStatus::InProgress),
                summary: None,
            },
            target: ActionExecution {
                token: None,
                status,
                summary: Some(summary.to_string()),
            },
        }
    }

    const NO_CHANGES: &str = "Stack stack-1 was created with no changes.";

    #[test]
    fn test_approves_no_change_change_set() {
        let verdict = evaluate(
            &request(),
            &states(Some("tok-1"), Some(ExecutionStatus::Succeeded), NO_CHANGES),
        );

        match verdict {
            Verdict::Approve(submission) => {
                assert_eq!(submission.pipeline_name, "my-pipeline");
                assert_eq!(submission.stage_name, "Deploy");
                assert_eq!(submission.action_name, "Approve");
                assert_eq!(submission.token, "tok-1");
                assert_eq!(submission.result.status, ApprovalStatus::Approved);
                assert_eq!(submission.result.summary, APPROVAL_SUMMARY);
            }
            other => panic!("expected approval, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_or_empty_token() {
        for token in [None, Some("")] {
            let verdict = evaluate(
                &request(),
                &states(token, Some(ExecutionStatus::Succeeded), NO_CHANGES),
            );
            assert_eq!(verdict, Verdict::Reject(RejectReason::MissingToken));
        }
    }

    #[test]
    fn test_token_mismatch() {
        let verdict = evaluate(
            &request(),
            &states(Some("tok-2"), Some(ExecutionStatus::Succeeded), NO_CHANGES),
        );
        assert_eq!(verdict, Verdict::Reject(RejectReason::TokenMismatch));
    }

    #[test]
    fn test_status_must_be_exactly_succeeded() {
        for status in [
            Some(ExecutionStatus::Failed),
            Some(ExecutionStatus::InProgress),
            Some(ExecutionStatus::Other("succeeded".into())),
            None,
        ] {
            let verdict = evaluate(&request(), &states(Some("tok-1"), status.clone(), NO_CHANGES));
            assert!(
                matches!(verdict, Verdict::Reject(RejectReason::NotSucceeded { .. })),
                "status {:?} should reject",
                status
            );
        }
    }

    #[test]
    fn test_changes_detected() {
        let verdict = evaluate(
            &request(),
            &states(
                Some("tok-1"),
                Some(ExecutionStatus::Succeeded),
                "Stack stack-1 will update 3 resources.",
            ),
        );
        assert!(matches!(
            verdict,
            Verdict::Reject(RejectReason::ChangesDetected { .. })
        ));

        // Suffix must be at the very end
        let verdict = evaluate(
            &request(),
            &states(
                Some("tok-1"),
                Some(ExecutionStatus::Succeeded),
                "Stack stack-1 was created with no changes. Really.",
            ),
        );
        assert!(!verdict.is_approved());
    }

    #[test]
    fn test_missing_summary_is_treated_as_changes() {
        let mut s = states(Some("tok-1"), Some(ExecutionStatus::Succeeded), "");
        s.target.summary = None;
        assert_eq!(
            evaluate(&request(), &s),
            Verdict::Reject(RejectReason::ChangesDetected { summary: None })
        );
    }

    #[test]
    fn test_token_is_checked_before_status() {
        let verdict = evaluate(
            &request(),
            &states(Some("other"), Some(ExecutionStatus::Failed), "whatever"),
        );
        assert_eq!(verdict, Verdict::Reject(RejectReason::TokenMismatch));
    }
}
