//! Error taxonomy for a single approval-gate invocation.
//!
//! Every failure is one of a closed set of variants. Callers switch on
//! [`GateError::kind`] to decide between retrying (the poller) and ending
//! the invocation (everything else). Validation failures are not errors;
//! see [`crate::decision::RejectReason`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Why an invocation could not reach a decision.
#[derive(Debug, Error)]
pub enum GateError {
    /// The notification's customData did not name an action to check.
    #[error("missing ActionToCheck=ACTION_NAME in notification customData")]
    MissingActionToCheck,

    /// The notification envelope could not be read.
    #[error("invalid notification: {0}")]
    InvalidNotification(String),

    /// The pipeline state has no stage with this name.
    #[error("pipeline state does not contain stage '{0}'")]
    StageNotFound(String),

    /// The stage has no action with this name.
    #[error("stage does not contain action '{0}'")]
    ActionNotFound(String),

    /// The action is registered but has no latest execution yet.
    #[error("action '{0}' has no latest execution yet")]
    MissingExecutionData(String),

    /// Execution data never showed up within the poll bound.
    #[error("pipeline state incomplete after waiting {}s", .waited.as_secs_f64())]
    PollTimeout { waited: Duration },

    /// The pipeline service call itself failed.
    #[error("pipeline service call failed: {0:#}")]
    Service(anyhow::Error),
}

/// Coarse classification of a [`GateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Notification or pipeline topology doesn't match expectations.
    Structural,
    /// Eventual-consistency gap between the notification and the state API.
    Transient,
    /// The transient condition did not resolve in time.
    Timeout,
    /// Transport or API failure talking to the pipeline service.
    Service,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Structural => write!(f, "structural"),
            ErrorKind::Transient => write!(f, "transient"),
            ErrorKind::Timeout => write!(f, "timeout"),
            ErrorKind::Service => write!(f, "service"),
        }
    }
}

impl GateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GateError::MissingActionToCheck
            | GateError::InvalidNotification(_)
            | GateError::StageNotFound(_)
            | GateError::ActionNotFound(_) => ErrorKind::Structural,
            GateError::MissingExecutionData(_) => ErrorKind::Transient,
            GateError::PollTimeout { .. } => ErrorKind::Timeout,
            GateError::Service(_) => ErrorKind::Service,
        }
    }

    /// Only the eventual-consistency gap is worth polling again for.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

pub type GateResult<T> = std::result::Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_missing_execution_data_is_retryable() {
        assert!(GateError::MissingExecutionData("Approve".into()).is_retryable());

        for err in [
            GateError::MissingActionToCheck,
            GateError::InvalidNotification("bad".into()),
            GateError::StageNotFound("Deploy".into()),
            GateError::ActionNotFound("Approve".into()),
            GateError::PollTimeout {
                waited: Duration::from_secs(11),
            },
            GateError::Service(anyhow::anyhow!("throttled")),
        ] {
            assert!(!err.is_retryable(), "{} should not be retried", err);
        }
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            GateError::StageNotFound("Deploy".into()).kind(),
            ErrorKind::Structural
        );
        assert_eq!(
            GateError::PollTimeout {
                waited: Duration::from_secs(1)
            }
            .kind(),
            ErrorKind::Timeout
        );
        assert_eq!(
            GateError::Service(anyhow::anyhow!("boom")).kind(),
            ErrorKind::Service
        );
    }

    #[test]
    fn test_display_names_the_missing_item() {
        let err = GateError::ActionNotFound("CreateChangeSetDev".into());
        assert!(err.to_string().contains("CreateChangeSetDev"));
    }
}
