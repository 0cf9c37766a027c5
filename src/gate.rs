//! The approval gate: one invocation per notification.
//!
//! Parses the notification, polls the pipeline state, evaluates the
//! decision and, only if it approves, submits the approval. Every failure
//! is logged and turned into an [`InvocationReport`]; nothing is returned
//! to the host runtime as an error.

use crate::config::GateConfig;
use crate::decision::{evaluate, RejectReason, Verdict};
use crate::error::{ErrorKind, GateError};
use crate::notification::{parse_event, ApprovalRequest};
use crate::pipeline::PipelineService;
use crate::poller::{poll_state, Sleeper, TokioSleeper};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// How an invocation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The approval was submitted
    Approved,
    /// All checks ran, and the request didn't qualify
    Rejected { reason: RejectReason, message: String },
    /// The invocation stopped before reaching a decision
    Aborted { kind: ErrorKind, error: String },
}

impl Outcome {
    fn aborted(err: &GateError) -> Self {
        Outcome::Aborted {
            kind: err.kind(),
            error: err.to_string(),
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, Outcome::Approved)
    }
}

/// What one invocation did. Returned to the host as the invocation result.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationReport {
    pub invocation_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Auto-approves manual approvals whose change set has no changes.
pub struct ApprovalGate {
    service: Arc<dyn PipelineService>,
    sleeper: Arc<dyn Sleeper>,
    config: GateConfig,
}

impl ApprovalGate {
    /// Create a gate that sleeps on the tokio timer between poll attempts.
    pub fn new(service: Arc<dyn PipelineService>, config: GateConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            service,
            sleeper: Arc::new(TokioSleeper),
            config,
        })
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Handle one raw notification event.
    pub async fn handle(&self, event: &serde_json::Value) -> InvocationReport {
        let invocation_id = Uuid::new_v4();
        let started_at = Utc::now();

        let (request, outcome) = match parse_event(event) {
            Ok(request) => {
                let outcome = self.handle_request(&request).await;
                (Some(request), outcome)
            }
            Err(e) => {
                log_abort(&e);
                (None, Outcome::aborted(&e))
            }
        };

        InvocationReport {
            invocation_id,
            started_at,
            finished_at: Utc::now(),
            pipeline: request.as_ref().map(|r| r.pipeline_name.clone()),
            stage: request.map(|r| r.stage_name),
            outcome,
        }
    }

    /// Run the poll and decision phases for an already-parsed request.
    pub async fn handle_request(&self, request: &ApprovalRequest) -> Outcome {
        let states = match poll_state(
            self.service.as_ref(),
            self.sleeper.as_ref(),
            request,
            &self.config.poll,
        )
        .await
        {
            Ok(states) => states,
            Err(e) => {
                log_abort(&e);
                return Outcome::aborted(&e);
            }
        };

        match evaluate(request, &states) {
            Verdict::Reject(reason) => {
                tracing::info!(
                    pipeline = %request.pipeline_name,
                    stage = %request.stage_name,
                    "{}. Skipping automatic approval.",
                    reason
                );
                Outcome::Rejected {
                    message: reason.to_string(),
                    reason,
                }
            }
            Verdict::Approve(submission) => {
                tracing::info!(
                    pipeline = %request.pipeline_name,
                    stage = %request.stage_name,
                    action = %request.approval_action_name,
                    "The change set was created without any changes. Automatically approving."
                );
                match self.service.submit_approval(&submission).await {
                    Ok(()) => Outcome::Approved,
                    Err(e) => {
                        let e = GateError::Service(e);
                        log_abort(&e);
                        Outcome::aborted(&e)
                    }
                }
            }
        }
    }
}

fn log_abort(err: &GateError) {
    match err {
        GateError::PollTimeout { .. } => {
            tracing::error!("Did not get a complete pipeline response in time: {}", err)
        }
        _ => tracing::error!(kind = %err.kind(), "{}", err),
    }
}
