//! State poller.
//!
//! SNS can deliver the approval notification before the state API shows
//! the approval action's latest execution. The poller re-fetches the state
//! every `wait_increment` until both actions expose execution data, giving
//! up once the accumulated wait exceeds `max_wait`. The bound is inclusive,
//! so the default 10s/1s settings allow 11 fetches.
//!
//! Structural errors (missing stage or action) and service failures end
//! polling immediately.

use crate::config::PollConfig;
use crate::error::{GateError, GateResult};
use crate::notification::ApprovalRequest;
use crate::pipeline::{find_action, find_stage, ActionExecution, PipelineService, PipelineState};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;

/// Waits between poll attempts. Swappable so tests don't actually sleep.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleep on the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Records requested sleeps and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sleeps(&self) -> Vec<Duration> {
        self.slept.lock().await.clone()
    }

    /// Simulated time spent waiting.
    pub async fn total(&self) -> Duration {
        self.slept.lock().await.iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().await.push(duration);
    }
}

/// Latest executions of the two actions the decision looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionStates {
    pub approval: ActionExecution,
    pub target: ActionExecution,
}

/// Poll the pipeline until both the approval action and the target action
/// have execution data.
pub async fn poll_state(
    service: &dyn PipelineService,
    sleeper: &dyn Sleeper,
    request: &ApprovalRequest,
    config: &PollConfig,
) -> GateResult<ExecutionStates> {
    let mut waited = Duration::ZERO;
    let mut attempt: u32 = 0;

    while waited <= config.max_wait {
        attempt += 1;
        tracing::debug!(
            pipeline = %request.pipeline_name,
            attempt,
            "Fetching pipeline state"
        );

        let state = service
            .get_state(&request.pipeline_name)
            .await
            .map_err(GateError::Service)?;

        match lookup(&state, request) {
            Ok(states) => return Ok(states),
            Err(e) if e.is_retryable() => {
                if config.wait_increment.is_zero() {
                    break;
                }
                tracing::warn!(
                    attempt,
                    "{}. Waiting {}s before fetching again.",
                    e,
                    config.wait_increment.as_secs_f64()
                );
                sleeper.sleep(config.wait_increment).await;
                waited += config.wait_increment;
            }
            Err(e) => return Err(e),
        }
    }

    Err(GateError::PollTimeout { waited })
}

/// One attempt: resolve the stage, then both actions.
fn lookup(state: &PipelineState, request: &ApprovalRequest) -> GateResult<ExecutionStates> {
    let stage = find_stage(state, &request.stage_name)?;
    let approval = find_action(stage, &request.approval_action_name)?;
    let target = find_action(stage, &request.target_action_name)?;

    Ok(ExecutionStates {
        approval: approval.clone(),
        target: target.clone(),
    })
}
