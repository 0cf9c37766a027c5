//! AWS CodePipeline implementation of [`PipelineService`].
//!
//! Converts SDK output into this crate's [`PipelineState`] so the rest of
//! the crate never touches SDK types.

use crate::pipeline::types::{
    ActionExecution, ActionState, ApprovalStatus, ApprovalSubmission, ExecutionStatus,
    PipelineState, StageState,
};
use crate::pipeline::PipelineService;
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_codepipeline::types as sdk;
use aws_sdk_codepipeline::Client;

/// Pipeline service backed by the CodePipeline API.
pub struct CodePipelineService {
    client: Client,
}

impl CodePipelineService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the standard AWS environment (region, credentials).
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl PipelineService for CodePipelineService {
    async fn get_state(&self, pipeline_name: &str) -> Result<PipelineState> {
        let output = self
            .client
            .get_pipeline_state()
            .name(pipeline_name)
            .send()
            .await
            .with_context(|| format!("GetPipelineState failed for '{}'", pipeline_name))?;

        Ok(PipelineState {
            pipeline_name: output.pipeline_name().map(str::to_string),
            stage_states: output.stage_states().iter().map(convert_stage).collect(),
        })
    }

    async fn submit_approval(&self, submission: &ApprovalSubmission) -> Result<()> {
        let status = match submission.result.status {
            ApprovalStatus::Approved => sdk::ApprovalStatus::Approved,
            ApprovalStatus::Rejected => sdk::ApprovalStatus::Rejected,
        };
        let result = sdk::ApprovalResult::builder()
            .summary(submission.result.summary.clone())
            .status(status)
            .build()
            .context("Failed to build approval result")?;

        self.client
            .put_approval_result()
            .pipeline_name(&submission.pipeline_name)
            .stage_name(&submission.stage_name)
            .action_name(&submission.action_name)
            .token(&submission.token)
            .result(result)
            .send()
            .await
            .with_context(|| {
                format!(
                    "PutApprovalResult failed for {}/{}/{}",
                    submission.pipeline_name, submission.stage_name, submission.action_name
                )
            })?;

        Ok(())
    }
}

fn convert_stage(stage: &sdk::StageState) -> StageState {
    StageState {
        stage_name: stage.stage_name().unwrap_or_default().to_string(),
        action_states: stage.action_states().iter().map(convert_action).collect(),
    }
}

fn convert_action(action: &sdk::ActionState) -> ActionState {
    ActionState {
        action_name: action.action_name().unwrap_or_default().to_string(),
        latest_execution: action.latest_execution().map(|exec| ActionExecution {
            token: exec.token().map(str::to_string),
            status: exec.status().map(|s| ExecutionStatus::from(s.as_str())),
            summary: exec.summary().map(str::to_string),
        }),
    }
}
