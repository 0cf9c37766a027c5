//! In-memory [`PipelineService`] that replays canned states and records
//! every call, so the gate can be exercised without AWS.

use crate::pipeline::types::{ApprovalSubmission, PipelineState};
use crate::pipeline::PipelineService;
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Replays a sequence of states, one per `get_state` call.
/// Once the sequence runs out, the last state is returned forever.
pub struct RecordingPipeline {
    states: Mutex<VecDeque<PipelineState>>,
    last: Mutex<Option<PipelineState>>,
    state_calls: Mutex<Vec<String>>,
    submissions: Mutex<Vec<ApprovalSubmission>>,
    fail_reads: bool,
}

impl RecordingPipeline {
    /// Always answer with the same state.
    pub fn new(state: PipelineState) -> Self {
        Self::with_sequence(vec![state])
    }

    /// Answer with each state in turn, repeating the last one.
    pub fn with_sequence(states: Vec<PipelineState>) -> Self {
        Self {
            states: Mutex::new(states.into()),
            last: Mutex::new(None),
            state_calls: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
            fail_reads: false,
        }
    }

    /// Fail every `get_state` call, as an unreachable service would.
    pub fn failing() -> Self {
        Self {
            fail_reads: true,
            ..Self::with_sequence(Vec::new())
        }
    }

    /// Pipeline names passed to `get_state`, in call order.
    pub async fn state_calls(&self) -> Vec<String> {
        self.state_calls.lock().await.clone()
    }

    /// Approvals submitted so far.
    pub async fn submissions(&self) -> Vec<ApprovalSubmission> {
        self.submissions.lock().await.clone()
    }
}

#[async_trait]
impl PipelineService for RecordingPipeline {
    async fn get_state(&self, pipeline_name: &str) -> Result<PipelineState> {
        self.state_calls.lock().await.push(pipeline_name.to_string());

        if self.fail_reads {
            bail!("pipeline service unavailable");
        }

        let mut last = self.last.lock().await;
        if let Some(next) = self.states.lock().await.pop_front() {
            *last = Some(next);
        }
        match last.as_ref() {
            Some(state) => Ok(state.clone()),
            None => bail!("no pipeline state recorded for '{}'", pipeline_name),
        }
    }

    async fn submit_approval(&self, submission: &ApprovalSubmission) -> Result<()> {
        self.submissions.lock().await.push(submission.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::StageState;

    fn named(stage: &str) -> PipelineState {
        PipelineState {
            pipeline_name: None,
            stage_states: vec![StageState {
                stage_name: stage.to_string(),
                action_states: vec![],
            }],
        }
    }

    #[tokio::test]
    async fn test_sequence_repeats_last_state() {
        let pipeline = RecordingPipeline::with_sequence(vec![named("A"), named("B")]);

        let names: Vec<String> = [
            pipeline.get_state("p").await.unwrap(),
            pipeline.get_state("p").await.unwrap(),
            pipeline.get_state("p").await.unwrap(),
        ]
        .iter()
        .map(|s| s.stage_states[0].stage_name.clone())
        .collect();

        assert_eq!(names, vec!["A", "B", "B"]);
        assert_eq!(pipeline.state_calls().await.len(), 3);
    }

    #[tokio::test]
    async fn test_failing_reads() {
        let pipeline = RecordingPipeline::failing();
        assert!(pipeline.get_state("p").await.is_err());
        assert_eq!(pipeline.state_calls().await, vec!["p".to_string()]);
    }
}
