pub mod codepipeline;
pub mod extract;
pub mod recording;
pub mod types;

pub use codepipeline::CodePipelineService;
pub use extract::{find_action, find_stage};
pub use recording::RecordingPipeline;
pub use types::*;

use anyhow::Result;
use async_trait::async_trait;

/// The pipeline service this crate reads state from and answers approvals on.
/// Implementations can be the AWS API, a recorded fixture, etc.
#[async_trait]
pub trait PipelineService: Send + Sync {
    /// Fetch a fresh snapshot of the pipeline's state. Never cached.
    async fn get_state(&self, pipeline_name: &str) -> Result<PipelineState>;

    /// Answer a pending manual approval.
    async fn submit_approval(&self, submission: &ApprovalSubmission) -> Result<()>;
}
