//! The contract between the scheduler and whatever actually performs work.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Everything an executor gets to see about one attempt.
#[derive(Debug, Clone)]
pub struct StepRequest {
    pub task_id: String,
    pub step_id: String,
    pub description: String,
    /// 1-based attempt number, so retried attempts can be told apart
    pub attempt: u32,
    /// Outputs of the task's dependencies, keyed by task ID
    pub context: BTreeMap<String, Value>,
    /// Fires when the run is cancelled; honouring it is up to the executor
    pub cancellation: CancellationToken,
}

/// Result of one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub success: bool,
    #[serde(default)]
    pub output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepOutcome {
    pub fn success(output: impl Into<Value>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: Value::Null,
            error: Some(error.into()),
        }
    }
}

/// Performs the work behind a task.
///
/// Implementations must tolerate being called again for the same task after
/// a failed attempt.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute(&self, request: StepRequest) -> StepOutcome;
}

/// Completes every task immediately, echoing its description.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunExecutor;

#[async_trait]
impl StepExecutor for DryRunExecutor {
    async fn execute(&self, request: StepRequest) -> StepOutcome {
        StepOutcome::success(request.description)
    }
}
