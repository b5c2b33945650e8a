//! Task model: the executable form of a step within one run.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::TaskStatus;

/// A unit of work owned by the scheduler for the duration of one run.
///
/// Tasks are derived from a version's steps but are not part of the
/// version; they are discarded once the run is over.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Step ID for top-level tasks, `{step}#{n}` for decomposed subtasks
    pub id: String,
    pub plan_id: String,
    pub version_id: String,
    pub step_id: String,
    pub description: String,
    pub status: TaskStatus,
    pub dependency_task_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Number of executor invocations so far
    pub attempt_count: u32,
    /// Set on subtasks produced by decomposition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_task_id: Option<String>,
    /// Ordered chain of subtasks; a parent with subtasks is never dispatched
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtask_ids: Vec<String>,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

impl Task {
    /// Creates a pending task.
    pub fn new(
        id: impl Into<String>,
        plan_id: impl Into<String>,
        version_id: impl Into<String>,
        step_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            plan_id: plan_id.into(),
            version_id: version_id.into(),
            step_id: step_id.into(),
            description: description.into(),
            status: TaskStatus::Pending,
            dependency_task_ids: Vec::new(),
            result: None,
            error: None,
            attempt_count: 0,
            parent_task_id: None,
            subtask_ids: Vec::new(),
            created_at: Timestamp::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Whether the scheduler dispatches this task to the executor.
    pub fn is_executable(&self) -> bool {
        self.subtask_ids.is_empty()
    }
}
