use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    error::{CairnError, Result},
    models::{Task, TaskStatus},
    tracker::Transition,
};

/// Terminal outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every task reached `COMPLETED`
    Succeeded,
    /// At least one task did not complete
    Failed {
        failed: Vec<String>,
        blocked: Vec<String>,
        cancelled: Vec<String>,
    },
    /// The run was cancelled from outside
    Cancelled { cancelled: Vec<String> },
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Succeeded => "succeeded",
            RunOutcome::Failed { .. } => "failed",
            RunOutcome::Cancelled { .. } => "cancelled",
        }
    }
}

/// Final state of every task of a run plus the transition log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub plan_id: String,
    pub version_id: String,
    pub outcome: RunOutcome,
    /// Tasks in graph order
    pub tasks: Vec<Task>,
    pub transitions: Vec<Transition>,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
}

impl RunResult {
    pub(crate) fn new(
        plan_id: String,
        version_id: String,
        tasks: Vec<Task>,
        transitions: Vec<Transition>,
        was_cancelled: bool,
        started_at: Timestamp,
    ) -> Self {
        let ids_with = |status: TaskStatus| -> Vec<String> {
            tasks
                .iter()
                .filter(|t| t.status == status)
                .map(|t| t.id.clone())
                .collect()
        };

        let outcome = if was_cancelled {
            RunOutcome::Cancelled {
                cancelled: ids_with(TaskStatus::Cancelled),
            }
        } else if tasks.iter().all(|t| t.status == TaskStatus::Completed) {
            RunOutcome::Succeeded
        } else {
            RunOutcome::Failed {
                failed: ids_with(TaskStatus::Failed),
                blocked: ids_with(TaskStatus::Blocked),
                cancelled: ids_with(TaskStatus::Cancelled),
            }
        };

        Self {
            plan_id,
            version_id,
            outcome,
            tasks,
            transitions,
            started_at,
            finished_at: Timestamp::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == RunOutcome::Succeeded
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Converts a non-successful run into the matching error.
    ///
    /// A failed run reports its first failed executable task as
    /// `TaskExecution`; a cancelled run yields `SchedulerCancelled`.
    pub fn ensure_success(self) -> Result<Self> {
        match &self.outcome {
            RunOutcome::Succeeded => Ok(self),
            RunOutcome::Cancelled { .. } => Err(CairnError::SchedulerCancelled {
                plan_id: self.plan_id,
                version_id: self.version_id,
            }),
            RunOutcome::Failed { .. } => {
                let culprit = self
                    .tasks
                    .iter()
                    .find(|t| t.status == TaskStatus::Failed && t.is_executable())
                    .or_else(|| self.tasks.iter().find(|t| t.status != TaskStatus::Completed));
                let (task_id, attempts, message) = match culprit {
                    Some(task) => (
                        task.id.clone(),
                        task.attempt_count,
                        task.error
                            .clone()
                            .unwrap_or_else(|| format!("task ended {}", task.status.as_str())),
                    ),
                    None => (String::new(), 0, "run did not complete".to_string()),
                };
                Err(CairnError::TaskExecution {
                    task_id,
                    attempts,
                    message,
                })
            }
        }
    }
}
