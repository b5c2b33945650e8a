//! Task lifecycle enforcement and transition log.

use jiff::Timestamp;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    error::{CairnError, Result},
    graph::TaskGraph,
    models::{Task, TaskStatus},
};

/// One applied status change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transition {
    pub task_id: String,
    pub from: TaskStatus,
    pub to: TaskStatus,
    pub at: Timestamp,
}

/// Applies task status changes according to the lifecycle table and records
/// every one of them.
#[derive(Debug, Default)]
pub struct StatusTracker {
    transitions: Vec<Transition>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `task` to `to`, stamping `started_at` / `completed_at`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` when the lifecycle table does not allow
    /// the change; the task is left untouched.
    pub fn apply(&mut self, task: &mut Task, to: TaskStatus) -> Result<()> {
        let from = task.status;
        if !from.can_transition_to(to) {
            return Err(CairnError::InvalidTransition {
                task_id: task.id.clone(),
                from,
                to,
            });
        }

        let at = Timestamp::now();
        if to == TaskStatus::InProgress {
            task.started_at = Some(at);
        }
        if to.is_terminal() {
            task.completed_at = Some(at);
        }
        task.status = to;

        debug!("Task '{}': {} -> {}", task.id, from.as_str(), to.as_str());
        self.transitions.push(Transition {
            task_id: task.id.clone(),
            from,
            to,
            at,
        });
        Ok(())
    }

    /// Transitions a task of `graph`, then refreshes the derived status of
    /// its parent when the task is a subtask.
    pub fn transition(&mut self, graph: &mut TaskGraph, task_id: &str, to: TaskStatus) -> Result<()> {
        let parent_id = {
            let task = graph.task_mut(task_id).ok_or_else(|| {
                CairnError::invalid_input("task_id")
                    .with_reason(format!("task '{task_id}' is not part of the graph"))
            })?;
            self.apply(task, to)?;
            task.parent_task_id.clone()
        };

        if let Some(parent_id) = parent_id {
            self.refresh_parent(graph, &parent_id)?;
        }
        Ok(())
    }

    /// Every transition applied so far, in order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn into_transitions(self) -> Vec<Transition> {
        self.transitions
    }

    fn refresh_parent(&mut self, graph: &mut TaskGraph, parent_id: &str) -> Result<()> {
        let Some(parent) = graph.task(parent_id) else {
            return Ok(());
        };
        let statuses: Vec<TaskStatus> = parent
            .subtask_ids
            .iter()
            .filter_map(|id| graph.task(id).map(|t| t.status))
            .collect();
        let derived = derive_parent_status(&statuses);
        let current = parent.status;

        if derived == current || !current.can_transition_to(derived) {
            return Ok(());
        }
        if let Some(parent) = graph.task_mut(parent_id) {
            self.apply(parent, derived)?;
        }
        Ok(())
    }
}

/// Status of a decomposed task given its subtasks' statuses.
pub fn derive_parent_status(subtasks: &[TaskStatus]) -> TaskStatus {
    let any = |s: TaskStatus| subtasks.contains(&s);
    let all = |s: TaskStatus| !subtasks.is_empty() && subtasks.iter().all(|&x| x == s);

    if any(TaskStatus::Failed) {
        TaskStatus::Failed
    } else if any(TaskStatus::Cancelled) {
        TaskStatus::Cancelled
    } else if all(TaskStatus::Completed) {
        TaskStatus::Completed
    } else if all(TaskStatus::Blocked) {
        TaskStatus::Blocked
    } else if any(TaskStatus::InProgress) || any(TaskStatus::Completed) {
        TaskStatus::InProgress
    } else {
        TaskStatus::Pending
    }
}
