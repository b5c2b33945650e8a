//! Status enumerations for steps and tasks.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Declarative progress hint carried by a step inside a plan snapshot.
///
/// Hints are informational only; the scheduler derives real lifecycle state
/// from [`TaskStatus`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatusHint {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Blocked,
}

impl StepStatusHint {
    /// Whether this is the default hint (skipped when serializing).
    pub fn is_not_started(&self) -> bool {
        *self == StepStatusHint::NotStarted
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatusHint::NotStarted => "not_started",
            StepStatusHint::InProgress => "in_progress",
            StepStatusHint::Completed => "completed",
            StepStatusHint::Blocked => "blocked",
        }
    }
}

impl FromStr for StepStatusHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "not_started" | "notstarted" | "todo" => Ok(StepStatusHint::NotStarted),
            "in_progress" | "inprogress" => Ok(StepStatusHint::InProgress),
            "completed" | "done" => Ok(StepStatusHint::Completed),
            "blocked" => Ok(StepStatusHint::Blocked),
            _ => Err(format!("Invalid step status hint: {s}")),
        }
    }
}

/// Lifecycle state of a task inside one scheduler run.
///
/// ```text
/// PENDING ──▶ IN_PROGRESS ──▶ COMPLETED | FAILED
///    │             │
///    ├─────────────┴──▶ CANCELLED
///    └──▶ BLOCKED
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Blocked,
    Cancelled,
}

impl TaskStatus {
    /// Whether the lifecycle table allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress)
                | (Pending, Blocked)
                | (Pending, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Failed)
                | (InProgress, Cancelled)
        )
    }

    /// Terminal states never transition again. `BLOCKED` counts as terminal.
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskStatus::Pending | TaskStatus::InProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Blocked => "BLOCKED",
            TaskStatus::Cancelled => "CANCELLED",
        }
    }

    /// Get status with consistent icon formatting for display.
    pub fn with_icon(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "○ Pending",
            TaskStatus::InProgress => "➤ In Progress",
            TaskStatus::Completed => "✓ Completed",
            TaskStatus::Failed => "✗ Failed",
            TaskStatus::Blocked => "⊘ Blocked",
            TaskStatus::Cancelled => "– Cancelled",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(TaskStatus::Pending),
            "IN_PROGRESS" | "INPROGRESS" => Ok(TaskStatus::InProgress),
            "COMPLETED" => Ok(TaskStatus::Completed),
            "FAILED" => Ok(TaskStatus::Failed),
            "BLOCKED" => Ok(TaskStatus::Blocked),
            "CANCELLED" => Ok(TaskStatus::Cancelled),
            _ => Err(format!("Invalid task status: {s}")),
        }
    }
}
