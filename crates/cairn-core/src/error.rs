//! Error types for the cairn library.
//!
//! Every domain variant names the plan, version, task or step it concerns so
//! callers never have to guess which record an error refers to.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::TaskStatus;

/// Comprehensive error type for all cairn operations.
#[derive(Error, Debug)]
pub enum CairnError {
    /// A plan with this ID already exists
    #[error("Plan '{plan_id}' already exists")]
    DuplicatePlan { plan_id: String },
    /// Plan not found for the given ID
    #[error("Plan '{plan_id}' not found")]
    PlanNotFound { plan_id: String },
    /// Version not found within a plan
    #[error("Version '{version_id}' not found for plan '{plan_id}'")]
    VersionNotFound { plan_id: String, version_id: String },
    /// Branch not found within a plan
    #[error("Branch '{branch}' not found for plan '{plan_id}'")]
    BranchNotFound { plan_id: String, branch: String },
    /// Branch name already in use within a plan
    #[error("Branch '{branch}' already exists for plan '{plan_id}'")]
    DuplicateBranch { plan_id: String, branch: String },
    /// Two steps in one snapshot share an ID
    #[error("Step '{step_id}' appears more than once in plan '{plan_id}'")]
    DuplicateStep { plan_id: String, step_id: String },
    /// A step depends on a step that is not part of the same snapshot
    #[error("Step '{step_id}' of plan '{plan_id}' depends on unknown step '{missing_ref}'")]
    MissingDependency {
        plan_id: String,
        step_id: String,
        missing_ref: String,
    },
    /// The step dependency relation contains a cycle
    #[error("Circular dependency in plan '{plan_id}': {}", .cycle.join(" -> "))]
    CircularDependency { plan_id: String, cycle: Vec<String> },
    /// A task status change outside the lifecycle table
    #[error("Task '{task_id}' cannot move from {from} to {to}")]
    InvalidTransition {
        task_id: String,
        from: TaskStatus,
        to: TaskStatus,
    },
    /// Both branches changed the same steps since their common ancestor
    #[error(
        "Merging branch '{source_branch}' into '{target}' of plan '{plan_id}' conflicts on steps: {}",
        .step_ids.join(", ")
    )]
    MergeConflict {
        plan_id: String,
        target: String,
        source_branch: String,
        step_ids: Vec<String>,
    },
    /// The step executor failed a task after all attempts were used
    #[error("Task '{task_id}' failed after {attempts} attempt(s): {message}")]
    TaskExecution {
        task_id: String,
        attempts: u32,
        message: String,
    },
    /// A scheduler run was cancelled before every task finished
    #[error("Run of plan '{plan_id}' version '{version_id}' was cancelled")]
    SchedulerCancelled { plan_id: String, version_id: String },
    /// Database connection or query errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Builder for creating database errors with optional context.
pub struct DatabaseErrorBuilder {
    message: String,
}

impl DatabaseErrorBuilder {
    /// Create a new database error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> CairnError {
        CairnError::Database {
            message: self.message,
            source,
        }
    }
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> CairnError {
        CairnError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl CairnError {
    /// Creates a builder for database errors.
    pub fn database(message: impl Into<String>) -> DatabaseErrorBuilder {
        DatabaseErrorBuilder::new(message)
    }

    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    pub(crate) fn plan_not_found(plan_id: &str) -> Self {
        Self::PlanNotFound {
            plan_id: plan_id.to_string(),
        }
    }

    pub(crate) fn version_not_found(plan_id: &str, version_id: &str) -> Self {
        Self::VersionNotFound {
            plan_id: plan_id.to_string(),
            version_id: version_id.to_string(),
        }
    }

    pub(crate) fn branch_not_found(plan_id: &str, branch: &str) -> Self {
        Self::BranchNotFound {
            plan_id: plan_id.to_string(),
            branch: branch.to_string(),
        }
    }

    /// Whether the error comes from snapshot validation and must stop a run
    /// before anything is dispatched.
    pub fn is_graph_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateStep { .. }
                | Self::MissingDependency { .. }
                | Self::CircularDependency { .. }
        )
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| CairnError::database(message).with_source(e))
    }
}

/// Result type alias for cairn operations
pub type Result<T> = std::result::Result<T, CairnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_dependency_message_lists_full_path() {
        let err = CairnError::CircularDependency {
            plan_id: "plan_1".to_string(),
            cycle: vec!["A".to_string(), "B".to_string(), "A".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Circular dependency in plan 'plan_1': A -> B -> A"
        );
        assert!(err.is_graph_error());
    }

    #[test]
    fn test_merge_conflict_message_names_steps() {
        let err = CairnError::MergeConflict {
            plan_id: "p".to_string(),
            target: "main".to_string(),
            source_branch: "experiment".to_string(),
            step_ids: vec!["2".to_string(), "5".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("'experiment' into 'main'"));
        assert!(message.ends_with("2, 5"));
        assert!(!err.is_graph_error());
    }

    #[test]
    fn test_invalid_input_builder() {
        let err = CairnError::invalid_input("branch").with_reason("must not be empty");
        assert!(matches!(err, CairnError::InvalidInput { ref field, .. } if field == "branch"));
    }
}
