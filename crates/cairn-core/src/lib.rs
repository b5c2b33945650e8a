//! Core library for cairn: versioned plans and dependency-aware execution.
//!
//! A plan holds a working copy of steps. Snapshots of that working copy are
//! appended as immutable versions that form a DAG (lineage parents plus merge
//! sources), with named branches pointing into it. Any version can be turned
//! into a task graph and run by the [`Scheduler`], which dispatches tasks to a
//! caller-supplied [`StepExecutor`] once their dependencies have completed.
//!
//! - [`planner`]: the async version manager backed by SQLite
//! - [`history`]: diffing, ancestry and three-way merging of snapshots
//! - [`graph`]: validation, analysis and task graph construction
//! - [`scheduler`] and [`tracker`]: execution and task lifecycle
//! - [`display`]: markdown formatting for terminal output
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use cairn_core::{
//!     models::Step,
//!     params::{CreatePlan, CreateVersion, ExecuteVersion},
//!     DryRunExecutor, PlannerBuilder, SchedulerConfig,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = tempfile::TempDir::new()?;
//! let planner = PlannerBuilder::new()
//!     .with_database_path(Some(dir.path().join("cairn.db")))
//!     .build()
//!     .await?;
//!
//! planner
//!     .create_plan(&CreatePlan {
//!         id: "plan_1".to_string(),
//!         title: "Launch".to_string(),
//!         steps: vec![
//!             Step::new("1", "Research"),
//!             Step::new("2", "Build").depends_on(["1"]),
//!         ],
//!         ..Default::default()
//!     })
//!     .await?;
//! planner
//!     .create_version(&CreateVersion {
//!         plan_id: "plan_1".to_string(),
//!         description: "initial".to_string(),
//!         branch: None,
//!     })
//!     .await?;
//!
//! let run = planner
//!     .execute_version(
//!         &ExecuteVersion {
//!             plan_id: "plan_1".to_string(),
//!             ..Default::default()
//!         },
//!         Arc::new(DryRunExecutor),
//!         SchedulerConfig::default(),
//!     )
//!     .await?;
//! assert!(run.is_success());
//! println!("{run}");
//! # Ok(())
//! # }
//! ```

pub mod db;
pub mod display;
pub mod error;
pub mod graph;
pub mod history;
pub mod models;
pub mod params;
pub mod planner;
pub mod scheduler;
pub mod tracker;

// Re-export commonly used types
pub use db::Database;
pub use display::{
    Branches, CreateResult, LocalDateTime, OperationStatus, Plans, UpdateResult, Versions,
};
pub use error::{CairnError, Result};
pub use graph::{DependencyReport, TaskGraph, TaskGraphBuilder};
pub use models::{Branch, Plan, Step, StepStatusHint, Task, TaskStatus, Version, VersionDiff};
pub use planner::{Planner, PlannerBuilder};
pub use scheduler::{
    DryRunExecutor, RetryPolicy, RunOutcome, RunResult, Scheduler, SchedulerConfig, StepExecutor,
    StepOutcome, StepRequest,
};
pub use tracker::{StatusTracker, Transition};
