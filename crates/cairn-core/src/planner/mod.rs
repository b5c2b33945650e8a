//! High-level planner API: plans, version history and execution.
//!
//! [`Planner`] is the version manager. It owns no connection; every call
//! opens the SQLite file inside `spawn_blocking`, so the type is cheap to
//! share across tasks.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │    Handlers     │    │   Operations    │    │    Database     │
//! │  (display       │───▶│ (plan_ops,      │───▶│   (via db/)     │
//! │   wrappers)     │    │  version_ops,   │    │                 │
//! │                 │    │  branch_ops,    │    │                 │
//! │                 │    │  run_ops)       │    │                 │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! Mutations of one plan's history are serialized by a per-plan lock held
//! for the whole read-decide-append sequence, on top of the IMMEDIATE
//! transaction the store uses for sequence allocation.
//!
//! # Usage
//!
//! ```rust
//! use cairn_core::{
//!     models::Step,
//!     params::{CreatePlan, CreateVersion},
//!     PlannerBuilder,
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
//!         steps: vec![Step::new("1", "Research")],
//!         ..Default::default()
//!     })
//!     .await?;
//!
//! let v1 = planner
//!     .create_version(&CreateVersion {
//!         plan_id: "plan_1".to_string(),
//!         description: "initial".to_string(),
//!         branch: None,
//!     })
//!     .await?;
//! assert_eq!(v1.version_id, "v1");
//! # Ok(())
//! # }
//! ```

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use tokio::{
    sync::{Mutex, OwnedMutexGuard},
    task,
};

use crate::{
    db::Database,
    error::{CairnError, Result},
};

pub mod branch_ops;
pub mod builder;
pub mod handlers;
pub mod plan_ops;
pub mod run_ops;
pub mod version_ops;

#[cfg(test)]
mod tests;

pub use builder::PlannerBuilder;

/// Main planner interface.
pub struct Planner {
    pub(crate) db_path: PathBuf,
    plan_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Planner {
    /// Creates a new planner with the specified database path.
    pub(crate) fn new(db_path: PathBuf) -> Self {
        Self {
            db_path,
            plan_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Runs `f` against a freshly opened database on the blocking pool.
    pub(crate) async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Database) -> Result<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            f(&mut db)
        })
        .await
        .map_err(|e| CairnError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }

    /// Acquires the mutation lock of one plan.
    pub(crate) async fn lock_plan(&self, plan_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.plan_locks.lock().await;
            Arc::clone(locks.entry(plan_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}
