//! Execution of versions through the scheduler.

use std::sync::Arc;

use log::{info, warn};

use super::Planner;
use crate::{
    error::{CairnError, Result},
    graph::{TaskGraph, TaskGraphBuilder},
    params::ExecuteVersion,
    scheduler::{RunResult, Scheduler, SchedulerConfig, StepExecutor},
};

impl Planner {
    /// Builds the task graph of a version (the active one by default).
    ///
    /// # Errors
    ///
    /// `DuplicateStep`, `MissingDependency` or `CircularDependency` when the
    /// snapshot is not a valid DAG; `InvalidInput` when the plan has no
    /// version to run.
    pub async fn build_task_graph(&self, params: &ExecuteVersion) -> Result<TaskGraph> {
        let params = params.clone();
        self.with_db(move |db| {
            let plan = db.require_plan(&params.plan_id)?;
            let version_id = match params.version_id {
                Some(version_id) => version_id,
                None => plan.active_version_id.clone().ok_or_else(|| {
                    CairnError::invalid_input("version_id")
                        .with_reason(format!("plan '{}' has no versions", plan.id))
                })?,
            };
            let version = db.require_version(&plan.id, &version_id)?;

            let mut builder = TaskGraphBuilder::new();
            if let Some(threshold) = params.decompose_threshold {
                builder = builder.with_decomposition(threshold);
            }
            builder.build(&version)
        })
        .await
    }

    /// Runs a version with a fresh scheduler built from `config`.
    pub async fn execute_version(
        &self,
        params: &ExecuteVersion,
        executor: Arc<dyn StepExecutor>,
        config: SchedulerConfig,
    ) -> Result<RunResult> {
        let scheduler = Scheduler::new(config);
        self.execute_version_with(params, &scheduler, executor).await
    }

    /// Runs a version on a caller-owned scheduler, so the caller can cancel
    /// it through [`Scheduler::cancellation_token`].
    ///
    /// Graph errors are returned before any task is dispatched. Once the run
    /// is over its outcome is stored on the version as the
    /// `last_run_status` and `last_run_at` annotations; a failed write is
    /// logged and the run result is still returned.
    pub async fn execute_version_with(
        &self,
        params: &ExecuteVersion,
        scheduler: &Scheduler,
        executor: Arc<dyn StepExecutor>,
    ) -> Result<RunResult> {
        let graph = self.build_task_graph(params).await?;
        info!(
            "Executing plan '{}' version '{}' ({} tasks)",
            graph.plan_id(),
            graph.version_id(),
            graph.len()
        );

        let result = scheduler.run(graph, executor).await?;
        if !result.is_success() {
            warn!(
                "Run of plan '{}' version '{}' ended {}",
                result.plan_id,
                result.version_id,
                result.outcome.as_str()
            );
        }

        if let Err(err) = self
            .record_run(
                &result.plan_id,
                &result.version_id,
                result.outcome.as_str(),
                result.finished_at,
            )
            .await
        {
            warn!(
                "Failed to record run status on plan '{}' version '{}': {err}",
                result.plan_id, result.version_id
            );
        }
        Ok(result)
    }
}
