//! Plan operations for the Planner.

use log::info;

use super::Planner;
use crate::{
    db::version_queries::NewVersion,
    error::{CairnError, Result},
    graph::{analyze_steps, ensure_unique_ids, DependencyReport},
    models::{Plan, MAIN_BRANCH},
    params::{AnalyzeDependencies, CreatePlan, ForkPlan, PlanId, UpdatePlan},
};

impl Planner {
    /// Creates a plan with the given working copy. No version is created
    /// until [`create_version`](Self::create_version) is called.
    ///
    /// # Errors
    ///
    /// `DuplicatePlan` when the ID is taken, `InvalidInput` for an empty ID,
    /// `DuplicateStep` when two steps share an ID.
    pub async fn create_plan(&self, params: &CreatePlan) -> Result<Plan> {
        if params.id.trim().is_empty() {
            return Err(CairnError::invalid_input("id").with_reason("plan ID must not be empty"));
        }
        ensure_unique_ids(&params.id, &params.steps)?;
        let params = params.clone();

        let plan = self
            .with_db(move |db| {
                db.create_plan(
                    &params.id,
                    &params.title,
                    params.description.as_deref(),
                    &params.steps,
                    &params.metadata,
                )
            })
            .await?;
        info!("Created plan '{}'", plan.id);
        Ok(plan)
    }

    /// Retrieves a plan by its ID.
    pub async fn get_plan(&self, params: &PlanId) -> Result<Option<Plan>> {
        let plan_id = params.plan_id.clone();
        self.with_db(move |db| db.get_plan(&plan_id)).await
    }

    /// Retrieves a plan by its ID, failing with `PlanNotFound`.
    pub async fn show_plan(&self, params: &PlanId) -> Result<Plan> {
        let plan_id = params.plan_id.clone();
        self.with_db(move |db| db.require_plan(&plan_id)).await
    }

    /// Lists all plans, most recently created first.
    pub async fn list_plans(&self) -> Result<Vec<Plan>> {
        self.with_db(|db| db.list_plans()).await
    }

    /// Edits the working copy. History is untouched; call
    /// [`create_version`](Self::create_version) to record the change.
    pub async fn update_plan(&self, params: &UpdatePlan) -> Result<Plan> {
        if let Some(steps) = &params.steps {
            ensure_unique_ids(&params.plan_id, steps)?;
        }
        let _guard = self.lock_plan(&params.plan_id).await;
        let params = params.clone();

        self.with_db(move |db| {
            let mut plan = db.require_plan(&params.plan_id)?;
            if let Some(title) = params.title {
                plan.title = title;
            }
            if let Some(description) = params.description {
                plan.description = Some(description);
            }
            if let Some(steps) = params.steps {
                plan.steps = steps;
            }
            plan.metadata.extend(params.metadata);

            plan.updated_at = db.update_working_copy(&plan)?;
            Ok(plan)
        })
        .await
    }

    /// Copies a version into a brand-new plan.
    ///
    /// The new plan records `forked_from = <plan>:<version>` in its metadata
    /// and starts with a `v1` holding the copied snapshot.
    pub async fn fork_plan(&self, params: &ForkPlan) -> Result<Plan> {
        if params.new_plan_id.trim().is_empty() {
            return Err(CairnError::invalid_input("new_plan_id")
                .with_reason("plan ID must not be empty"));
        }
        let params = params.clone();

        let plan = self
            .with_db(move |db| {
                let source = db.require_plan(&params.plan_id)?;
                let version_id = match params.version_id {
                    Some(id) => id,
                    None => source.active_version_id.clone().ok_or_else(|| {
                        CairnError::invalid_input("version_id")
                            .with_reason(format!("plan '{}' has no versions", source.id))
                    })?,
                };
                let version = db.require_version(&source.id, &version_id)?;

                let mut metadata = source.metadata.clone();
                metadata.insert(
                    "forked_from".to_string(),
                    format!("{}:{}", source.id, version.version_id),
                );
                let title = params.title.unwrap_or_else(|| source.title.clone());

                db.create_plan(
                    &params.new_plan_id,
                    &title,
                    source.description.as_deref(),
                    &version.steps,
                    &metadata,
                )?;
                db.append_version(
                    &params.new_plan_id,
                    NewVersion {
                        branch: MAIN_BRANCH,
                        description: &format!(
                            "Forked from {} {}",
                            source.id, version.version_id
                        ),
                        steps: &version.steps,
                        merged_from: None,
                    },
                )?;
                db.require_plan(&params.new_plan_id)
            })
            .await?;

        info!("Forked {} into plan '{}'", forked_from(&plan), plan.id);
        Ok(plan)
    }

    /// Reports roots, leaves, stages and any missing reference or cycle of
    /// a version, or of the working copy when no version is given.
    pub async fn analyze_dependencies(&self, params: &AnalyzeDependencies) -> Result<DependencyReport> {
        let params = params.clone();
        self.with_db(move |db| {
            let (version_id, steps) = match params.version_id {
                Some(version_id) => {
                    let version = db.require_version(&params.plan_id, &version_id)?;
                    (Some(version.version_id), version.steps)
                }
                None => {
                    let plan = db.require_plan(&params.plan_id)?;
                    (None, plan.steps)
                }
            };
            Ok(analyze_steps(&params.plan_id, version_id.as_deref(), &steps))
        })
        .await
    }
}

fn forked_from(plan: &Plan) -> &str {
    plan.metadata
        .get("forked_from")
        .map(String::as_str)
        .unwrap_or_default()
}
