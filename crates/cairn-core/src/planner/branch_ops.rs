//! Branch and merge operations for the Planner.

use log::{info, warn};

use super::Planner;
use crate::{
    db::version_queries::NewVersion,
    error::{CairnError, Result},
    graph::validate_steps,
    history::{three_way_merge, Lineage, MergeOutcome},
    models::{Branch, Plan, Version},
    params::{BranchRef, CreateBranch, MergeBranches, PlanId},
};

impl Planner {
    /// Records a new branch pointing at an existing version (the active one
    /// by default). The current branch does not change.
    pub async fn create_branch(&self, params: &CreateBranch) -> Result<Branch> {
        validate_branch_name(&params.name)?;
        let _guard = self.lock_plan(&params.plan_id).await;
        let params = params.clone();

        let branch = self
            .with_db(move |db| {
                let plan = db.require_plan(&params.plan_id)?;
                let from = match params.from_version_id {
                    Some(version_id) => version_id,
                    None => plan.active_version_id.clone().ok_or_else(|| {
                        CairnError::invalid_input("from_version_id")
                            .with_reason(format!("plan '{}' has no versions", plan.id))
                    })?,
                };
                db.ensure_version_exists(&plan.id, &from)?;
                db.create_branch(&plan.id, &params.name, &from)
            })
            .await?;
        info!(
            "Created branch '{}' of plan '{}' at '{}'",
            branch.name, branch.plan_id, branch.version_id
        );
        Ok(branch)
    }

    /// Lists a plan's branches in creation order.
    pub async fn list_branches(&self, params: &PlanId) -> Result<Vec<Branch>> {
        let plan_id = params.plan_id.clone();
        self.with_db(move |db| {
            db.require_plan(&plan_id)?;
            db.list_branches(&plan_id)
        })
        .await
    }

    /// Makes a branch current and loads its tip into the working copy.
    pub async fn checkout(&self, params: &BranchRef) -> Result<Plan> {
        let _guard = self.lock_plan(&params.plan_id).await;
        let params = params.clone();
        self.with_db(move |db| {
            db.require_plan(&params.plan_id)?;
            db.checkout(&params.plan_id, &params.name)
        })
        .await
    }

    /// Three-way merges the tip of `source` into `target`.
    ///
    /// The base is the nearest common ancestor of both tips. When both
    /// sides changed a step differently, `MergeConflict` lists every such
    /// step and nothing is written. A merge result that fails graph
    /// validation is rejected the same way. On success a version with
    /// `merged_from` set is appended to `target`, which becomes current.
    /// If `source` is already contained in `target`, the target tip is
    /// returned unchanged.
    pub async fn merge(&self, params: &MergeBranches) -> Result<Version> {
        if params.target == params.source {
            return Err(CairnError::invalid_input("source")
                .with_reason("cannot merge a branch into itself"));
        }
        let _guard = self.lock_plan(&params.plan_id).await;
        let params = params.clone();

        self.with_db(move |db| {
            let plan = db.require_plan(&params.plan_id)?;
            let target = db.require_branch(&plan.id, &params.target)?;
            let source = db.require_branch(&plan.id, &params.source)?;
            let versions = db.list_versions(&plan.id)?;
            let lineage = Lineage::new(&versions);

            let target_tip = lineage
                .get(&target.version_id)
                .ok_or_else(|| CairnError::version_not_found(&plan.id, &target.version_id))?;
            let source_tip = lineage
                .get(&source.version_id)
                .ok_or_else(|| CairnError::version_not_found(&plan.id, &source.version_id))?;

            if lineage.ancestors(&target_tip.version_id).contains(source_tip.version_id.as_str()) {
                info!(
                    "Branch '{}' is already merged into '{}' of plan '{}'",
                    source.name, target.name, plan.id
                );
                return Ok(target_tip.clone());
            }

            let base_steps = lineage
                .nearest_common_ancestor(&target_tip.version_id, &source_tip.version_id)
                .map(|base| base.steps.as_slice())
                .unwrap_or_default();

            let merged = match three_way_merge(base_steps, &target_tip.steps, &source_tip.steps) {
                MergeOutcome::Merged(steps) => steps,
                MergeOutcome::Conflicts(step_ids) => {
                    warn!(
                        "Merge of '{}' into '{}' of plan '{}' conflicts on {} step(s)",
                        source.name,
                        target.name,
                        plan.id,
                        step_ids.len()
                    );
                    return Err(CairnError::MergeConflict {
                        plan_id: plan.id.clone(),
                        target: target.name.clone(),
                        source_branch: source.name.clone(),
                        step_ids,
                    });
                }
            };
            validate_steps(&plan.id, &merged)?;

            let description = params
                .description
                .unwrap_or_else(|| format!("Merge branch '{}' into '{}'", source.name, target.name));
            db.append_version(
                &plan.id,
                NewVersion {
                    branch: &target.name,
                    description: &description,
                    steps: &merged,
                    merged_from: Some(&source_tip.version_id),
                },
            )
        })
        .await
    }
}

fn validate_branch_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(CairnError::invalid_input("name").with_reason("branch name must not be empty"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(CairnError::invalid_input("name")
            .with_reason(format!("branch name '{name}' must not contain whitespace")));
    }
    Ok(())
}
