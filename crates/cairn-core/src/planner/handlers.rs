//! Handler operations that return display wrapper types for the Planner.
//!
//! These are thin adapters over the operations in `plan_ops`,
//! `version_ops` and `branch_ops`, shaped for interfaces that print
//! results rather than inspect them.

use super::Planner;
use crate::{
    display::{Branches, CreateResult, OperationStatus, Plans, UpdateResult, Versions},
    error::Result,
    models::{Branch, Plan, Version},
    params::{
        AnnotateVersion, CreateBranch, CreatePlan, CreateVersion, PlanId, TagVersion, UpdatePlan,
    },
};

impl Planner {
    /// Creates a plan and wraps it for confirmation output.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use cairn_core::{params::CreatePlan, PlannerBuilder};
    /// # async {
    /// let planner = PlannerBuilder::new().build().await?;
    /// let params = CreatePlan {
    ///     id: "plan_1".to_string(),
    ///     title: "Launch".to_string(),
    ///     ..Default::default()
    /// };
    /// let result = planner.create_plan_result(&params).await?;
    /// println!("{result}");
    /// # Result::<(), cairn_core::CairnError>::Ok(())
    /// # };
    /// ```
    pub async fn create_plan_result(&self, params: &CreatePlan) -> Result<CreateResult<Plan>> {
        Ok(CreateResult::new(self.create_plan(params).await?))
    }

    /// Updates the working copy and lists which parts changed.
    pub async fn update_plan_result(&self, params: &UpdatePlan) -> Result<UpdateResult<Plan>> {
        let mut changes = Vec::new();
        if params.title.is_some() {
            changes.push("Updated title".to_string());
        }
        if params.description.is_some() {
            changes.push("Updated description".to_string());
        }
        if let Some(steps) = &params.steps {
            changes.push(format!("Replaced steps ({} total)", steps.len()));
        }
        for key in params.metadata.keys() {
            changes.push(format!("Set metadata '{key}'"));
        }

        let plan = self.update_plan(params).await?;
        Ok(UpdateResult::with_changes(plan, changes))
    }

    pub async fn list_plans_display(&self) -> Result<Plans> {
        Ok(Plans(self.list_plans().await?))
    }

    pub async fn create_version_result(
        &self,
        params: &CreateVersion,
    ) -> Result<CreateResult<Version>> {
        Ok(CreateResult::new(self.create_version(params).await?))
    }

    pub async fn list_versions_display(&self, params: &PlanId) -> Result<Versions> {
        Ok(Versions(self.list_versions(params).await?))
    }

    pub async fn create_branch_result(&self, params: &CreateBranch) -> Result<CreateResult<Branch>> {
        Ok(CreateResult::new(self.create_branch(params).await?))
    }

    pub async fn list_branches_display(&self, params: &PlanId) -> Result<Branches> {
        Ok(Branches(self.list_branches(params).await?))
    }

    /// Tags a version, reporting a repeated tag as a notice rather than an
    /// error.
    pub async fn tag_version_status(&self, params: &TagVersion) -> Result<OperationStatus> {
        let status = if self.tag_version(params).await? {
            OperationStatus::success(format!(
                "Tagged {} of plan '{}' as '{}'",
                params.version_id, params.plan_id, params.tag
            ))
        } else {
            OperationStatus::failure(format!(
                "{} of plan '{}' is already tagged '{}'",
                params.version_id, params.plan_id, params.tag
            ))
        };
        Ok(status)
    }

    pub async fn annotate_version_status(
        &self,
        params: &AnnotateVersion,
    ) -> Result<OperationStatus> {
        self.annotate_version(params).await?;
        Ok(OperationStatus::success(format!(
            "Set '{}' on {} of plan '{}'",
            params.key, params.version_id, params.plan_id
        )))
    }
}
