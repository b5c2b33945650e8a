//! Version history operations for the Planner.

use jiff::Timestamp;
use log::{debug, info};

use super::Planner;
use crate::{
    db::{version_queries::NewVersion, Database},
    error::{CairnError, Result},
    graph::ensure_unique_ids,
    history::compare_versions,
    models::{Version, VersionDiff, VersionDocument},
    params::{AnnotateVersion, CompareVersions, CreateVersion, PlanId, TagVersion, VersionRef},
};

impl Planner {
    /// Snapshots the working copy as a new version.
    ///
    /// The version extends `params.branch` (or the current branch), its
    /// parent is that branch's tip, and the branch becomes current. The
    /// first version of a plan creates the branch.
    ///
    /// # Errors
    ///
    /// `PlanNotFound`, `BranchNotFound` for an unknown branch once history
    /// exists, and `DuplicateStep` when two steps share an ID.
    pub async fn create_version(&self, params: &CreateVersion) -> Result<Version> {
        let _guard = self.lock_plan(&params.plan_id).await;
        let params = params.clone();

        self.with_db(move |db| {
            let plan = db.require_plan(&params.plan_id)?;
            ensure_unique_ids(&plan.id, &plan.steps)?;
            let branch = params.branch.as_deref().unwrap_or(&plan.current_branch);

            db.append_version(
                &plan.id,
                NewVersion {
                    branch,
                    description: &params.description,
                    steps: &plan.steps,
                    merged_from: None,
                },
            )
        })
        .await
    }

    /// Lists a plan's versions in creation order.
    pub async fn list_versions(&self, params: &PlanId) -> Result<Vec<Version>> {
        let plan_id = params.plan_id.clone();
        self.with_db(move |db| {
            db.require_plan(&plan_id)?;
            db.list_versions(&plan_id)
        })
        .await
    }

    /// Retrieves one version.
    pub async fn get_version(&self, params: &VersionRef) -> Result<Version> {
        let params = params.clone();
        self.with_db(move |db| {
            db.require_plan(&params.plan_id)?;
            db.require_version(&params.plan_id, &params.version_id)
        })
        .await
    }

    /// The version the working copy was last synchronised with, if any.
    pub async fn get_active_version(&self, params: &PlanId) -> Result<Option<Version>> {
        let plan_id = params.plan_id.clone();
        self.with_db(move |db| {
            let plan = db.require_plan(&plan_id)?;
            plan.active_version_id
                .map(|version_id| db.require_version(&plan_id, &version_id))
                .transpose()
        })
        .await
    }

    /// Diffs two versions of a plan.
    pub async fn compare_versions(&self, params: &CompareVersions) -> Result<VersionDiff> {
        let params = params.clone();
        self.with_db(move |db| {
            db.require_plan(&params.plan_id)?;
            let from = db.require_version(&params.plan_id, &params.from_version_id)?;
            let to = db.require_version(&params.plan_id, &params.to_version_id)?;
            let diff = compare_versions(&from, &to);
            debug!(
                "Compared {} -> {} of plan '{}': {} added, {} removed, {} modified",
                from.version_id,
                to.version_id,
                params.plan_id,
                diff.added.len(),
                diff.removed.len(),
                diff.modified.len()
            );
            Ok(diff)
        })
        .await
    }

    /// Restores an earlier snapshot by appending a copy of it as a new
    /// version on the current branch. Nothing is deleted.
    pub async fn rollback(&self, params: &VersionRef) -> Result<Version> {
        let _guard = self.lock_plan(&params.plan_id).await;
        let params = params.clone();

        let version = self
            .with_db(move |db| {
                let plan = db.require_plan(&params.plan_id)?;
                let target = db.require_version(&plan.id, &params.version_id)?;
                db.append_version(
                    &plan.id,
                    NewVersion {
                        branch: &plan.current_branch,
                        description: &format!("Rollback to {}", target.version_id),
                        steps: &target.steps,
                        merged_from: None,
                    },
                )
            })
            .await?;
        info!(
            "Rolled back plan '{}' on branch '{}' as '{}'",
            version.plan_id, version.branch, version.version_id
        );
        Ok(version)
    }

    /// Attaches a tag to a version. Tagging twice is a no-op; the return
    /// value tells whether the tag was new.
    pub async fn tag_version(&self, params: &TagVersion) -> Result<bool> {
        if params.tag.trim().is_empty() {
            return Err(CairnError::invalid_input("tag").with_reason("tag must not be empty"));
        }
        let params = params.clone();
        self.with_db(move |db| {
            db.require_plan(&params.plan_id)?;
            db.add_tag(&params.plan_id, &params.version_id, &params.tag)
        })
        .await
    }

    /// Sets a key/value annotation on a version. The snapshot is unchanged.
    pub async fn annotate_version(&self, params: &AnnotateVersion) -> Result<()> {
        if params.key.trim().is_empty() {
            return Err(CairnError::invalid_input("key").with_reason("key must not be empty"));
        }
        let params = params.clone();
        self.with_db(move |db| {
            db.require_plan(&params.plan_id)?;
            db.set_annotation(&params.plan_id, &params.version_id, &params.key, &params.value)
        })
        .await
    }

    /// The persisted JSON document of a version, with its current tags.
    pub async fn export_version(&self, params: &VersionRef) -> Result<VersionDocument> {
        Ok(self.get_version(params).await?.to_document())
    }

    /// Records the outcome of a run on the executed version.
    pub(crate) async fn record_run(
        &self,
        plan_id: &str,
        version_id: &str,
        status: &str,
        finished_at: Timestamp,
    ) -> Result<()> {
        let (plan_id, version_id, status) =
            (plan_id.to_string(), version_id.to_string(), status.to_string());
        self.with_db(move |db| record_run(db, &plan_id, &version_id, &status, finished_at))
            .await
    }
}

fn record_run(
    db: &mut Database,
    plan_id: &str,
    version_id: &str,
    status: &str,
    finished_at: Timestamp,
) -> Result<()> {
    db.set_annotation(plan_id, version_id, "last_run_status", status)?;
    db.set_annotation(plan_id, version_id, "last_run_at", &finished_at.to_string())
}
