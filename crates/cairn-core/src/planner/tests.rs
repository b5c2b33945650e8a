//! Tests for the planner module.

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tempfile::TempDir;

use super::*;
use crate::{
    models::{Step, MAIN_BRANCH},
    params::{
        AnalyzeDependencies, AnnotateVersion, BranchRef, CompareVersions, CreateBranch,
        CreatePlan, CreateVersion, ExecuteVersion, ForkPlan, MergeBranches, PlanId, TagVersion,
        UpdatePlan, VersionRef,
    },
    scheduler::{DryRunExecutor, SchedulerConfig, StepExecutor, StepOutcome, StepRequest},
};

/// Helper function to create a test planner
async fn create_test_planner() -> (TempDir, Planner) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let planner = PlannerBuilder::new()
        .with_database_path(Some(&db_path))
        .build()
        .await
        .expect("Failed to create planner");
    (temp_dir, planner)
}

fn plan_id() -> PlanId {
    PlanId {
        plan_id: "plan_1".to_string(),
    }
}

fn version_ref(version_id: &str) -> VersionRef {
    VersionRef {
        plan_id: "plan_1".to_string(),
        version_id: version_id.to_string(),
    }
}

async fn create_plan(planner: &Planner, steps: Vec<Step>) {
    planner
        .create_plan(&CreatePlan {
            id: "plan_1".to_string(),
            title: "Launch".to_string(),
            steps,
            ..Default::default()
        })
        .await
        .expect("Failed to create plan");
}

async fn snapshot(planner: &Planner, description: &str) -> crate::models::Version {
    planner
        .create_version(&CreateVersion {
            plan_id: "plan_1".to_string(),
            description: description.to_string(),
            branch: None,
        })
        .await
        .expect("Failed to create version")
}

async fn replace_steps(planner: &Planner, steps: Vec<Step>) {
    planner
        .update_plan(&UpdatePlan {
            plan_id: "plan_1".to_string(),
            steps: Some(steps),
            ..Default::default()
        })
        .await
        .expect("Failed to update plan");
}

fn base_steps() -> Vec<Step> {
    vec![
        Step::new("1", "Research"),
        Step::new("2", "Design"),
        Step::new("3", "Build").depends_on(["1", "2"]),
    ]
}

#[tokio::test]
async fn test_create_plan_has_no_history() {
    let (_temp_dir, planner) = create_test_planner().await;
    create_plan(&planner, base_steps()).await;

    let plan = planner.show_plan(&plan_id()).await.unwrap();
    assert_eq!(plan.steps.len(), 3);
    assert_eq!(plan.current_branch, MAIN_BRANCH);
    assert!(plan.active_version_id.is_none());
    assert!(planner.list_versions(&plan_id()).await.unwrap().is_empty());
    assert!(planner.get_active_version(&plan_id()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_plan_rejected() {
    let (_temp_dir, planner) = create_test_planner().await;
    create_plan(&planner, vec![]).await;

    let err = planner
        .create_plan(&CreatePlan {
            id: "plan_1".to_string(),
            title: "Again".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CairnError::DuplicatePlan { ref plan_id } if plan_id == "plan_1"));

    let err = planner
        .create_plan(&CreatePlan {
            id: "  ".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CairnError::InvalidInput { .. }));
}

#[tokio::test]
async fn test_unknown_plan_and_version() {
    let (_temp_dir, planner) = create_test_planner().await;

    assert!(planner.get_plan(&plan_id()).await.unwrap().is_none());
    let err = planner.list_versions(&plan_id()).await.unwrap_err();
    assert!(matches!(err, CairnError::PlanNotFound { .. }));

    create_plan(&planner, base_steps()).await;
    let err = planner.get_version(&version_ref("v7")).await.unwrap_err();
    assert!(
        matches!(err, CairnError::VersionNotFound { ref version_id, .. } if version_id == "v7")
    );
}

#[tokio::test]
async fn test_versions_are_sequential_and_chained() {
    let (_temp_dir, planner) = create_test_planner().await;
    create_plan(&planner, base_steps()).await;

    let v1 = snapshot(&planner, "initial").await;
    let v2 = snapshot(&planner, "unchanged").await;

    assert_eq!(v1.version_id, "v1");
    assert!(v1.parent_version_id.is_none());
    assert_eq!(v2.version_id, "v2");
    assert_eq!(v2.parent_version_id.as_deref(), Some("v1"));

    let plan = planner.show_plan(&plan_id()).await.unwrap();
    assert_eq!(plan.active_version_id.as_deref(), Some("v2"));
    assert_eq!(plan.branches.get(MAIN_BRANCH).map(String::as_str), Some("v2"));
}

#[tokio::test]
async fn test_duplicate_step_ids_rejected_in_working_copy() {
    let (_temp_dir, planner) = create_test_planner().await;
    let duplicated = vec![Step::new("1", "Research"), Step::new("1", "Again")];

    let err = planner
        .create_plan(&CreatePlan {
            id: "plan_1".to_string(),
            title: "Launch".to_string(),
            steps: duplicated.clone(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CairnError::DuplicateStep { ref step_id, .. } if step_id == "1"));
    assert!(planner.get_plan(&plan_id()).await.unwrap().is_none());

    create_plan(&planner, base_steps()).await;
    let err = planner
        .update_plan(&UpdatePlan {
            plan_id: "plan_1".to_string(),
            steps: Some(duplicated),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CairnError::DuplicateStep { ref step_id, .. } if step_id == "1"));

    let plan = planner.show_plan(&plan_id()).await.unwrap();
    assert_eq!(plan.steps, base_steps());
    let report = planner
        .analyze_dependencies(&AnalyzeDependencies {
            plan_id: "plan_1".to_string(),
            version_id: None,
        })
        .await
        .unwrap();
    assert!(report.duplicates.is_empty());
}

#[tokio::test]
async fn test_rollback_appends_copy_and_diff_shows_revert() {
    let (_temp_dir, planner) = create_test_planner().await;
    create_plan(&planner, base_steps()).await;
    let v1 = snapshot(&planner, "initial").await;

    let mut edited = base_steps();
    edited[1].description = "Design review".to_string();
    edited.push(Step::new("4", "Ship").depends_on(["3"]));
    replace_steps(&planner, edited).await;
    let v2 = snapshot(&planner, "added ship").await;

    let v3 = planner.rollback(&version_ref("v1")).await.unwrap();
    assert_eq!(v3.version_id, "v3");
    assert_eq!(v3.parent_version_id.as_deref(), Some("v2"));
    assert_eq!(v3.steps, v1.steps);
    assert_eq!(v3.description, "Rollback to v1");

    let diff = planner
        .compare_versions(&CompareVersions {
            plan_id: "plan_1".to_string(),
            from_version_id: v2.version_id.clone(),
            to_version_id: v3.version_id.clone(),
        })
        .await
        .unwrap();
    assert_eq!(diff.removed, vec!["4".to_string()]);
    assert!(diff.added.is_empty());
    assert_eq!(diff.modified.len(), 1);
    assert_eq!(diff.modified[0].step_id, "2");

    let same = planner
        .compare_versions(&CompareVersions {
            plan_id: "plan_1".to_string(),
            from_version_id: "v1".to_string(),
            to_version_id: "v3".to_string(),
        })
        .await
        .unwrap();
    assert!(same.is_empty());

    // History is intact and the working copy follows the rollback.
    assert_eq!(planner.list_versions(&plan_id()).await.unwrap().len(), 3);
    let plan = planner.show_plan(&plan_id()).await.unwrap();
    assert_eq!(plan.steps, v1.steps);
}

#[tokio::test]
async fn test_tags_are_idempotent_and_annotations_overwrite() {
    let (_temp_dir, planner) = create_test_planner().await;
    create_plan(&planner, base_steps()).await;
    snapshot(&planner, "initial").await;

    let tag = TagVersion {
        plan_id: "plan_1".to_string(),
        version_id: "v1".to_string(),
        tag: "stable".to_string(),
    };
    assert!(planner.tag_version(&tag).await.unwrap());
    assert!(!planner.tag_version(&tag).await.unwrap());

    for value in ["alice", "bob"] {
        planner
            .annotate_version(&AnnotateVersion {
                plan_id: "plan_1".to_string(),
                version_id: "v1".to_string(),
                key: "reviewer".to_string(),
                value: value.to_string(),
            })
            .await
            .unwrap();
    }

    let v1 = planner.get_version(&version_ref("v1")).await.unwrap();
    assert_eq!(v1.tags.len(), 1);
    assert_eq!(v1.annotations.get("reviewer").map(String::as_str), Some("bob"));

    let document = planner.export_version(&version_ref("v1")).await.unwrap();
    assert_eq!(document.tags, vec!["stable".to_string()]);

    let err = planner
        .tag_version(&TagVersion {
            version_id: "v9".to_string(),
            ..tag
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CairnError::VersionNotFound { .. }));
}

#[tokio::test]
async fn test_branch_and_checkout() {
    let (_temp_dir, planner) = create_test_planner().await;
    create_plan(&planner, base_steps()).await;
    snapshot(&planner, "initial").await;

    let branch = planner
        .create_branch(&CreateBranch {
            plan_id: "plan_1".to_string(),
            name: "experiment".to_string(),
            from_version_id: None,
        })
        .await
        .unwrap();
    assert_eq!(branch.version_id, "v1");

    let err = planner
        .create_branch(&CreateBranch {
            plan_id: "plan_1".to_string(),
            name: "experiment".to_string(),
            from_version_id: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CairnError::DuplicateBranch { .. }));

    // Creating a branch does not switch to it.
    let plan = planner.show_plan(&plan_id()).await.unwrap();
    assert_eq!(plan.current_branch, MAIN_BRANCH);

    let plan = planner
        .checkout(&BranchRef {
            plan_id: "plan_1".to_string(),
            name: "experiment".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(plan.current_branch, "experiment");

    replace_steps(&planner, vec![Step::new("1", "Research")]).await;
    let v2 = snapshot(&planner, "trimmed").await;
    assert_eq!(v2.branch, "experiment");
    assert_eq!(v2.parent_version_id.as_deref(), Some("v1"));

    // Main still points at v1; checking it out restores its snapshot.
    let plan = planner
        .checkout(&BranchRef {
            plan_id: "plan_1".to_string(),
            name: MAIN_BRANCH.to_string(),
        })
        .await
        .unwrap();
    assert_eq!(plan.active_version_id.as_deref(), Some("v1"));
    assert_eq!(plan.steps.len(), 3);

    let branches = planner.list_branches(&plan_id()).await.unwrap();
    let names: Vec<&str> = branches.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec![MAIN_BRANCH, "experiment"]);

    let err = planner
        .checkout(&BranchRef {
            plan_id: "plan_1".to_string(),
            name: "missing".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CairnError::BranchNotFound { .. }));
}

/// main: v1 -> v3 (edits step 1), experiment: v1 -> v2 (adds step 4).
async fn diverge(planner: &Planner, main_step_1: &str, experiment_step_1: Option<&str>) {
    create_plan(planner, base_steps()).await;
    snapshot(planner, "initial").await;
    planner
        .create_branch(&CreateBranch {
            plan_id: "plan_1".to_string(),
            name: "experiment".to_string(),
            from_version_id: Some("v1".to_string()),
        })
        .await
        .unwrap();

    planner
        .checkout(&BranchRef {
            plan_id: "plan_1".to_string(),
            name: "experiment".to_string(),
        })
        .await
        .unwrap();
    let mut steps = base_steps();
    if let Some(description) = experiment_step_1 {
        steps[0].description = description.to_string();
    }
    steps.push(Step::new("4", "Ship").depends_on(["3"]));
    replace_steps(planner, steps).await;
    snapshot(planner, "experiment").await;

    planner
        .checkout(&BranchRef {
            plan_id: "plan_1".to_string(),
            name: MAIN_BRANCH.to_string(),
        })
        .await
        .unwrap();
    let mut steps = base_steps();
    steps[0].description = main_step_1.to_string();
    replace_steps(planner, steps).await;
    snapshot(planner, "main edit").await;
}

fn merge_params() -> MergeBranches {
    MergeBranches {
        plan_id: "plan_1".to_string(),
        target: MAIN_BRANCH.to_string(),
        source: "experiment".to_string(),
        description: None,
    }
}

#[tokio::test]
async fn test_clean_merge_combines_both_sides() {
    let (_temp_dir, planner) = create_test_planner().await;
    diverge(&planner, "Deep research", None).await;

    let merged = planner.merge(&merge_params()).await.unwrap();
    assert_eq!(merged.version_id, "v4");
    assert_eq!(merged.branch, MAIN_BRANCH);
    assert_eq!(merged.parent_version_id.as_deref(), Some("v3"));
    assert_eq!(merged.merged_from.as_deref(), Some("v2"));

    let ids: Vec<&str> = merged.steps.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4"]);
    assert_eq!(merged.steps[0].description, "Deep research");

    // Merging again is a no-op.
    let again = planner.merge(&merge_params()).await.unwrap();
    assert_eq!(again.version_id, "v4");
    assert_eq!(planner.list_versions(&plan_id()).await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_conflicting_merge_creates_nothing() {
    let (_temp_dir, planner) = create_test_planner().await;
    diverge(&planner, "Deep research", Some("Quick research")).await;

    let err = planner.merge(&merge_params()).await.unwrap_err();
    match err {
        CairnError::MergeConflict { step_ids, .. } => assert_eq!(step_ids, vec!["1".to_string()]),
        other => panic!("expected merge conflict, got {other:?}"),
    }
    assert_eq!(planner.list_versions(&plan_id()).await.unwrap().len(), 3);

    let err = planner
        .merge(&MergeBranches {
            source: MAIN_BRANCH.to_string(),
            ..merge_params()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CairnError::InvalidInput { .. }));
}

#[tokio::test]
async fn test_fork_copies_version_into_new_plan() {
    let (_temp_dir, planner) = create_test_planner().await;
    create_plan(&planner, base_steps()).await;
    let v1 = snapshot(&planner, "initial").await;

    let fork = planner
        .fork_plan(&ForkPlan {
            plan_id: "plan_1".to_string(),
            version_id: None,
            new_plan_id: "plan_2".to_string(),
            title: Some("Launch copy".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(fork.id, "plan_2");
    assert_eq!(fork.title, "Launch copy");
    assert_eq!(fork.active_version_id.as_deref(), Some("v1"));
    assert_eq!(fork.steps, v1.steps);
    assert_eq!(
        fork.metadata.get("forked_from").map(String::as_str),
        Some("plan_1:v1")
    );

    // The source is untouched.
    assert_eq!(planner.list_versions(&plan_id()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_analyze_working_copy_reports_problems() {
    let (_temp_dir, planner) = create_test_planner().await;
    create_plan(
        &planner,
        vec![
            Step::new("1", "Research"),
            Step::new("2", "Build").depends_on(["1", "9"]),
        ],
    )
    .await;

    let report = planner
        .analyze_dependencies(&AnalyzeDependencies {
            plan_id: "plan_1".to_string(),
            version_id: None,
        })
        .await
        .unwrap();
    assert!(!report.is_executable());
    assert_eq!(report.missing.len(), 1);
    assert_eq!(report.missing[0].missing_ref, "9");
    assert!(report.version_id.is_none());
}

#[tokio::test]
async fn test_execute_version_records_outcome() {
    let (_temp_dir, planner) = create_test_planner().await;
    create_plan(&planner, base_steps()).await;
    snapshot(&planner, "initial").await;

    let run = planner
        .execute_version(
            &ExecuteVersion {
                plan_id: "plan_1".to_string(),
                ..Default::default()
            },
            Arc::new(DryRunExecutor),
            SchedulerConfig::default(),
        )
        .await
        .unwrap();
    assert!(run.is_success());
    assert_eq!(run.version_id, "v1");
    assert_eq!(run.tasks.len(), 3);

    let v1 = planner.get_version(&version_ref("v1")).await.unwrap();
    assert_eq!(
        v1.annotations.get("last_run_status").map(String::as_str),
        Some("succeeded")
    );
    assert!(v1.annotations.contains_key("last_run_at"));
    // Annotations never touch the snapshot.
    assert_eq!(v1.steps, base_steps());
}

#[tokio::test]
async fn test_execute_without_versions_is_rejected() {
    let (_temp_dir, planner) = create_test_planner().await;
    create_plan(&planner, base_steps()).await;

    let err = planner
        .build_task_graph(&ExecuteVersion {
            plan_id: "plan_1".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CairnError::InvalidInput { ref field, .. } if field == "version_id"));
}

#[tokio::test]
async fn test_handlers_wrap_results() {
    let (_temp_dir, planner) = create_test_planner().await;
    let created = planner
        .create_plan_result(&CreatePlan {
            id: "plan_1".to_string(),
            title: "Launch".to_string(),
            steps: base_steps(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(created.to_string().starts_with("Created plan 'plan_1'"));

    let updated = planner
        .update_plan_result(&UpdatePlan {
            plan_id: "plan_1".to_string(),
            title: Some("Launch v2".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(updated.changes, vec!["Updated title".to_string()]);
    assert_eq!(updated.resource.title, "Launch v2");

    let version = planner
        .create_version_result(&CreateVersion {
            plan_id: "plan_1".to_string(),
            description: "initial".to_string(),
            branch: None,
        })
        .await
        .unwrap();
    assert_eq!(version.resource.version_id, "v1");

    let versions = planner.list_versions_display(&plan_id()).await.unwrap();
    assert_eq!(versions.len(), 1);

    let status = planner
        .tag_version_status(&TagVersion {
            plan_id: "plan_1".to_string(),
            version_id: "v1".to_string(),
            tag: "stable".to_string(),
        })
        .await
        .unwrap();
    assert!(status.success);

    let plans = planner.list_plans_display().await.unwrap();
    assert_eq!(plans.len(), 1);
}

#[tokio::test]
async fn test_concurrent_snapshots_get_distinct_sequences() {
    let (_temp_dir, planner) = create_test_planner().await;
    create_plan(&planner, base_steps()).await;
    snapshot(&planner, "initial").await;

    let planner = Arc::new(planner);
    let handles: Vec<_> = (0..5)
        .map(|n| {
            let planner = Arc::clone(&planner);
            tokio::spawn(async move {
                planner
                    .create_version(&CreateVersion {
                        plan_id: "plan_1".to_string(),
                        description: format!("concurrent {n}"),
                        branch: None,
                    })
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let versions = planner.list_versions(&plan_id()).await.unwrap();
    let ids: Vec<&str> = versions.iter().map(|v| v.version_id.as_str()).collect();
    assert_eq!(ids, vec!["v1", "v2", "v3", "v4", "v5", "v6"]);
    // Each snapshot extends the previous tip, so the lineage is a chain.
    for pair in versions.windows(2) {
        assert_eq!(
            pair[1].parent_version_id.as_deref(),
            Some(pair[0].version_id.as_str())
        );
    }
}

/// Deletes the database file while the run is in progress.
struct RemovesDatabase(PathBuf);

#[async_trait]
impl StepExecutor for RemovesDatabase {
    async fn execute(&self, request: StepRequest) -> StepOutcome {
        let _ = std::fs::remove_file(&self.0);
        StepOutcome::success(request.description)
    }
}

#[tokio::test]
async fn test_run_result_survives_failed_status_write() {
    let (_temp_dir, planner) = create_test_planner().await;
    create_plan(&planner, vec![Step::new("1", "Research")]).await;
    snapshot(&planner, "initial").await;

    let executor = Arc::new(RemovesDatabase(planner.db_path.clone()));
    let run = planner
        .execute_version(
            &ExecuteVersion {
                plan_id: "plan_1".to_string(),
                ..Default::default()
            },
            executor,
            SchedulerConfig::default(),
        )
        .await
        .expect("run result despite lost database");

    assert!(run.is_success());
    assert_eq!(run.version_id, "v1");
    assert!(planner.get_plan(&plan_id()).await.unwrap().is_none());
}
