use std::collections::BTreeMap;

use cairn_core::{db::version_queries::NewVersion, models::Step, CairnError, Database};
use tempfile::NamedTempFile;

/// Helper function to create a temporary database for testing
fn create_test_db() -> (NamedTempFile, Database) {
    let temp_file = NamedTempFile::new().expect("Failed to create temporary file");
    let db = Database::new(temp_file.path()).expect("Failed to create test database");
    (temp_file, db)
}

fn steps() -> Vec<Step> {
    vec![
        Step::new("1", "Research"),
        Step::new("2", "Build").depends_on(["1"]),
    ]
}

fn new_version<'a>(branch: &'a str, steps: &'a [Step]) -> NewVersion<'a> {
    NewVersion {
        branch,
        description: "snapshot",
        steps,
        merged_from: None,
    }
}

#[test]
fn test_create_and_get_plan() {
    let (_temp_file, mut db) = create_test_db();
    let mut metadata = BTreeMap::new();
    metadata.insert("owner".to_string(), "ops".to_string());

    let plan = db
        .create_plan("plan_1", "Launch", Some("Q3 launch"), &steps(), &metadata)
        .expect("Failed to create plan");
    assert_eq!(plan.id, "plan_1");
    assert_eq!(plan.current_branch, "main");

    let fetched = db.get_plan("plan_1").unwrap().expect("plan exists");
    assert_eq!(fetched.steps, steps());
    assert_eq!(fetched.metadata, metadata);
    assert_eq!(fetched.description.as_deref(), Some("Q3 launch"));
    assert!(db.get_plan("plan_2").unwrap().is_none());

    let err = db
        .create_plan("plan_1", "Again", None, &[], &BTreeMap::new())
        .unwrap_err();
    assert!(matches!(err, CairnError::DuplicatePlan { .. }));
}

#[test]
fn test_list_plans_newest_first() {
    let (_temp_file, mut db) = create_test_db();
    for id in ["a", "b", "c"] {
        db.create_plan(id, id, None, &[], &BTreeMap::new()).unwrap();
    }
    let ids: Vec<String> = db.list_plans().unwrap().into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec!["c", "b", "a"]);
}

#[test]
fn test_append_version_allocates_sequence_and_moves_tip() {
    let (_temp_file, mut db) = create_test_db();
    db.create_plan("plan_1", "Launch", None, &steps(), &BTreeMap::new())
        .unwrap();

    let snapshot = steps();
    let v1 = db.append_version("plan_1", new_version("main", &snapshot)).unwrap();
    let v2 = db.append_version("plan_1", new_version("main", &snapshot[..1])).unwrap();

    assert_eq!((v1.version_id.as_str(), v1.sequence), ("v1", 1));
    assert_eq!((v2.version_id.as_str(), v2.sequence), ("v2", 2));
    assert_eq!(v2.parent_version_id.as_deref(), Some("v1"));

    let plan = db.require_plan("plan_1").unwrap();
    assert_eq!(plan.active_version_id.as_deref(), Some("v2"));
    assert_eq!(plan.steps.len(), 1);
    assert_eq!(plan.branches.get("main").map(String::as_str), Some("v2"));

    let stored = db.require_version("plan_1", "v1").unwrap();
    assert_eq!(stored.steps, snapshot);
}

#[test]
fn test_append_to_unknown_branch_after_first_version() {
    let (_temp_file, mut db) = create_test_db();
    db.create_plan("plan_1", "Launch", None, &[], &BTreeMap::new())
        .unwrap();
    db.append_version("plan_1", new_version("main", &[])).unwrap();

    let err = db
        .append_version("plan_1", new_version("ghost", &[]))
        .unwrap_err();
    assert!(matches!(err, CairnError::BranchNotFound { ref branch, .. } if branch == "ghost"));

    let err = db
        .append_version("plan_9", new_version("main", &[]))
        .unwrap_err();
    assert!(matches!(err, CairnError::PlanNotFound { .. }));
}

#[test]
fn test_sequences_are_per_plan() {
    let (_temp_file, mut db) = create_test_db();
    for id in ["a", "b"] {
        db.create_plan(id, id, None, &[], &BTreeMap::new()).unwrap();
    }
    db.append_version("a", new_version("main", &[])).unwrap();
    db.append_version("a", new_version("main", &[])).unwrap();
    let first_of_b = db.append_version("b", new_version("main", &[])).unwrap();
    assert_eq!(first_of_b.version_id, "v1");
}

#[test]
fn test_labels_do_not_touch_snapshot() {
    let (_temp_file, mut db) = create_test_db();
    db.create_plan("plan_1", "Launch", None, &steps(), &BTreeMap::new())
        .unwrap();
    let snapshot = steps();
    let v1 = db.append_version("plan_1", new_version("main", &snapshot)).unwrap();

    assert!(db.add_tag("plan_1", "v1", "stable").unwrap());
    assert!(!db.add_tag("plan_1", "v1", "stable").unwrap());
    db.set_annotation("plan_1", "v1", "reviewer", "alice").unwrap();

    let labelled = db.require_version("plan_1", "v1").unwrap();
    assert_eq!(labelled.steps, v1.steps);
    assert_eq!(labelled.created_at, v1.created_at);
    assert!(labelled.tags.contains("stable"));
    assert_eq!(labelled.annotations["reviewer"], "alice");

    let err = db.add_tag("plan_1", "v5", "stable").unwrap_err();
    assert!(matches!(err, CairnError::VersionNotFound { .. }));
}

#[test]
fn test_branch_create_and_checkout() {
    let (_temp_file, mut db) = create_test_db();
    db.create_plan("plan_1", "Launch", None, &steps(), &BTreeMap::new())
        .unwrap();
    let snapshot = steps();
    db.append_version("plan_1", new_version("main", &snapshot)).unwrap();

    let branch = db.create_branch("plan_1", "experiment", "v1").unwrap();
    assert_eq!(branch.version_id, "v1");
    let err = db.create_branch("plan_1", "experiment", "v1").unwrap_err();
    assert!(matches!(err, CairnError::DuplicateBranch { .. }));

    let plan = db.checkout("plan_1", "experiment").unwrap();
    assert_eq!(plan.current_branch, "experiment");
    assert_eq!(plan.active_version_id.as_deref(), Some("v1"));

    let v2 = db
        .append_version("plan_1", new_version("experiment", &snapshot[..1]))
        .unwrap();
    assert_eq!(v2.branch, "experiment");
    assert_eq!(db.require_branch("plan_1", "main").unwrap().version_id, "v1");
    assert_eq!(
        db.require_branch("plan_1", "experiment").unwrap().version_id,
        "v2"
    );

    let names: Vec<String> = db
        .list_branches("plan_1")
        .unwrap()
        .into_iter()
        .map(|b| b.name)
        .collect();
    assert_eq!(names, vec!["main", "experiment"]);
}
