use cairn_core::{models::Step, params::CreatePlan, Planner, PlannerBuilder};
use tempfile::TempDir;

/// Helper function to create a test planner
pub async fn create_test_planner() -> (TempDir, Planner) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let planner = PlannerBuilder::new()
        .with_database_path(Some(&db_path))
        .build()
        .await
        .expect("Failed to create planner");
    (temp_dir, planner)
}

/// Parameters for a plan with the given steps and a generated title.
pub fn plan_with_steps(id: &str, steps: Vec<Step>) -> CreatePlan {
    CreatePlan {
        id: id.to_string(),
        title: format!("Plan {id}"),
        steps,
        ..Default::default()
    }
}
