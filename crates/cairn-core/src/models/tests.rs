#[cfg(test)]
mod model_tests {
    use std::str::FromStr;

    use jiff::Timestamp;
    use serde_json::json;

    use crate::models::{Step, StepStatusHint, Task, TaskStatus, Version, VersionDocument};

    fn create_test_version() -> Version {
        Version {
            plan_id: "plan_1".to_string(),
            version_id: "v2".to_string(),
            sequence: 2,
            parent_version_id: Some("v1".to_string()),
            merged_from: None,
            branch: "main".to_string(),
            description: "added export step".to_string(),
            steps: vec![
                Step::new("1", "Research"),
                Step::new("2", "Export").depends_on(["1"]),
            ],
            tags: ["stable".to_string()].into_iter().collect(),
            annotations: Default::default(),
            created_at: Timestamp::from_second(1745457360).unwrap(),
        }
    }

    #[test]
    fn test_step_serializes_dependencies_field() {
        let step = Step::new("2", "Export").depends_on(["1"]);
        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(
            value,
            json!({"id": "2", "description": "Export", "dependencies": ["1"]})
        );

        let parsed: Step = serde_json::from_value(json!({"id": "1", "description": "Research"}))
            .expect("dependencies default to empty");
        assert!(parsed.dependency_step_ids.is_empty());
        assert_eq!(parsed.status_hint, StepStatusHint::NotStarted);
    }

    #[test]
    fn test_same_content_ignores_hints() {
        let a = Step::new("1", "Research");
        let mut b = a.clone();
        b.status_hint = StepStatusHint::Completed;
        b.complexity = Some(8);
        assert!(a.same_content(&b));

        let c = Step::new("1", "Research more");
        assert!(!a.same_content(&c));
    }

    #[test]
    fn test_task_status_lifecycle_table() {
        use TaskStatus::*;

        let allowed = [
            (Pending, InProgress),
            (Pending, Blocked),
            (Pending, Cancelled),
            (InProgress, Completed),
            (InProgress, Failed),
            (InProgress, Cancelled),
        ];
        let all = [Pending, InProgress, Completed, Failed, Blocked, Cancelled];
        for from in all {
            for to in all {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }

        assert!(Blocked.is_terminal());
        assert!(!InProgress.is_terminal());
    }

    #[test]
    fn test_task_status_strings() {
        assert_eq!(
            serde_json::to_value(TaskStatus::InProgress).unwrap(),
            json!("IN_PROGRESS")
        );
        assert_eq!(TaskStatus::from_str("in_progress"), Ok(TaskStatus::InProgress));
        assert!(TaskStatus::from_str("done").is_err());
        assert_eq!(StepStatusHint::from_str("done"), Ok(StepStatusHint::Completed));
    }

    #[test]
    fn test_new_task_is_pending_and_executable() {
        let task = Task::new("1", "plan_1", "v1", "1", "Research");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.attempt_count, 0);
        assert!(task.is_executable());
        assert!(task.started_at.is_none());
    }

    #[test]
    fn test_version_document_shape() {
        let document = create_test_version().to_document();
        let value = serde_json::to_value(&document).unwrap();

        assert_eq!(value["plan_id"], "plan_1");
        assert_eq!(value["version_id"], "v2");
        assert_eq!(value["parent_version_id"], "v1");
        assert_eq!(value["tags"], json!(["stable"]));
        assert_eq!(value["created_at"], "2025-04-24T01:16:00Z");
        assert_eq!(value["steps"][1]["dependencies"], json!(["1"]));
        assert!(value.get("merged_from").is_none());

        let back: VersionDocument = serde_json::from_value(value).unwrap();
        assert_eq!(back, document);
    }

    #[test]
    fn test_version_parents_include_merge_source() {
        let mut version = create_test_version();
        version.merged_from = Some("v5".to_string());
        let parents: Vec<&str> = version.parents().collect();
        assert_eq!(parents, vec!["v1", "v5"]);
        assert!(version.step("2").is_some());
        assert!(version.step("9").is_none());
    }
}
