//! Builder turning a version snapshot into a validated task graph.

use std::collections::{HashMap, HashSet};

use log::debug;

use super::{validate::validate_steps, TaskGraph};
use crate::{
    error::{CairnError, Result},
    models::{Task, Version},
};

/// Settings for the optional decomposition pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecompositionConfig {
    /// Steps whose complexity exceeds this value are split into subtasks
    pub threshold: u32,
}

/// Converts a version's steps into an acyclic [`TaskGraph`].
///
/// # Examples
///
/// ```rust
/// use cairn_core::{graph::TaskGraphBuilder, models::{Step, Version}};
/// # use jiff::Timestamp;
/// # let version = Version {
/// #     plan_id: "plan_1".into(), version_id: "v1".into(), sequence: 1,
/// #     parent_version_id: None, merged_from: None, branch: "main".into(),
/// #     description: String::new(), tags: Default::default(),
/// #     annotations: Default::default(), created_at: Timestamp::now(),
/// #     steps: vec![
/// #         Step::new("1", "Research"),
/// #         Step::new("2", "Design"),
/// #         Step::new("3", "Implement").depends_on(["1", "2"]),
/// #     ],
/// # };
/// let graph = TaskGraphBuilder::new().build(&version)?;
/// assert_eq!(graph.stages(), vec![vec!["1", "2"], vec!["3"]]);
/// # Ok::<(), cairn_core::CairnError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct TaskGraphBuilder {
    decomposition: Option<DecompositionConfig>,
}

impl TaskGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables decomposition of steps whose complexity exceeds `threshold`.
    pub fn with_decomposition(mut self, threshold: u32) -> Self {
        self.decomposition = Some(DecompositionConfig { threshold });
        self
    }

    /// Validates the snapshot and materializes one task per step.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateStep`, `MissingDependency` or `CircularDependency`
    /// when the snapshot cannot be executed; `InvalidInput` for a zero
    /// decomposition threshold or a subtask ID that collides with a step.
    pub fn build(&self, version: &Version) -> Result<TaskGraph> {
        validate_steps(&version.plan_id, &version.steps)?;

        let mut tasks: Vec<Task> = version
            .steps
            .iter()
            .map(|step| {
                let mut task = Task::new(
                    step.id.clone(),
                    version.plan_id.clone(),
                    version.version_id.clone(),
                    step.id.clone(),
                    step.description.clone(),
                );
                task.dependency_task_ids = step.dependency_step_ids.iter().cloned().collect();
                task
            })
            .collect();

        if let Some(config) = self.decomposition {
            if config.threshold == 0 {
                return Err(CairnError::invalid_input("decompose_threshold")
                    .with_reason("threshold must be at least 1"));
            }
            let complexities: HashMap<&str, u32> = version
                .steps
                .iter()
                .filter_map(|s| s.complexity.map(|c| (s.id.as_str(), c)))
                .collect();
            tasks = decompose(&version.plan_id, tasks, &complexities, config.threshold)?;
        }

        debug!(
            "Built task graph for plan '{}' version '{}' with {} tasks",
            version.plan_id,
            version.version_id,
            tasks.len()
        );

        Ok(TaskGraph::from_tasks(
            version.plan_id.clone(),
            version.version_id.clone(),
            tasks,
        ))
    }
}

/// Splits complex tasks into ordered subtask chains.
///
/// The first subtask inherits the parent's dependencies, each later subtask
/// depends on its predecessor, and every reference to the parent is rewired
/// to its last subtask. Subtask IDs are `{parent}#{n}` and must not clash
/// with any other task ID.
fn decompose(
    plan_id: &str,
    tasks: Vec<Task>,
    complexities: &HashMap<&str, u32>,
    threshold: u32,
) -> Result<Vec<Task>> {
    let mut taken: HashSet<String> = tasks.iter().map(|t| t.id.clone()).collect();
    let mut last_subtask: HashMap<String, String> = HashMap::new();
    let mut expanded = Vec::with_capacity(tasks.len());

    for mut parent in tasks {
        let complexity = complexities
            .get(parent.step_id.as_str())
            .copied()
            .unwrap_or(0);
        if complexity <= threshold {
            expanded.push(parent);
            continue;
        }

        let parts = complexity.div_ceil(threshold);
        let mut chain: Vec<Task> = Vec::with_capacity(parts as usize);
        for part in 1..=parts {
            let sub_id = format!("{}#{part}", parent.id);
            if !taken.insert(sub_id.clone()) {
                return Err(CairnError::invalid_input("steps").with_reason(format!(
                    "subtask '{sub_id}' of step '{}' in plan '{plan_id}' collides with an existing step",
                    parent.id
                )));
            }
            let mut sub = Task::new(
                sub_id,
                parent.plan_id.clone(),
                parent.version_id.clone(),
                parent.step_id.clone(),
                format!("{} (part {part} of {parts})", parent.description),
            );
            sub.parent_task_id = Some(parent.id.clone());
            sub.dependency_task_ids = match chain.last() {
                None => parent.dependency_task_ids.clone(),
                Some(previous) => vec![previous.id.clone()],
            };
            chain.push(sub);
        }

        parent.subtask_ids = chain.iter().map(|t| t.id.clone()).collect();
        if let Some(last) = parent.subtask_ids.last() {
            last_subtask.insert(parent.id.clone(), last.clone());
        }
        debug!("Decomposed task '{}' into {parts} subtasks", parent.id);

        expanded.push(parent);
        expanded.extend(chain);
    }

    for task in &mut expanded {
        for dep in &mut task.dependency_task_ids {
            if let Some(last) = last_subtask.get(dep) {
                *dep = last.clone();
            }
        }
    }

    Ok(expanded)
}
