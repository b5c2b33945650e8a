//! Task graph construction, validation and analysis.
//!
//! A [`TaskGraph`] is built from one version snapshot by the
//! [`TaskGraphBuilder`]. Building fails on duplicate steps, unresolved
//! dependencies and cycles, so every graph handed to the scheduler is a DAG.

mod analysis;
mod builder;
mod validate;

use std::collections::HashMap;

pub use analysis::{analyze_steps, DependencyReport, MissingReference};
pub use builder::{DecompositionConfig, TaskGraphBuilder};
pub use validate::{
    ensure_unique_ids, find_cycle, find_duplicates, find_missing_dependency, validate_steps,
};

use crate::models::Task;

/// Acyclic graph of tasks for one version.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    plan_id: String,
    version_id: String,
    /// Task nodes keyed by task ID
    tasks: HashMap<String, Task>,
    /// Reverse edges over executable tasks: task ID -> tasks depending on it
    dependents: HashMap<String, Vec<String>>,
    /// Insertion order, used for stable output
    order: Vec<String>,
}

impl TaskGraph {
    pub(crate) fn from_tasks(plan_id: String, version_id: String, tasks: Vec<Task>) -> Self {
        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
        let mut order = Vec::with_capacity(tasks.len());
        let mut nodes = HashMap::with_capacity(tasks.len());

        for task in tasks {
            if task.is_executable() {
                for dep in &task.dependency_task_ids {
                    dependents
                        .entry(dep.clone())
                        .or_default()
                        .push(task.id.clone());
                }
            }
            order.push(task.id.clone());
            nodes.insert(task.id.clone(), task);
        }

        Self {
            plan_id,
            version_id,
            tasks: nodes,
            dependents,
            order,
        }
    }

    pub fn plan_id(&self) -> &str {
        &self.plan_id
    }

    pub fn version_id(&self) -> &str {
        &self.version_id
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub(crate) fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.get_mut(id)
    }

    /// Tasks in insertion order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.order.iter().filter_map(|id| self.tasks.get(id))
    }

    /// IDs of the tasks the scheduler dispatches, in insertion order.
    pub fn executable_ids(&self) -> Vec<String> {
        self.tasks()
            .filter(|t| t.is_executable())
            .map(|t| t.id.clone())
            .collect()
    }

    /// IDs of tasks that declare a dependency on `id`.
    pub fn dependents(&self, id: &str) -> &[String] {
        self.dependents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Groups executable tasks into stages with Kahn's algorithm.
    ///
    /// Tasks within one stage have no dependencies on each other and may run
    /// in parallel; each stage only depends on earlier ones.
    pub fn stages(&self) -> Vec<Vec<String>> {
        let executable = self.executable_ids();
        let position: HashMap<&str, usize> = executable
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        let mut in_degree: HashMap<&str, usize> = executable
            .iter()
            .filter_map(|id| self.tasks.get(id))
            .map(|t| (t.id.as_str(), t.dependency_task_ids.len()))
            .collect();

        let mut stages = Vec::new();
        let mut current: Vec<&str> = executable
            .iter()
            .map(String::as_str)
            .filter(|id| in_degree.get(id) == Some(&0))
            .collect();

        while !current.is_empty() {
            let mut next = Vec::new();
            for id in &current {
                for dependent in self.dependents(id) {
                    if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                        *degree -= 1;
                        if *degree == 0 {
                            next.push(dependent.as_str());
                        }
                    }
                }
            }
            next.sort_by_key(|id| position.get(id).copied().unwrap_or(usize::MAX));
            stages.push(current.iter().map(|id| id.to_string()).collect());
            current = next;
        }

        stages
    }

    /// Consumes the graph, returning tasks in insertion order.
    pub fn into_tasks(mut self) -> Vec<Task> {
        self.order
            .iter()
            .filter_map(|id| self.tasks.remove(id))
            .collect()
    }
}
