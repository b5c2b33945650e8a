//! Non-failing dependency analysis of a step snapshot.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{find_cycle, find_duplicates};
use crate::models::Step;

/// A dependency reference that does not resolve inside the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MissingReference {
    pub step_id: String,
    pub missing_ref: String,
}

/// Structure of a snapshot's dependency relation.
///
/// Unlike graph building, analysis never fails: duplicate IDs, missing
/// references and cycles are reported alongside whatever could be layered.
/// When an ID repeats, only its first step is analyzed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependencyReport {
    pub plan_id: String,
    pub version_id: Option<String>,
    /// Steps without dependencies
    pub roots: Vec<String>,
    /// Steps nothing depends on
    pub leaves: Vec<String>,
    /// Parallel execution stages; steps on or behind a cycle are left out
    pub stages: Vec<Vec<String>>,
    #[serde(default)]
    pub duplicates: Vec<String>,
    pub missing: Vec<MissingReference>,
    pub cycle: Option<Vec<String>>,
}

impl DependencyReport {
    /// Whether the snapshot can be built into a task graph.
    pub fn is_executable(&self) -> bool {
        self.duplicates.is_empty() && self.missing.is_empty() && self.cycle.is_none()
    }
}

/// Analyzes `steps`, ignoring unresolved references when layering.
pub fn analyze_steps(plan_id: &str, version_id: Option<&str>, steps: &[Step]) -> DependencyReport {
    let duplicates = find_duplicates(steps);
    let mut ids: HashSet<&str> = HashSet::new();
    let steps: Vec<Step> = steps
        .iter()
        .filter(|s| ids.insert(s.id.as_str()))
        .cloned()
        .collect();
    let steps = steps.as_slice();

    let mut missing = Vec::new();
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for step in steps {
        let mut degree = 0;
        for dep in &step.dependency_step_ids {
            if ids.contains(dep.as_str()) {
                degree += 1;
                dependents.entry(dep.as_str()).or_default().push(step.id.as_str());
            } else {
                missing.push(MissingReference {
                    step_id: step.id.clone(),
                    missing_ref: dep.clone(),
                });
            }
        }
        in_degree.insert(step.id.as_str(), degree);
    }

    let roots = steps
        .iter()
        .filter(|s| s.dependency_step_ids.is_empty())
        .map(|s| s.id.clone())
        .collect();
    let leaves = steps
        .iter()
        .filter(|s| !dependents.contains_key(s.id.as_str()))
        .map(|s| s.id.clone())
        .collect();

    let position: HashMap<&str, usize> = steps
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id.as_str(), i))
        .collect();
    let mut stages = Vec::new();
    let mut current: Vec<&str> = steps
        .iter()
        .map(|s| s.id.as_str())
        .filter(|id| in_degree.get(id) == Some(&0))
        .collect();
    while !current.is_empty() {
        let mut next = Vec::new();
        for id in &current {
            for &dependent in dependents.get(id).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        next.push(dependent);
                    }
                }
            }
        }
        next.sort_by_key(|id| position.get(id).copied().unwrap_or(usize::MAX));
        stages.push(current.iter().map(|id| id.to_string()).collect());
        current = next;
    }

    DependencyReport {
        plan_id: plan_id.to_string(),
        version_id: version_id.map(str::to_string),
        roots,
        leaves,
        stages,
        duplicates,
        missing,
        cycle: find_cycle(steps),
    }
}
