//! Validation of step dependency relations.

use std::collections::{HashMap, HashSet};

use crate::{
    error::{CairnError, Result},
    models::Step,
};

/// DFS colouring: unvisited, on the current path, finished.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Checks that step IDs are unique, every dependency resolves inside the
/// snapshot, and the dependency relation is acyclic.
pub fn validate_steps(plan_id: &str, steps: &[Step]) -> Result<()> {
    ensure_unique_ids(plan_id, steps)?;

    if let Some((step_id, missing_ref)) = find_missing_dependency(steps) {
        return Err(CairnError::MissingDependency {
            plan_id: plan_id.to_string(),
            step_id,
            missing_ref,
        });
    }

    if let Some(cycle) = find_cycle(steps) {
        return Err(CairnError::CircularDependency {
            plan_id: plan_id.to_string(),
            cycle,
        });
    }

    Ok(())
}

/// Fails with `DuplicateStep` on the first step ID seen twice.
pub fn ensure_unique_ids(plan_id: &str, steps: &[Step]) -> Result<()> {
    match find_duplicates(steps).into_iter().next() {
        Some(step_id) => Err(CairnError::DuplicateStep {
            plan_id: plan_id.to_string(),
            step_id,
        }),
        None => Ok(()),
    }
}

/// Step IDs that occur more than once, each listed once, in order of their
/// second occurrence.
pub fn find_duplicates(steps: &[Step]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for step in steps {
        if !seen.insert(step.id.as_str()) && !duplicates.contains(&step.id) {
            duplicates.push(step.id.clone());
        }
    }
    duplicates
}

/// First `(step_id, missing_ref)` pair in snapshot order, if any.
pub fn find_missing_dependency(steps: &[Step]) -> Option<(String, String)> {
    let ids: HashSet<&str> = steps.iter().map(|s| s.id.as_str()).collect();
    steps.iter().find_map(|step| {
        step.dependency_step_ids
            .iter()
            .find(|dep| !ids.contains(dep.as_str()))
            .map(|dep| (step.id.clone(), dep.clone()))
    })
}

/// Finds a dependency cycle with three-colour DFS.
///
/// The returned path starts and ends with the same step, e.g.
/// `["A", "B", "A"]`. Dependencies on unknown steps are ignored here.
pub fn find_cycle(steps: &[Step]) -> Option<Vec<String>> {
    let edges: HashMap<&str, Vec<&str>> = steps
        .iter()
        .map(|s| {
            (
                s.id.as_str(),
                s.dependency_step_ids.iter().map(String::as_str).collect(),
            )
        })
        .collect();
    let mut colors: HashMap<&str, Color> =
        steps.iter().map(|s| (s.id.as_str(), Color::White)).collect();
    let mut path = Vec::new();

    for step in steps {
        if colors[step.id.as_str()] == Color::White {
            if let Some(cycle) = visit(step.id.as_str(), &edges, &mut colors, &mut path) {
                return Some(cycle);
            }
        }
    }
    None
}

fn visit<'a>(
    node: &'a str,
    edges: &HashMap<&'a str, Vec<&'a str>>,
    colors: &mut HashMap<&'a str, Color>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    colors.insert(node, Color::Gray);
    path.push(node);

    for &dep in edges.get(node).into_iter().flatten() {
        match colors.get(dep).copied() {
            Some(Color::Gray) => {
                // Back-edge: the cycle is the path from `dep` to here, closed.
                let start = path.iter().position(|&n| n == dep).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|s| s.to_string()).collect();
                cycle.push(dep.to_string());
                return Some(cycle);
            }
            Some(Color::White) => {
                if let Some(cycle) = visit(dep, edges, colors, path) {
                    return Some(cycle);
                }
            }
            Some(Color::Black) | None => {}
        }
    }

    path.pop();
    colors.insert(node, Color::Black);
    None
}
