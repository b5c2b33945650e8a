//! Step-level comparison of two snapshots.

use std::collections::HashMap;

use crate::models::{DependencyChange, FieldChange, Step, StepChange, Version, VersionDiff};

/// Compares version `from` against version `to`.
///
/// Added steps follow `to`'s order; removed and modified steps follow
/// `from`'s order. Comparing a version with itself always yields an empty
/// diff.
pub fn compare_versions(from: &Version, to: &Version) -> VersionDiff {
    let mut diff = compare_steps(&from.steps, &to.steps);
    diff.plan_id = from.plan_id.clone();
    diff.from_version_id = from.version_id.clone();
    diff.to_version_id = to.version_id.clone();
    diff
}

/// Compares two step lists without version context.
pub fn compare_steps(from: &[Step], to: &[Step]) -> VersionDiff {
    let old: HashMap<&str, &Step> = from.iter().map(|s| (s.id.as_str(), s)).collect();
    let new: HashMap<&str, &Step> = to.iter().map(|s| (s.id.as_str(), s)).collect();

    let added = to
        .iter()
        .filter(|s| !old.contains_key(s.id.as_str()))
        .map(|s| s.id.clone())
        .collect();
    let removed = from
        .iter()
        .filter(|s| !new.contains_key(s.id.as_str()))
        .map(|s| s.id.clone())
        .collect();
    let modified = from
        .iter()
        .filter_map(|before| {
            new.get(before.id.as_str())
                .and_then(|after| step_change(before, after))
        })
        .collect();

    VersionDiff {
        added,
        removed,
        modified,
        ..Default::default()
    }
}

fn step_change(before: &Step, after: &Step) -> Option<StepChange> {
    if before.same_content(after) {
        return None;
    }

    let description = (before.description != after.description).then(|| FieldChange {
        old: before.description.clone(),
        new: after.description.clone(),
    });
    let dependencies =
        (before.dependency_step_ids != after.dependency_step_ids).then(|| DependencyChange {
            added: after
                .dependency_step_ids
                .difference(&before.dependency_step_ids)
                .cloned()
                .collect(),
            removed: before
                .dependency_step_ids
                .difference(&after.dependency_step_ids)
                .cloned()
                .collect(),
        });

    Some(StepChange {
        step_id: before.id.clone(),
        description,
        dependencies,
    })
}
