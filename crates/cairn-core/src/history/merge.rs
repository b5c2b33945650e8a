//! Three-way merge of step snapshots.

use std::collections::{HashMap, HashSet};

use crate::models::Step;

/// Outcome of merging two snapshots against their common base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The merged step list: target order first, then source-only additions.
    Merged(Vec<Step>),
    /// Step IDs changed differently on both sides since the base.
    Conflicts(Vec<String>),
}

/// Merges `source` into `target` using `base` as the common ancestor.
///
/// Per step ID: identical on both sides is kept; changed on one side only
/// takes that side (a deletion counts as a change); changed differently on
/// both sides is a conflict. Only description and dependency set are
/// compared.
pub fn three_way_merge(base: &[Step], target: &[Step], source: &[Step]) -> MergeOutcome {
    let base_by_id = index(base);
    let target_by_id = index(target);
    let source_by_id = index(source);

    let mut order: Vec<&str> = target.iter().map(|s| s.id.as_str()).collect();
    let mut seen: HashSet<&str> = order.iter().copied().collect();
    for step in source {
        if seen.insert(step.id.as_str()) {
            order.push(step.id.as_str());
        }
    }
    // Steps deleted on both sides are absent from both lists and stay deleted.

    let mut merged = Vec::new();
    let mut conflicts = Vec::new();
    for id in order {
        let ours = target_by_id.get(id).copied();
        let theirs = source_by_id.get(id).copied();
        let ancestor = base_by_id.get(id).copied();

        let resolved = if same(ours, theirs) {
            ours
        } else if same(ours, ancestor) {
            theirs
        } else if same(theirs, ancestor) {
            ours
        } else {
            conflicts.push(id.to_string());
            continue;
        };

        if let Some(step) = resolved {
            merged.push(step.clone());
        }
    }

    if conflicts.is_empty() {
        MergeOutcome::Merged(merged)
    } else {
        MergeOutcome::Conflicts(conflicts)
    }
}

fn index(steps: &[Step]) -> HashMap<&str, &Step> {
    steps.iter().map(|s| (s.id.as_str(), s)).collect()
}

fn same(a: Option<&Step>, b: Option<&Step>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.same_content(b),
        (None, None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Vec<Step> {
        vec![
            Step::new("1", "Research"),
            Step::new("2", "Design"),
            Step::new("3", "Implement").depends_on(["1", "2"]),
        ]
    }

    fn ids(steps: &[Step]) -> Vec<&str> {
        steps.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_non_overlapping_changes_combine() {
        let mut target = base();
        target[0].description = "Research competitors".to_string();

        let mut source = base();
        source.push(Step::new("4", "Export").depends_on(["3"]));

        let MergeOutcome::Merged(steps) = three_way_merge(&base(), &target, &source) else {
            panic!("expected clean merge");
        };
        assert_eq!(ids(&steps), vec!["1", "2", "3", "4"]);
        assert_eq!(steps[0].description, "Research competitors");
    }

    #[test]
    fn test_one_sided_deletion_wins() {
        let target = base();
        let source: Vec<Step> = base().into_iter().filter(|s| s.id != "2").collect();

        let MergeOutcome::Merged(steps) = three_way_merge(&base(), &target, &source) else {
            panic!("expected clean merge");
        };
        assert_eq!(ids(&steps), vec!["1", "3"]);
    }

    #[test]
    fn test_same_edit_on_both_sides_is_not_a_conflict() {
        let mut target = base();
        target[1].description = "Design API".to_string();
        let source = target.clone();

        assert!(matches!(
            three_way_merge(&base(), &target, &source),
            MergeOutcome::Merged(_)
        ));
    }

    #[test]
    fn test_divergent_edits_conflict() {
        let mut target = base();
        target[1].description = "Design API".to_string();
        target[2].dependency_step_ids.remove("1");

        let mut source = base();
        source[1].description = "Design UI".to_string();
        source[2].dependency_step_ids.remove("2");

        assert_eq!(
            three_way_merge(&base(), &target, &source),
            MergeOutcome::Conflicts(vec!["2".to_string(), "3".to_string()])
        );
    }

    #[test]
    fn test_edit_versus_delete_conflicts() {
        let mut target = base();
        target[0].description = "Deep research".to_string();
        let source: Vec<Step> = base().into_iter().filter(|s| s.id != "1").collect();

        assert_eq!(
            three_way_merge(&base(), &target, &source),
            MergeOutcome::Conflicts(vec!["1".to_string()])
        );
    }
}
