//! Ancestry queries over a plan's version DAG.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::models::Version;

/// Index of a plan's versions keyed by version ID.
pub struct Lineage<'a> {
    by_id: HashMap<&'a str, &'a Version>,
}

impl<'a> Lineage<'a> {
    pub fn new(versions: &'a [Version]) -> Self {
        Self {
            by_id: versions.iter().map(|v| (v.version_id.as_str(), v)).collect(),
        }
    }

    pub fn get(&self, version_id: &str) -> Option<&'a Version> {
        self.by_id.get(version_id).copied()
    }

    /// All ancestors of `version_id`, the version itself included.
    ///
    /// Follows both lineage parents and merge sources.
    pub fn ancestors(&self, version_id: &str) -> HashSet<&'a str> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        if let Some(start) = self.get(version_id) {
            queue.push_back(start);
        }

        while let Some(version) = queue.pop_front() {
            if !seen.insert(version.version_id.as_str()) {
                continue;
            }
            for parent in version.parents() {
                if let Some(parent) = self.get(parent) {
                    queue.push_back(parent);
                }
            }
        }

        seen
    }

    /// The common ancestor of `a` and `b` created most recently.
    ///
    /// Sequence numbers grow along every edge of the DAG, so the common
    /// ancestor with the highest sequence is a nearest one.
    pub fn nearest_common_ancestor(&self, a: &str, b: &str) -> Option<&'a Version> {
        let left = self.ancestors(a);
        self.ancestors(b)
            .into_iter()
            .filter(|id| left.contains(id))
            .filter_map(|id| self.get(id))
            .max_by_key(|v| v.sequence)
    }
}
