//! Version model and its persisted document form.

use std::collections::{BTreeMap, BTreeSet};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::Step;

/// An immutable snapshot of a plan's steps.
///
/// Tags and annotations are labels attached to the version after the fact;
/// they never alter `steps`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Version {
    pub plan_id: String,

    /// `v{sequence}`
    pub version_id: String,

    /// Per-plan creation counter, shared by every branch
    pub sequence: u64,

    /// Version this one extends (None for the plan's first version)
    pub parent_version_id: Option<String>,

    /// Tip of the source branch when this version is a merge result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_from: Option<String>,

    /// Branch the version was appended to
    pub branch: String,

    pub description: String,

    /// Snapshot of the plan's steps
    pub steps: Vec<Step>,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    pub created_at: Timestamp,
}

impl Version {
    /// Looks up a step of the snapshot by ID.
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|step| step.id == id)
    }

    /// Parents in the version DAG: the lineage parent, then the merge source.
    pub fn parents(&self) -> impl Iterator<Item = &str> {
        self.parent_version_id
            .as_deref()
            .into_iter()
            .chain(self.merged_from.as_deref())
    }

    /// The document written to the persistence sink for this version.
    pub fn to_document(&self) -> VersionDocument {
        VersionDocument {
            plan_id: self.plan_id.clone(),
            version_id: self.version_id.clone(),
            parent_version_id: self.parent_version_id.clone(),
            merged_from: self.merged_from.clone(),
            branch: Some(self.branch.clone()),
            description: self.description.clone(),
            tags: self.tags.iter().cloned().collect(),
            created_at: self.created_at,
            steps: self.steps.clone(),
        }
    }
}

/// One JSON document per version, as stored by the version store.
///
/// ```json
/// {
///   "plan_id": "plan_1",
///   "version_id": "v2",
///   "parent_version_id": "v1",
///   "description": "added export step",
///   "tags": ["stable"],
///   "created_at": "2025-04-24T01:16:00Z",
///   "steps": [{"id": "1", "description": "Research", "dependencies": []}]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionDocument {
    pub plan_id: String,
    pub version_id: String,
    pub parent_version_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: Timestamp,
    pub steps: Vec<Step>,
}
