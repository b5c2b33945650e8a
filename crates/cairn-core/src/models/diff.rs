//! Differences between two versions of a plan.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Step-level difference from version `from` to version `to`.
///
/// `added` lists steps present only in `to`, `removed` steps present only in
/// `from`; `modified` covers steps present in both whose tracked fields
/// differ.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionDiff {
    pub plan_id: String,
    pub from_version_id: String,
    pub to_version_id: String,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<StepChange>,
}

impl VersionDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/// Field-level changes of one step present in both versions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepChange {
    pub step_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<FieldChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<DependencyChange>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldChange {
    pub old: String,
    pub new: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependencyChange {
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
}
