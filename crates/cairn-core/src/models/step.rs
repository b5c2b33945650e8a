//! Step model definition and related functionality.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::StepStatusHint;

/// A declarative unit of work inside a plan snapshot.
///
/// Steps never execute themselves; the task graph builder turns them into
/// tasks. The serialized shape matches the version document format, where
/// the dependency set is written as `dependencies`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Step {
    /// Identifier, unique within one snapshot
    pub id: String,

    /// What the step is about
    pub description: String,

    /// IDs of steps in the same snapshot that must complete first
    #[serde(rename = "dependencies", default)]
    pub dependency_step_ids: BTreeSet<String>,

    /// Informational progress hint
    #[serde(default, skip_serializing_if = "StepStatusHint::is_not_started")]
    pub status_hint: StepStatusHint,

    /// Declared complexity used by the optional decomposition pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<u32>,
}

impl Step {
    /// Creates a step with no dependencies.
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            dependency_step_ids: BTreeSet::new(),
            status_hint: StepStatusHint::default(),
            complexity: None,
        }
    }

    /// Adds dependencies on other steps.
    pub fn depends_on<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependency_step_ids
            .extend(ids.into_iter().map(Into::into));
        self
    }

    /// Sets the declared complexity.
    pub fn with_complexity(mut self, complexity: u32) -> Self {
        self.complexity = Some(complexity);
        self
    }

    /// Compares the fields that versioning tracks: description and
    /// dependency set.
    pub fn same_content(&self, other: &Step) -> bool {
        self.description == other.description
            && self.dependency_step_ids == other.dependency_step_ids
    }
}
