//! Plan model definition and related functionality.

use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::Step;

/// Name of the branch every plan starts on.
pub const MAIN_BRANCH: &str = "main";

/// A plan with its working copy of steps and version pointers.
///
/// The working copy (`steps`) is what the next `create_version` snapshots.
/// History lives in immutable versions; the plan only points into it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    /// Caller-supplied unique identifier
    pub id: String,

    /// Title of the plan
    pub title: String,

    /// Detailed multi-line description of the plan
    pub description: Option<String>,

    /// Working copy of the steps
    #[serde(default)]
    pub steps: Vec<Step>,

    /// Free-form key/value metadata
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    /// Version the working copy was last synchronised with
    pub active_version_id: Option<String>,

    /// Branch that `create_version` extends by default
    pub current_branch: String,

    /// Branch name to tip version ID
    #[serde(default)]
    pub branches: BTreeMap<String, String>,

    /// Timestamp when the plan was created (UTC)
    pub created_at: Timestamp,

    /// Timestamp when the plan was last modified (UTC)
    pub updated_at: Timestamp,
}

impl Plan {
    /// Looks up a step of the working copy by ID.
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|step| step.id == id)
    }
}

/// A named pointer into a plan's version history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Branch {
    pub plan_id: String,
    pub name: String,
    /// Tip version of the branch
    pub version_id: String,
    pub created_at: Timestamp,
}
