//! Parameter structures for cairn operations.
//!
//! These structures carry no interface-specific derives. The CLI defines its
//! own clap argument structs and converts them into these with `From` impls:
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐
//! │   CLI Args      │    │  Core Params    │
//! │  (clap derives) │───▶│ (serde only)    │
//! └─────────────────┘    └─────────────────┘
//! ```
//!
//! Planner methods take these by reference, so one parameter value can be
//! reused across calls.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::Step;

/// Parameters for operations requiring just a plan ID.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanId {
    pub plan_id: String,
}

/// Parameters for creating a new plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePlan {
    /// Caller-chosen unique identifier, e.g. `plan_1`
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// Initial working copy
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Partial update of a plan's working copy. Unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePlan {
    pub plan_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Replaces the whole working copy when set
    pub steps: Option<Vec<Step>>,
    /// Merged into the existing metadata
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Parameters for snapshotting the working copy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateVersion {
    pub plan_id: String,
    pub description: String,
    /// Branch to extend; defaults to the plan's current branch
    pub branch: Option<String>,
}

/// Identifies one version of a plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionRef {
    pub plan_id: String,
    pub version_id: String,
}

/// Parameters for diffing two versions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompareVersions {
    pub plan_id: String,
    pub from_version_id: String,
    pub to_version_id: String,
}

/// Parameters for creating a branch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateBranch {
    pub plan_id: String,
    pub name: String,
    /// Version the branch starts from; defaults to the active version
    pub from_version_id: Option<String>,
}

/// Identifies a branch of a plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BranchRef {
    pub plan_id: String,
    pub name: String,
}

/// Parameters for merging `source` into `target`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeBranches {
    pub plan_id: String,
    pub target: String,
    pub source: String,
    /// Description of the merge version; generated when absent
    pub description: Option<String>,
}

/// Parameters for tagging a version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagVersion {
    pub plan_id: String,
    pub version_id: String,
    pub tag: String,
}

/// Parameters for annotating a version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotateVersion {
    pub plan_id: String,
    pub version_id: String,
    pub key: String,
    pub value: String,
}

/// Parameters for forking a version into a new plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForkPlan {
    pub plan_id: String,
    /// Defaults to the active version
    pub version_id: Option<String>,
    pub new_plan_id: String,
    /// Defaults to the source plan's title
    pub title: Option<String>,
}

/// Parameters for dependency analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeDependencies {
    pub plan_id: String,
    /// Analyzes the working copy when absent
    pub version_id: Option<String>,
}

/// Parameters for executing a version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteVersion {
    pub plan_id: String,
    /// Defaults to the active version
    pub version_id: Option<String>,
    /// Enables decomposition of steps whose complexity exceeds this value
    pub decompose_threshold: Option<u32>,
}
