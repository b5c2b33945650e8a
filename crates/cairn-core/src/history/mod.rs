//! Pure operations over version history: diffing, ancestry and merging.
//!
//! Nothing here touches storage; the [`crate::planner`] layer loads versions
//! and feeds them through these functions.

pub mod diff;
pub mod lineage;
pub mod merge;

pub use diff::{compare_steps, compare_versions};
pub use lineage::Lineage;
pub use merge::{three_way_merge, MergeOutcome};
