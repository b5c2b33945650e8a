//! Data models for plans, versions and tasks.
//!
//! Display implementations for these models live in
//! [`crate::display::models`], keeping data structures separate from
//! presentation.
//!
//! - [`Plan`] holds a mutable working copy of steps plus pointers into the
//!   version history (active version, branches).
//! - [`Version`] is an immutable snapshot; [`VersionDocument`] is its
//!   persisted JSON form.
//! - [`Task`] is the per-run executable form of a step, with a
//!   [`TaskStatus`] lifecycle.
//!
//! # Examples
//!
//! ```rust
//! use cairn_core::models::{Step, TaskStatus};
//!
//! let step = Step::new("3", "Implement").depends_on(["1", "2"]);
//! assert_eq!(step.dependency_step_ids.len(), 2);
//!
//! assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Blocked));
//! assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Pending));
//! ```

pub mod diff;
pub mod plan;
pub mod status;
pub mod step;
pub mod task;
pub mod version;

#[cfg(test)]
mod tests;

pub use diff::{DependencyChange, FieldChange, StepChange, VersionDiff};
pub use plan::{Branch, Plan, MAIN_BRANCH};
pub use status::{StepStatusHint, TaskStatus};
pub use step::Step;
pub use task::Task;
pub use version::{Version, VersionDocument};
