//! Display implementations for domain models.
//!
//! Kept apart from the model definitions; every implementation writes
//! markdown for the terminal renderer.

use std::fmt;

use super::datetime::LocalDateTime;
use crate::{
    graph::DependencyReport,
    models::{Branch, Plan, Step, StepStatusHint, Task, TaskStatus, Version, VersionDiff},
    scheduler::{RunOutcome, RunResult},
};

impl fmt::Display for StepStatusHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "- **{}** {}", self.id, self.description)?;
        if !self.dependency_step_ids.is_empty() {
            let deps: Vec<&str> = self.dependency_step_ids.iter().map(String::as_str).collect();
            write!(f, " (after {})", deps.join(", "))?;
        }
        if !self.status_hint.is_not_started() {
            write!(f, " [{}]", self.status_hint)?;
        }
        if let Some(complexity) = self.complexity {
            write!(f, " {{complexity {complexity}}}")?;
        }
        writeln!(f)
    }
}

fn write_steps(f: &mut fmt::Formatter<'_>, steps: &[Step], empty: &str) -> fmt::Result {
    if steps.is_empty() {
        return writeln!(f, "{empty}");
    }
    for step in steps {
        write!(f, "{step}")?;
    }
    Ok(())
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {} ({})", self.title, self.id)?;
        writeln!(f)?;

        writeln!(f, "- Branch: {}", self.current_branch)?;
        writeln!(
            f,
            "- Active version: {}",
            self.active_version_id.as_deref().unwrap_or("none")
        )?;
        if !self.branches.is_empty() {
            let branches: Vec<String> = self
                .branches
                .iter()
                .map(|(name, tip)| format!("{name}@{tip}"))
                .collect();
            writeln!(f, "- Branches: {}", branches.join(", "))?;
        }
        for (key, value) in &self.metadata {
            writeln!(f, "- {key}: {value}")?;
        }
        writeln!(f, "- Created: {}", LocalDateTime(&self.created_at))?;
        writeln!(f, "- Updated: {}", LocalDateTime(&self.updated_at))?;

        if let Some(desc) = &self.description {
            writeln!(f)?;
            writeln!(f, "{desc}")?;
        }

        writeln!(f, "\n## Working copy")?;
        writeln!(f)?;
        write_steps(f, &self.steps, "No steps in this plan.")
    }
}

impl Version {
    fn fmt_header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "## {} on {}", self.version_id, self.branch)?;
        if !self.tags.is_empty() {
            let tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
            write!(f, " [{}]", tags.join(", "))?;
        }
        writeln!(f)?;
        writeln!(f)?;
        writeln!(f, "{}", self.description)?;
        writeln!(f)?;
        match (&self.parent_version_id, &self.merged_from) {
            (Some(parent), Some(source)) => writeln!(f, "- Parents: {parent}, {source} (merge)")?,
            (Some(parent), None) => writeln!(f, "- Parent: {parent}")?,
            (None, _) => writeln!(f, "- Parent: none")?,
        }
        writeln!(f, "- Steps: {}", self.steps.len())?;
        writeln!(f, "- Created: {}", LocalDateTime(&self.created_at))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_header(f)?;
        for (key, value) in &self.annotations {
            writeln!(f, "- {key}: {value}")?;
        }
        writeln!(f)?;
        write_steps(f, &self.steps, "Empty snapshot.")
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "- **{}** at {}", self.name, self.version_id)
    }
}

impl fmt::Display for VersionDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "# {} → {} ({})",
            self.from_version_id, self.to_version_id, self.plan_id
        )?;
        writeln!(f)?;
        if self.is_empty() {
            return writeln!(f, "No differences.");
        }

        if !self.added.is_empty() {
            writeln!(f, "## Added")?;
            writeln!(f)?;
            for id in &self.added {
                writeln!(f, "- {id}")?;
            }
            writeln!(f)?;
        }
        if !self.removed.is_empty() {
            writeln!(f, "## Removed")?;
            writeln!(f)?;
            for id in &self.removed {
                writeln!(f, "- {id}")?;
            }
            writeln!(f)?;
        }
        if !self.modified.is_empty() {
            writeln!(f, "## Modified")?;
            writeln!(f)?;
            for change in &self.modified {
                writeln!(f, "- **{}**", change.step_id)?;
                if let Some(description) = &change.description {
                    writeln!(f, "  - description: {} → {}", description.old, description.new)?;
                }
                if let Some(deps) = &change.dependencies {
                    for added in &deps.added {
                        writeln!(f, "  - depends on {added}")?;
                    }
                    for removed in &deps.removed {
                        writeln!(f, "  - no longer depends on {removed}")?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "- {} **{}** {}", self.status.with_icon(), self.id, self.description)?;
        if self.attempt_count > 1 {
            write!(f, " ({} attempts)", self.attempt_count)?;
        }
        writeln!(f)?;
        if let Some(error) = &self.error {
            writeln!(f, "  - error: {error}")?;
        }
        Ok(())
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Run of {} {}", self.plan_id, self.version_id)?;
        writeln!(f)?;
        match &self.outcome {
            RunOutcome::Succeeded => writeln!(f, "All {} tasks completed.", self.tasks.len())?,
            RunOutcome::Failed {
                failed,
                blocked,
                cancelled,
            } => writeln!(
                f,
                "Run failed: {} failed, {} blocked, {} cancelled.",
                failed.len(),
                blocked.len(),
                cancelled.len()
            )?,
            RunOutcome::Cancelled { cancelled } => {
                writeln!(f, "Run cancelled: {} tasks cancelled.", cancelled.len())?
            }
        }
        writeln!(f)?;
        for task in &self.tasks {
            write!(f, "{task}")?;
        }
        Ok(())
    }
}

impl fmt::Display for DependencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "# Dependencies of {} ({})",
            self.plan_id,
            self.version_id.as_deref().unwrap_or("working copy")
        )?;
        writeln!(f)?;
        writeln!(f, "- Roots: {}", self.roots.join(", "))?;
        writeln!(f, "- Leaves: {}", self.leaves.join(", "))?;

        if !self.stages.is_empty() {
            writeln!(f, "\n## Stages")?;
            writeln!(f)?;
            for (n, stage) in self.stages.iter().enumerate() {
                writeln!(f, "{}. {}", n + 1, stage.join(", "))?;
            }
        }

        if !self.duplicates.is_empty() {
            writeln!(f, "\n## Duplicate steps")?;
            writeln!(f)?;
            for id in &self.duplicates {
                writeln!(f, "- {id}")?;
            }
        }
        if !self.missing.is_empty() {
            writeln!(f, "\n## Missing references")?;
            writeln!(f)?;
            for missing in &self.missing {
                writeln!(f, "- {} → {}", missing.step_id, missing.missing_ref)?;
            }
        }
        if let Some(cycle) = &self.cycle {
            writeln!(f, "\n## Cycle")?;
            writeln!(f)?;
            writeln!(f, "{}", cycle.join(" → "))?;
        }
        Ok(())
    }
}
