//! Result wrapper types for displaying operation outcomes.

use std::fmt;

use crate::models::{Branch, Plan, Version};

/// The result of a create operation: a confirmation line followed by the
/// created resource.
///
/// # Examples
///
/// ```rust
/// use cairn_core::{display::CreateResult, models::Branch};
/// use jiff::Timestamp;
///
/// let branch = Branch {
///     plan_id: "plan_1".to_string(),
///     name: "experiment".to_string(),
///     version_id: "v2".to_string(),
///     created_at: Timestamp::now(),
/// };
/// let output = CreateResult::new(branch).to_string();
/// assert!(output.starts_with("Created branch 'experiment' at v2"));
/// ```
pub struct CreateResult<T> {
    pub resource: T,
}

impl<T> CreateResult<T> {
    pub fn new(resource: T) -> Self {
        Self { resource }
    }
}

impl fmt::Display for CreateResult<Plan> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Created plan '{}'", self.resource.id)?;
        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

impl fmt::Display for CreateResult<Version> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Created version {} of plan '{}'",
            self.resource.version_id, self.resource.plan_id
        )?;
        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

impl fmt::Display for CreateResult<Branch> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Created branch '{}' at {}",
            self.resource.name, self.resource.version_id
        )
    }
}

/// The result of an update operation, with an optional list of changes.
pub struct UpdateResult<T> {
    pub resource: T,
    pub changes: Vec<String>,
}

impl<T> UpdateResult<T> {
    pub fn new(resource: T) -> Self {
        Self {
            resource,
            changes: Vec::new(),
        }
    }

    pub fn with_changes(resource: T, changes: Vec<String>) -> Self {
        Self { resource, changes }
    }
}

impl fmt::Display for UpdateResult<Plan> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Updated plan '{}'", self.resource.id)?;

        if !self.changes.is_empty() {
            writeln!(f)?;
            writeln!(f, "Changes made:")?;
            for change in &self.changes {
                writeln!(f, "- {change}")?;
            }
        }

        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use super::*;
    use crate::models::Step;

    fn plan() -> Plan {
        Plan {
            id: "plan_1".to_string(),
            title: "Launch".to_string(),
            description: None,
            steps: vec![Step::new("1", "Research")],
            metadata: Default::default(),
            active_version_id: None,
            current_branch: "main".to_string(),
            branches: Default::default(),
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_create_plan_result() {
        let output = CreateResult::new(plan()).to_string();
        assert!(output.starts_with("Created plan 'plan_1'\n"));
        assert!(output.contains("# Launch (plan_1)"));
        assert!(output.contains("- Active version: none"));
    }

    #[test]
    fn test_update_result_lists_changes() {
        let result = UpdateResult::with_changes(plan(), vec!["Replaced steps".to_string()]);
        let output = result.to_string();
        assert!(output.contains("Changes made:\n- Replaced steps"));

        let bare = UpdateResult::new(plan()).to_string();
        assert!(!bare.contains("Changes made:"));
    }
}
