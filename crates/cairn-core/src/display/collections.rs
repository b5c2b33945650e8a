//! Collection wrapper types for displaying groups of domain objects.

use std::{fmt, ops::Index};

use super::datetime::LocalDateTime;
use crate::models::{Branch, Plan, Version};

/// Newtype wrapper for listing plans, one summary block each.
pub struct Plans(pub Vec<Plan>);

impl Plans {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Plan> {
        self.0.iter()
    }
}

impl Index<usize> for Plans {
    type Output = Plan;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl fmt::Display for Plans {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No plans found.");
        }
        for plan in &self.0 {
            writeln!(f, "## {} ({})", plan.title, plan.id)?;
            writeln!(f)?;
            writeln!(
                f,
                "- **Steps**: {} on branch {}",
                plan.steps.len(),
                plan.current_branch
            )?;
            if let Some(active) = &plan.active_version_id {
                writeln!(f, "- **Active version**: {active}")?;
            }
            writeln!(f, "- **Created**: {}", LocalDateTime(&plan.created_at))?;
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Newtype wrapper for a plan's version history.
pub struct Versions(pub Vec<Version>);

impl Versions {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Version> {
        self.0.iter()
    }
}

impl IntoIterator for Versions {
    type Item = Version;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for Versions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No versions found.");
        }
        for version in &self.0 {
            let mut line = format!(
                "- **{}** ({}) {}",
                version.version_id, version.branch, version.description
            );
            if !version.tags.is_empty() {
                let tags: Vec<&str> = version.tags.iter().map(String::as_str).collect();
                line.push_str(&format!(" [{}]", tags.join(", ")));
            }
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Newtype wrapper for a plan's branches.
pub struct Branches(pub Vec<Branch>);

impl Branches {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Branches {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No branches found.");
        }
        for branch in &self.0 {
            write!(f, "{branch}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use super::*;

    fn version(seq: u64, tags: &[&str]) -> Version {
        Version {
            plan_id: "p".to_string(),
            version_id: format!("v{seq}"),
            sequence: seq,
            parent_version_id: None,
            merged_from: None,
            branch: "main".to_string(),
            description: format!("snapshot {seq}"),
            steps: Vec::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            annotations: Default::default(),
            created_at: Timestamp::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_versions_display() {
        let output = Versions(vec![version(1, &[]), version(2, &["stable"])]).to_string();
        assert_eq!(
            output,
            "- **v1** (main) snapshot 1\n- **v2** (main) snapshot 2 [stable]\n"
        );
        assert_eq!(Versions(vec![]).to_string(), "No versions found.\n");
    }

    #[test]
    fn test_empty_collections() {
        assert_eq!(Plans(vec![]).to_string(), "No plans found.\n");
        assert_eq!(Branches(vec![]).to_string(), "No branches found.\n");
    }
}
