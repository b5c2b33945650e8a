//! Named branch pointers into a plan's version history.

use jiff::Timestamp;
use rusqlite::{params, OptionalExtension};

use super::timestamp_column;
use crate::{
    error::{CairnError, DatabaseResultExt, Result},
    models::{Branch, Plan},
};

const INSERT_BRANCH_SQL: &str =
    "INSERT INTO branches (plan_id, name, version_id, created_at) VALUES (?1, ?2, ?3, ?4)";
const CHECK_BRANCH_EXISTS_SQL: &str =
    "SELECT EXISTS(SELECT 1 FROM branches WHERE plan_id = ?1 AND name = ?2)";
const SELECT_BRANCH_SQL: &str =
    "SELECT plan_id, name, version_id, created_at FROM branches WHERE plan_id = ?1 AND name = ?2";
const SELECT_BRANCHES_SQL: &str =
    "SELECT plan_id, name, version_id, created_at FROM branches WHERE plan_id = ?1 ORDER BY rowid";
const CHECKOUT_SQL: &str = "UPDATE plans SET current_branch = ?1, active_version_id = ?2, steps = ?3, updated_at = ?4 WHERE id = ?5";

impl super::Database {
    /// Records a new branch pointing at an existing version.
    pub fn create_branch(&mut self, plan_id: &str, name: &str, version_id: &str) -> Result<Branch> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let exists: bool = tx
            .query_row(CHECK_BRANCH_EXISTS_SQL, params![plan_id, name], |row| row.get(0))
            .db_context("Failed to check branch existence")?;
        if exists {
            return Err(CairnError::DuplicateBranch {
                plan_id: plan_id.to_string(),
                branch: name.to_string(),
            });
        }

        let now = Timestamp::now();
        tx.execute(
            INSERT_BRANCH_SQL,
            params![plan_id, name, version_id, now.to_string()],
        )
        .db_context("Failed to insert branch")?;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(Branch {
            plan_id: plan_id.to_string(),
            name: name.to_string(),
            version_id: version_id.to_string(),
            created_at: now,
        })
    }

    pub fn get_branch(&self, plan_id: &str, name: &str) -> Result<Option<Branch>> {
        self.connection
            .query_row(SELECT_BRANCH_SQL, params![plan_id, name], |row| {
                Ok(Branch {
                    plan_id: row.get(0)?,
                    name: row.get(1)?,
                    version_id: row.get(2)?,
                    created_at: timestamp_column(row, 3)?,
                })
            })
            .optional()
            .db_context("Failed to query branch")
    }

    /// Like [`get_branch`](Self::get_branch), failing with `BranchNotFound`.
    pub fn require_branch(&self, plan_id: &str, name: &str) -> Result<Branch> {
        self.get_branch(plan_id, name)?
            .ok_or_else(|| CairnError::branch_not_found(plan_id, name))
    }

    /// Lists a plan's branches in creation order.
    pub fn list_branches(&self, plan_id: &str) -> Result<Vec<Branch>> {
        let mut stmt = self
            .connection
            .prepare(SELECT_BRANCHES_SQL)
            .db_context("Failed to prepare query")?;

        let branches = stmt
            .query_map(params![plan_id], |row| {
                Ok(Branch {
                    plan_id: row.get(0)?,
                    name: row.get(1)?,
                    version_id: row.get(2)?,
                    created_at: timestamp_column(row, 3)?,
                })
            })
            .db_context("Failed to query branches")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch branches")?;
        Ok(branches)
    }

    /// Makes `name` the plan's current branch and loads its tip into the
    /// working copy.
    pub fn checkout(&mut self, plan_id: &str, name: &str) -> Result<Plan> {
        let branch = self.require_branch(plan_id, name)?;
        let tip = self.require_version(plan_id, &branch.version_id)?;

        self.connection
            .execute(
                CHECKOUT_SQL,
                params![
                    name,
                    tip.version_id,
                    serde_json::to_string(&tip.steps)?,
                    Timestamp::now().to_string(),
                    plan_id,
                ],
            )
            .db_context("Failed to check out branch")?;

        self.require_plan(plan_id)
    }
}
