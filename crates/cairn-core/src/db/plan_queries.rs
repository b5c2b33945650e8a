//! Plan CRUD operations and queries.

use std::collections::BTreeMap;

use jiff::Timestamp;
use rusqlite::{params, OptionalExtension, Row};

use super::{json_column, timestamp_column};
use crate::{
    error::{CairnError, DatabaseResultExt, Result},
    models::{Plan, Step, MAIN_BRANCH},
};

const INSERT_PLAN_SQL: &str = "INSERT INTO plans (id, title, description, steps, metadata, current_branch, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)";
const PLAN_COLUMNS: &str =
    "id, title, description, steps, metadata, active_version_id, current_branch, created_at, updated_at";
const CHECK_PLAN_EXISTS_SQL: &str = "SELECT EXISTS(SELECT 1 FROM plans WHERE id = ?1)";
const UPDATE_WORKING_COPY_SQL: &str = "UPDATE plans SET title = ?1, description = ?2, steps = ?3, metadata = ?4, updated_at = ?5 WHERE id = ?6";
const SELECT_BRANCH_TIPS_SQL: &str = "SELECT name, version_id FROM branches WHERE plan_id = ?1";

impl super::Database {
    /// Creates a plan whose working copy holds `steps`. No version is
    /// created.
    pub fn create_plan(
        &mut self,
        id: &str,
        title: &str,
        description: Option<&str>,
        steps: &[Step],
        metadata: &BTreeMap<String, String>,
    ) -> Result<Plan> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let exists: bool = tx
            .query_row(CHECK_PLAN_EXISTS_SQL, params![id], |row| row.get(0))
            .db_context("Failed to check plan existence")?;
        if exists {
            return Err(CairnError::DuplicatePlan {
                plan_id: id.to_string(),
            });
        }

        let now = Timestamp::now();
        tx.execute(
            INSERT_PLAN_SQL,
            params![
                id,
                title,
                description,
                serde_json::to_string(steps)?,
                serde_json::to_string(metadata)?,
                MAIN_BRANCH,
                now.to_string(),
            ],
        )
        .db_context("Failed to insert plan")?;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(Plan {
            id: id.to_string(),
            title: title.to_string(),
            description: description.map(String::from),
            steps: steps.to_vec(),
            metadata: metadata.clone(),
            active_version_id: None,
            current_branch: MAIN_BRANCH.to_string(),
            branches: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Retrieves a plan by its ID, branch tips included.
    pub fn get_plan(&self, id: &str) -> Result<Option<Plan>> {
        let mut plan = self
            .connection
            .query_row(
                &format!("SELECT {PLAN_COLUMNS} FROM plans WHERE id = ?1"),
                params![id],
                plan_from_row,
            )
            .optional()
            .db_context("Failed to query plan")?;

        if let Some(ref mut plan) = plan {
            plan.branches = self.branch_tips(&plan.id)?;
        }

        Ok(plan)
    }

    /// Like [`get_plan`](Self::get_plan), failing with `PlanNotFound`.
    pub fn require_plan(&self, id: &str) -> Result<Plan> {
        self.get_plan(id)?
            .ok_or_else(|| CairnError::plan_not_found(id))
    }

    /// Lists all plans, most recently created first.
    pub fn list_plans(&self) -> Result<Vec<Plan>> {
        let mut stmt = self
            .connection
            .prepare(&format!(
                "SELECT {PLAN_COLUMNS} FROM plans ORDER BY rowid DESC"
            ))
            .db_context("Failed to prepare query")?;

        let mut plans = stmt
            .query_map([], plan_from_row)
            .db_context("Failed to query plans")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch plans")?;

        for plan in &mut plans {
            plan.branches = self.branch_tips(&plan.id)?;
        }

        Ok(plans)
    }

    /// Writes the working copy fields of `plan` (title, description, steps,
    /// metadata). Version pointers are not touched.
    pub fn update_working_copy(&mut self, plan: &Plan) -> Result<Timestamp> {
        let now = Timestamp::now();
        let rows = self
            .connection
            .execute(
                UPDATE_WORKING_COPY_SQL,
                params![
                    plan.title,
                    plan.description,
                    serde_json::to_string(&plan.steps)?,
                    serde_json::to_string(&plan.metadata)?,
                    now.to_string(),
                    plan.id,
                ],
            )
            .db_context("Failed to update plan")?;

        if rows == 0 {
            return Err(CairnError::plan_not_found(&plan.id));
        }
        Ok(now)
    }

    fn branch_tips(&self, plan_id: &str) -> Result<BTreeMap<String, String>> {
        let mut stmt = self
            .connection
            .prepare(SELECT_BRANCH_TIPS_SQL)
            .db_context("Failed to prepare query")?;

        let tips = stmt
            .query_map(params![plan_id], |row| Ok((row.get(0)?, row.get(1)?)))
            .db_context("Failed to query branches")?
            .collect::<std::result::Result<BTreeMap<String, String>, _>>()
            .db_context("Failed to fetch branches")?;
        Ok(tips)
    }
}

fn plan_from_row(row: &Row<'_>) -> rusqlite::Result<Plan> {
    Ok(Plan {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        steps: json_column(row, 3)?,
        metadata: json_column(row, 4)?,
        active_version_id: row.get(5)?,
        current_branch: row.get(6)?,
        branches: BTreeMap::new(),
        created_at: timestamp_column(row, 7)?,
        updated_at: timestamp_column(row, 8)?,
    })
}
