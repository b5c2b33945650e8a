//! Append-only version storage, tags and annotations.

use std::collections::{BTreeMap, BTreeSet};

use jiff::Timestamp;
use log::info;
use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};

use super::{json_column, timestamp_column};
use crate::{
    error::{CairnError, DatabaseResultExt, Result},
    models::{Step, Version, VersionDocument},
};

const VERSION_COLUMNS: &str =
    "plan_id, version_id, sequence, parent_version_id, merged_from, branch, description, document, created_at";
const SELECT_NEXT_SEQUENCE_SQL: &str = "SELECT next_sequence FROM plans WHERE id = ?1";
const SELECT_BRANCH_TIP_SQL: &str = "SELECT version_id FROM branches WHERE plan_id = ?1 AND name = ?2";
const INSERT_VERSION_SQL: &str = "INSERT INTO versions (plan_id, version_id, sequence, parent_version_id, merged_from, branch, description, document, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";
const UPSERT_BRANCH_TIP_SQL: &str = "INSERT INTO branches (plan_id, name, version_id, created_at) VALUES (?1, ?2, ?3, ?4) ON CONFLICT(plan_id, name) DO UPDATE SET version_id = excluded.version_id";
const ADVANCE_PLAN_SQL: &str = "UPDATE plans SET next_sequence = ?1, active_version_id = ?2, current_branch = ?3, steps = ?4, updated_at = ?5 WHERE id = ?6";
const CHECK_VERSION_EXISTS_SQL: &str =
    "SELECT EXISTS(SELECT 1 FROM versions WHERE plan_id = ?1 AND version_id = ?2)";
const INSERT_TAG_SQL: &str = "INSERT OR IGNORE INTO version_tags (plan_id, version_id, tag, created_at) VALUES (?1, ?2, ?3, ?4)";
const SELECT_TAGS_SQL: &str =
    "SELECT tag FROM version_tags WHERE plan_id = ?1 AND version_id = ?2 ORDER BY tag";
const UPSERT_ANNOTATION_SQL: &str = "INSERT INTO version_annotations (plan_id, version_id, key, value, updated_at) VALUES (?1, ?2, ?3, ?4, ?5) ON CONFLICT(plan_id, version_id, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at";
const SELECT_ANNOTATIONS_SQL: &str =
    "SELECT key, value FROM version_annotations WHERE plan_id = ?1 AND version_id = ?2";

/// What to append to a plan's history.
#[derive(Debug, Clone, Copy)]
pub struct NewVersion<'a> {
    /// Branch the version extends; its tip becomes the parent
    pub branch: &'a str,
    pub description: &'a str,
    pub steps: &'a [Step],
    /// Source branch tip when recording a merge
    pub merged_from: Option<&'a str>,
}

impl super::Database {
    /// Appends a version to `branch` and moves the plan onto it.
    ///
    /// Runs in one IMMEDIATE transaction: the sequence number is allocated,
    /// the version row inserted, the branch tip advanced, and the plan's
    /// working copy, active version and current branch updated together.
    /// The first version of a plan creates its branch; afterwards the
    /// branch must already exist.
    pub fn append_version(&mut self, plan_id: &str, new: NewVersion<'_>) -> Result<Version> {
        let tx = self
            .connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .db_context("Failed to begin transaction")?;

        let sequence: i64 = tx
            .query_row(SELECT_NEXT_SEQUENCE_SQL, params![plan_id], |row| row.get(0))
            .optional()
            .db_context("Failed to read version sequence")?
            .ok_or_else(|| CairnError::plan_not_found(plan_id))?;

        let tip: Option<String> = tx
            .query_row(SELECT_BRANCH_TIP_SQL, params![plan_id, new.branch], |row| {
                row.get(0)
            })
            .optional()
            .db_context("Failed to read branch tip")?;
        if tip.is_none() && sequence > 1 {
            return Err(CairnError::branch_not_found(plan_id, new.branch));
        }

        let now = Timestamp::now();
        let version = Version {
            plan_id: plan_id.to_string(),
            version_id: format!("v{sequence}"),
            sequence: sequence as u64,
            parent_version_id: tip,
            merged_from: new.merged_from.map(String::from),
            branch: new.branch.to_string(),
            description: new.description.to_string(),
            steps: new.steps.to_vec(),
            tags: BTreeSet::new(),
            annotations: BTreeMap::new(),
            created_at: now,
        };
        let now_str = now.to_string();

        tx.execute(
            INSERT_VERSION_SQL,
            params![
                version.plan_id,
                version.version_id,
                sequence,
                version.parent_version_id,
                version.merged_from,
                version.branch,
                version.description,
                serde_json::to_string(&version.to_document())?,
                &now_str,
            ],
        )
        .db_context("Failed to insert version")?;

        tx.execute(
            UPSERT_BRANCH_TIP_SQL,
            params![plan_id, new.branch, version.version_id, &now_str],
        )
        .db_context("Failed to advance branch tip")?;

        tx.execute(
            ADVANCE_PLAN_SQL,
            params![
                sequence + 1,
                version.version_id,
                new.branch,
                serde_json::to_string(new.steps)?,
                &now_str,
                plan_id,
            ],
        )
        .db_context("Failed to update plan")?;

        tx.commit().db_context("Failed to commit transaction")?;

        info!(
            "Created version '{}' of plan '{}' on branch '{}'",
            version.version_id, plan_id, version.branch
        );
        Ok(version)
    }

    /// Retrieves one version with its tags and annotations.
    pub fn get_version(&self, plan_id: &str, version_id: &str) -> Result<Option<Version>> {
        let version = self
            .connection
            .query_row(
                &format!("SELECT {VERSION_COLUMNS} FROM versions WHERE plan_id = ?1 AND version_id = ?2"),
                params![plan_id, version_id],
                version_from_row,
            )
            .optional()
            .db_context("Failed to query version")?;

        version.map(|v| self.with_labels(v)).transpose()
    }

    /// Like [`get_version`](Self::get_version), failing with
    /// `VersionNotFound`.
    pub fn require_version(&self, plan_id: &str, version_id: &str) -> Result<Version> {
        self.get_version(plan_id, version_id)?
            .ok_or_else(|| CairnError::version_not_found(plan_id, version_id))
    }

    /// Lists a plan's versions in creation order.
    pub fn list_versions(&self, plan_id: &str) -> Result<Vec<Version>> {
        let mut stmt = self
            .connection
            .prepare(&format!(
                "SELECT {VERSION_COLUMNS} FROM versions WHERE plan_id = ?1 ORDER BY sequence"
            ))
            .db_context("Failed to prepare query")?;

        let versions = stmt
            .query_map(params![plan_id], version_from_row)
            .db_context("Failed to query versions")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch versions")?;

        versions.into_iter().map(|v| self.with_labels(v)).collect()
    }

    /// Attaches `tag` to a version. Returns false when it was already there.
    pub fn add_tag(&mut self, plan_id: &str, version_id: &str, tag: &str) -> Result<bool> {
        self.ensure_version_exists(plan_id, version_id)?;
        let inserted = self
            .connection
            .execute(
                INSERT_TAG_SQL,
                params![plan_id, version_id, tag, Timestamp::now().to_string()],
            )
            .db_context("Failed to tag version")?;
        Ok(inserted > 0)
    }

    /// Sets annotation `key` of a version, replacing any previous value.
    pub fn set_annotation(
        &mut self,
        plan_id: &str,
        version_id: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        self.ensure_version_exists(plan_id, version_id)?;
        self.connection
            .execute(
                UPSERT_ANNOTATION_SQL,
                params![plan_id, version_id, key, value, Timestamp::now().to_string()],
            )
            .db_context("Failed to annotate version")?;
        Ok(())
    }

    pub(crate) fn ensure_version_exists(&self, plan_id: &str, version_id: &str) -> Result<()> {
        let exists: bool = self
            .connection
            .query_row(CHECK_VERSION_EXISTS_SQL, params![plan_id, version_id], |row| {
                row.get(0)
            })
            .db_context("Failed to check version existence")?;
        if exists {
            Ok(())
        } else {
            Err(CairnError::version_not_found(plan_id, version_id))
        }
    }

    fn with_labels(&self, mut version: Version) -> Result<Version> {
        let mut stmt = self
            .connection
            .prepare(SELECT_TAGS_SQL)
            .db_context("Failed to prepare query")?;
        version.tags = stmt
            .query_map(params![version.plan_id, version.version_id], |row| row.get(0))
            .db_context("Failed to query tags")?
            .collect::<std::result::Result<BTreeSet<String>, _>>()
            .db_context("Failed to fetch tags")?;

        let mut stmt = self
            .connection
            .prepare(SELECT_ANNOTATIONS_SQL)
            .db_context("Failed to prepare query")?;
        version.annotations = stmt
            .query_map(params![version.plan_id, version.version_id], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .db_context("Failed to query annotations")?
            .collect::<std::result::Result<BTreeMap<String, String>, _>>()
            .db_context("Failed to fetch annotations")?;

        Ok(version)
    }
}

fn version_from_row(row: &Row<'_>) -> rusqlite::Result<Version> {
    let document: VersionDocument = json_column(row, 7)?;
    Ok(Version {
        plan_id: row.get(0)?,
        version_id: row.get(1)?,
        sequence: row.get::<_, i64>(2)? as u64,
        parent_version_id: row.get(3)?,
        merged_from: row.get(4)?,
        branch: row.get(5)?,
        description: row.get(6)?,
        steps: document.steps,
        tags: BTreeSet::new(),
        annotations: BTreeMap::new(),
        created_at: timestamp_column(row, 8)?,
    })
}
