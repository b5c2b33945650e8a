//! SQLite storage for plans and their version history.
//!
//! Plans keep the mutable working copy; versions are append-only rows whose
//! `document` column holds the JSON snapshot. Tags, annotations and branch
//! pointers live in side tables so a version row never changes after insert.

use std::{path::Path, time::Duration};

use jiff::Timestamp;
use rusqlite::{types::Type, Connection, Row};
use serde::de::DeserializeOwned;

use crate::error::{DatabaseResultExt, Result};

pub mod branch_queries;
pub mod migrations;
pub mod plan_queries;
pub mod version_queries;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database connection and operations handler.
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Creates a new database connection and initializes the schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = Connection::open(path).db_context("Failed to open database connection")?;
        // Writers to different plans share the file.
        connection
            .busy_timeout(BUSY_TIMEOUT)
            .db_context("Failed to set busy timeout")?;

        let db = Self { connection };
        db.initialize_schema()?;
        Ok(db)
    }
}

/// Reads an RFC 3339 text column as a timestamp.
pub(crate) fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Timestamp> {
    row.get::<_, String>(idx)?
        .parse::<Timestamp>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Reads a JSON text column into `T`.
pub(crate) fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
