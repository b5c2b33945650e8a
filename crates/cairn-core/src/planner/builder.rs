//! Builder for creating and configuring Planner instances.

use std::path::{Path, PathBuf};

use log::debug;
use tokio::task;

use super::Planner;
use crate::{
    db::Database,
    error::{CairnError, Result},
};

/// Builder for creating and configuring Planner instances.
#[derive(Debug, Clone, Default)]
pub struct PlannerBuilder {
    database_path: Option<PathBuf>,
}

impl PlannerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom database file path.
    ///
    /// If not specified, uses the XDG Base Directory specification:
    /// `$XDG_DATA_HOME/cairn/cairn.db` or `~/.local/share/cairn/cairn.db`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.database_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Builds the configured planner instance.
    ///
    /// # Errors
    ///
    /// Returns `CairnError::FileSystem` if the database directory cannot be
    /// created, `CairnError::Database` if schema initialization fails.
    pub async fn build(self) -> Result<Planner> {
        let db_path = match self.database_path {
            Some(path) => path,
            None => Self::default_database_path()?,
        };

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CairnError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let db_path_clone = db_path.clone();
        task::spawn_blocking(move || {
            let _db = Database::new(&db_path_clone)?;
            Ok::<(), CairnError>(())
        })
        .await
        .map_err(|e| CairnError::Configuration {
            message: format!("Task join error: {e}"),
        })??;

        debug!("Using database at {}", db_path.display());
        Ok(Planner::new(db_path))
    }

    /// Returns the default database path following the XDG Base Directory
    /// specification.
    fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("cairn")
            .place_data_file("cairn.db")
            .map_err(|e| CairnError::XdgDirectory(e.to_string()))
    }
}
