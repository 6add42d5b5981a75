//! Homewatch Storage - Configuration Store implementations
//!
//! This crate provides the flat key-value Configuration Store used by the
//! scheduler, backed by redb as the embedded database, plus an in-memory
//! variant for ephemeral runs and tests.
//!
//! # Layout
//!
//! All values are UTF-8 strings in a single `config` table:
//!
//! - `tasks` - JSON array of task names, order significant
//! - `defaultNotifier` - fallback notifier target
//! - `task:<name>:<field>` - one field of one task

pub mod config_store;
pub mod keys;
pub mod memory;
pub mod simple_storage;

use anyhow::{Context, Result};
use redb::Database;
use std::path::Path;
use std::sync::Arc;

pub use config_store::ConfigTable;
pub use keys::{DEFAULT_NOTIFIER_KEY, TASK_LIST_KEY, task_key};
pub use memory::MemoryConfigStore;
pub use simple_storage::SimpleStorage;

/// Central storage manager that opens the database and its tables
pub struct Storage {
    pub config: ConfigTable,
}

impl Storage {
    /// Create a new storage instance at the given path.
    ///
    /// This will create the database file if it doesn't exist and initialize
    /// all required tables.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let db = Arc::new(
            Database::create(path)
                .with_context(|| format!("Failed to open database at {}", path.display()))?,
        );
        let config = ConfigTable::new(db.clone())?;

        tracing::debug!(path = %path.display(), "Storage opened");
        Ok(Self { config })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_second_open_reports_lock() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("homewatch.db");
        let _first = Storage::new(&path).unwrap();

        let err = Storage::new(&path).err().unwrap();
        let message = format!("{:#}", err);
        assert!(message.contains("Failed to open database"));
        assert!(message.to_lowercase().contains("already open"));
    }
}
