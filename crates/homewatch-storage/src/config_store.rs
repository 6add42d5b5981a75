//! redb-backed Configuration Store.

use crate::SimpleStorage;
use anyhow::Result;
use homewatch_traits::{CollaboratorError, ConfigStore};
use redb::{Database, TableDefinition};
use std::sync::Arc;

const CONFIG_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("config");

/// Flat string key-value table holding the task configuration.
#[derive(Debug, Clone)]
pub struct ConfigTable {
    db: Arc<Database>,
}

impl ConfigTable {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        // Create table
        let write_txn = db.begin_write()?;
        write_txn.open_table(CONFIG_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        match self.get_raw(key)? {
            Some(bytes) => Ok(Some(String::from_utf8(bytes)?)),
            None => Ok(None),
        }
    }

    pub fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.put_raw(key, value.as_bytes())
    }
}

impl SimpleStorage for ConfigTable {
    const TABLE: TableDefinition<'static, &'static str, &'static [u8]> = CONFIG_TABLE;

    fn db(&self) -> &Arc<Database> {
        &self.db
    }
}

fn storage_err(err: anyhow::Error) -> CollaboratorError {
    CollaboratorError::Storage(err.to_string())
}

impl ConfigStore for ConfigTable {
    fn get(&self, key: &str) -> homewatch_traits::Result<Option<String>> {
        self.get_string(key).map_err(storage_err)
    }

    fn set(&self, key: &str, value: &str) -> homewatch_traits::Result<()> {
        self.set_string(key, value).map_err(storage_err)
    }

    fn delete(&self, key: &str) -> homewatch_traits::Result<bool> {
        SimpleStorage::delete(self, key).map_err(storage_err)
    }

    fn list_keys(&self, prefix: Option<&str>) -> homewatch_traits::Result<Vec<String>> {
        SimpleStorage::list_keys(self, prefix).map_err(storage_err)
    }
}
