use crate::error::Result;

// ── ConfigStore ─────────────────────────────────────────────────────

/// Flat string key-value configuration.
///
/// Task fields live under `task:<name>:<field>`. The scheduling core only
/// reads; writes come from the manual trigger and task administration.
pub trait ConfigStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Returns true if the key existed.
    fn delete(&self, key: &str) -> Result<bool>;
    fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>>;
}
