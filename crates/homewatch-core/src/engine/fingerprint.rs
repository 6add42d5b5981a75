//! Change detection over the enabled task list.

use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::models::Task;

/// Deterministic digest of the ordered list of tasks.
///
/// Each task is serialized on its own and the resulting strings are
/// serialized again as one ordered array, so reordering the list changes
/// the fingerprint even when the set of tasks is identical.
pub fn fingerprint(tasks: &[Task]) -> Result<String> {
    let serialized = tasks
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()?;
    let combined = serde_json::to_string(&serialized)?;

    let mut hasher = Sha256::new();
    hasher.update(combined.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}
