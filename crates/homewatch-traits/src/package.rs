//! Package registry abstraction used for plugin update checks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A single published version of a package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageVersion {
    pub version: String,
    /// Distribution tags pointing at this version (`latest`, `beta`, ...).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub published_at: DateTime<Utc>,
}

impl PackageVersion {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// A version is beta when tagged `beta` or when its prerelease part says so.
    /// The `latest` tag always marks a stable release.
    pub fn is_beta(&self) -> bool {
        if self.has_tag("latest") {
            return false;
        }
        if self.has_tag("beta") {
            return true;
        }
        self.version
            .split_once('-')
            .is_some_and(|(_, pre)| pre.to_ascii_lowercase().contains("beta"))
    }
}

#[async_trait]
pub trait PackageRegistry: Send + Sync {
    /// All published versions of `package`, in no particular order.
    async fn get_versions(&self, package: &str) -> Result<Vec<PackageVersion>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(v: &str, tags: &[&str]) -> PackageVersion {
        PackageVersion {
            version: v.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            published_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_beta_by_tag() {
        assert!(version("1.2.0", &["beta"]).is_beta());
        assert!(!version("1.2.0", &["latest"]).is_beta());
    }

    #[test]
    fn test_latest_tag_wins_over_beta() {
        assert!(!version("1.2.0", &["beta", "latest"]).is_beta());
        assert!(!version("1.2.0", &["latest", "beta"]).is_beta());
    }

    #[test]
    fn test_is_beta_by_prerelease() {
        assert!(version("1.3.0-beta.2", &[]).is_beta());
        assert!(!version("1.3.0-rc.1", &[]).is_beta());
        assert!(!version("1.3.0", &[]).is_beta());
    }
}
