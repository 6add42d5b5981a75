use async_trait::async_trait;
use chrono::{DateTime, Utc};
use homewatch_traits::{CollaboratorError, PackageRegistry, PackageVersion, Result};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use url::Url;

use super::{endpoint, http_client, parse_base_url, send_json};

pub const DEFAULT_NPM_REGISTRY: &str = "https://registry.npmjs.org";

/// Package document fields we use.
#[derive(Debug, Deserialize)]
struct PackageDocument {
    #[serde(rename = "dist-tags", default)]
    dist_tags: HashMap<String, String>,
    #[serde(default)]
    time: HashMap<String, String>,
}

/// Every published version with its publish time and dist-tags.
fn versions_from_document(doc: PackageDocument) -> Vec<PackageVersion> {
    let mut versions: Vec<PackageVersion> = doc
        .time
        .into_iter()
        .filter(|(key, _)| key != "created" && key != "modified")
        .filter_map(|(version, published)| {
            let published_at = DateTime::parse_from_rfc3339(&published)
                .ok()?
                .with_timezone(&Utc);
            let mut tags: Vec<String> = doc
                .dist_tags
                .iter()
                .filter(|(_, tagged)| **tagged == version)
                .map(|(tag, _)| tag.clone())
                .collect();
            tags.sort();
            Some(PackageVersion {
                version,
                tags,
                published_at,
            })
        })
        .collect();
    versions.sort_by_key(|v| v.published_at);
    versions
}

/// npm registry client.
pub struct NpmRegistryClient {
    client: Client,
    registry: Url,
}

impl NpmRegistryClient {
    pub fn new(registry: &str) -> Result<Self> {
        Ok(Self {
            client: http_client(),
            registry: parse_base_url(registry)?,
        })
    }
}

#[async_trait]
impl PackageRegistry for NpmRegistryClient {
    async fn get_versions(&self, package: &str) -> Result<Vec<PackageVersion>> {
        let url = endpoint(&self.registry, &[package])?;
        match send_json::<PackageDocument>(self.client.get(url)).await {
            Ok(doc) => Ok(versions_from_document(doc)),
            Err(err) if err.is_not_found() => Err(CollaboratorError::NotFound(package.to_string())),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_from_document() {
        let doc: PackageDocument = serde_json::from_str(
            r#"{
                "name": "@scrypted/nvr",
                "dist-tags": {"latest": "1.1.0", "beta": "1.2.0-beta.1"},
                "time": {
                    "created": "2020-01-01T00:00:00.000Z",
                    "modified": "2026-03-01T00:00:00.000Z",
                    "1.2.0-beta.1": "2026-02-20T10:00:00.000Z",
                    "1.0.0": "2025-01-01T10:00:00.000Z",
                    "1.1.0": "2026-01-15T10:00:00.000Z"
                }
            }"#,
        )
        .unwrap();

        let versions = versions_from_document(doc);
        let names: Vec<&str> = versions.iter().map(|v| v.version.as_str()).collect();
        assert_eq!(names, vec!["1.0.0", "1.1.0", "1.2.0-beta.1"]);
        assert!(versions[0].tags.is_empty());
        assert_eq!(versions[1].tags, vec!["latest"]);
        assert!(versions[2].is_beta());
    }

    #[test]
    fn test_promoted_beta_keeps_every_tag() {
        let doc: PackageDocument = serde_json::from_str(
            r#"{
                "dist-tags": {"latest": "1.1.0", "beta": "1.1.0"},
                "time": {
                    "1.0.0": "2025-01-01T10:00:00.000Z",
                    "1.1.0": "2026-01-15T10:00:00.000Z"
                }
            }"#,
        )
        .unwrap();

        let versions = versions_from_document(doc);
        assert_eq!(versions[1].tags, vec!["beta", "latest"]);
        assert!(!versions[1].is_beta());
    }

    #[test]
    fn test_missing_sections_yield_nothing() {
        let doc: PackageDocument = serde_json::from_str(r#"{"name": "x"}"#).unwrap();
        assert!(versions_from_document(doc).is_empty());
    }
}
