//! CLI setup module
//!
//! Builds the collaborator clients and the Homewatch core from the config.

use anyhow::{Context, Result};
use homewatch_core::HomewatchCore;
use homewatch_core::clients::{BridgeClient, HomeAssistantClient, NpmRegistryClient, NtfyNotifier};
use homewatch_core::paths;
use homewatch_core::runtime::{Collaborators, ExecutorConfig};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::CliConfig;

/// Database path. Priority: --db-path / HOMEWATCH_DB_PATH > config file > ~/.homewatch/
pub fn resolve_db_path(cli_db_path: Option<String>, config: &CliConfig) -> Result<PathBuf> {
    if let Some(path) = cli_db_path.or_else(|| config.default.db_path.clone()) {
        return Ok(PathBuf::from(path));
    }
    paths::database_path()
}

fn build_collaborators(config: &CliConfig) -> Result<Collaborators> {
    let bridge = Arc::new(
        BridgeClient::new(config.bridge_url(), config.bridge.token.clone())
            .context("Invalid bridge URL")?,
    );
    let home_assistant = HomeAssistantClient::new(
        config.home_assistant_url(),
        config.home_assistant.token.clone().unwrap_or_default(),
    )
    .context("Invalid Home Assistant URL")?;
    let packages = NpmRegistryClient::new(config.npm_registry()).context("Invalid npm registry URL")?;
    let notifier = NtfyNotifier::new(config.ntfy_server(), config.ntfy.token.clone())
        .context("Invalid ntfy server URL")?;

    Ok(Collaborators {
        registry: bridge.clone(),
        diagnostics: bridge.clone(),
        benchmark: Some(bridge.clone()),
        home_assistant: Arc::new(home_assistant),
        packages: Arc::new(packages),
        notifier: Arc::new(notifier),
        host: bridge,
    })
}

/// Build the embedded Homewatch core
pub fn prepare_core(cli_db_path: Option<String>, config: &CliConfig) -> Result<Arc<HomewatchCore>> {
    let db_path = resolve_db_path(cli_db_path, config)?;
    let executor_config = ExecutorConfig {
        host_plugin: config.host_plugin().to_string(),
        default_notifier: config.default.default_notifier.clone(),
    };

    let core = HomewatchCore::open(&db_path, build_collaborators(config)?, executor_config)?;
    Ok(Arc::new(core))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_path_priority() {
        let mut config = CliConfig::default();
        config.default.db_path = Some("/from/config.db".into());

        assert_eq!(
            resolve_db_path(Some("/from/cli.db".into()), &config).unwrap(),
            PathBuf::from("/from/cli.db")
        );
        assert_eq!(
            resolve_db_path(None, &config).unwrap(),
            PathBuf::from("/from/config.db")
        );
    }

    #[test]
    fn test_prepare_core_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("homewatch.db");
        let core = prepare_core(Some(db.to_string_lossy().into_owned()), &CliConfig::default()).unwrap();

        assert!(db.exists());
        assert!(core.tasks.list_tasks().unwrap().is_empty());
    }
}
