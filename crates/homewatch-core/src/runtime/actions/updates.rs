//! Plugin update checks and installs.

use anyhow::{Context, Result};
use homewatch_traits::{PackageVersion, PluginInfo};
use tracing::{info, warn};

use super::ActionContext;
use crate::models::TaskReport;

/// Newest version by publish time when `beta` is set; otherwise the version
/// tagged `latest`, falling back to the newest non-beta version.
pub fn select_latest(versions: &[PackageVersion], beta: bool) -> Option<&PackageVersion> {
    if beta {
        return versions.iter().max_by_key(|v| v.published_at);
    }
    versions.iter().find(|v| v.has_tag("latest")).or_else(|| {
        versions
            .iter()
            .filter(|v| !v.is_beta())
            .max_by_key(|v| v.published_at)
    })
}

/// Whether `latest` supersedes the installed version.
///
/// Unknown installed versions (not in the registry) count as outdated.
fn is_newer(installed: &str, latest: &PackageVersion, versions: &[PackageVersion]) -> bool {
    if installed == latest.version {
        return false;
    }
    versions
        .iter()
        .find(|v| v.version == installed)
        .is_none_or(|current| latest.published_at > current.published_at)
}

/// Latest applicable version of `package`, or `None` when the registry has no data.
async fn lookup_latest(ctx: &ActionContext<'_>, package: &str) -> Option<(PackageVersion, Vec<PackageVersion>)> {
    match ctx.collaborators.packages.get_versions(package).await {
        Ok(versions) => {
            let latest = select_latest(&versions, ctx.task.beta)?.clone();
            Some((latest, versions))
        }
        Err(err) => {
            warn!(package = %package, error = %err, "Package registry lookup failed");
            None
        }
    }
}

pub async fn run(ctx: &ActionContext<'_>) -> Result<TaskReport> {
    let registry = &ctx.collaborators.registry;
    let installed: Vec<PluginInfo> = registry
        .list_plugins()
        .await
        .context("Failed to list installed plugins")?;
    let mut lines = Vec::new();

    for package in &ctx.task.plugins {
        let Some((latest, versions)) = lookup_latest(ctx, package).await else {
            lines.push(format!("{}: no data found", package));
            continue;
        };
        let Some(current) = installed.iter().find(|p| p.name == *package) else {
            lines.push(format!("{}: not installed", package));
            continue;
        };

        if !is_newer(&current.version, &latest, &versions) {
            lines.push(format!("{}: up to date ({})", package, current.version));
            continue;
        }

        info!(
            task = %ctx.task.name,
            package = %package,
            from = %current.version,
            to = %latest.version,
            "Installing plugin update"
        );
        match registry.install_version(package, &latest.version).await {
            Ok(()) => lines.push(format!(
                "{}: {} -> {}",
                package, current.version, latest.version
            )),
            Err(err) => lines.push(format!(
                "Failed to update {} to {}: {}",
                package, latest.version, err
            )),
        }
    }

    if ctx.task.check_all_plugins {
        let mut outdated = Vec::new();
        for plugin in installed
            .iter()
            .filter(|p| !ctx.task.plugins.contains(&p.name))
        {
            match lookup_latest(ctx, &plugin.name).await {
                Some((latest, versions)) => {
                    if is_newer(&plugin.version, &latest, &versions) {
                        outdated.push(format!(
                            "- {}: {} -> {}",
                            plugin.name, plugin.version, latest.version
                        ));
                    }
                }
                None => outdated.push(format!("- {}: no data found", plugin.name)),
            }
        }

        if !outdated.is_empty() {
            lines.push(format!("Outdated plugins:\n{}", outdated.join("\n")));
        }
    }

    if lines.is_empty() {
        lines.push("No plugins to update".to_string());
    }

    Ok(TaskReport::new(lines.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Task, TaskType};
    use crate::testkit::TestHarness;
    use chrono::{Duration, Utc};

    fn version(v: &str, tags: &[&str], days_ago: i64) -> PackageVersion {
        PackageVersion {
            version: v.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            published_at: Utc::now() - Duration::days(days_ago),
        }
    }

    fn history() -> Vec<PackageVersion> {
        vec![
            version("1.0.0", &[], 30),
            version("1.1.0", &["latest"], 10),
            version("1.2.0-beta.1", &["beta"], 2),
        ]
    }

    #[test]
    fn test_select_latest_skips_beta() {
        let versions = history();
        assert_eq!(select_latest(&versions, false).unwrap().version, "1.1.0");
    }

    #[test]
    fn test_select_latest_with_beta() {
        let versions = history();
        assert_eq!(select_latest(&versions, true).unwrap().version, "1.2.0-beta.1");
    }

    #[test]
    fn test_select_latest_empty() {
        assert!(select_latest(&[], true).is_none());
        let only_beta = vec![version("2.0.0-beta.0", &[], 1)];
        assert!(select_latest(&only_beta, false).is_none());
    }

    #[test]
    fn test_select_latest_promoted_beta_is_stable() {
        let versions = vec![
            version("1.0.0", &[], 30),
            version("1.1.0", &["beta", "latest"], 5),
        ];
        assert_eq!(select_latest(&versions, false).unwrap().version, "1.1.0");
    }

    #[test]
    fn test_select_latest_follows_latest_tag() {
        // 1.2.0 shipped under beta and lost the tag without being promoted.
        let versions = vec![
            version("1.1.0", &["latest"], 10),
            version("1.2.0", &[], 2),
        ];
        assert_eq!(select_latest(&versions, false).unwrap().version, "1.1.0");
        assert_eq!(select_latest(&versions, true).unwrap().version, "1.2.0");
    }

    fn task(plugins: &[&str]) -> Task {
        let mut task = Task::new("Update").with_type(TaskType::UpdatePlugins);
        task.plugins = plugins.iter().map(|p| p.to_string()).collect();
        task
    }

    #[tokio::test]
    async fn test_installs_newer_version() {
        let harness = TestHarness::new();
        harness.registry.add_plugin("@scrypted/nvr", "1.0.0").await;
        harness.packages.set_versions("@scrypted/nvr", history()).await;

        let report = run(&harness.context(&task(&["@scrypted/nvr"]))).await.unwrap();

        assert_eq!(
            harness.registry.installed().await,
            vec![("@scrypted/nvr".to_string(), "1.1.0".to_string())]
        );
        assert_eq!(report.message, "@scrypted/nvr: 1.0.0 -> 1.1.0");
    }

    #[tokio::test]
    async fn test_beta_task_installs_beta() {
        let harness = TestHarness::new();
        harness.registry.add_plugin("@scrypted/nvr", "1.1.0").await;
        harness.packages.set_versions("@scrypted/nvr", history()).await;

        let mut task = task(&["@scrypted/nvr"]);
        task.beta = true;
        run(&harness.context(&task)).await.unwrap();

        assert_eq!(
            harness.registry.installed().await,
            vec![("@scrypted/nvr".to_string(), "1.2.0-beta.1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_up_to_date_and_missing_data() {
        let harness = TestHarness::new();
        harness.registry.add_plugin("@scrypted/nvr", "1.1.0").await;
        harness.registry.add_plugin("@scrypted/ghost", "0.1.0").await;
        harness.packages.set_versions("@scrypted/nvr", history()).await;

        let report = run(&harness.context(&task(&["@scrypted/nvr", "@scrypted/ghost"])))
            .await
            .unwrap();

        assert!(harness.registry.installed().await.is_empty());
        assert_eq!(
            report.message,
            "@scrypted/nvr: up to date (1.1.0)\n@scrypted/ghost: no data found"
        );
    }

    #[tokio::test]
    async fn test_check_all_reports_without_installing() {
        let harness = TestHarness::new();
        harness.registry.add_plugin("@scrypted/nvr", "1.1.0").await;
        harness.registry.add_plugin("@scrypted/onvif", "1.0.0").await;
        harness.packages.set_versions("@scrypted/nvr", history()).await;
        harness.packages.set_versions("@scrypted/onvif", history()).await;

        let mut task = task(&["@scrypted/nvr"]);
        task.check_all_plugins = true;
        let report = run(&harness.context(&task)).await.unwrap();

        assert!(harness.registry.installed().await.is_empty());
        assert!(
            report
                .message
                .ends_with("Outdated plugins:\n- @scrypted/onvif: 1.0.0 -> 1.1.0")
        );
    }
}
