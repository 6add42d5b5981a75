//! Plugin host status snapshot.

use anyhow::{Context, Result};
use homewatch_traits::PluginStats;
use tracing::warn;

use super::ActionContext;
use super::format::render_stat_section;
use crate::models::TaskReport;

/// Render the snapshot as sections capped at `max_stats` entries each.
pub fn render_stats(stats: &PluginStats, max_stats: usize) -> Vec<String> {
    let mut sections = Vec::new();
    sections.extend(render_stat_section("RPC objects", &stats.rpc_objects, max_stats));
    sections.extend(render_stat_section(
        "Pending results",
        &stats.pending_results,
        max_stats,
    ));
    sections.extend(render_stat_section("Connections", &stats.connections, max_stats));

    if let Some(cluster) = &stats.cluster {
        sections.extend(render_stat_section("Cluster workers", &cluster.workers, max_stats));
        sections.extend(render_stat_section("Cluster devices", &cluster.devices, max_stats));
    }
    sections
}

pub async fn run(ctx: &ActionContext<'_>) -> Result<TaskReport> {
    let stats = ctx
        .collaborators
        .registry
        .plugin_stats()
        .await
        .context("Failed to collect plugin stats")?;

    let mut sections = render_stats(&stats, ctx.task.max_stats as usize);

    if ctx.task.run_benchmark {
        match &ctx.collaborators.benchmark {
            Some(benchmark) => match benchmark.run_benchmark().await {
                Ok(summary) => sections.push(format!("Benchmark:\n{}", summary.trim_end())),
                Err(err) => {
                    warn!(task = %ctx.task.name, error = %err, "Benchmark failed");
                    sections.push(format!("Benchmark: failed ({})", err));
                }
            },
            None => sections.push("Benchmark: not available".to_string()),
        }
    }

    if sections.is_empty() {
        sections.push("No stats available".to_string());
    }

    Ok(TaskReport::new(sections.join("\n\n")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Task, TaskType};
    use crate::testkit::TestHarness;
    use homewatch_traits::{ClusterStats, StatEntry};

    fn stats(with_cluster: bool) -> PluginStats {
        PluginStats {
            rpc_objects: vec![
                StatEntry::new("@scrypted/nvr", 120),
                StatEntry::new("@scrypted/core", 40),
                StatEntry::new("@scrypted/onvif", 300),
            ],
            pending_results: vec![],
            connections: vec![StatEntry::new("@scrypted/nvr", 3)],
            cluster: with_cluster.then(|| ClusterStats {
                workers: vec![StatEntry::new("server", 4), StatEntry::new("mini", 2)],
                devices: vec![],
            }),
        }
    }

    #[test]
    fn test_sections_without_cluster() {
        let sections = render_stats(&stats(false), 2);
        assert_eq!(
            sections,
            vec![
                "RPC objects:\n- @scrypted/onvif: 300\n- @scrypted/nvr: 120".to_string(),
                "Connections:\n- @scrypted/nvr: 3".to_string(),
            ]
        );
    }

    #[test]
    fn test_cluster_section_present() {
        let sections = render_stats(&stats(true), 5);
        assert_eq!(sections.last().unwrap(), "Cluster workers:\n- server: 4\n- mini: 2");
    }

    #[tokio::test]
    async fn test_benchmark_section() {
        let harness = TestHarness::new();
        harness.registry.set_stats(stats(false)).await;

        let mut task = Task::new("Status").with_type(TaskType::ReportPluginsStatus);
        task.run_benchmark = true;
        let report = run(&harness.context(&task)).await.unwrap();

        assert!(report.message.ends_with("Benchmark:\nall good"));
        assert!(!report.force_stop);
    }
}
