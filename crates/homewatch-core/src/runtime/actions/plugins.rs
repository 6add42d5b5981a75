//! Plugin and host restarts.

use anyhow::Result;
use tracing::{info, warn};

use super::ActionContext;
use crate::models::{DeferredAction, TaskReport};

/// Restart every target plugin; the host plugin itself restarts after notification.
pub async fn restart_plugins(ctx: &ActionContext<'_>) -> Result<TaskReport> {
    let registry = &ctx.collaborators.registry;
    let mut lines = Vec::new();
    let mut restart_self = false;

    for plugin in &ctx.task.plugins {
        if *plugin == ctx.config.host_plugin {
            restart_self = true;
            lines.push(format!("Restarting {} after notification", plugin));
            continue;
        }

        info!(task = %ctx.task.name, plugin = %plugin, "Restarting plugin");
        match registry.restart_plugin(plugin).await {
            Ok(()) => lines.push(format!("Restarted {}", plugin)),
            Err(err) => {
                warn!(plugin = %plugin, error = %err, "Plugin restart failed");
                lines.push(format!("Failed to restart {}: {}", plugin, err));
            }
        }
    }

    if lines.is_empty() {
        lines.push("No plugins to restart".to_string());
    }

    let report = TaskReport::new(lines.join("\n"));
    Ok(if restart_self {
        report.with_deferred(DeferredAction::RestartSelf)
    } else {
        report
    })
}

/// Announce the host restart; the restart itself is deferred.
pub async fn restart_host(_ctx: &ActionContext<'_>) -> Result<TaskReport> {
    Ok(TaskReport::new("Restarting host process").with_deferred(DeferredAction::RestartHostProcess))
}
