//! Device and system validation.

use anyhow::Result;
use homewatch_traits::{NotificationPriority, StepOutcome, StepStatus};
use tracing::{info, warn};

use super::ActionContext;
use crate::models::TaskReport;

fn status_marker(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Ok => "✅",
        StepStatus::Warn => "⚠️",
        StepStatus::Error => "❌",
    }
}

fn render_steps(lines: &mut Vec<String>, outcomes: &[StepOutcome]) {
    for outcome in outcomes {
        let mut line = format!("{} {}", status_marker(outcome.status), outcome.step);
        if let Some(message) = outcome.message.as_deref().filter(|m| !m.is_empty()) {
            line.push_str(&format!(": {}", message));
        }
        lines.push(line);
    }
}

fn has_errors(outcomes: &[StepOutcome]) -> bool {
    outcomes.iter().any(|o| o.status == StepStatus::Error)
}

pub async fn run(ctx: &ActionContext<'_>) -> Result<TaskReport> {
    let registry = &ctx.collaborators.registry;
    let diagnostics = &ctx.collaborators.diagnostics;
    let mut lines = Vec::new();
    let mut any_errors = false;

    for device_id in &ctx.task.devices {
        let device = match registry.get_device(device_id).await {
            Ok(Some(device)) => device,
            Ok(None) => {
                lines.push(format!("[{}] Device not found", device_id));
                continue;
            }
            Err(err) => {
                lines.push(format!("[{}] Unable to load device: {}", device_id, err));
                continue;
            }
        };

        lines.push(format!("[{}]", device.name));
        let outcomes = match diagnostics.validate_device(&device.id).await {
            Ok(outcomes) => outcomes,
            Err(err) => {
                lines.push(format!("{} Validation failed: {}", status_marker(StepStatus::Error), err));
                any_errors = true;
                continue;
            }
        };
        render_steps(&mut lines, &outcomes);

        if !has_errors(&outcomes) {
            continue;
        }
        any_errors = true;

        if ctx.task.reboot_on_errors && device.can_reboot() {
            info!(task = %ctx.task.name, device = %device.name, "Rebooting device after failed validation");
            match registry.reboot_device(&device.id).await {
                Ok(()) => lines.push(format!("Rebooted {}", device.name)),
                Err(err) => {
                    warn!(device = %device.name, error = %err, "Reboot failed");
                    lines.push(format!("Failed to reboot {}: {}", device.name, err));
                }
            }
        }
    }

    if ctx.task.validate_system {
        lines.push("[System]".to_string());
        match diagnostics.validate_system().await {
            Ok(outcomes) => {
                any_errors |= has_errors(&outcomes);
                render_steps(&mut lines, &outcomes);
            }
            Err(err) => {
                any_errors = true;
                lines.push(format!("{} Validation failed: {}", status_marker(StepStatus::Error), err));
            }
        }
    }

    if lines.is_empty() {
        lines.push("No devices to validate".to_string());
    }

    let report = TaskReport::new(lines.join("\n"));
    Ok(if any_errors {
        report.with_priority(NotificationPriority::High)
    } else {
        report
    })
}
