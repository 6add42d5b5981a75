//! Scheduled camera reboots.

use anyhow::Result;
use tracing::{info, warn};

use super::ActionContext;
use crate::models::TaskReport;

pub async fn run(ctx: &ActionContext<'_>) -> Result<TaskReport> {
    let registry = &ctx.collaborators.registry;
    let mut lines = Vec::new();

    for device_id in &ctx.task.devices {
        let name = match registry.get_device(device_id).await {
            Ok(Some(device)) => device.name,
            Ok(None) => {
                lines.push(format!("{}: device not found", device_id));
                continue;
            }
            Err(err) => {
                lines.push(format!("{}: unable to load device: {}", device_id, err));
                continue;
            }
        };

        info!(task = %ctx.task.name, device = %name, "Rebooting device");
        match registry.reboot_device(device_id).await {
            Ok(()) => lines.push(format!("Rebooted {}", name)),
            Err(err) => {
                warn!(device = %name, error = %err, "Reboot failed");
                lines.push(format!("Failed to reboot {}: {}", name, err));
            }
        }
    }

    if lines.is_empty() {
        lines.push("No devices to reboot".to_string());
    }

    Ok(TaskReport::new(lines.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Task, TaskType};
    use crate::testkit::TestHarness;
    use homewatch_traits::DeviceInfo;

    fn device(id: &str, name: &str) -> DeviceInfo {
        DeviceInfo {
            id: id.to_string(),
            name: name.to_string(),
            interfaces: vec!["Reboot".to_string()],
        }
    }

    #[tokio::test]
    async fn test_reboots_in_configured_order() {
        let harness = TestHarness::new();
        harness.registry.add_device(device("1", "Porch")).await;
        harness.registry.add_device(device("2", "Garage")).await;
        harness.registry.fail_reboot("1").await;

        let mut task = Task::new("Cameras").with_type(TaskType::RestartCameras);
        task.devices = vec!["2".into(), "9".into(), "1".into()];
        let report = run(&harness.context(&task)).await.unwrap();

        assert_eq!(harness.registry.rebooted().await, vec!["2"]);
        let lines: Vec<&str> = report.message.lines().collect();
        assert_eq!(lines[0], "Rebooted Garage");
        assert_eq!(lines[1], "9: device not found");
        assert!(lines[2].starts_with("Failed to reboot Porch"));
    }
}
