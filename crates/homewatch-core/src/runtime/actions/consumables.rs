//! Consumables running out (filters, ink, salt, ...).

use anyhow::{Context, Result};
use homewatch_traits::{EntityState, NotificationPriority};

use super::ActionContext;
use crate::models::{Task, TaskReport};

const PERCENT_THRESHOLD: f64 = 10.0;
const DAYS_THRESHOLD: f64 = 3.0;

/// Why an entity is flagged, or `None` when it is fine.
fn flag(entity: &EntityState) -> Option<String> {
    if entity.device_class() == Some("problem") {
        return (entity.state == "on").then(|| "problem reported".to_string());
    }

    let value = entity.numeric_state()?;
    match entity.unit_of_measurement()? {
        "%" if value < PERCENT_THRESHOLD => Some(format!("{}%", entity.state)),
        "d" | "days" if value <= DAYS_THRESHOLD => Some(format!("{} days left", entity.state)),
        _ => None,
    }
}

pub fn flagged_consumables(states: &[EntityState], task: &Task) -> Vec<String> {
    task.entities_to_always_report
        .iter()
        .filter_map(|entity_id| states.iter().find(|e| e.entity_id == *entity_id))
        .filter_map(|entity| {
            flag(entity).map(|reason| format!("- {}: {}", entity.display_name(), reason))
        })
        .collect()
}

pub async fn run(ctx: &ActionContext<'_>) -> Result<TaskReport> {
    let states = ctx
        .collaborators
        .home_assistant
        .get_all_entity_states()
        .await
        .context("Failed to fetch entity states")?;

    let flagged = flagged_consumables(&states, ctx.task);
    if flagged.is_empty() {
        return Ok(TaskReport::silent());
    }

    Ok(
        TaskReport::new(format!("Consumables to replace:\n{}", flagged.join("\n")))
            .with_priority(NotificationPriority::Normal),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskType;
    use crate::testkit::TestHarness;

    fn entity(id: &str, state: &str, unit: &str) -> EntityState {
        EntityState::new(id, state).with_attribute("unit_of_measurement", unit)
    }

    fn task(ids: &[&str]) -> Task {
        let mut task = Task::new("Consumables").with_type(TaskType::ReportHaConsumables);
        task.entities_to_always_report = ids.iter().map(|id| id.to_string()).collect();
        task
    }

    #[test]
    fn test_flags_each_kind() {
        let states = vec![
            entity("sensor.ink", "8", "%"),
            entity("sensor.filter", "45", "%"),
            entity("sensor.salt_days", "3", "d"),
            entity("sensor.brush_days", "12", "days"),
            EntityState::new("binary_sensor.bin_full", "on").with_attribute("device_class", "problem"),
            EntityState::new("binary_sensor.tank", "off").with_attribute("device_class", "problem"),
            entity("sensor.not_tracked", "1", "%"),
        ];
        let flagged = flagged_consumables(
            &states,
            &task(&[
                "sensor.ink",
                "sensor.filter",
                "sensor.salt_days",
                "sensor.brush_days",
                "binary_sensor.bin_full",
                "binary_sensor.tank",
            ]),
        );

        assert_eq!(
            flagged,
            vec![
                "- sensor.ink: 8%",
                "- sensor.salt_days: 3 days left",
                "- binary_sensor.bin_full: problem reported",
            ]
        );
    }

    #[tokio::test]
    async fn test_nothing_flagged_force_stops() {
        let harness = TestHarness::new();
        harness
            .home_assistant
            .set_states(vec![entity("sensor.filter", "45", "%")])
            .await;

        let report = run(&harness.context(&task(&["sensor.filter"]))).await.unwrap();
        assert!(report.force_stop);
    }

    #[tokio::test]
    async fn test_flagged_reports() {
        let harness = TestHarness::new();
        harness
            .home_assistant
            .set_states(vec![entity("sensor.ink", "2", "%")])
            .await;

        let report = run(&harness.context(&task(&["sensor.ink"]))).await.unwrap();
        assert!(!report.force_stop);
        assert_eq!(report.message, "Consumables to replace:\n- sensor.ink: 2%");
    }
}
