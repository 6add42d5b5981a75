//! Home-automation battery levels.

use anyhow::{Context, Result};
use homewatch_traits::{EntityState, NotificationPriority};

use super::ActionContext;
use crate::models::{Task, TaskReport};

#[derive(Debug, Default, PartialEq)]
pub struct BatteryReport {
    pub low: Vec<String>,
    pub always: Vec<String>,
    pub at_least_one_low: bool,
}

fn is_battery_sensor(entity: &EntityState) -> bool {
    entity.domain() == "sensor" && entity.device_class() == Some("battery")
}

fn is_battery_problem(entity: &EntityState) -> bool {
    entity.domain() == "binary_sensor" && entity.device_class() == Some("battery")
}

/// Low level for numeric sensors, `on` for binary battery sensors.
fn is_low(entity: &EntityState, threshold: f64) -> bool {
    if is_battery_sensor(entity) {
        return entity.numeric_state().is_some_and(|level| level < threshold);
    }
    is_battery_problem(entity) && entity.state == "on"
}

fn describe(entity: &EntityState) -> String {
    let value = if is_battery_problem(entity) {
        if entity.state == "on" {
            "battery low".to_string()
        } else {
            "battery ok".to_string()
        }
    } else {
        let unit = entity.unit_of_measurement().unwrap_or("");
        format!("{}{}", entity.state, unit)
    };

    if entity.display_name() == entity.entity_id {
        format!("{}: {}", entity.entity_id, value)
    } else {
        format!("{} ({}): {}", entity.display_name(), entity.entity_id, value)
    }
}

pub fn build_report(states: &[EntityState], task: &Task) -> BatteryReport {
    let mut report = BatteryReport::default();
    let threshold = task.battery_threshold;

    for entity in states {
        if task.entities_to_exclude.contains(&entity.entity_id)
            || task.entities_to_always_report.contains(&entity.entity_id)
        {
            continue;
        }
        if is_low(entity, threshold) {
            report.low.push(format!("- {}", describe(entity)));
        }
    }

    for entity_id in &task.entities_to_always_report {
        match states.iter().find(|e| e.entity_id == *entity_id) {
            Some(entity) => {
                let low = is_low(entity, threshold);
                let marker = if low { "⚠️ " } else { "" };
                report.always.push(format!("- {}{}", marker, describe(entity)));
                report.at_least_one_low |= low;
            }
            None => report.always.push(format!("- {}: not found", entity_id)),
        }
    }

    report.at_least_one_low |= !report.low.is_empty();
    report
}

pub async fn run(ctx: &ActionContext<'_>) -> Result<TaskReport> {
    let states = ctx
        .collaborators
        .home_assistant
        .get_all_entity_states()
        .await
        .context("Failed to fetch entity states")?;

    let battery = build_report(&states, ctx.task);

    let mut sections = Vec::new();
    if battery.low.is_empty() {
        sections.push("All batteries are fine".to_string());
    } else {
        sections.push(format!("Low batteries:\n{}", battery.low.join("\n")));
    }
    if !battery.always.is_empty() {
        sections.push(format!("Always reported:\n{}", battery.always.join("\n")));
    }

    let report = TaskReport::new(sections.join("\n\n"));
    Ok(if battery.at_least_one_low {
        report.with_priority(NotificationPriority::High)
    } else {
        report
    })
}
